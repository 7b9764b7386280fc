//! Holt-Winters forecaster over an absolute series.

use chrono::{DateTime, Utc};

use crate::core::{Forecast, HwPrediction, ObservedSeries};
use crate::error::{ForecastError, Result};
use crate::models::holt_winters::calibrate::estimate_params;
use crate::models::holt_winters::state::{advance, estimate_state, forecast, HWParams, HWState};
use crate::models::Forecaster;
use crate::utils::stats::two_sided_z;

/// Additive Holt-Winters with automatic period detection and calibrated
/// smoothing parameters.
///
/// Fitting estimates an initial state from a prefix of the history (the
/// whole history by default), calibrates `(alpha, beta, gamma)` on every
/// observation and replays the updates to reach the terminal state.
///
/// # Example
/// ```
/// use spend_forecast::models::holt_winters::HoltWintersEngine;
///
/// let values: Vec<f64> = (0..30).map(|i| 2.0 * i as f64).collect();
/// let mut engine = HoltWintersEngine::new();
/// engine.fit(&values).unwrap();
///
/// let next = engine.forecast(3).unwrap();
/// assert!((next[0] - 60.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HoltWintersEngine {
    prefix_len: Option<usize>,
    params: Option<HWParams>,
    initial_state: Option<HWState>,
    state: Option<HWState>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
}

impl HoltWintersEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimate the initial state from the first `len` observations only.
    pub fn with_prefix_len(mut self, len: usize) -> Self {
        self.prefix_len = Some(len);
        self
    }

    /// Calibrated smoothing parameters.
    pub fn params(&self) -> Option<HWParams> {
        self.params
    }

    /// State estimated before any observation was absorbed.
    pub fn initial_state(&self) -> Option<&HWState> {
        self.initial_state.as_ref()
    }

    /// State after the last observation.
    pub fn state(&self) -> Option<&HWState> {
        self.state.as_ref()
    }

    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        let prefix_len = self.prefix_len.unwrap_or(values.len()).min(values.len());
        let initial = estimate_state(&values[..prefix_len])?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        let params = estimate_params(values, &initial)?;

        let mut state = initial.clone();
        let mut fitted = Vec::with_capacity(values.len());
        let mut residuals = Vec::with_capacity(values.len());
        for &y in values {
            let (next, error) = advance(y, &params, state);
            fitted.push(y - error);
            residuals.push(error);
            state = next;
        }

        if !(state.level.is_finite() && state.trend.is_finite()) {
            return Err(ForecastError::divergence(
                "Holt-Winters replay",
                format!("terminal level {} trend {}", state.level, state.trend),
            ));
        }

        let variance = residuals.iter().map(|e| e * e).sum::<f64>() / residuals.len() as f64;
        log::debug!(
            "Holt-Winters replayed {} observations, terminal level {:.4} trend {:.4}",
            values.len(),
            state.level,
            state.trend
        );

        self.params = Some(params);
        self.initial_state = Some(initial);
        self.state = Some(state);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        self.residual_variance = Some(variance);
        Ok(())
    }

    /// Forecasts for steps `1..=steps` from the terminal state.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        Ok((1..=steps).map(|k| forecast(state, k)).collect())
    }

    /// Fit on `values` and forecast `steps` steps past the last timestamp.
    ///
    /// Forecast timestamps advance by the modal spacing of `timestamps`.
    pub fn get_forecast(
        &mut self,
        values: &[f64],
        timestamps: &[DateTime<Utc>],
        steps: usize,
    ) -> Result<Vec<HwPrediction>> {
        let series = ObservedSeries::new(timestamps.to_vec(), values.to_vec())?;
        let frequency = series.infer_frequency(0.0)?;
        let last = series
            .last()
            .ok_or(ForecastError::InsufficientData { needed: 2, got: 0 })?;

        self.fit(series.values())?;
        let predictions = self
            .forecast(steps)?
            .into_iter()
            .enumerate()
            .map(|(i, value)| HwPrediction {
                timestamp: last.timestamp + frequency * (i as i32 + 1),
                value,
            })
            .collect();
        Ok(predictions)
    }
}

/// Fit a fresh engine and forecast; see [`HoltWintersEngine::get_forecast`].
pub fn get_forecast(
    values: &[f64],
    timestamps: &[DateTime<Utc>],
    steps: usize,
) -> Result<Vec<HwPrediction>> {
    HoltWintersEngine::new().get_forecast(values, timestamps, steps)
}

impl Forecaster for HoltWintersEngine {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        HoltWintersEngine::fit(self, values)
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        Ok(Forecast::from_values(self.forecast(horizon)?))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        let variance = self.residual_variance.unwrap_or(0.0);
        let period = state.period();
        let z = two_sided_z(level);

        let predictions = self.forecast(horizon)?;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (i, pred) in predictions.iter().enumerate() {
            // Uncertainty grows once per completed season.
            let k = i / period + 1;
            let se = (variance * k as f64).sqrt();
            lower.push(pred - z * se);
            upper.push(pred + z * se);
        }

        Ok(Forecast::from_values_with_intervals(predictions, lower, upper))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "HoltWinters"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::hours(i as i64)).collect()
    }

    fn make_seasonal_data(n: usize, period: usize, trend: f64, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * (i % period) as f64 / period as f64;
                100.0 + trend * i as f64 + amplitude * phase.sin()
            })
            .collect()
    }

    #[test]
    fn hw_linear_series_continues_slope() {
        let values: Vec<f64> = (0..40).map(|i| 2.0 * i as f64).collect();
        let mut engine = HoltWintersEngine::new();
        engine.fit(&values).unwrap();

        let state = engine.state().unwrap();
        assert_eq!(state.t, 39);
        assert_relative_eq!(state.trend, 2.0, epsilon = 1e-9);
        for (k, value) in engine.forecast(5).unwrap().iter().enumerate() {
            assert_relative_eq!(*value, 2.0 * (40 + k) as f64, epsilon = 1e-6);
        }
        assert!(engine.residuals().unwrap().iter().all(|e| e.abs() < 1e-9));
    }

    #[test]
    fn hw_tracks_daily_seasonality() {
        let values = make_seasonal_data(24 * 11, 24, 0.05, 5.0);
        let (history, future) = values.split_at(24 * 10);

        let mut engine = HoltWintersEngine::new();
        engine.fit(history).unwrap();
        assert_eq!(engine.state().unwrap().period(), 24);

        let predicted = engine.forecast(24).unwrap();
        let mae = predicted
            .iter()
            .zip(future)
            .map(|(p, y)| (p - y).abs())
            .sum::<f64>()
            / 24.0;
        assert!(mae < 1.0, "mean absolute error {mae}");
    }

    #[test]
    fn hw_get_forecast_timestamps() {
        let values: Vec<f64> = (0..48).map(|i| 10.0 + i as f64).collect();
        let timestamps = make_timestamps(48);

        let predictions = get_forecast(&values, &timestamps, 3).unwrap();
        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].timestamp, timestamps[47] + Duration::hours(1));
        assert_eq!(predictions[2].timestamp, timestamps[47] + Duration::hours(3));
        assert_relative_eq!(predictions[0].value, 58.0, epsilon = 1e-6);
    }

    #[test]
    fn hw_get_forecast_rejects_mismatched_lengths() {
        let timestamps = make_timestamps(5);
        assert!(get_forecast(&[1.0, 2.0, 3.0], &timestamps, 2).is_err());
    }

    #[test]
    fn hw_prefix_only_shapes_initial_state() {
        let mut values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        values.extend((10..30).map(|i| 3.0 * i as f64));

        let mut engine = HoltWintersEngine::new().with_prefix_len(10);
        engine.fit(&values).unwrap();
        assert_relative_eq!(engine.initial_state().unwrap().trend, 1.0);
        assert_eq!(engine.state().unwrap().t, 29);
    }

    #[test]
    fn hw_requires_fit_before_forecast() {
        let engine = HoltWintersEngine::new();
        assert_eq!(engine.forecast(2).unwrap_err(), ForecastError::FitRequired);
        assert!(!engine.is_fitted());
    }

    #[test]
    fn hw_intervals_contain_point_forecast() {
        let values = make_seasonal_data(24 * 6, 24, 0.1, 3.0);
        let mut engine = HoltWintersEngine::new();
        Forecaster::fit(&mut engine, &values).unwrap();

        let forecast = engine.predict_with_intervals(30, 0.9).unwrap();
        for row in forecast.intervals().unwrap() {
            assert!(row.is_ordered());
        }
        assert_eq!(engine.name(), "HoltWinters");
    }
}
