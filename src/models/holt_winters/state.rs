//! Holt-Winters state, one-step forecast and error-correction update.

use serde::{Deserialize, Serialize};

use crate::detection::{detect_seasonality, SeasonalityConfig};
use crate::error::{ForecastError, Result};
use crate::seasonality::decompose_additive;

/// Smoothing parameters, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HWParams {
    /// Level smoothing.
    pub alpha: f64,
    /// Trend smoothing.
    pub beta: f64,
    /// Seasonal smoothing.
    pub gamma: f64,
}

impl HWParams {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    pub(crate) fn from_slice(x: &[f64]) -> Self {
        Self::new(x[0], x[1], x[2])
    }

    pub(crate) fn to_vec(self) -> Vec<f64> {
        vec![self.alpha, self.beta, self.gamma]
    }
}

impl Default for HWParams {
    /// The calibration starting point `(0.3, 0.1, 0.1)`.
    fn default() -> Self {
        Self::new(0.3, 0.1, 0.1)
    }
}

/// Additive Holt-Winters state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HWState {
    /// Index of the last absorbed observation; `-1` before the first.
    pub t: i64,
    pub level: f64,
    pub trend: f64,
    /// One seasonal value per phase; a single zero when no seasonality was found.
    pub seasons: Vec<f64>,
}

impl HWState {
    /// Seasonal period (length of `seasons`).
    pub fn period(&self) -> usize {
        self.seasons.len()
    }

    /// Seasonal value for absolute time index `t`.
    pub fn season_at(&self, t: i64) -> f64 {
        self.seasons[t.rem_euclid(self.seasons.len() as i64) as usize]
    }
}

/// Initial state from a prefix of the series.
///
/// The period comes from autocorrelation peaks of the differenced prefix.
/// When one is found, a classical additive decomposition supplies the
/// seasons and the trend; otherwise the prefix itself is the trend and the
/// seasons collapse to `[0.0]`.
pub fn estimate_state(prefix: &[f64]) -> Result<HWState> {
    if prefix.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            got: prefix.len(),
        });
    }
    if prefix.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::MissingValues);
    }

    let detected = detect_seasonality(prefix, &SeasonalityConfig::default());
    let decomposition = detected
        .period
        .and_then(|period| decompose_additive(prefix, period))
        .filter(|d| d.trended().len() >= 2);

    let (seasons, trended) = match decomposition {
        Some(d) => {
            log::debug!(
                "Holt-Winters state: period {} (acf {:.3})",
                d.period(),
                detected.strength
            );
            let trended = d.trended();
            (d.indices, trended)
        }
        None => {
            log::debug!("Holt-Winters state: no seasonality detected");
            (vec![0.0], prefix.to_vec())
        }
    };

    let trend = trended[1] - trended[0];
    Ok(HWState {
        t: -1,
        level: trended[0] - trend,
        trend,
        seasons,
    })
}

/// Forecast `steps` steps past the state's time index.
pub fn forecast(state: &HWState, steps: usize) -> f64 {
    state.level + state.trend * steps as f64 + state.season_at(state.t + steps as i64)
}

/// Absorb observation `y`, returning the new state and the one-step error.
pub fn advance(y: f64, params: &HWParams, mut state: HWState) -> (HWState, f64) {
    let error = y - forecast(&state, 1);
    state.level += state.trend + params.alpha * error;
    state.trend += params.alpha * params.beta * error;
    let m = state.seasons.len() as i64;
    state.seasons[(state.t + 1).rem_euclid(m) as usize] += params.gamma * error;
    state.t += 1;
    (state, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_state(level: f64, trend: f64) -> HWState {
        HWState {
            t: -1,
            level,
            trend,
            seasons: vec![0.0],
        }
    }

    #[test]
    fn linear_series_state() {
        let values: Vec<f64> = (0..20).map(|i| 2.0 * i as f64).collect();
        let state = estimate_state(&values).unwrap();

        assert_eq!(state.t, -1);
        assert_eq!(state.seasons, vec![0.0]);
        assert_relative_eq!(state.trend, 2.0);
        assert_relative_eq!(state.level, -2.0);
        assert_relative_eq!(forecast(&state, 1), 0.0);
    }

    #[test]
    fn seasonal_series_state() {
        let values: Vec<f64> = (0..24 * 6)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * (i % 24) as f64 / 24.0;
                50.0 + 6.0 * phase.sin()
            })
            .collect();
        let state = estimate_state(&values).unwrap();

        assert_eq!(state.period(), 24);
        assert_relative_eq!(state.trend, 0.0, epsilon = 1e-9);
        assert_relative_eq!(state.level, 50.0, epsilon = 1e-9);
        assert_relative_eq!(state.seasons[6], 6.0, epsilon = 1e-9);
    }

    #[test]
    fn estimate_state_needs_two_points() {
        assert_eq!(
            estimate_state(&[1.0]).unwrap_err(),
            ForecastError::InsufficientData { needed: 2, got: 1 }
        );
    }

    #[test]
    fn forecast_with_flat_seasons_is_linear() {
        let state = flat_state(10.0, 1.5);
        for k in 1..10 {
            assert_relative_eq!(forecast(&state, k), 10.0 + 1.5 * k as f64);
        }
    }

    #[test]
    fn forecast_wraps_seasons() {
        let state = HWState {
            t: 4,
            level: 0.0,
            trend: 0.0,
            seasons: vec![1.0, 2.0, 3.0],
        };
        // (4 + 1) mod 3 = 2, (4 + 2) mod 3 = 0
        assert_relative_eq!(forecast(&state, 1), 3.0);
        assert_relative_eq!(forecast(&state, 2), 1.0);
    }

    #[test]
    fn advance_updates_components() {
        let params = HWParams::new(0.5, 0.2, 0.4);
        let state = HWState {
            t: -1,
            level: 10.0,
            trend: 1.0,
            seasons: vec![0.5, -0.5],
        };
        // forecast(state, 1) = 10 + 1 + seasons[0] = 11.5
        let (next, error) = advance(13.5, &params, state.clone());

        assert_relative_eq!(error, 2.0);
        assert_relative_eq!(next.level, 10.0 + 1.0 + 0.5 * 2.0);
        assert_relative_eq!(next.trend, 1.0 + 0.5 * 0.2 * 2.0);
        assert_relative_eq!(next.seasons[0], 0.5 + 0.4 * 2.0);
        assert_relative_eq!(next.seasons[1], -0.5);
        assert_eq!(next.t, 0);
        // The input state is untouched.
        assert_relative_eq!(state.level, 10.0);
    }

    #[test]
    fn advance_counts_time() {
        let params = HWParams::default();
        let values = [3.0, 4.0, 6.0, 5.0, 7.0];
        let state = values.iter().fold(flat_state(2.0, 1.0), |s, &y| {
            advance(y, &params, s).0
        });
        assert_eq!(state.t, values.len() as i64 - 1);
    }
}
