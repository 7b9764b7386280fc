//! Forecaster trait defining the common interface of the forecasting engines.

use crate::core::Forecast;
use crate::error::Result;

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to a series of values.
    fn fit(&mut self, values: &[f64]) -> Result<()>;

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with confidence intervals.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use spend_forecast::models::holt_winters::HoltWintersEngine;
/// use spend_forecast::models::sarima::SARIMA;
/// use spend_forecast::models::BoxedForecaster;
///
/// let models: Vec<BoxedForecaster> = vec![
///     Box::new(SARIMA::fallback()),
///     Box::new(HoltWintersEngine::new()),
/// ];
/// let names: Vec<&str> = models.iter().map(|m| m.name()).collect();
/// assert_eq!(names, ["SARIMA", "HoltWinters"]);
/// assert!(models.iter().all(|m| !m.is_fitted()));
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::holt_winters::HoltWintersEngine;
    use crate::models::sarima::SARIMA;

    #[test]
    fn boxed_models_fit_and_predict() {
        let values: Vec<f64> = (0..72)
            .map(|i| 5.0 + (i % 24) as f64 * 0.5 + 0.1 * i as f64)
            .collect();
        let mut models: Vec<BoxedForecaster> =
            vec![Box::new(SARIMA::fallback()), Box::new(HoltWintersEngine::new())];

        for model in models.iter_mut() {
            model.fit(&values).unwrap();
            assert!(model.is_fitted());
            assert_eq!(model.predict(6).unwrap().horizon(), 6);
            let forecast = model.predict_with_intervals(6, 0.95).unwrap();
            assert!(forecast.has_lower() && forecast.has_upper());
        }
    }
}
