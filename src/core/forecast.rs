//! Forecast result structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// A forecast result containing point predictions and optional intervals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(values: Vec<f64>, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn primary(&self) -> &[f64] {
        &self.point
    }

    pub fn has_lower(&self) -> bool {
        self.lower.is_some()
    }

    pub fn has_upper(&self) -> bool {
        self.upper.is_some()
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Per-step interval rows (steps numbered from 1).
    ///
    /// Fails if the forecast carries no intervals.
    pub fn intervals(&self) -> Result<Vec<ForecastInterval>> {
        let (lower, upper) = match (&self.lower, &self.upper) {
            (Some(l), Some(u)) => (l, u),
            _ => {
                return Err(ForecastError::ComputationError(
                    "forecast has no prediction intervals".to_string(),
                ))
            }
        };
        if lower.len() != self.point.len() || upper.len() != self.point.len() {
            return Err(ForecastError::ComputationError(format!(
                "interval length mismatch: {} points, {} lower, {} upper",
                self.point.len(),
                lower.len(),
                upper.len()
            )));
        }

        Ok(self
            .point
            .iter()
            .zip(lower.iter().zip(upper.iter()))
            .enumerate()
            .map(|(i, (&mean, (&lower, &upper)))| ForecastInterval {
                step: i + 1,
                lower,
                mean,
                upper,
            })
            .collect())
    }
}

/// One forecast step on the differenced scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastInterval {
    /// Step number, starting at 1.
    pub step: usize,
    pub lower: f64,
    pub mean: f64,
    pub upper: f64,
}

impl ForecastInterval {
    /// Whether `lower <= mean <= upper` holds for this step.
    pub fn is_ordered(&self) -> bool {
        self.lower <= self.mean && self.mean <= self.upper
    }
}

/// A forecast step augmented with cumulative totals on the absolute scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativeInterval {
    pub step: usize,
    pub lower: f64,
    pub mean: f64,
    pub upper: f64,
    pub lower_total: f64,
    pub mean_total: f64,
    pub upper_total: f64,
}

/// Final cumulative totals of a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub lower_total: f64,
    pub mean_total: f64,
    pub upper_total: f64,
}

/// Point prediction of the Holt-Winters path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HwPrediction {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_from_values_has_no_intervals() {
        let forecast = Forecast::from_values(vec![1.0, 2.0, 3.0]);
        assert_eq!(forecast.horizon(), 3);
        assert!(!forecast.is_empty());
        assert!(!forecast.has_lower());
        assert!(!forecast.has_upper());
        assert!(forecast.intervals().is_err());
    }

    #[test]
    fn forecast_intervals_number_steps_from_one() {
        let forecast = Forecast::from_values_with_intervals(
            vec![2.0, 3.0],
            vec![1.0, 2.0],
            vec![3.0, 4.0],
        );

        let rows = forecast.intervals().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            ForecastInterval {
                step: 1,
                lower: 1.0,
                mean: 2.0,
                upper: 3.0
            }
        );
        assert_eq!(rows[1].step, 2);
        assert!(rows.iter().all(ForecastInterval::is_ordered));
    }

    #[test]
    fn forecast_intervals_reject_length_mismatch() {
        let forecast =
            Forecast::from_values_with_intervals(vec![2.0, 3.0], vec![1.0], vec![3.0, 4.0]);
        assert!(matches!(
            forecast.intervals(),
            Err(ForecastError::ComputationError(_))
        ));
    }

    #[test]
    fn empty_forecast() {
        let forecast = Forecast::new();
        assert!(forecast.is_empty());
        assert_eq!(forecast.horizon(), 0);
    }

    #[test]
    fn interval_ordering_check() {
        let row = ForecastInterval {
            step: 1,
            lower: 3.0,
            mean: 2.0,
            upper: 4.0,
        };
        assert!(!row.is_ordered());
    }
}
