//! Run configuration for the forecasting pipeline.

use std::ops::Range;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Hourly data repeats daily.
pub const HOURLY_SEASONAL_PERIOD: usize = 24;

/// Number of forecast steps per forecast day (hourly sampling).
pub const STEPS_PER_DAY: usize = 24;

/// Longest accepted forecast horizon in days.
pub const MAX_FORECAST_DAYS: usize = 366;

/// Configuration for a single forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Forecast horizon in days; converted to `days * 24` hourly steps.
    pub forecast_length_days: usize,
    /// Upper bound of the MA search range. Zero disables the grid search
    /// and selects the fixed fallback parameterization.
    pub use_grid: usize,
    /// Confidence level for forecast intervals.
    pub confidence_level: f64,
    /// Seasonal period of the SARIMA models.
    pub seasonal_period: usize,
    /// Wall-time cap for the grid search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_time_limit: Option<Duration>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            forecast_length_days: 7,
            use_grid: 0,
            confidence_level: 0.95,
            seasonal_period: HOURLY_SEASONAL_PERIOD,
            grid_time_limit: None,
        }
    }
}

impl ForecastConfig {
    /// Configuration used for one-off, interactive forecasts (one day ahead).
    pub fn adhoc() -> Self {
        Self {
            forecast_length_days: 1,
            ..Self::default()
        }
    }

    /// Set the forecast horizon in days.
    pub fn with_forecast_length_days(mut self, days: usize) -> Self {
        self.forecast_length_days = days;
        self
    }

    /// Enable the grid search with the given MA upper bound (0 disables it).
    pub fn with_grid(mut self, use_grid: usize) -> Self {
        self.use_grid = use_grid;
        self
    }

    /// Set the interval confidence level.
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Set the seasonal period.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Cap the wall time spent in the grid search.
    pub fn with_grid_time_limit(mut self, limit: Duration) -> Self {
        self.grid_time_limit = Some(limit);
        self
    }

    /// Number of hourly steps to forecast.
    ///
    /// Saturates for horizons that [`validate`](Self::validate) rejects.
    pub fn forecast_steps(&self) -> usize {
        self.forecast_length_days.saturating_mul(STEPS_PER_DAY)
    }

    /// Whether the grid search is enabled.
    pub fn grid_enabled(&self) -> bool {
        self.use_grid > 0
    }

    /// Grid derived from `use_grid`, if enabled.
    pub fn grid_spec(&self) -> Option<GridSpec> {
        self.grid_enabled()
            .then(|| GridSpec::from_upper_bound(self.use_grid).with_seasonal_period(self.seasonal_period))
    }

    /// Reject malformed settings before any fitting work begins.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_FORECAST_DAYS).contains(&self.forecast_length_days) {
            return Err(ForecastError::InvalidConfiguration(format!(
                "forecast_length_days must be in 1..={MAX_FORECAST_DAYS}, got {}",
                self.forecast_length_days
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidConfiguration(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.seasonal_period < 2 {
            return Err(ForecastError::InvalidConfiguration(format!(
                "seasonal_period must be at least 2, got {}",
                self.seasonal_period
            )));
        }
        if let Some(grid) = self.grid_spec() {
            grid.validate()?;
        }
        Ok(())
    }
}

/// Search space of the SARIMA grid.
///
/// The same three ranges generate the non-seasonal `(p, d, q)` tuples and
/// the seasonal `(P, D, Q, s)` tuples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// AR order range (half-open).
    pub p: Range<usize>,
    /// Differencing order range (half-open).
    pub d: Range<usize>,
    /// MA order range (half-open).
    pub q: Range<usize>,
    /// Seasonal period attached to every seasonal tuple.
    pub seasonal_period: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            p: 1..2,
            d: 1..2,
            q: 0..2,
            seasonal_period: HOURLY_SEASONAL_PERIOD,
        }
    }
}

impl GridSpec {
    /// Grid with `p` in `[1, 2)`, `d` in `[1, 2)` and `q` in `[0, upper)`.
    pub fn from_upper_bound(upper: usize) -> Self {
        Self {
            q: 0..upper,
            ..Self::default()
        }
    }

    /// Set all three order ranges.
    pub fn with_ranges(mut self, p: Range<usize>, d: Range<usize>, q: Range<usize>) -> Self {
        self.p = p;
        self.d = d;
        self.q = q;
        self
    }

    /// Set the seasonal period.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Number of `(p, d, q)` tuples (equal to the number of seasonal tuples).
    pub fn tuples_per_side(&self) -> usize {
        self.p.len() * self.d.len() * self.q.len()
    }

    /// Total candidates of the full cross product.
    pub fn candidate_count(&self) -> usize {
        self.tuples_per_side() * self.tuples_per_side()
    }

    /// Reject empty ranges and degenerate periods.
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [("p", &self.p), ("d", &self.d), ("q", &self.q)] {
            if range.is_empty() {
                return Err(ForecastError::InvalidConfiguration(format!(
                    "grid range for {name} is empty ({}..{})",
                    range.start, range.end
                )));
            }
        }
        if self.seasonal_period < 2 {
            return Err(ForecastError::InvalidConfiguration(format!(
                "seasonal_period must be at least 2, got {}",
                self.seasonal_period
            )));
        }
        Ok(())
    }
}
