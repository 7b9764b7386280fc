//! # spend-forecast
//!
//! Forecasts month-to-date cumulative spend from hourly observations and
//! compares the projection with a budget.
//!
//! Two engines are provided:
//! - SARIMA on the hourly increments with AIC-driven order selection,
//!   reconstructed into cumulative totals with prediction intervals.
//! - Additive Holt-Winters on the absolute series with automatic period
//!   detection and calibrated smoothing parameters.
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use spend_forecast::prelude::*;
//!
//! let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let points: Vec<Datapoint> = [100.0, 105.0, 111.0, 118.0, 126.0, 135.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &v)| Datapoint::new(base + Duration::hours(i as i64), v))
//!     .collect();
//!
//! let prepared = prepare(&points).unwrap();
//! let report = run_sarima(&prepared, &ForecastConfig::adhoc()).unwrap();
//! assert_eq!(report.forecast.len(), 24);
//! ```

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod budget;
pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reconstruct;
pub mod seasonality;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::budget::{AlertPayload, BudgetCheck, BudgetVerdict, ForecastWindow};
    pub use crate::config::{ForecastConfig, GridSpec};
    pub use crate::core::{prepare, Datapoint, Forecast, ForecastInterval, Headline, PreparedSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::holt_winters::{HWParams, HWState, HoltWintersEngine};
    pub use crate::models::sarima::{GridSearch, SarimaParams, SARIMA};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{run, run_holt_winters, run_sarima, Report, Strategy};
    pub use crate::reconstruct::{reconstruct, CumulativeForecast};
}
