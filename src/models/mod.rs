//! Forecasting models.

mod traits;

pub mod holt_winters;
pub mod sarima;

pub use holt_winters::HoltWintersEngine;
pub use sarima::SARIMA;
pub use traits::{BoxedForecaster, Forecaster};
