//! Detection utilities for time series analysis.

mod seasonality;

pub use seasonality::{detect_seasonality, SeasonalityConfig, SeasonalityResult};
