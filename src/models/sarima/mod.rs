//! Seasonal ARIMA models and order selection.

mod grid;
mod model;
mod params;
pub mod polynomial;

pub use grid::{fit_candidate, FitOutcome, GridResult, GridRow, GridSearch};
pub use model::{SarimaCoefficients, DEFAULT_LEVEL, MIN_FIT_VALUES, SARIMA};
pub use params::{Order, SarimaParams, SeasonalOrder};
