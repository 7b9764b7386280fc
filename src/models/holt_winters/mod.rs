//! Additive Holt-Winters exponential smoothing.
//!
//! The state carries a level, a trend and one seasonal value per phase.
//! Updates use the error-correction form:
//! - Error: `e = y - (l + b + s[(t+1) mod m])`
//! - Level: `l += b + αe`
//! - Trend: `b += αβe`
//! - Season: `s[(t+1) mod m] += γe`
//!
//! Seasonal values are not re-normalized after updates.

mod calibrate;
mod engine;
mod state;

pub use calibrate::{estimate_params, one_step_mse};
pub use engine::{get_forecast, HoltWintersEngine};
pub use state::{advance, estimate_state, forecast, HWParams, HWState};
