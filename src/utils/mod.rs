//! Numerical utilities shared by the models.

pub mod lbfgs;
pub mod optimization;
pub mod stats;

pub use lbfgs::{minimize_unit_box, LbfgsConfig};
pub use optimization::{nelder_mead, NelderMeadConfig, OptimizeResult};
pub use stats::{quantile_normal, two_sided_z};
