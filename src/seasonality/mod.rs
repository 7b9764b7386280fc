//! Seasonal decomposition.

mod decompose;

pub use decompose::{decompose_additive, Decomposition};
