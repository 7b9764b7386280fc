//! Smoothing-parameter calibration.

use crate::error::{ForecastError, Result};
use crate::models::holt_winters::state::{advance, HWParams, HWState};
use crate::utils::lbfgs::{minimize_unit_box, LbfgsConfig};

/// Mean squared one-step error of replaying `values` from `initial`.
///
/// The initial state is cloned, never mutated.
pub fn one_step_mse(values: &[f64], params: &HWParams, initial: &HWState) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let (_, sse) = values
        .iter()
        .fold((initial.clone(), 0.0), |(state, sse), &y| {
            let (next, error) = advance(y, params, state);
            (next, sse + error * error)
        });
    sse / values.len() as f64
}

/// Minimize [`one_step_mse`] over `[0, 1]^3` starting from `(0.3, 0.1, 0.1)`.
///
/// The search runs L-BFGS on the logits of the three parameters, so the
/// result lies strictly inside the box.
pub fn estimate_params(values: &[f64], initial: &HWState) -> Result<HWParams> {
    if values.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }

    let start = HWParams::default().to_vec();
    let result = minimize_unit_box(
        |x| one_step_mse(values, &HWParams::from_slice(x), initial),
        &start,
        &LbfgsConfig::default(),
    )
    .map_err(|e| match e {
        ForecastError::FitDivergence { reason, .. } => {
            ForecastError::divergence("Holt-Winters calibration", reason)
        }
        other => other,
    })?;

    let params = HWParams::from_slice(&result.optimal_point);
    log::debug!(
        "Holt-Winters calibrated: alpha={:.4}, beta={:.4}, gamma={:.4}, mse={:.6} ({} iterations)",
        params.alpha,
        params.beta,
        params.gamma,
        result.optimal_value,
        result.iterations
    );
    Ok(params)
}
