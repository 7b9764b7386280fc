//! L-BFGS over the unit box, backed by `argmin`.
//!
//! Parameters constrained to `[0, 1]` are optimized in logit space: the
//! solver works on unconstrained `u` and the objective sees `logistic(u)`.
//! Gradients are finite differences of the cost in `u`, taken with
//! `finitediff`. The bounds themselves are approached but never reached.

use std::cell::{Cell, RefCell};

use argmin::core::{
    CostFunction, Error, Executor, Gradient, State, TerminationReason, TerminationStatus,
};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use finitediff::FiniteDiff;

use crate::error::{ForecastError, Result};
use crate::utils::optimization::OptimizeResult;

/// Smallest distance from 0 or 1 a starting point is clamped to before `logit`.
pub const LOGIT_EPS: f64 = 1e-12;

type Param = Vec<f64>;
type Solver = LBFGS<MoreThuenteLineSearch<Param, Param, f64>, Param, Param, f64>;

/// Configuration for [`minimize_unit_box`].
#[derive(Debug, Clone)]
pub struct LbfgsConfig {
    /// Maximum number of solver iterations.
    pub max_iter: u64,
    /// Number of correction pairs kept for the inverse-Hessian approximation.
    pub memory: usize,
    /// Stop when the gradient norm in logit space falls below this.
    pub tol_grad: f64,
    /// Stop when the cost changes by less than this between iterations.
    pub tol_cost: f64,
}

impl Default for LbfgsConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            memory: 7,
            tol_grad: 1e-8,
            tol_cost: 1e-12,
        }
    }
}

/// `1 / (1 + e^-u)`, evaluated without overflow for large `|u|`.
pub fn logistic(u: f64) -> f64 {
    if u >= 0.0 {
        1.0 / (1.0 + (-u).exp())
    } else {
        let e = u.exp();
        e / (1.0 + e)
    }
}

/// Inverse of [`logistic`], with `x` clamped into `[LOGIT_EPS, 1 - LOGIT_EPS]`.
pub fn logit(x: f64) -> f64 {
    let x = x.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    (x / (1.0 - x)).ln()
}

/// Bridges a unit-box objective to `argmin`'s `CostFunction` and `Gradient`.
///
/// Every cost evaluation is recorded, so the best point seen survives a
/// failed line search.
struct UnitBoxProblem<'a, F> {
    objective: F,
    best: &'a RefCell<Option<(Vec<f64>, f64)>>,
    evaluations: &'a Cell<usize>,
}

impl<F: Fn(&[f64]) -> f64> UnitBoxProblem<'_, F> {
    fn evaluate(&self, u: &[f64]) -> f64 {
        let x: Vec<f64> = u.iter().map(|&v| logistic(v)).collect();
        let value = (self.objective)(&x);
        self.evaluations.set(self.evaluations.get() + 1);
        if value.is_finite() {
            let mut best = self.best.borrow_mut();
            if best.as_ref().map_or(true, |(_, b)| value < *b) {
                *best = Some((x, value));
            }
        }
        value
    }
}

impl<F: Fn(&[f64]) -> f64> CostFunction for UnitBoxProblem<'_, F> {
    type Param = Param;
    type Output = f64;

    fn cost(&self, u: &Self::Param) -> std::result::Result<Self::Output, Error> {
        let value = self.evaluate(u);
        if !value.is_finite() {
            let reason = format!("objective is {value}");
            return Err(ForecastError::divergence("L-BFGS cost", reason).into());
        }
        Ok(value)
    }
}

impl<F: Fn(&[f64]) -> f64> Gradient for UnitBoxProblem<'_, F> {
    type Param = Param;
    type Gradient = Param;

    /// Central differences first; forward differences when any entry is
    /// not finite.
    fn gradient(&self, u: &Self::Param) -> std::result::Result<Self::Gradient, Error> {
        let cost = |p: &Vec<f64>| self.evaluate(p);
        let central = u.central_diff(&cost);
        if central.iter().all(|g| g.is_finite()) {
            return Ok(central);
        }
        let forward = u.forward_diff(&cost);
        if forward.iter().all(|g| g.is_finite()) {
            return Ok(forward);
        }
        let reason = "finite differences are not finite";
        Err(ForecastError::divergence("L-BFGS gradient", reason).into())
    }
}

fn build_solver(config: &LbfgsConfig) -> std::result::Result<Solver, Error> {
    LBFGS::new(MoreThuenteLineSearch::new(), config.memory)
        .with_tolerance_grad(config.tol_grad)?
        .with_tolerance_cost(config.tol_cost)
}

/// Minimize `objective` over `[0, 1]^n` with L-BFGS in logit space.
///
/// Returns the best point evaluated. A solver error after the first
/// evaluation is logged and the best point so far is returned; a
/// non-finite objective at the start is an error.
///
/// # Example
/// ```
/// use spend_forecast::utils::lbfgs::{minimize_unit_box, LbfgsConfig};
///
/// let result = minimize_unit_box(
///     |x| (x[0] - 0.3).powi(2) + (x[1] - 0.8).powi(2),
///     &[0.5, 0.5],
///     &LbfgsConfig::default(),
/// )
/// .unwrap();
///
/// assert!((result.optimal_point[0] - 0.3).abs() < 1e-4);
/// assert!((result.optimal_point[1] - 0.8).abs() < 1e-4);
/// ```
pub fn minimize_unit_box<F>(
    objective: F,
    initial: &[f64],
    config: &LbfgsConfig,
) -> Result<OptimizeResult>
where
    F: Fn(&[f64]) -> f64,
{
    let start: Vec<f64> = initial.iter().map(|&x| logit(x)).collect();
    let best = RefCell::new(None);
    let evaluations = Cell::new(0);
    let problem = UnitBoxProblem {
        objective,
        best: &best,
        evaluations: &evaluations,
    };

    let initial_value = problem.evaluate(&start);
    if !initial_value.is_finite() {
        return Err(ForecastError::divergence(
            "L-BFGS start",
            format!("objective is {initial_value}"),
        ));
    }

    let solver = build_solver(config)
        .map_err(|e| ForecastError::InvalidConfiguration(format!("L-BFGS solver: {e}")))?;
    let outcome = Executor::new(problem, solver)
        .configure(|state| state.param(start).max_iters(config.max_iter))
        .run();

    let (iterations, converged) = match &outcome {
        Ok(result) => {
            let state = result.state();
            let converged = matches!(
                state.get_termination_status(),
                TerminationStatus::Terminated(TerminationReason::SolverConverged)
            );
            (state.get_iter() as usize, converged)
        }
        Err(e) => {
            log::debug!("L-BFGS stopped early: {e}");
            (0, false)
        }
    };
    drop(outcome);

    let (optimal_point, optimal_value) = best
        .into_inner()
        .ok_or_else(|| ForecastError::divergence("L-BFGS", "no finite objective value"))?;

    Ok(OptimizeResult {
        optimal_point,
        optimal_value,
        iterations,
        evaluations: evaluations.get(),
        converged,
    })
}
