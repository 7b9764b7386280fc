//! Derivative-free optimization for parameter estimation.
//!
//! Nelder-Mead minimizes the SARIMA conditional sum of squares.

/// Outcome of a minimization.
#[derive(Debug, Clone)]
pub struct OptimizeResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Number of objective evaluations.
    pub evaluations: usize,
    /// Whether a convergence criterion was met.
    pub converged: bool,
}

impl OptimizeResult {
    fn empty() -> Self {
        Self {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            evaluations: 0,
            converged: false,
        }
    }
}

/// Clamp `point` into `bounds` in place. Dimensions without a bound are left alone.
fn project(point: &mut [f64], bounds: Option<&[(f64, f64)]>) {
    if let Some(b) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(b.iter()) {
            *x = x.clamp(lo, hi);
        }
    }
}

fn bound_of(bounds: Option<&[(f64, f64)]>, i: usize) -> (f64, f64) {
    bounds
        .and_then(|b| b.get(i).copied())
        .unwrap_or((f64::NEG_INFINITY, f64::INFINITY))
}

/// Objective wrapper that counts evaluations and maps NaN to `f64::MAX`.
struct Counted<F> {
    f: F,
    evaluations: usize,
}

impl<F: Fn(&[f64]) -> f64> Counted<F> {
    fn new(f: F) -> Self {
        Self { f, evaluations: 0 }
    }

    fn eval(&mut self, x: &[f64]) -> f64 {
        self.evaluations += 1;
        let v = (self.f)(x);
        if v.is_nan() {
            f64::MAX
        } else {
            v
        }
    }
}

// ---------------------------------------------------------------------------
// Nelder-Mead
// ---------------------------------------------------------------------------

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Absolute tolerance on the spread of objective values across the simplex.
    pub fatol: f64,
    /// Absolute tolerance on the largest coordinate distance from the best vertex.
    pub xatol: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step size.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            fatol: 1e-8,
            xatol: 1e-6,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Minimize `objective` with the Nelder-Mead simplex method.
///
/// Every trial vertex is projected into `bounds`. The search stops once both
/// the value spread is within `fatol` and the simplex fits within `xatol` of
/// its best vertex.
///
/// # Example
/// ```
/// use spend_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> OptimizeResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return OptimizeResult::empty();
    }
    let mut f = Counted::new(objective);

    let mut start = initial.to_vec();
    project(&mut start, bounds);

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for i in 0..n {
        let mut vertex = start.clone();
        let step = if start[i].abs() > 1e-10 {
            config.initial_step * start[i].abs()
        } else {
            config.initial_step
        };
        // Step inward when the start sits on its upper bound.
        let (_, hi) = bound_of(bounds, i);
        vertex[i] = if vertex[i] + step > hi {
            vertex[i] - step
        } else {
            vertex[i] + step
        };
        project(&mut vertex, bounds);
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| f.eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        let value_spread = values
            .iter()
            .map(|v| (v - values[best]).abs())
            .fold(0.0, f64::max);
        if value_spread <= config.fatol && simplex_size(&simplex, best) <= config.xatol {
            converged = true;
            break;
        }

        let centroid = centroid_without(&simplex, worst);
        let mut reflected = along(&centroid, &simplex[worst], -config.alpha);
        project(&mut reflected, bounds);
        let reflected_value = f.eval(&reflected);

        if reflected_value < values[best] {
            let mut expanded = along(&centroid, &reflected, config.gamma);
            project(&mut expanded, bounds);
            let expanded_value = f.eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let (toward, reference) = if reflected_value < values[worst] {
            (reflected.clone(), reflected_value)
        } else {
            (simplex[worst].clone(), values[worst])
        };
        let mut contracted = along(&centroid, &toward, config.rho);
        project(&mut contracted, bounds);
        let contracted_value = f.eval(&contracted);
        if contracted_value < reference {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in (0..=n).filter(|&i| i != best) {
            let mut shrunk = along(&anchor, &simplex[i], config.sigma);
            project(&mut shrunk, bounds);
            values[i] = f.eval(&shrunk);
            simplex[i] = shrunk;
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    OptimizeResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        evaluations: f.evaluations,
        converged,
    }
}

/// Centroid of all vertices except `exclude`.
fn centroid_without(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];
    for (_, vertex) in simplex.iter().enumerate().filter(|(i, _)| *i != exclude) {
        for (c, v) in centroid.iter_mut().zip(vertex) {
            *c += v;
        }
    }
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

/// `origin + t * (point - origin)`.
fn along(origin: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

/// Largest coordinate distance of any vertex from `simplex[best]`.
fn simplex_size(simplex: &[Vec<f64>], best: usize) -> f64 {
    simplex
        .iter()
        .flat_map(|v| v.iter().zip(&simplex[best]).map(|(a, b)| (a - b).abs()))
        .fold(0.0, f64::max)
}
