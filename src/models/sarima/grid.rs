//! Exhaustive AIC-minimizing SARIMA order search.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::GridSpec;
use crate::error::{ForecastError, Result};
use crate::models::sarima::model::SARIMA;
use crate::models::sarima::params::{Order, SarimaParams, SeasonalOrder};

/// Outcome of fitting one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    /// The fit succeeded with this AIC.
    Fitted { aic: f64 },
    /// The fit failed.
    Failed(ForecastError),
    /// The wall-time cap was exceeded before the candidate was tried.
    Skipped,
}

/// A successfully fitted candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    pub params: SarimaParams,
    pub aic: f64,
}

/// Every successful fit of a search, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridResult {
    /// Successful fits.
    pub rows: Vec<GridRow>,
    /// Candidates in the search space.
    pub attempted: usize,
    /// Expected numerical failures (divergence, too little data).
    pub failures: usize,
    /// Failures of any other kind.
    pub unexpected_failures: usize,
    /// Candidates not tried because of the wall-time cap.
    pub skipped: usize,
}

impl GridResult {
    /// Row with the smallest AIC; the earliest row wins ties.
    pub fn best(&self) -> Option<&GridRow> {
        self.rows.iter().fold(None, |best: Option<&GridRow>, row| match best {
            Some(b) if b.aic <= row.aic => Some(b),
            _ => Some(row),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Grid search over the full cross product of `(p,d,q)` and `(P,D,Q,s)`.
///
/// # Example
/// ```
/// use spend_forecast::config::GridSpec;
/// use spend_forecast::models::sarima::GridSearch;
///
/// let values: Vec<f64> = (0..60).map(|i| (i % 24) as f64 + 0.2 * i as f64).collect();
/// let result = GridSearch::new(GridSpec::from_upper_bound(2)).run(&values).unwrap();
///
/// assert_eq!(result.attempted, 4);
/// let best = result.best().unwrap();
/// assert!(result.rows.iter().all(|r| best.aic <= r.aic));
/// ```
#[derive(Debug, Clone)]
pub struct GridSearch {
    spec: GridSpec,
    time_limit: Option<Duration>,
}

impl GridSearch {
    pub fn new(spec: GridSpec) -> Self {
        Self {
            spec,
            time_limit: None,
        }
    }

    /// Skip remaining candidates once `limit` has elapsed.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// All candidates in enumeration order: the seasonal tuple varies fastest.
    pub fn candidates(&self) -> Vec<SarimaParams> {
        let spec = &self.spec;
        let mut triples = Vec::with_capacity(spec.tuples_per_side());
        for p in spec.p.clone() {
            for d in spec.d.clone() {
                for q in spec.q.clone() {
                    triples.push((p, d, q));
                }
            }
        }

        let mut candidates = Vec::with_capacity(triples.len() * triples.len());
        for &(p, d, q) in &triples {
            for &(sp, sd, sq) in &triples {
                candidates.push(SarimaParams::new(
                    Order::new(p, d, q),
                    SeasonalOrder::new(sp, sd, sq, spec.seasonal_period),
                ));
            }
        }
        candidates
    }

    /// Fit every candidate on `values` and collect the successes.
    ///
    /// Returns [`ForecastError::EmptySearchSpace`] if no candidate fits.
    pub fn run(&self, values: &[f64]) -> Result<GridResult> {
        self.spec.validate()?;
        let candidates = self.candidates();
        let started = Instant::now();

        log::info!(
            "SARIMA grid search over {} candidates on {} values",
            candidates.len(),
            values.len()
        );

        let outcomes = self.evaluate_all(&candidates, values, started);

        let mut result = GridResult {
            attempted: candidates.len(),
            ..GridResult::default()
        };
        for (params, outcome) in candidates.into_iter().zip(outcomes) {
            match outcome {
                FitOutcome::Fitted { aic } => result.rows.push(GridRow { params, aic }),
                FitOutcome::Failed(err) if err.is_expected_fit_failure() => {
                    log::debug!("SARIMA{params} dropped: {err}");
                    result.failures += 1;
                }
                FitOutcome::Failed(err) => {
                    log::warn!("SARIMA{params} failed unexpectedly: {err}");
                    result.unexpected_failures += 1;
                }
                FitOutcome::Skipped => result.skipped += 1,
            }
        }

        if result.skipped > 0 {
            log::warn!(
                "grid time limit reached after {:?}; {} candidates skipped",
                started.elapsed(),
                result.skipped
            );
        }

        match result.best() {
            Some(best) => {
                log::info!(
                    "selected SARIMA{} (aic={:.4}) from {} fitted candidates",
                    best.params,
                    best.aic,
                    result.rows.len()
                );
                Ok(result)
            }
            None => Err(ForecastError::EmptySearchSpace {
                attempted: result.attempted,
            }),
        }
    }

    fn evaluate(&self, params: SarimaParams, values: &[f64], started: Instant) -> FitOutcome {
        if let Some(limit) = self.time_limit {
            if started.elapsed() >= limit {
                return FitOutcome::Skipped;
            }
        }
        fit_candidate(params, values)
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate_all(
        &self,
        candidates: &[SarimaParams],
        values: &[f64],
        started: Instant,
    ) -> Vec<FitOutcome> {
        candidates
            .iter()
            .map(|&params| self.evaluate(params, values, started))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn evaluate_all(
        &self,
        candidates: &[SarimaParams],
        values: &[f64],
        started: Instant,
    ) -> Vec<FitOutcome> {
        use rayon::prelude::*;

        candidates
            .par_iter()
            .map(|&params| self.evaluate(params, values, started))
            .collect()
    }
}

/// Fit a single candidate and report its AIC.
pub fn fit_candidate(params: SarimaParams, values: &[f64]) -> FitOutcome {
    let mut model = SARIMA::new(params);
    match model.fit(values) {
        Ok(()) => match model.aic() {
            Some(aic) => FitOutcome::Fitted { aic },
            None => FitOutcome::Failed(ForecastError::divergence(
                format!("SARIMA{params} fit"),
                "no information criterion",
            )),
        },
        Err(err) => FitOutcome::Failed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily_pattern(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let hour = (i % 24) as f64;
                3.0 + if (8.0..18.0).contains(&hour) { 2.0 } else { 0.5 } + 0.01 * i as f64
            })
            .collect()
    }

    #[test]
    fn candidates_form_full_cross_product() {
        let search = GridSearch::new(GridSpec::from_upper_bound(3));
        let candidates = search.candidates();

        assert_eq!(candidates.len(), 9);
        assert_eq!(candidates.len(), search.spec().candidate_count());
        assert_eq!(candidates[0].order, Order::new(1, 1, 0));
        assert_eq!(candidates[0].seasonal_order, SeasonalOrder::new(1, 1, 0, 24));
        assert_eq!(candidates[1].seasonal_order, SeasonalOrder::new(1, 1, 1, 24));
        assert_eq!(candidates[3].order, Order::new(1, 1, 1));
        assert_eq!(candidates[8].order, Order::new(1, 1, 2));
        assert_eq!(candidates[8].seasonal_order, SeasonalOrder::new(1, 1, 2, 24));
    }

    #[test]
    fn best_has_minimum_aic() {
        let result = GridSearch::new(GridSpec::from_upper_bound(2))
            .run(&daily_pattern(72))
            .unwrap();

        assert_eq!(result.attempted, 4);
        assert_eq!(result.rows.len() + result.failures + result.unexpected_failures, 4);
        let best = result.best().unwrap();
        for row in &result.rows {
            assert!(best.aic <= row.aic);
        }
    }

    #[test]
    fn best_prefers_first_row_on_ties() {
        let a = SarimaParams::fallback();
        let b = SarimaParams::new(Order::new(1, 1, 0), SeasonalOrder::new(1, 1, 0, 24));
        let result = GridResult {
            rows: vec![
                GridRow { params: a, aic: 10.0 },
                GridRow { params: b, aic: 10.0 },
            ],
            attempted: 2,
            ..GridResult::default()
        };
        assert_eq!(result.best().unwrap().params, a);
    }

    #[test]
    fn too_short_series_is_empty_search_space() {
        let err = GridSearch::new(GridSpec::from_upper_bound(2))
            .run(&[1.0, 2.0])
            .unwrap_err();
        assert_eq!(err, ForecastError::EmptySearchSpace { attempted: 4 });
    }

    #[test]
    fn zero_time_limit_skips_everything() {
        let err = GridSearch::new(GridSpec::from_upper_bound(2))
            .with_time_limit(Duration::ZERO)
            .run(&daily_pattern(48))
            .unwrap_err();
        assert!(matches!(err, ForecastError::EmptySearchSpace { attempted: 4 }));
    }

    #[test]
    fn invalid_grid_is_rejected() {
        let spec = GridSpec::from_upper_bound(0);
        let err = GridSearch::new(spec).run(&daily_pattern(48)).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidConfiguration(_)));
    }

    #[test]
    fn fit_candidate_tags_failures() {
        let outcome = fit_candidate(SarimaParams::fallback(), &[1.0]);
        assert!(matches!(
            outcome,
            FitOutcome::Failed(ForecastError::InsufficientData { needed: 3, got: 1 })
        ));
        assert!(matches!(
            fit_candidate(SarimaParams::fallback(), &daily_pattern(30)),
            FitOutcome::Fitted { .. }
        ));
    }

    #[test]
    fn grid_search_is_deterministic() {
        let values = daily_pattern(60);
        let search = GridSearch::new(GridSpec::from_upper_bound(2));
        assert_eq!(search.run(&values).unwrap(), search.run(&values).unwrap());
    }
}
