//! Cumulative reconstruction of differenced forecasts.
//!
//! The SARIMA path forecasts increments. Each band (lower, mean, upper) is
//! summed independently and offset by the last observed absolute value, so
//! `mean_total[k] = last_observed + Σ_{i<=k} mean[i]`.

use serde::{Deserialize, Serialize};

use crate::core::{CumulativeInterval, ForecastInterval, Headline};

/// Forecast rows with running totals on the absolute scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeForecast {
    rows: Vec<CumulativeInterval>,
    last_observed: f64,
}

impl CumulativeForecast {
    pub fn rows(&self) -> &[CumulativeInterval] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<CumulativeInterval> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Absolute value the totals are anchored to.
    pub fn last_observed(&self) -> f64 {
        self.last_observed
    }

    /// Whether every row satisfies `lower_total <= mean_total <= upper_total`.
    pub fn is_ordered(&self) -> bool {
        self.rows
            .iter()
            .all(|r| r.lower_total <= r.mean_total && r.mean_total <= r.upper_total)
    }

    /// Totals of the final step, `None` for an empty forecast.
    pub fn headline(&self) -> Option<Headline> {
        self.rows.last().map(|r| Headline {
            lower_total: r.lower_total,
            mean_total: r.mean_total,
            upper_total: r.upper_total,
        })
    }
}

/// Turn per-step increments into running totals from `last_observed`.
///
/// Bands are never clamped; steps whose increments are out of order are
/// logged.
pub fn reconstruct(intervals: &[ForecastInterval], last_observed: f64) -> CumulativeForecast {
    let mut lower_total = last_observed;
    let mut mean_total = last_observed;
    let mut upper_total = last_observed;

    let rows: Vec<CumulativeInterval> = intervals
        .iter()
        .map(|iv| {
            if !iv.is_ordered() {
                log::warn!(
                    "forecast step {} is out of order: lower={} mean={} upper={}",
                    iv.step,
                    iv.lower,
                    iv.mean,
                    iv.upper
                );
            }
            lower_total += iv.lower;
            mean_total += iv.mean;
            upper_total += iv.upper;
            CumulativeInterval {
                step: iv.step,
                lower: iv.lower,
                mean: iv.mean,
                upper: iv.upper,
                lower_total,
                mean_total,
                upper_total,
            }
        })
        .collect();

    CumulativeForecast {
        rows,
        last_observed,
    }
}
