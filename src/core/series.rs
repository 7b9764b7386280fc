//! Observed and differenced series, and the preparer that builds them.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// A raw datapoint as delivered by a metrics source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    /// Unit label reported by the source; discarded during preparation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Datapoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Build a datapoint from an RFC 3339 timestamp string.
    pub fn parse(timestamp: &str, value: f64) -> Result<Self> {
        let parsed = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| ForecastError::TimestampError(format!("{timestamp:?}: {e}")))?;
        Ok(Self::new(parsed.with_timezone(&Utc), value))
    }
}

/// A single timestamped value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Observations sorted by strictly increasing timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl ObservedSeries {
    /// Create a series from parallel vectors.
    ///
    /// Timestamps must be strictly increasing and values finite.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::ComputationError(format!(
                "{} timestamps for {} values",
                timestamps.len(),
                values.len()
            )));
        }
        for w in timestamps.windows(2) {
            if w[1] <= w[0] {
                return Err(ForecastError::TimestampError(format!(
                    "timestamps must be strictly increasing ({} follows {})",
                    w[1], w[0]
                )));
            }
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        Ok(Self { timestamps, values })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Observation at `index`.
    pub fn get(&self, index: usize) -> Option<Observation> {
        Some(Observation {
            timestamp: *self.timestamps.get(index)?,
            value: *self.values.get(index)?,
        })
    }

    /// Most recent observation.
    pub fn last(&self) -> Option<Observation> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// First-order differences, each stamped with the later timestamp.
    pub fn difference(&self) -> DifferencedSeries {
        let values = self.values.windows(2).map(|w| w[1] - w[0]).collect();
        let timestamps = self.timestamps.iter().skip(1).copied().collect();
        DifferencedSeries { timestamps, values }
    }

    /// Infer the sampling interval from the modal timestamp spacing.
    ///
    /// `tolerance` is the minimum share of gaps that must equal the mode.
    pub fn infer_frequency(&self, tolerance: f64) -> Result<Duration> {
        if self.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in self.timestamps.windows(2) {
            *counts.entry((w[1] - w[0]).num_seconds()).or_insert(0) += 1;
        }

        // Ties resolve to the shorter spacing so the result is deterministic.
        let (modal_diff, modal_count) = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(&diff, &count)| (diff, count))
            .ok_or_else(|| ForecastError::TimestampError("empty spacing data".to_string()))?;

        let total: usize = counts.values().sum();
        if (modal_count as f64 / total as f64) < tolerance {
            return Err(ForecastError::TimestampError(
                "no unique modal spacing found".to_string(),
            ));
        }

        Ok(Duration::seconds(modal_diff))
    }
}

/// First differences of an [`ObservedSeries`].
///
/// Has one entry fewer than its source: the undefined leading difference
/// is dropped rather than stored.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferencedSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl DifferencedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Output of [`prepare`]: the sorted series and its first difference.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSeries {
    pub observed: ObservedSeries,
    pub differenced: DifferencedSeries,
}

impl PreparedSeries {
    /// Most recent absolute value, the anchor for cumulative reconstruction.
    pub fn last_value(&self) -> Option<f64> {
        self.observed.last().map(|o| o.value)
    }
}

/// Normalize raw datapoints into a sorted series plus its first difference.
///
/// Input may be unordered. Duplicate timestamps and non-finite values are
/// rejected, and at least two points are required so that the differenced
/// series is non-empty.
pub fn prepare(datapoints: &[Datapoint]) -> Result<PreparedSeries> {
    if datapoints.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            got: datapoints.len(),
        });
    }

    let mut sorted: Vec<(DateTime<Utc>, f64)> = datapoints
        .iter()
        .map(|d| (d.timestamp, d.value))
        .collect();
    sorted.sort_by_key(|&(ts, _)| ts);

    if let Some(w) = sorted.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(ForecastError::TimestampError(format!(
            "duplicate timestamp {}",
            w[0].0
        )));
    }

    let (timestamps, values): (Vec<_>, Vec<_>) = sorted.into_iter().unzip();
    let observed = ObservedSeries::new(timestamps, values)?;
    let differenced = observed.difference();

    log::debug!(
        "prepared {} observations ({} differences)",
        observed.len(),
        differenced.len()
    );

    Ok(PreparedSeries {
        observed,
        differenced,
    })
}
