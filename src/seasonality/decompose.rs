//! Classical additive decomposition.
//!
//! Splits a series into a centered-moving-average trend and zero-mean
//! seasonal indices, one per phase: `y = trend + indices[i % m] + remainder`.

/// Result of a classical decomposition.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Trend component; `NaN` where the centered window does not fit.
    pub trend: Vec<f64>,
    /// Zero-mean seasonal index per phase.
    pub indices: Vec<f64>,
}

impl Decomposition {
    /// Trend values with the undefined edges removed.
    pub fn trended(&self) -> Vec<f64> {
        self.trend.iter().copied().filter(|v| v.is_finite()).collect()
    }

    /// Seasonal period.
    pub fn period(&self) -> usize {
        self.indices.len()
    }
}

/// Decompose `series` with the given seasonal `period`.
///
/// Returns `None` when the period is below 2 or the series has fewer than
/// two full cycles.
pub fn decompose_additive(series: &[f64], period: usize) -> Option<Decomposition> {
    let n = series.len();
    if period < 2 || n < 2 * period {
        return None;
    }

    let trend = centered_moving_average(series, period);

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, (&y, &t)) in series.iter().zip(trend.iter()).enumerate() {
        if t.is_finite() {
            sums[i % period] += y - t;
            counts[i % period] += 1;
        }
    }
    if counts.iter().any(|&c| c == 0) {
        return None;
    }

    let mut indices: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(s, &c)| s / c as f64)
        .collect();
    let offset = indices.iter().sum::<f64>() / period as f64;
    indices.iter_mut().for_each(|s| *s -= offset);

    Some(Decomposition { trend, indices })
}

/// Centered moving average of width `period` (a 2×m average for even m).
fn centered_moving_average(series: &[f64], period: usize) -> Vec<f64> {
    let n = series.len();
    let half = period / 2;
    let mut trend = vec![f64::NAN; n];

    for i in half..n.saturating_sub(half) {
        trend[i] = if period % 2 == 1 {
            series[i - half..=i + half].iter().sum::<f64>() / period as f64
        } else {
            let inner: f64 = series[i + 1 - half..i + half].iter().sum();
            (0.5 * series[i - half] + inner + 0.5 * series[i + half]) / period as f64
        };
    }

    trend
}
