//! Seasonality detection utilities.
//!
//! Detects the presence and period of seasonality from local maxima of the
//! autocorrelation function.

use crate::utils::stats::autocorrelation;

/// Result of seasonality detection.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalityResult {
    /// The detected seasonal period (if any).
    pub period: Option<usize>,
    /// Autocorrelation at the detected period, clamped to [0, 1].
    pub strength: f64,
    /// Candidate periods and their autocorrelation, best first.
    pub candidates: Vec<(usize, f64)>,
}

impl SeasonalityResult {
    fn none() -> Self {
        Self {
            period: None,
            strength: 0.0,
            candidates: Vec::new(),
        }
    }
}

/// Configuration for seasonality detection.
#[derive(Debug, Clone)]
pub struct SeasonalityConfig {
    /// Maximum period to consider.
    pub max_period: usize,
    /// Minimum period to consider.
    pub min_period: usize,
    /// Minimum autocorrelation for a candidate (0.0 to 1.0).
    pub threshold: f64,
    /// Difference the series once before computing autocorrelations, so a
    /// strong trend does not mask the seasonal peaks.
    pub detrend: bool,
}

impl Default for SeasonalityConfig {
    fn default() -> Self {
        Self {
            max_period: 168,
            min_period: 2,
            threshold: 0.3,
            detrend: true,
        }
    }
}

/// Detect seasonality in a series using autocorrelation peaks.
///
/// Only lags up to half the (possibly differenced) series length are
/// considered, so a detected period always has two full cycles of data.
pub fn detect_seasonality(series: &[f64], config: &SeasonalityConfig) -> SeasonalityResult {
    let owned;
    let values: &[f64] = if config.detrend {
        owned = series.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();
        &owned
    } else {
        series
    };

    let n = values.len();
    let min_lag = config.min_period.max(2);
    let max_lag = config.max_period.min(n / 2);
    // Need lag neighbours on both sides to find a local maximum.
    if max_lag < min_lag + 1 {
        return SeasonalityResult::none();
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let spread = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    if spread < 1e-10 {
        return SeasonalityResult::none();
    }

    let acf: Vec<(usize, f64)> = (min_lag - 1..=max_lag + 1)
        .filter(|&lag| lag < n)
        .map(|lag| (lag, autocorrelation(values, lag)))
        .collect();

    let mut candidates: Vec<(usize, f64)> = acf
        .windows(3)
        .filter_map(|w| {
            let (lag, r) = w[1];
            (lag <= max_lag && r > w[0].1 && r > w[2].1 && r > config.threshold).then_some((lag, r))
        })
        .collect();

    // Highest autocorrelation first; shorter lag wins ties.
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    match candidates.first() {
        Some(&(period, r)) => SeasonalityResult {
            period: Some(period),
            strength: r.clamp(0.0, 1.0),
            candidates,
        },
        None => SeasonalityResult::none(),
    }
}
