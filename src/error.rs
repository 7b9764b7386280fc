//! Error types for the spend-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur during forecasting operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Numerical fitting failed (non-finite objective, variance or forecast).
    #[error("fit diverged during {stage}: {reason}")]
    FitDivergence { stage: String, reason: String },

    /// Grid search produced no successful fit.
    #[error("grid search produced no usable model out of {attempted} candidates")]
    EmptySearchSpace { attempted: usize },

    /// Malformed or out-of-range configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Missing or non-finite values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Computation error (e.g., numerical issues outside a model fit).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl ForecastError {
    /// Shorthand for a [`ForecastError::FitDivergence`].
    pub fn divergence(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        ForecastError::FitDivergence {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is one of the failures a grid search expects to see
    /// for some candidates (short data, numerical non-convergence).
    pub fn is_expected_fit_failure(&self) -> bool {
        matches!(
            self,
            ForecastError::FitDivergence { .. } | ForecastError::InsufficientData { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = ForecastError::divergence("sarima fit", "residual variance is NaN");
        assert_eq!(
            err.to_string(),
            "fit diverged during sarima fit: residual variance is NaN"
        );

        let err = ForecastError::EmptySearchSpace { attempted: 4 };
        assert_eq!(
            err.to_string(),
            "grid search produced no usable model out of 4 candidates"
        );

        let err = ForecastError::InvalidConfiguration("forecast_length_days must be positive".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: forecast_length_days must be positive"
        );

        let err = ForecastError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");
    }

    #[test]
    fn expected_fit_failures_are_classified() {
        assert!(ForecastError::divergence("x", "y").is_expected_fit_failure());
        assert!(ForecastError::InsufficientData { needed: 3, got: 1 }.is_expected_fit_failure());
        assert!(!ForecastError::MissingValues.is_expected_fit_failure());
        assert!(!ForecastError::ComputationError("bug".into()).is_expected_fit_failure());
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::MissingValues;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
