//! Error types for the smartbed engine.

use thiserror::Error;

/// Errors raised by the stateless analytics functions.
///
/// These are never fatal: the caller should treat them as "not yet
/// computable" and retry once more data has accumulated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    #[error("insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },
}

impl AnalyticsError {
    pub(crate) fn require(required: usize, actual: usize) -> Result<(), Self> {
        if actual < required {
            Err(AnalyticsError::InsufficientData { required, actual })
        } else {
            Ok(())
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A threshold or parameter is outside its sane range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(AnalyticsError::require(2, 2).is_ok());
        assert_eq!(
            AnalyticsError::require(2, 1),
            Err(AnalyticsError::InsufficientData {
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_display() {
        let err = AnalyticsError::InsufficientData {
            required: 5,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 5 samples, got 3"
        );
        let err = ConfigError::Invalid("exit_threshold above enter_threshold".into());
        assert!(err.to_string().contains("exit_threshold"));
    }
}
