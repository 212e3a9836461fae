use thiserror::Error;

/// Main error type for MeLiF searches
#[derive(Error, Debug)]
pub enum MelifError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Evaluation failed at point {point}: {message}")]
    Evaluation { point: String, message: String },

    #[error("Run interrupted: {0}")]
    Interrupted(String),

    #[error("Worker panicked: {0}")]
    WorkerPanic(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MelifError {
    /// Whether this error came from a cooperative cancellation rather than a
    /// bad configuration or a failing evaluator.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, MelifError::Interrupted(_))
    }
}

/// Configuration errors, rejected before any work is scheduled
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Starting point {index} has {actual} coordinates, but {expected} measures are configured")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid step size: delta must be finite and positive, got {delta}")]
    InvalidDelta { delta: f64 },

    #[error("At least one relevance measure is required")]
    NoMeasures,

    #[error("Worker count must be positive")]
    NoWorkers,

    #[error("At least one starting point is required")]
    NoStartingPoints,

    #[error("Stop budget must be positive")]
    EmptyBudget,

    #[error("Degenerate weight vector {coordinates:?}: {message}")]
    DegenerateWeights {
        coordinates: Vec<f64>,
        message: String,
    },

    #[error("Invalid grid resolution {resolution}: must be at least 1")]
    InvalidGrid { resolution: usize },

    #[error("Invalid arm selection policy: {message}")]
    InvalidPolicy { message: String },

    #[error("Relevance row for feature {feature} has {actual} scores, expected {expected}")]
    RelevanceShape {
        feature: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid cutting rule: {message}")]
    InvalidCuttingRule { message: String },
}

/// Result type alias for MeLiF operations
pub type MelifResult<T> = Result<T, MelifError>;

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::MelifError::Internal(format!($($arg)*))
    };
}

/// Macro for creating evaluation errors at a given point
#[macro_export]
macro_rules! evaluation_error {
    ($point:expr, $($arg:tt)*) => {
        $crate::MelifError::Evaluation {
            point: $point.to_string(),
            message: format!($($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;

    #[test]
    fn test_error_display() {
        let error = ConfigError::DimensionMismatch {
            index: 2,
            expected: 4,
            actual: 3,
        };

        assert!(error.to_string().contains("Starting point 2"));
        assert!(error.to_string().contains("4 measures"));
    }

    #[test]
    fn test_error_conversion() {
        let config_error = ConfigError::NoWorkers;
        let melif_error: MelifError = config_error.into();

        match melif_error {
            MelifError::Config(ConfigError::NoWorkers) => (),
            _ => panic!("Expected Config error"),
        }
        assert!(!MelifError::Internal("x".into()).is_interrupted());
        assert!(MelifError::Interrupted("cancelled".into()).is_interrupted());
    }

    #[test]
    fn test_macros() {
        let point = Point::uniform(2).unwrap();
        let err = evaluation_error!(point, "classifier failed on fold {}", 3);
        assert!(err.to_string().contains("[0.500, 0.500]"));
        assert!(err.to_string().contains("fold 3"));

        let internal = internal_error!("Something went wrong");
        assert!(matches!(internal, MelifError::Internal(_)));
    }
}
