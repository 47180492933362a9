//! Error types for the transmutation simulator.
//!
//! Only failures that stop a request are represented here. Gaps in the
//! nuclear data (missing daughters, unparseable half-lives, absent cross
//! sections) degrade to zero rates or skipped edges and never surface.

use thiserror::Error;

/// Main error type for simulator operations.
#[derive(Error, Debug)]
pub enum SimulatorError {
    /// Seed element symbol is not in the data store
    #[error("Element with symbol '{0}' not found")]
    ElementNotFound(String),

    /// Seed isotope is not in the data store
    #[error("Isotope {0} not found")]
    IsotopeNotFound(String),

    /// Request rejected before the simulation starts
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// No nuclear data file could be located
    #[error("Nuclear data unavailable: {0}")]
    DataUnavailable(String),

    /// File system errors
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Time evolution table assembly
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Result type alias for simulator operations.
pub type Result<T> = std::result::Result<T, SimulatorError>;

impl SimulatorError {
    /// Creates a new invalid parameters error.
    #[must_use]
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameters(msg.into())
    }

    /// True for failures caused by a seed that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound(_) | Self::IsotopeNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimulatorError::ElementNotFound("Xx".to_string());
        assert_eq!(err.to_string(), "Element with symbol 'Xx' not found");
    }

    #[test]
    fn test_invalid_parameters() {
        let err = SimulatorError::invalid("time_step must be >= 0.001");
        assert!(err.to_string().contains("time_step"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SimulatorError = json_err.into();
        assert!(matches!(err, SimulatorError::Json(_)));
    }
}
