//! Error types for predecir
//!
//! A single crate-wide error enum with a `Result` alias. Optional features
//! (probability extraction, prediction logging) swallow their errors at the
//! call site; everything else propagates with `?`.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum PredecirError {
    /// I/O failure reading or writing a file
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the failure
        message: String,
    },

    /// Model artifact is malformed
    #[error("Format error: {reason}")]
    FormatError {
        /// What was wrong with the artifact
        reason: String,
    },

    /// A candidate location did not yield a model
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// User-supplied form input could not be parsed
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Which field failed and why
        reason: String,
    },

    /// Model invocation failed
    #[error("Inference error: {0}")]
    InferenceError(String),

    /// The model does not support the requested operation
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// Name of the unsupported operation
        operation: String,
    },

    /// Bad CLI argument or environment configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, PredecirError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = PredecirError::IoError {
            message: "file not found".to_string(),
        };
        assert!(err.to_string().contains("I/O error"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_format_error_display() {
        let err = PredecirError::FormatError {
            reason: "bad magic".to_string(),
        };
        assert!(err.to_string().contains("Format error"));
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_model_not_found_display() {
        let err = PredecirError::ModelNotFound("models:/demo/1".to_string());
        assert!(err.to_string().contains("Model not found"));
        assert!(err.to_string().contains("models:/demo/1"));
    }

    #[test]
    fn test_invalid_input_display() {
        let err = PredecirError::InvalidInput {
            reason: "f3 is not a number".to_string(),
        };
        assert!(err.to_string().contains("Invalid input"));
        assert!(err.to_string().contains("f3"));
    }

    #[test]
    fn test_unsupported_operation_display() {
        let err = PredecirError::UnsupportedOperation {
            operation: "predict_proba".to_string(),
        };
        assert!(err.to_string().contains("Unsupported operation"));
        assert!(err.to_string().contains("predict_proba"));
    }
}
