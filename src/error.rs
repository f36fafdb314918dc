//! # Error Types
//!
//! Custom error types for Gamepad Mapper using `thiserror`.

use thiserror::Error;

/// Main error type for Gamepad Mapper
#[derive(Debug, Error)]
pub enum MapperError {
    /// A step operation was invoked after the mapping finished.
    ///
    /// This is a caller bug: the poll loop checks `is_done()` first.
    #[error("Cannot access after mapping is done")]
    InvalidState,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Controller access errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No gamepad found during auto-detection
    #[error("No gamepad found")]
    ControllerNotFound,

    /// Malformed export handed to the code generator
    #[error("Codegen error: {0}")]
    Codegen(String),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Gamepad Mapper
pub type Result<T> = std::result::Result<T, MapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = MapperError::InvalidState;
        assert_eq!(err.to_string(), "Cannot access after mapping is done");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MapperError = io.into();
        assert!(matches!(err, MapperError::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }
}
