//! Error types for media processing and download operations
//!
//! Every strategy in a cascade reports failure through [`MediaError`]. The
//! cascade runner is the only place that turns these errors into the
//! "no result" signal returned by the public operations.

use thiserror::Error;

/// Result type alias for media operations
pub type Result<T> = std::result::Result<T, MediaError>;

/// Failure classes a cascade stage can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeout, connection failure or non-success HTTP status
    Network,
    /// Successful response with a missing or malformed field
    ProviderContract,
    /// Input or provider bytes are not a readable image
    Decode,
    /// Unsupported URL, or pattern/identifier extraction found nothing
    NoMatch,
    /// The local segmentation model could not be loaded
    ResourceUnavailable,
    /// Invalid configuration value
    Config,
    /// Everything else (I/O, task join failures, encoder errors)
    Internal,
}

/// Error types for media cascade operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// Timeout, connection refused or non-success HTTP status
    #[error("Network failure: {0}")]
    Network(String),

    /// Missing or malformed field in an otherwise successful response
    #[error("Provider contract violation: {0}")]
    ProviderContract(String),

    /// Bytes that should hold an image could not be decoded
    #[error("Decode failure: {0}")]
    Decode(String),

    /// URL unsupported or extraction found nothing
    #[error("No match: {0}")]
    NoMatch(String),

    /// Local model failed to load
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input/output errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a network failure with the stage that produced it
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create a provider contract violation
    pub fn contract<S: Into<String>>(msg: S) -> Self {
        Self::ProviderContract(msg.into())
    }

    /// Create a decode failure
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a no-match error
    pub fn no_match<S: Into<String>>(msg: S) -> Self {
        Self::NoMatch(msg.into())
    }

    /// Create a resource-unavailable error
    pub fn resource_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ResourceUnavailable(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Convert a `reqwest` error into a network failure with request context
    pub fn from_reqwest(context: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Network(format!("{context}: request timed out"))
        } else if error.is_decode() {
            Self::ProviderContract(format!("{context}: {error}"))
        } else {
            Self::Network(format!("{context}: {error}"))
        }
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {operation} '{path_display}': {error}"),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {rec}"),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {parameter}: {value} (valid range: {valid_range}).{recommendation}"
        ))
    }

    /// Taxonomy bucket of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::ProviderContract(_) => ErrorKind::ProviderContract,
            Self::Decode(_) => ErrorKind::Decode,
            Self::NoMatch(_) => ErrorKind::NoMatch,
            Self::ResourceUnavailable(_) => ErrorKind::ResourceUnavailable,
            Self::InvalidConfig(_) => ErrorKind::Config,
            Self::Io(_) | Self::Image(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<tokio::task::JoinError> for MediaError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Blocking task failed: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = MediaError::invalid_config("test config error");
        assert!(matches!(err, MediaError::InvalidConfig(_)));

        let err = MediaError::no_match("not a pin url");
        assert_eq!(err.kind(), ErrorKind::NoMatch);
    }

    #[test]
    fn test_error_display() {
        let err = MediaError::contract("missing result_url");
        assert_eq!(
            err.to_string(),
            "Provider contract violation: missing result_url"
        );
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(MediaError::network("x").kind(), ErrorKind::Network);
        assert_eq!(MediaError::decode("x").kind(), ErrorKind::Decode);
        assert_eq!(
            MediaError::resource_unavailable("x").kind(),
            ErrorKind::ResourceUnavailable
        );
        assert_eq!(MediaError::internal("x").kind(), ErrorKind::Internal);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(MediaError::from(io).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_enhanced_error_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = MediaError::file_io_error("write model file", Path::new("/models/u2net.onnx"), &io_error);
        let error_string = err.to_string();
        assert!(error_string.contains("write model file"));
        assert!(error_string.contains("/models/u2net.onnx"));

        let err = MediaError::config_value_error("white threshold", 300, "0-254", Some(240));
        let error_string = err.to_string();
        assert!(error_string.contains("white threshold"));
        assert!(error_string.contains("300"));
        assert!(error_string.contains("Recommended: 240"));
    }
}
