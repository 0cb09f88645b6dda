//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for service-call dispatch.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller asked for something the action table does not allow.
    #[error("validation error: {0}")]
    Validation(String),

    /// The call's cancellation token fired.
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// The call's deadline passed.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Parameters or envelope could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The underlying connection failed to write.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// An earlier write was abandoned partway; the wire state is unknown.
    #[error("connection poisoned by an interrupted write")]
    ConnectionPoisoned,

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable code, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "INVALID_ARGUMENT",
            Error::Cancelled(_) => "CANCELLED",
            Error::Timeout(_) => "DEADLINE_EXCEEDED",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Transport(_) => "UNAVAILABLE",
            Error::ConnectionPoisoned => "FAILED_PRECONDITION",
            Error::Config(_) => "CONFIG",
        }
    }

    /// True when the call stopped because its context ended.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled(_) | Error::Timeout(_))
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let cases = vec![
            (Error::validation("x"), "INVALID_ARGUMENT"),
            (Error::cancelled("x"), "CANCELLED"),
            (Error::timeout("x"), "DEADLINE_EXCEEDED"),
            (
                Error::Transport(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "x")),
                "UNAVAILABLE",
            ),
            (Error::ConnectionPoisoned, "FAILED_PRECONDITION"),
            (Error::config("x"), "CONFIG"),
        ];

        for (err, code) in cases {
            assert_eq!(err.code(), code, "code for {:?}", err);
        }
    }

    #[test]
    fn test_is_cancellation() {
        assert!(Error::cancelled("x").is_cancellation());
        assert!(Error::timeout("x").is_cancellation());
        assert!(!Error::validation("x").is_cancellation());
        assert!(!Error::ConnectionPoisoned.is_cancellation());
    }

    #[test]
    fn test_serde_error_converts() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().starts_with("serialization error"));
    }
}
