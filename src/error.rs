// src/error.rs

//! Unified error handling for the job feed client.

use std::fmt;

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client-side validation failed before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend rejected a query or mutation
    #[error("Remote error [{code}]: {message}")]
    Remote { code: String, message: String },

    /// A unique constraint was violated (row already exists)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// No row matched
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a remote error from a backend code and message.
    pub fn remote(code: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.to_string(),
        }
    }

    /// Create an "already exists" error.
    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists(what.into())
    }

    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Whether the error is a duplicate outcome rather than a failure.
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// Human-readable text for a dismissable alert.
    ///
    /// Validation text is shown verbatim. Remote failures get a best-effort
    /// reason; transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::AlreadyExists(_) => "This has already been done".to_string(),
            Self::NotFound(_) => "The requested item could not be found".to_string(),
            Self::Unauthorized(_) => "You need to be signed in to do this".to_string(),
            Self::Remote { message, .. } if !message.is_empty() => message.clone(),
            Self::Http(_) => "Network error, please try again".to_string(),
            _ => "Something went wrong".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = AppError::validation("Title is required");
        assert_eq!(err.user_message(), "Title is required");
        assert!(!err.is_informational());
    }

    #[test]
    fn test_already_exists_is_informational() {
        let err = AppError::already_exists("application");
        assert!(err.is_informational());
        assert_ne!(err.user_message(), "Something went wrong");
    }

    #[test]
    fn test_remote_message_fallback() {
        assert_eq!(
            AppError::remote("42501", "permission denied").user_message(),
            "permission denied"
        );
        assert_eq!(AppError::remote("XX000", "").user_message(), "Something went wrong");
        assert_eq!(AppError::config("bad").user_message(), "Something went wrong");
    }
}
