//! Error types for UCS Manager operations.
//!
//! This module defines the error types used throughout the ucsm crates.
//! All errors implement `std::error::Error` via `thiserror`.

use thiserror::Error;

/// Result type alias for UCS Manager operations.
pub type UcsmResult<T> = Result<T, UcsmError>;

/// Errors that can occur while talking to UCS Manager or reconciling state.
#[derive(Debug, Error)]
pub enum UcsmError {
    /// HTTP transport failed (connect, TLS, timeout).
    #[error("Transport error talking to {uri}: {source}")]
    Transport {
        /// The endpoint that was being called.
        uri: String,
        /// The underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP {status} from {uri}")]
    HttpStatus {
        /// The endpoint that was being called.
        uri: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The XML API rejected the request.
    #[error("{method} failed: [ErrorCode]: {code}[ErrorDescription]: {description}")]
    Api {
        /// The XML API method (e.g., "aaaLogin", "configConfMos").
        method: String,
        /// The UCSM error code.
        code: String,
        /// The UCSM error description.
        description: String,
    },

    /// A response or request document could not be processed.
    #[error("XML error: {message}")]
    Xml {
        /// Error message.
        message: String,
    },

    /// An operation needing a session cookie ran before login.
    #[error("Not logged in to {hostname}")]
    NotLoggedIn {
        /// The UCSM host.
        hostname: String,
    },

    /// Declaration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl UcsmError {
    /// Creates an API error.
    pub fn api(
        method: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::Api {
            method: method.into(),
            code: code.into(),
            description: description.into(),
        }
    }

    /// Creates an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml {
            message: message.into(),
        }
    }

    /// Creates a not-logged-in error.
    pub fn not_logged_in(hostname: impl Into<String>) -> Self {
        Self::NotLoggedIn {
            hostname: hostname.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            UcsmError::Transport { .. } => true,
            UcsmError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
