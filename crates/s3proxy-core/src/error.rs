//! Error types for the proxy core.
//!
//! [`FetchError`] is the failure half of a gateway fetch. Every variant resolves
//! to an HTTP status through [`FetchError::status_code`], so the handler can turn
//! any storage failure into a response without further inspection.

use http::StatusCode;

/// A failed object fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The backend answered with a structured failure carrying an HTTP status
    /// (missing key, access denied, throttling, ...).
    #[error("{message}")]
    Backend {
        /// Status code reported by the backend.
        status: u16,
        /// Backend error text.
        message: String,
    },

    /// The backend could not be reached or produced no status (connect
    /// failure, timeout, request construction failure).
    #[error("{0}")]
    Transport(String),
}

impl FetchError {
    /// Create a backend failure.
    #[must_use]
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// Create a transport failure.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// HTTP status to answer the client with.
    ///
    /// Backend statuses pass through unchanged unless they are not valid HTTP
    /// status codes, in which case they become `500 Internal Server Error` like
    /// transport failures.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Backend { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable failure text.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Backend { message, .. } | Self::Transport(message) => message,
        }
    }
}

/// Invalid startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `APP_PORT` is not a TCP port number.
    #[error("invalid listen port: {0:?}")]
    InvalidPort(String),
}
