//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// No authenticated session.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Required input missing or unreadable.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Request body larger than the configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Storage provider rejected the operation.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::MalformedInput(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::Provider(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::MalformedInput(_) => "MALFORMED_INPUT",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Provider(_) => "PROVIDER_ERROR",
        }
    }

    /// Returns the message shown to API clients.
    ///
    /// Provider messages are written by the caller and are expected to be
    /// generic already.
    #[must_use]
    pub fn public_message(&self) -> &str {
        match self {
            Self::Unauthorized(msg)
            | Self::MalformedInput(msg)
            | Self::PayloadTooLarge(msg)
            | Self::Provider(msg) => msg,
        }
    }
}
