//! Client error types.
//!
//! Provides unified error handling with actionable context for debugging.
//! Non-ok API envelopes are usually returned to the caller as data; only the
//! cases listed here are raised.

use thiserror::Error;

/// Client result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Client error types with specific context for actionable debugging
#[derive(Debug, Error)]
pub enum Error {
    /// Network error (connection, timeout, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// `Elvanto` API error with status context
    #[error("Elvanto API error: {message}")]
    Api {
        /// Human-readable error description.
        message: String,
        /// Error code from the response envelope, if present.
        code: Option<i64>,
        /// HTTP status code, if from an HTTP response.
        status: Option<u16>,
        /// Actionable suggestion for resolving the error.
        hint: Option<&'static str>,
    },

    /// Token endpoint rejected an exchange or refresh
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// Configuration error with guidance
    #[error("Configuration error: {message}. {hint}")]
    Config {
        /// Description of the configuration problem.
        message: String,
        /// Actionable guidance for fixing the issue.
        hint: &'static str,
    },

    /// Response parsing error
    #[error("Parse error in {context:?}: {message}")]
    Parse {
        /// Endpoint or record that failed to parse, if known.
        context: Option<String>,
        /// Description of the parse failure.
        message: String,
    },

    /// Lookup by exact id found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Generic message error (escape hatch)
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an `Elvanto` error from a non-ok response envelope
    pub fn api(message: impl Into<String>, code: Option<i64>) -> Self {
        Self::Api {
            message: message.into(),
            code,
            status: None,
            hint: None,
        }
    }

    /// Create an `Elvanto` error with HTTP status
    pub fn api_status(message: impl Into<String>, status: u16) -> Self {
        let hint = match status {
            401 => Some("Check ELVANTO_API_KEY or ELVANTO_ACCESS_TOKEN environment variables"),
            403 => Some("Your API credentials may lack the required scope"),
            404 => Some("The requested endpoint was not found"),
            429 => Some("Rate limited - wait a moment and try again"),
            500..=599 => Some("Elvanto server error - try again later"),
            _ => None,
        };
        Self::Api {
            message: message.into(),
            code: None,
            status: Some(status),
            hint,
        }
    }

    /// Create a config error with actionable hint
    pub fn config(message: impl Into<String>, hint: &'static str) -> Self {
        Self::Config { message: message.into(), hint }
    }

    /// Create a parse error with endpoint or record context
    pub fn parse(message: impl Into<String>, context: impl Into<Option<String>>) -> Self {
        Self::Parse { context: context.into(), message: message.into() }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Msg(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Msg(s.to_string())
    }
}
