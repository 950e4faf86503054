//! Core error types for coursegrab-core.
//!
//! One failure taxonomy for every component: transport failures, non-2xx
//! server responses, malformed payloads, and rejected caller input. Fetch
//! failures are reported to the immediate caller as values; nothing in the
//! library panics on a bad response.

use thiserror::Error;

/// Core error type for coursegrab-core.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure, no usable response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response. The message is extracted from the JSON body when
    /// one is present, otherwise synthesized from the status code.
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// Response body missing expected fields, or persisted local state
    /// failing schema validation.
    #[error("malformed data: {0}")]
    DataFormat(String),

    /// Caller-supplied input rejected before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// Local IO failure (configuration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DataFormat(err.to_string())
    }
}

impl Error {
    /// Shorthand for a [`Error::Server`] synthesized from a bare status.
    pub(crate) fn from_status(status: u16) -> Self {
        Error::Server {
            status,
            message: format!("server returned status code {status}"),
        }
    }
}

/// Result type alias for [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
