//! Error types for the apikit request executor.
//!
//! # Design
//! Only `ConfigurationError` ever reaches the caller as an `Err`. It signals a
//! contract violation in the request description and is raised before any
//! network I/O. `TransportError` is what a transport hands back to the
//! executor; the executor always folds it into a `Response` with a sentinel
//! status code, so callers inspect `Response::is_success` instead.

use thiserror::Error;

/// A request description that cannot be sent as given.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// More than one body encoding was selected on the same request.
    #[error("conflicting encodings: {first} and {second} are mutually exclusive")]
    ConflictingEncoding {
        first: &'static str,
        second: &'static str,
    },

    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// A relative path was given but the client has no base URL to join it to.
    #[error("relative path {0:?} requires a base URL")]
    MissingBaseUrl(String),

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: String, value: String },

    /// The request parameters could not be encoded for the chosen encoding.
    #[error("failed to encode parameters: {0}")]
    Serialization(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// A failure reported by a transport before a usable response was obtained.
///
/// `kind` carries the name of the underlying library error class so the
/// response summary can say what actually went wrong.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, host unreachable, or name resolution failure.
    #[error("{kind}: {message}")]
    Unreachable { kind: String, message: String },

    /// Any other transport or HTTP protocol failure.
    #[error("{kind}: {message}")]
    Protocol { kind: String, message: String },

    /// Connect or read timeout.
    #[error("timed out: {message}")]
    Timeout { message: String },

    /// A response arrived but its body could not be read or decoded.
    #[error("failed to decode response (status {status}): {message}")]
    Decode {
        status: u16,
        text: String,
        message: String,
    },
}

impl TransportError {
    pub fn unreachable(kind: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Unreachable {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn protocol(kind: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Protocol {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        TransportError::Timeout {
            message: message.into(),
        }
    }

    pub fn decode(status: u16, text: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Decode {
            status,
            text: text.into(),
            message: message.into(),
        }
    }
}
