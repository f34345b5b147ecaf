//! Error types for the JSON client, the test harness and its configuration.
//!
//! # Design
//! Each failure mode gets its own variant so callers can match on the kind
//! of failure instead of inspecting messages. `RequestFailed` keeps the raw
//! status code and body text because non-200 bodies are diagnostics, not
//! structured results.

use std::path::PathBuf;

/// Errors returned by `JsonClient` and `Transport` implementations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or no response arrived.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a status other than 200.
    #[error("{status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// The server answered 200 but the body is not valid JSON.
    #[error("malformed response body: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl ClientError {
    /// Status code carried by a `RequestFailed` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while running a test case.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The observed status code differs from the expected one.
    #[error("expected status {expected}, got {actual}: {body}")]
    AssertionFailed {
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("service {0:?} is not configured")]
    UnknownService(String),
}

/// Errors raised while loading harness or suite configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {field}: {reason}")]
    Invalid { field: String, reason: String },
}
