//! Error types for relmirror-client.

use thiserror::Error;

/// All errors that can arise from a registry request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, TLS, timeout, reset...).
    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The registry answered with a status the operation does not accept.
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body does not match the documented schema.
    #[error("invalid response from {url}: {message}")]
    Decode { url: String, message: String },

    /// A base URL or path could not be turned into a request URL.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The shared HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// HTTP status carried by the error, if the registry answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
