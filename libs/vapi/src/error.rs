//! Error types for vAPI requests.

use thiserror::Error;

/// Errors returned by any REST call.
///
/// Transport, HTTP and decode failures share one channel; callers that care
/// about the class can match on the variant, nothing in this crate retries.
#[derive(Debug, Error)]
pub enum Error {
    /// The service could not be reached or the exchange was interrupted.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Http {
        status: u16,
        error_type: Option<String>,
        message: String,
    },

    /// A body did not match the expected JSON shape.
    #[error("failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The base URL or a resource path could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The session token cannot be carried in an HTTP header.
    #[error("invalid session id: {0}")]
    InvalidSession(#[from] reqwest::header::InvalidHeaderValue),
}

impl Error {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true for a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
