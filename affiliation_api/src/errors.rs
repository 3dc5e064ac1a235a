//! Error types for the API client.

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, DNS failure, or unreadable response).
    #[error("Request failed")]
    RequestFailed,
    /// The request did not complete within the client deadline.
    #[error("Request timed out")]
    Timeout,
    /// The API returned a non-success status.
    ///
    /// `message` and `code` are lifted from a structured `{message, code}`
    /// error body when the backend sends one.
    #[error("Request failed with status {status}")]
    HttpStatus {
        status: u16,
        reason: Option<String>,
        message: Option<String>,
        code: Option<i64>,
        body: String,
    },
    /// The response body could not be decoded into the expected shape.
    #[error("Failed to parse response: {0}")]
    ParseFailed(String),
}

impl Error {
    /// Returns the HTTP status code when the backend answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a `401 Unauthorized` answer.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
