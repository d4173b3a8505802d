//! Extraction error types.

use thiserror::Error;

/// Vision extraction errors.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The HTTP call failed.
    #[error("vision request failed: {0}")]
    Request(String),

    /// The endpoint answered with an error status.
    #[error("vision endpoint returned {status}: {body}")]
    Status {
        /// HTTP status.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The model answered without content.
    #[error("vision response had no content")]
    EmptyResponse,

    /// The content was not the expected JSON.
    #[error("could not parse extraction: {0}")]
    InvalidPayload(String),
}

impl ExtractionError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        502
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) | Self::Status { .. } => "EXTRACTION_UNAVAILABLE",
            Self::EmptyResponse | Self::InvalidPayload(_) => "EXTRACTION_INVALID",
        }
    }
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}
