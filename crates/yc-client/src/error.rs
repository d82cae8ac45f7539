//! Yandex Cloud client errors

use thiserror::Error;

/// Errors that can occur when fetching inventory from Yandex Cloud
#[derive(Debug, Error)]
pub enum CloudError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error status
    #[error("Yandex Cloud API error: {0}")]
    Api(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
