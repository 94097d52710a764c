//! Typed errors for lookups and delivery

use thiserror::Error;

/// Failure of a single outbound lookup
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("service reported an error: {0}")]
    Rejected(String),
}

/// Failure of a chat delivery call
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API rejected the call: {0}")]
    Api(String),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}
