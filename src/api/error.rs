//! API error types.

use thiserror::Error;

/// Binance API error types.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Binance returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid kline row at index {index}: {reason}")]
    InvalidRow { index: usize, reason: String },
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
