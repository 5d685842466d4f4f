//! Binance REST API client for fetching kline data

mod binance;
mod error;

pub use binance::{parse_klines, BinanceClient, DEFAULT_BASE_URL, MAX_KLINE_LIMIT};
pub use error::{ApiError, ApiResult};
