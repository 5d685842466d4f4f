//! Binance spot kline client.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::error::{ApiError, ApiResult};
use crate::data::types::Candle;

/// Binance public REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Largest page the klines endpoint serves.
pub const MAX_KLINE_LIMIT: usize = 1000;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ERROR_BODY: usize = 1024;

/// Binance API client for fetching market data.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    /// Create a client.
    ///
    /// A missing or blank base URL falls back to [`DEFAULT_BASE_URL`] and a
    /// zero timeout to 15 seconds.
    pub fn new(base_url: Option<&str>, timeout: Duration) -> ApiResult<Self> {
        let base_url = match base_url.map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => DEFAULT_BASE_URL.to_string(),
        };
        let timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch kline (candlestick) data, oldest first.
    ///
    /// # Arguments
    /// * `symbol` - Trading pair (e.g., "BTCUSDT")
    /// * `interval` - Kline interval (e.g., "1h")
    /// * `limit` - Number of candles to fetch (1..=1000)
    pub async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> ApiResult<Vec<Candle>> {
        if symbol.is_empty() {
            return Err(ApiError::InvalidParameter("symbol is required".to_string()));
        }
        if interval.is_empty() {
            return Err(ApiError::InvalidParameter("interval is required".to_string()));
        }
        if limit == 0 || limit > MAX_KLINE_LIMIT {
            return Err(ApiError::InvalidParameter(format!(
                "limit must be in range 1..{}, got {}",
                MAX_KLINE_LIMIT, limit
            )));
        }

        let url = format!("{}/api/v3/klines", self.base_url);
        let limit_param = limit.to_string();
        debug!("Fetching klines: {} {} {} x{}", url, symbol, interval, limit);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let bytes = response.bytes().await?;
            let body = String::from_utf8_lossy(&bytes[..bytes.len().min(MAX_ERROR_BODY)]);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.into_owned(),
            });
        }

        let raw: Vec<Vec<Value>> = response.json().await?;
        let candles = parse_klines(raw)?;

        info!("Fetched {} candles for {} {}", candles.len(), symbol, interval);
        Ok(candles)
    }
}

/// Convert raw kline rows into candles.
///
/// Each row is `[open_time_ms, open, high, low, close, volume, close_time_ms, ...]`;
/// numeric fields may be JSON numbers or numeric strings.
pub fn parse_klines(raw: Vec<Vec<Value>>) -> ApiResult<Vec<Candle>> {
    raw.iter()
        .enumerate()
        .map(|(index, row)| parse_row(row).map_err(|reason| ApiError::InvalidRow { index, reason }))
        .collect()
}

fn parse_row(row: &[Value]) -> Result<Candle, String> {
    if row.len() < 7 {
        return Err(format!("expected at least 7 fields, got {}", row.len()));
    }

    Ok(Candle {
        open_time: millis_field(&row[0], "open time")?,
        open: float_field(&row[1], "open")?,
        high: float_field(&row[2], "high")?,
        low: float_field(&row[3], "low")?,
        close: float_field(&row[4], "close")?,
        volume: float_field(&row[5], "volume")?,
        close_time: millis_field(&row[6], "close time")?,
    })
}

fn float_field(value: &Value, name: &str) -> Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("{}: number {} is not representable", name, n)),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| format!("{}: parse {:?}: {}", name, s, e)),
        other => Err(format!("{}: unsupported value {}", name, other)),
    }
}

fn millis_field(value: &Value, name: &str) -> Result<DateTime<Utc>, String> {
    let millis = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| format!("{}: number {} is not an integer", name, n))?,
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|e| format!("{}: parse {:?}: {}", name, s, e))?,
        other => return Err(format!("{}: unsupported value {}", name, other)),
    };

    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| format!("{}: timestamp {} out of range", name, millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_klines_mixed_types() {
        let raw: Vec<Vec<Value>> = serde_json::from_value(json!([
            [1735689600000_i64, "100.5", "101.0", "99.5", "100.8", "12.3", 1735693199999_i64, "0", 10],
            [1735693200000_i64, 100.8, 102.0, 100.1, 101.7, 8.0, "1735696799999"]
        ]))
        .unwrap();

        let candles = parse_klines(raw).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(
            candles[0].open_time,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(candles[0].close, 100.8);
        assert_eq!(candles[1].high, 102.0);
        assert_eq!(candles[1].close_time.timestamp_millis(), 1735696799999);
    }

    #[test]
    fn test_parse_klines_rejects_short_row() {
        let raw = vec![vec![json!(1), json!("1.0")]];
        assert!(matches!(
            parse_klines(raw),
            Err(ApiError::InvalidRow { index: 0, .. })
        ));
    }

    #[test]
    fn test_parse_klines_rejects_bad_number() {
        let row: Vec<Value> = vec![
            json!(1735689600000_i64),
            json!("abc"),
            json!("1"),
            json!("1"),
            json!("1"),
            json!("1"),
            json!(1735693199999_i64),
        ];
        match parse_klines(vec![row]) {
            Err(ApiError::InvalidRow { reason, .. }) => assert!(reason.starts_with("open")),
            other => panic!("unexpected result: {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_client_defaults() {
        let client = BinanceClient::new(None, Duration::ZERO).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);

        let custom = BinanceClient::new(Some("http://localhost:9000/"), Duration::from_secs(1)).unwrap();
        assert_eq!(custom.base_url(), "http://localhost:9000");
    }

    #[tokio::test]
    async fn test_fetch_validates_parameters() {
        let client = BinanceClient::new(None, Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.fetch_klines("", "1h", 10).await,
            Err(ApiError::InvalidParameter(_))
        ));
        assert!(matches!(
            client.fetch_klines("BTCUSDT", "1h", 0).await,
            Err(ApiError::InvalidParameter(_))
        ));
        assert!(matches!(
            client.fetch_klines("BTCUSDT", "1h", 1001).await,
            Err(ApiError::InvalidParameter(_))
        ));
    }
}
