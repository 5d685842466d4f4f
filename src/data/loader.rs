//! Candle loading from CSV files
//!
//! Headers are matched loosely: case, surrounding whitespace and the
//! separators ` `, `_`, `-` are ignored, and a few short aliases are
//! accepted (`o`, `h`, `l`, `c`, `v`, `vol`).

use super::types::Candle;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord, Writer};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Naive timestamp formats tried after RFC 3339
const NAIVE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Errors while loading candles from CSV
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing time column (time/timestamp/date)")]
    MissingTimeColumn,

    #[error("Missing required OHLC columns")]
    MissingOhlcColumns,

    #[error("CSV has no candle rows")]
    NoRows,

    #[error("Row {row}: {reason}")]
    InvalidRow { row: u64, reason: String },
}

/// Column indices resolved from the header row
#[derive(Debug, Default, Clone, Copy)]
struct Columns {
    open_time: Option<usize>,
    close_time: Option<usize>,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    volume: Option<usize>,
}

/// OHLC indices once all four are known to be present
struct Resolved {
    open_time: usize,
    close_time: Option<usize>,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Resolved, LoadError> {
        let mut cols = Columns::default();

        for (idx, raw) in header.iter().enumerate() {
            let slot = match normalize_header(raw).as_str() {
                "time" | "timestamp" | "datetime" | "date" | "opentime" | "openat" => {
                    &mut cols.open_time
                }
                "closetime" | "closetimestamp" => &mut cols.close_time,
                "open" | "o" => &mut cols.open,
                "high" | "h" => &mut cols.high,
                "low" | "l" => &mut cols.low,
                "close" | "c" => &mut cols.close,
                "volume" | "vol" | "v" => &mut cols.volume,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(idx);
            }
        }

        let open_time = cols.open_time.ok_or(LoadError::MissingTimeColumn)?;
        match (cols.open, cols.high, cols.low, cols.close) {
            (Some(open), Some(high), Some(low), Some(close)) => Ok(Resolved {
                open_time,
                close_time: cols.close_time,
                open,
                high,
                low,
                close,
                volume: cols.volume,
            }),
            _ => Err(LoadError::MissingOhlcColumns),
        }
    }
}

/// Data loader for CSV files
pub struct DataLoader;

impl DataLoader {
    /// Load candles sorted by open time.
    ///
    /// A positive `limit` keeps only the most recent `limit` candles;
    /// zero keeps all of them.
    pub fn load_candles<P: AsRef<Path>>(path: P, limit: usize) -> Result<Vec<Candle>, LoadError> {
        let file = File::open(&path).map_err(|source| LoadError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let columns = Columns::from_header(reader.headers()?)?;

        let mut candles = Vec::new();
        for result in reader.records() {
            let record = result?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let row = record.position().map(|p| p.line()).unwrap_or(0);
            let candle = parse_candle(&record, &columns)
                .map_err(|reason| LoadError::InvalidRow { row, reason })?;
            candles.push(candle);
        }

        if candles.is_empty() {
            return Err(LoadError::NoRows);
        }

        candles.sort_by_key(|c| c.open_time);

        if limit > 0 && candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }

        debug!("Loaded {} candles from {:?}", candles.len(), path.as_ref());
        Ok(candles)
    }

    /// Save candles to a CSV file readable by [`DataLoader::load_candles`]
    pub fn save_candles<P: AsRef<Path>>(candles: &[Candle], path: P) -> Result<(), LoadError> {
        let file = File::create(&path).map_err(|source| LoadError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;

        let mut writer = Writer::from_writer(file);
        for candle in candles {
            writer.serialize(candle)?;
        }
        writer.flush().map_err(|source| LoadError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

fn parse_candle(record: &StringRecord, cols: &Resolved) -> Result<Candle, String> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let open_time = parse_time(field(cols.open_time)).map_err(|e| format!("parse time: {}", e))?;
    let close_time = match cols.close_time {
        Some(idx) => parse_time(field(idx)).map_err(|e| format!("parse close time: {}", e))?,
        None => open_time,
    };

    let number = |idx: usize, name: &str| {
        parse_float(field(idx)).map_err(|e| format!("parse {}: {}", name, e))
    };

    let volume = match cols.volume {
        Some(idx) if !field(idx).trim().is_empty() => number(idx, "volume")?,
        _ => 0.0,
    };

    Ok(Candle {
        open_time,
        close_time,
        open: number(cols.open, "open")?,
        high: number(cols.high, "high")?,
        low: number(cols.low, "low")?,
        close: number(cols.close, "close")?,
        volume,
    })
}

fn normalize_header(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parse unix millis, unix seconds, RFC 3339 or a naive UTC timestamp/date
fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty time value".to_string());
    }

    if let Ok(n) = value.parse::<i64>() {
        if n > 1_000_000_000_000 {
            if let Some(ts) = Utc.timestamp_millis_opt(n).single() {
                return Ok(ts);
            }
        } else if n > 1_000_000_000 {
            if let Some(ts) = Utc.timestamp_opt(n, 0).single() {
                return Ok(ts);
            }
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in NAIVE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(format!("unsupported time format {:?}", value))
}

fn parse_float(value: &str) -> Result<f64, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty numeric value".to_string());
    }
    value
        .parse::<f64>()
        .map_err(|e| format!("parse float {:?}: {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_with_limit_keeps_latest() {
        let file = write_csv(
            "Date,Open,High,Low,Close,Volume\n\
             2026-01-03,3,4,2,3.5,30\n\
             2026-01-01,1,2,0.5,1.5,10\n\
             2026-01-02,2,3,1.5,2.5,20\n",
        );

        let candles = DataLoader::load_candles(file.path(), 2).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 2.5);
        assert_eq!(candles[1].close, 3.5);
        assert_eq!(
            candles[0].open_time,
            Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap()
        );
        // No close time column
        assert_eq!(candles[0].close_time, candles[0].open_time);

        let all = DataLoader::load_candles(file.path(), 0).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_unix_millis_and_aliases() {
        let file = write_csv(
            "open_time, o, h, l, c, vol, Close Time\n\
             1735689600000,1,2,0.5,1.5,,1735693199999\n",
        );

        let candles = DataLoader::load_candles(file.path(), 0).unwrap();
        assert_eq!(
            candles[0].open_time,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(candles[0].close_time.timestamp_millis(), 1735693199999);
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn test_time_formats() {
        let want = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(parse_time("1772600767").unwrap(), want);
        assert_eq!(parse_time("2026-03-04T05:06:07Z").unwrap(), want);
        assert_eq!(parse_time("2026-03-04 05:06:07").unwrap(), want);
        assert_eq!(parse_time("2026-03-04T05:06:07").unwrap(), want);
        assert!(parse_time("yesterday").is_err());
        assert!(parse_time("").is_err());
    }

    #[test]
    fn test_missing_columns() {
        let no_close = write_csv("time,open,high,low,volume\n2026-01-01,1,2,0.5,10\n");
        assert!(matches!(
            DataLoader::load_candles(no_close.path(), 0),
            Err(LoadError::MissingOhlcColumns)
        ));

        let no_time = write_csv("open,high,low,close\n1,2,0.5,1.5\n");
        assert!(matches!(
            DataLoader::load_candles(no_time.path(), 0),
            Err(LoadError::MissingTimeColumn)
        ));
    }

    #[test]
    fn test_no_rows_and_bad_row() {
        let empty = write_csv("time,open,high,low,close\n,,,,\n");
        assert!(matches!(
            DataLoader::load_candles(empty.path(), 0),
            Err(LoadError::NoRows)
        ));

        let bad = write_csv("time,open,high,low,close\n2026-01-01,1,2,0.5,1.5\n2026-01-02,x,2,0.5,1.5\n");
        match DataLoader::load_candles(bad.path(), 0) {
            Err(LoadError::InvalidRow { row, reason }) => {
                assert_eq!(row, 3);
                assert!(reason.contains("open"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_save_and_load_candles() {
        let base = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let candles: Vec<Candle> = (0..3)
            .map(|i| Candle {
                open_time: base + chrono::Duration::hours(i),
                close_time: base + chrono::Duration::hours(i + 1),
                open: 100.0 + i as f64,
                high: 102.0 + i as f64,
                low: 99.0 + i as f64,
                close: 101.5 + i as f64,
                volume: 10.25 * (i + 1) as f64,
            })
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candles.csv");
        DataLoader::save_candles(&candles, &path).unwrap();

        let loaded = DataLoader::load_candles(&path, 0).unwrap();
        assert_eq!(loaded, candles);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            DataLoader::load_candles("/nonexistent/candles.csv", 0),
            Err(LoadError::Io { .. })
        ));
    }
}
