//! sigbt-md
//!
//! Market-data boundary for the signal backtester.
//!
//! This crate owns the candle type, the flat-file (CSV) persistence of candle
//! series, the data-quality report, and the paged historical provider.
//! It does **not** simulate anything; callers hand candles to `sigbt-backtest`.

pub mod candle_csv;
pub mod provider;
pub mod quality;

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub use candle_csv::{read_candles_csv, parse_candles_csv, write_candles_csv};
pub use provider::{
    candle_file_name, fetch_all, BinanceKlinesProvider, FetchRequest, HistoricalProvider,
};
pub use quality::{build_quality_report, QualityReport};

/// Candle interval identifiers, Binance kline style.
///
/// Parsing is case-insensitive so strategy metadata written as `1H` resolves
/// to the same interval as `1h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
}

impl Interval {
    /// Canonical (Binance) interval string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H2 => "2h",
            Interval::H4 => "4h",
            Interval::H6 => "6h",
            Interval::H12 => "12h",
            Interval::D1 => "1d",
        }
    }

    /// Expected bar-to-bar step in seconds.
    pub fn step_secs(&self) -> i64 {
        match self {
            Interval::M1 => 60,
            Interval::M5 => 300,
            Interval::M15 => 900,
            Interval::M30 => 1_800,
            Interval::H1 => 3_600,
            Interval::H2 => 7_200,
            Interval::H4 => 14_400,
            Interval::H6 => 21_600,
            Interval::H12 => 43_200,
            Interval::D1 => 86_400,
        }
    }

    pub fn parse(s: &str) -> Result<Self, MdError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Interval::M1),
            "5m" => Ok(Interval::M5),
            "15m" => Ok(Interval::M15),
            "30m" => Ok(Interval::M30),
            "1h" => Ok(Interval::H1),
            "2h" => Ok(Interval::H2),
            "4h" => Ok(Interval::H4),
            "6h" => Ok(Interval::H6),
            "12h" => Ok(Interval::H12),
            "1d" => Ok(Interval::D1),
            _ => Err(MdError::UnknownInterval(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One OHLCV observation for a fixed time bucket.
///
/// `timestamp` is the bucket open time (UTC). The simulator only reads `close`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Market-data errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MdError {
    /// File could not be opened/read/written.
    Io { path: String, message: String },
    /// A CSV row could not be decoded.
    BadRow { line: u64, reason: String },
    /// A timestamp string matched none of the accepted formats.
    BadTimestamp(String),
    /// Two candles share a timestamp.
    DuplicateTimestamp(DateTime<Utc>),
    /// Interval string not recognised.
    UnknownInterval(String),
}

impl fmt::Display for MdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MdError::Io { path, message } => write!(f, "io error on {path}: {message}"),
            MdError::BadRow { line, reason } => write!(f, "bad csv row at line {line}: {reason}"),
            MdError::BadTimestamp(v) => write!(f, "unparseable timestamp: {v}"),
            MdError::DuplicateTimestamp(ts) => {
                write!(f, "duplicate candle timestamp: {}", ts.to_rfc3339())
            }
            MdError::UnknownInterval(v) => write!(
                f,
                "invalid interval '{v}'. expected one of: 1m | 5m | 15m | 30m | 1h | 2h | 4h | 6h | 12h | 1d"
            ),
        }
    }
}

impl std::error::Error for MdError {}

/// Parse a timestamp as written by common exporters.
///
/// Accepted: RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, or integer epoch
/// milliseconds. Naive forms are interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, MdError> {
    let t = raw.trim();

    if let Ok(ms) = t.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| MdError::BadTimestamp(t.to_string()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        if let Some(ndt) = d.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }
    Err(MdError::BadTimestamp(t.to_string()))
}
