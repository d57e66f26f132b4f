use std::fmt;

use chrono::{DateTime, Utc};

/// Malformed configuration or misaligned input. Always raised before the
/// first simulation step; the fold itself never fails.
#[derive(Clone, Debug, PartialEq)]
pub enum InvalidInput {
    /// fee must lie in `[0, 1)`.
    FeeOutOfRange { fee: f64 },
    /// initial capital must be finite and > 0.
    NonPositiveCapital { initial_capital: f64 },
    /// Signal and price sequences differ in length.
    LengthMismatch { signals: usize, prices: usize },
    /// Nothing to simulate or evaluate.
    EmptySeries,
    /// Signal and price at the same index carry different timestamps.
    TimestampMismatch {
        index: usize,
        signal: DateTime<Utc>,
        price: DateTime<Utc>,
    },
    /// Timestamp earlier than its predecessor.
    NonMonotonicTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
        prev: DateTime<Utc>,
    },
    /// position_size outside `(0, 1]`.
    InvalidPositionSize { index: usize, value: f64 },
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidInput::FeeOutOfRange { fee } => write!(f, "fee {fee} outside [0, 1)"),
            InvalidInput::NonPositiveCapital { initial_capital } => {
                write!(f, "initial capital {initial_capital} must be > 0")
            }
            InvalidInput::LengthMismatch { signals, prices } => write!(
                f,
                "signal/price length mismatch: {signals} signals vs {prices} prices"
            ),
            InvalidInput::EmptySeries => write!(f, "empty series"),
            InvalidInput::TimestampMismatch {
                index,
                signal,
                price,
            } => write!(
                f,
                "misaligned row {index}: signal @ {} vs price @ {}",
                signal.to_rfc3339(),
                price.to_rfc3339()
            ),
            InvalidInput::NonMonotonicTimestamp {
                index,
                timestamp,
                prev,
            } => write!(
                f,
                "timestamp at row {index} ({}) precedes row {} ({})",
                timestamp.to_rfc3339(),
                index.saturating_sub(1),
                prev.to_rfc3339()
            ),
            InvalidInput::InvalidPositionSize { index, value } => {
                write!(f, "row {index}: position_size {value} outside (0, 1]")
            }
        }
    }
}

/// Backtest error variants.
#[derive(Clone, Debug, PartialEq)]
pub enum BacktestError {
    InvalidInput(InvalidInput),
}

impl fmt::Display for BacktestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacktestError::InvalidInput(e) => write!(f, "invalid input: {e}"),
        }
    }
}

impl std::error::Error for BacktestError {}

impl From<InvalidInput> for BacktestError {
    fn from(e: InvalidInput) -> Self {
        BacktestError::InvalidInput(e)
    }
}
