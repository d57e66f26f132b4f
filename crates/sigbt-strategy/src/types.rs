use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trading decision for one time step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }

    pub fn parse(s: &str) -> Result<Self, StrategyError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            "HOLD" => Ok(Action::Hold),
            other => Err(StrategyError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sizing used when a producer does not emit one.
pub const FULL_POSITION: f64 = 1.0;

/// A timestamped trading decision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    /// Fraction of available cash to deploy on entry, in `(0, 1]`.
    pub position_size: f64,
}

impl Signal {
    pub fn new(timestamp: DateTime<Utc>, action: Action) -> Self {
        Self {
            timestamp,
            action,
            position_size: FULL_POSITION,
        }
    }

    pub fn sized(timestamp: DateTime<Utc>, action: Action, position_size: f64) -> Self {
        Self {
            timestamp,
            action,
            position_size,
        }
    }

    pub fn hold(timestamp: DateTime<Utc>) -> Self {
        Self::new(timestamp, Action::Hold)
    }
}

/// `true` if `size` is a usable position size.
pub fn is_valid_position_size(size: f64) -> bool {
    size.is_finite() && size > 0.0 && size <= 1.0
}

/// One instrument a producer reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub symbol: String,
    pub timeframe: String,
}

impl AssetRef {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        }
    }
}

/// Which symbols/timeframes a producer needs. Configuration only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyMetadata {
    pub target: AssetRef,
    pub anchors: Vec<AssetRef>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StrategyError {
    /// Action string is not BUY/SELL/HOLD.
    UnknownAction(String),
    /// position_size outside `(0, 1]`.
    InvalidPositionSize { line: u64, value: f64 },
    /// Signal file row could not be decoded.
    BadRow { line: u64, reason: String },
    /// Signal file could not be opened/written.
    Io { path: String, message: String },
    /// A producer was handed no candles for an anchor it declared.
    MissingAnchor(String),
    /// No producer registered under this name.
    UnknownProducer(String),
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::UnknownAction(a) => {
                write!(f, "unknown action '{a}'. expected one of: BUY | SELL | HOLD")
            }
            StrategyError::InvalidPositionSize { line, value } => {
                write!(f, "line {line}: position_size {value} outside (0, 1]")
            }
            StrategyError::BadRow { line, reason } => write!(f, "line {line}: {reason}"),
            StrategyError::Io { path, message } => write!(f, "io error on {path}: {message}"),
            StrategyError::MissingAnchor(s) => write!(f, "missing candles for anchor {s}"),
            StrategyError::UnknownProducer(s) => write!(f, "unknown strategy '{s}'"),
        }
    }
}

impl std::error::Error for StrategyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parse_accepts_any_case() {
        assert_eq!(Action::parse("buy").unwrap(), Action::Buy);
        assert_eq!(Action::parse(" SELL ").unwrap(), Action::Sell);
        assert_eq!(Action::parse("Hold").unwrap(), Action::Hold);
        assert!(Action::parse("SHORT").is_err());
    }

    #[test]
    fn position_size_bounds() {
        assert!(is_valid_position_size(1.0));
        assert!(is_valid_position_size(0.25));
        assert!(!is_valid_position_size(0.0));
        assert!(!is_valid_position_size(1.5));
        assert!(!is_valid_position_size(f64::NAN));
    }
}
