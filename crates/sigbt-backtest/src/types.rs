use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sigbt_md::Candle;
use sigbt_strategy::Action;

use crate::error::{BacktestError, InvalidInput};
use crate::metrics::{step_returns, Metrics};

/// Fee per trade side (0.1%).
pub const DEFAULT_FEE: f64 = 0.001;

/// Starting cash.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000.0;

/// How `position_size` on a BUY is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingMode {
    /// Base contract: every entry deploys all cash; position_size is ignored.
    #[default]
    Full,
    /// Extension: an entry deploys `position_size` of the fee-adjusted cash
    /// and keeps the remainder as cash.
    Fractional,
}

impl SizingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizingMode::Full => "full",
            SizingMode::Fractional => "fractional",
        }
    }
}

/// Simulation parameters, validated at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    fee: f64,
    initial_capital: f64,
    sizing: SizingMode,
}

impl SimulationConfig {
    pub fn new(fee: f64, initial_capital: f64, sizing: SizingMode) -> Result<Self, BacktestError> {
        let cfg = Self {
            fee,
            initial_capital,
            sizing,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn sizing(&self) -> SizingMode {
        self.sizing
    }

    pub(crate) fn validate(&self) -> Result<(), BacktestError> {
        // NaN fails both comparisons
        if !(self.fee >= 0.0 && self.fee < 1.0) {
            return Err(InvalidInput::FeeOutOfRange { fee: self.fee }.into());
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(InvalidInput::NonPositiveCapital {
                initial_capital: self.initial_capital,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fee: DEFAULT_FEE,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            sizing: SizingMode::Full,
        }
    }
}

/// Settled simulator state after one step.
///
/// Under [`SizingMode::Full`] exactly one of `cash > 0` / `holdings_units > 0`
/// holds at every settled step (for non-zero capital).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationState {
    pub cash: f64,
    pub holdings_units: f64,
    pub in_position: bool,
}

impl SimulationState {
    pub fn initial(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            holdings_units: 0.0,
            in_position: false,
        }
    }

    /// Mark-to-market value at `price`.
    pub fn capital_at(&self, price: f64) -> f64 {
        self.cash + self.holdings_units * price
    }
}

/// Close price at one timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }
}

impl From<&Candle> for PricePoint {
    fn from(c: &Candle) -> Self {
        Self {
            timestamp: c.timestamp,
            close: c.close,
        }
    }
}

/// One point on the equity curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapitalSample {
    pub timestamp: DateTime<Utc>,
    /// Signal seen at this step (recorded even when it was a no-op).
    pub action: Action,
    pub close: f64,
    pub cash: f64,
    pub holdings_units: f64,
    /// `cash + holdings_units * close`
    pub capital: f64,
}

/// Result of a full align -> simulate -> evaluate run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BacktestReport {
    pub config_fee: f64,
    pub config_initial_capital: f64,
    pub sizing: SizingMode,
    /// Signals with no candle at their timestamp.
    pub dropped_signals: usize,
    /// Candles with no signal at their timestamp.
    pub dropped_candles: usize,
    pub samples: Vec<CapitalSample>,
    /// Full precision; see [`Metrics::rounded`] for reporting.
    pub metrics: Metrics,
}

impl BacktestReport {
    /// Per-step simple returns, `returns[0] == 0`.
    pub fn step_returns(&self) -> Vec<f64> {
        let capital: Vec<f64> = self.samples.iter().map(|s| s.capital).collect();
        step_returns(&capital)
    }

    /// Number of executed entries and exits.
    pub fn executed_trades(&self) -> usize {
        self.samples
            .windows(2)
            .filter(|w| (w[0].holdings_units > 0.0) != (w[1].holdings_units > 0.0))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.fee(), 0.001);
        assert_eq!(cfg.initial_capital(), 1_000.0);
        assert_eq!(cfg.sizing(), SizingMode::Full);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn construction_rejects_bad_values() {
        for fee in [-0.01, 1.0, f64::NAN] {
            assert!(matches!(
                SimulationConfig::new(fee, 1_000.0, SizingMode::Full),
                Err(BacktestError::InvalidInput(InvalidInput::FeeOutOfRange { .. }))
            ));
        }
        for cap in [0.0, -5.0, f64::INFINITY] {
            assert!(matches!(
                SimulationConfig::new(0.0, cap, SizingMode::Full),
                Err(BacktestError::InvalidInput(InvalidInput::NonPositiveCapital { .. }))
            ));
        }
        assert!(SimulationConfig::new(0.0, 1.0, SizingMode::Fractional).is_ok());
    }

    #[test]
    fn sizing_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SizingMode::Fractional).unwrap(), "\"fractional\"");
        let back: SizingMode = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(back, SizingMode::Full);
    }

    #[test]
    fn executed_trades_counts_position_flips() {
        let ts = chrono::TimeZone::with_ymd_and_hms(&Utc, 2025, 1, 1, 0, 0, 0).unwrap();
        let sample = |holdings_units: f64, capital: f64| CapitalSample {
            timestamp: ts,
            action: Action::Hold,
            close: 1.0,
            cash: capital - holdings_units,
            holdings_units,
            capital,
        };
        let report = BacktestReport {
            config_fee: 0.0,
            config_initial_capital: 100.0,
            sizing: SizingMode::Full,
            dropped_signals: 0,
            dropped_candles: 0,
            samples: vec![
                sample(0.0, 100.0),
                sample(100.0, 100.0),
                sample(100.0, 110.0),
                sample(0.0, 110.0),
            ],
            metrics: Metrics {
                final_capital: 110.0,
                final_return_pct: 10.0,
                sharpe_ratio: 0.0,
                max_drawdown_pct: 0.0,
            },
        };
        assert_eq!(report.executed_trades(), 2);
        assert_eq!(report.step_returns()[2], 0.1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sizing"], "full");
        assert_eq!(json["samples"].as_array().map(|a| a.len()), Some(4));
    }
}
