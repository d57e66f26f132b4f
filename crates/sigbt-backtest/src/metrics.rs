use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, InvalidInput};
use crate::types::CapitalSample;

/// Summary metrics derived from a capital series.
///
/// `sharpe_ratio` is the raw per-bar `mean / stdev` of simple step returns:
/// not annualized, no risk-free rate. Callers needing annualization scale it
/// themselves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub final_capital: f64,
    pub final_return_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
}

impl Metrics {
    /// Presentation rounding: 2 dp for capital and percentages, 4 dp for the
    /// ratio (half away from zero).
    pub fn rounded(&self) -> Metrics {
        Metrics {
            final_capital: round_dp(self.final_capital, 2),
            final_return_pct: round_dp(self.final_return_pct, 2),
            sharpe_ratio: round_dp(self.sharpe_ratio, 4),
            max_drawdown_pct: round_dp(self.max_drawdown_pct, 2),
        }
    }
}

fn round_dp(x: f64, dp: i32) -> f64 {
    let scale = 10f64.powi(dp);
    (x * scale).round() / scale
}

/// Evaluate a simulator output. Initial capital is the first sample's capital.
pub fn evaluate(samples: &[CapitalSample]) -> Result<Metrics, BacktestError> {
    let first = samples.first().ok_or(InvalidInput::EmptySeries)?;
    let capital: Vec<f64> = samples.iter().map(|s| s.capital).collect();
    evaluate_capital(&capital, first.capital)
}

/// Evaluate an arbitrary capital series against `initial_capital`.
pub fn evaluate_capital(capital: &[f64], initial_capital: f64) -> Result<Metrics, BacktestError> {
    let last = *capital.last().ok_or(InvalidInput::EmptySeries)?;
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(InvalidInput::NonPositiveCapital { initial_capital }.into());
    }

    let returns = step_returns(capital);

    Ok(Metrics {
        final_capital: last,
        final_return_pct: (last - initial_capital) / initial_capital * 100.0,
        sharpe_ratio: sharpe_ratio(&returns),
        max_drawdown_pct: max_drawdown(capital) * 100.0,
    })
}

/// Simple per-step returns. `returns[0]` is 0 (no prior period); a step whose
/// previous capital is 0 also yields 0.
pub fn step_returns(capital: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(capital.len());
    if capital.is_empty() {
        return out;
    }
    out.push(0.0);
    for w in capital.windows(2) {
        let prev = w[0];
        out.push(if prev == 0.0 { 0.0 } else { (w[1] - prev) / prev });
    }
    out
}

/// mean / sample stdev (n - 1) over all returns including `returns[0]`.
/// 0 when fewer than two returns or zero dispersion.
fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();

    if std > 0.0 {
        mean / std
    } else {
        0.0
    }
}

/// Largest peak-to-trough decline as a fraction of the running peak.
fn max_drawdown(capital: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &c in capital {
        if c > peak {
            peak = c;
        }
        if peak > 0.0 {
            let dd = (peak - c) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}
