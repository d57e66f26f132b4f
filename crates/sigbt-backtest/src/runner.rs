use sigbt_md::Candle;
use sigbt_strategy::Signal;
use tracing::info;

use crate::align::align;
use crate::error::BacktestError;
use crate::metrics::evaluate;
use crate::simulator::simulate;
use crate::types::{BacktestReport, SimulationConfig};

/// Align, simulate, evaluate.
///
/// Fails with `InvalidInput` when the configuration is invalid, when no
/// timestamps survive alignment, or when the aligned series is malformed.
pub fn run_backtest(
    signals: &[Signal],
    candles: &[Candle],
    config: &SimulationConfig,
) -> Result<BacktestReport, BacktestError> {
    let aligned = align(signals, candles);
    let samples = simulate(&aligned.signals, &aligned.prices, config)?;
    let metrics = evaluate(&samples)?;

    info!(
        rows = samples.len(),
        dropped_signals = aligned.dropped_signals,
        dropped_candles = aligned.dropped_candles,
        final_capital = metrics.final_capital,
        "backtest complete"
    );

    Ok(BacktestReport {
        config_fee: config.fee(),
        config_initial_capital: config.initial_capital(),
        sizing: config.sizing(),
        dropped_signals: aligned.dropped_signals,
        dropped_candles: aligned.dropped_candles,
        samples,
        metrics,
    })
}
