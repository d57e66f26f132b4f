use sigbt_strategy::{is_valid_position_size, Action, Signal};
use tracing::{debug, warn};

use crate::error::{BacktestError, InvalidInput};
use crate::types::{CapitalSample, PricePoint, SimulationConfig, SimulationState, SizingMode};

/// One transition of the flat/long state machine.
///
/// Pure: reads only the previous settled state, the current signal and the
/// current price. Mismatched signals (BUY while long, SELL while flat) and
/// HOLD carry the previous state forward unchanged. A BUY at a price that is
/// not finite and positive is also carried forward.
pub fn step(
    prev: &SimulationState,
    signal: &Signal,
    price: f64,
    config: &SimulationConfig,
) -> SimulationState {
    let fee = config.fee();
    match signal.action {
        Action::Buy if !prev.in_position && is_tradable_price(price) => {
            let investable = prev.cash * (1.0 - fee);
            let shares = investable / price;
            let (size, cash) = match config.sizing() {
                SizingMode::Full => (1.0, 0.0),
                SizingMode::Fractional => {
                    let size = signal.position_size;
                    (size, investable * (1.0 - size))
                }
            };
            SimulationState {
                cash,
                holdings_units: shares * size,
                in_position: true,
            }
        }
        Action::Sell if prev.in_position => {
            let proceeds = prev.holdings_units * price * (1.0 - fee);
            SimulationState {
                cash: prev.cash + proceeds,
                holdings_units: 0.0,
                in_position: false,
            }
        }
        _ => *prev,
    }
}

fn is_tradable_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Replay `signals` against `prices` and produce one capital sample per row.
///
/// Both sequences must already be aligned 1:1 by timestamp (see
/// [`crate::align`]). All validation happens before the first step.
///
/// Row 0 only seeds the state: its signal is never executed and its capital
/// is `initial_capital`.
pub fn simulate(
    signals: &[Signal],
    prices: &[PricePoint],
    config: &SimulationConfig,
) -> Result<Vec<CapitalSample>, BacktestError> {
    config.validate()?;
    validate_series(signals, prices)?;

    let mut state = SimulationState::initial(config.initial_capital());
    let mut out = Vec::with_capacity(signals.len());
    out.push(CapitalSample {
        timestamp: prices[0].timestamp,
        action: signals[0].action,
        close: prices[0].close,
        cash: state.cash,
        holdings_units: state.holdings_units,
        capital: config.initial_capital(),
    });

    for (signal, point) in signals.iter().zip(prices).skip(1) {
        let price = point.close;

        if signal.action == Action::Buy && !state.in_position && !is_tradable_price(price) {
            warn!(
                ts = %point.timestamp,
                price,
                "BUY skipped: price is not positive and finite"
            );
        }

        let next = step(&state, signal, price, config);
        if next.in_position != state.in_position {
            debug!(
                ts = %point.timestamp,
                action = %signal.action,
                price,
                cash = next.cash,
                holdings_units = next.holdings_units,
                "executed"
            );
        }
        state = next;

        out.push(CapitalSample {
            timestamp: point.timestamp,
            action: signal.action,
            close: price,
            cash: state.cash,
            holdings_units: state.holdings_units,
            capital: state.capital_at(price),
        });
    }

    Ok(out)
}

fn validate_series(signals: &[Signal], prices: &[PricePoint]) -> Result<(), InvalidInput> {
    if signals.len() != prices.len() {
        return Err(InvalidInput::LengthMismatch {
            signals: signals.len(),
            prices: prices.len(),
        });
    }
    if signals.is_empty() {
        return Err(InvalidInput::EmptySeries);
    }

    for (index, (s, p)) in signals.iter().zip(prices).enumerate() {
        if s.timestamp != p.timestamp {
            return Err(InvalidInput::TimestampMismatch {
                index,
                signal: s.timestamp,
                price: p.timestamp,
            });
        }
        if !is_valid_position_size(s.position_size) {
            return Err(InvalidInput::InvalidPositionSize {
                index,
                value: s.position_size,
            });
        }
        if index > 0 && p.timestamp < prices[index - 1].timestamp {
            return Err(InvalidInput::NonMonotonicTimestamp {
                index,
                timestamp: p.timestamp,
                prev: prices[index - 1].timestamp,
            });
        }
    }
    Ok(())
}
