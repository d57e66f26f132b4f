//! sigbt-backtest
//!
//! Signal replay: (signal, price) pairs -> capital series -> metrics.
//!
//! Pipeline: ALIGN -> SIMULATE -> EVALUATE
//!
//! - Single pass, left to right, no look-ahead
//! - Flat/long state machine; one position at a time, no shorts, no leverage
//! - Fee charged once per executed side on the traded notional
//! - The first aligned signal is never executed
//! - Metrics are pure reductions over the immutable capital series
//! - Configuration is passed explicitly; nothing global

mod align;
mod error;
mod metrics;
mod runner;
mod simulator;
mod types;

pub use align::{align, Aligned};
pub use error::{BacktestError, InvalidInput};
pub use metrics::{evaluate, evaluate_capital, step_returns, Metrics};
pub use runner::run_backtest;
pub use simulator::{simulate, step};
pub use types::{
    BacktestReport, CapitalSample, PricePoint, SimulationConfig, SimulationState, SizingMode,
    DEFAULT_FEE, DEFAULT_INITIAL_CAPITAL,
};
