//! sigbt-strategy
//!
//! Signal boundary for the backtester.
//!
//! - Signals are timestamped BUY/SELL/HOLD decisions with optional sizing.
//! - A producer maps target candles plus anchor candles to a signal sequence;
//!   the simulator treats every producer as opaque.
//! - Metadata (which symbols/timeframes a producer needs) is configuration only.

mod anchor_lag;
mod producer;
mod signals_csv;
mod types;

pub use anchor_lag::AnchorLagStrategy;
pub use producer::{producer_by_name, SignalProducer};
pub use signals_csv::{parse_signals_csv, read_signals_csv, write_signals_csv};
pub use types::*;
