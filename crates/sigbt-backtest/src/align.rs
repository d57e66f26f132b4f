use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use sigbt_md::Candle;
use sigbt_strategy::Signal;
use tracing::warn;

use crate::types::PricePoint;

/// Signals and prices joined on timestamp, ready for [`crate::simulate`].
#[derive(Clone, Debug, PartialEq)]
pub struct Aligned {
    pub signals: Vec<Signal>,
    pub prices: Vec<PricePoint>,
    pub dropped_signals: usize,
    pub dropped_candles: usize,
}

impl Aligned {
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Inner join on timestamp.
///
/// Only timestamps present in both inputs survive; unmatched rows on either
/// side are dropped and counted, never an error. Output follows signal order.
pub fn align(signals: &[Signal], candles: &[Candle]) -> Aligned {
    let closes: BTreeMap<DateTime<Utc>, f64> =
        candles.iter().map(|c| (c.timestamp, c.close)).collect();

    let mut out_signals = Vec::with_capacity(signals.len());
    let mut prices = Vec::with_capacity(signals.len());
    let mut matched: BTreeSet<DateTime<Utc>> = BTreeSet::new();

    for s in signals {
        if let Some(&close) = closes.get(&s.timestamp) {
            out_signals.push(*s);
            prices.push(PricePoint::new(s.timestamp, close));
            matched.insert(s.timestamp);
        }
    }

    let dropped_signals = signals.len() - out_signals.len();
    let dropped_candles = candles
        .iter()
        .filter(|c| !matched.contains(&c.timestamp))
        .count();

    if dropped_signals > 0 {
        warn!(dropped_signals, "signals without a matching candle were dropped");
    }
    if dropped_candles > 0 {
        warn!(dropped_candles, "candles without a matching signal were dropped");
    }

    Aligned {
        signals: out_signals,
        prices,
        dropped_signals,
        dropped_candles,
    }
}
