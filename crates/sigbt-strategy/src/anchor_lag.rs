//! Anchor-lag reference producer.
//!
//! Trades the target when the anchor moved sharply on the previous bar but the
//! target did not follow, provided the anchor's recent volatility is low.
//! Every entry is unwound a fixed number of bars later.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sigbt_md::Candle;
use tracing::debug;

use crate::producer::SignalProducer;
use crate::types::{Action, AssetRef, Signal, StrategyError, StrategyMetadata};

#[derive(Clone, Debug, PartialEq)]
pub struct AnchorLagStrategy {
    pub target: AssetRef,
    pub anchor: AssetRef,
    /// Anchor previous-bar return beyond which it counts as a pump/dump.
    pub anchor_move: f64,
    /// Target previous-bar return under which it counts as lagging.
    pub target_lag: f64,
    /// Upper bound for the anchor's rolling return stdev.
    pub max_anchor_volatility: f64,
    /// Rolling window (bars) for anchor volatility.
    pub volatility_window: usize,
    /// Bars between entry and the unwinding signal.
    pub hold_bars: u32,
}

impl Default for AnchorLagStrategy {
    fn default() -> Self {
        Self {
            target: AssetRef::new("LTC", "1H"),
            anchor: AssetRef::new("BTC", "1H"),
            anchor_move: 0.0075,
            target_lag: 0.001,
            max_anchor_volatility: 0.015,
            volatility_window: 6,
            hold_bars: 2,
        }
    }
}

struct Row {
    timestamp: DateTime<Utc>,
    target: f64,
    anchor: f64,
}

impl SignalProducer for AnchorLagStrategy {
    fn name(&self) -> &str {
        "anchor-lag"
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            target: self.target.clone(),
            anchors: vec![self.anchor.clone()],
        }
    }

    fn generate(
        &self,
        target: &[Candle],
        anchors: &BTreeMap<String, Vec<Candle>>,
    ) -> Result<Vec<Signal>, StrategyError> {
        let anchor = anchors
            .get(&self.anchor.symbol)
            .ok_or_else(|| StrategyError::MissingAnchor(self.anchor.symbol.clone()))?;

        let anchor_close: BTreeMap<DateTime<Utc>, f64> =
            anchor.iter().map(|c| (c.timestamp, c.close)).collect();
        let rows: Vec<Row> = target
            .iter()
            .filter_map(|c| {
                anchor_close.get(&c.timestamp).map(|&a| Row {
                    timestamp: c.timestamp,
                    target: c.close,
                    anchor: a,
                })
            })
            .collect();

        let anchor_ret = pct_change(rows.iter().map(|r| r.anchor));
        let target_ret = pct_change(rows.iter().map(|r| r.target));
        let anchor_vol = rolling_stdev(&anchor_ret, self.volatility_window);

        let mut out = Vec::with_capacity(rows.len());
        let mut holding: u32 = 0;
        let mut last_entry = Action::Hold;

        for (i, row) in rows.iter().enumerate() {
            // Decisions only see the previous bar's values.
            let prev = |series: &[Option<f64>]| i.checked_sub(1).and_then(|j| series[j]);
            let a_ret = prev(&anchor_ret);
            let t_ret = prev(&target_ret);
            let vol = prev(&anchor_vol);

            let mut action = Action::Hold;
            if holding > 0 {
                holding -= 1;
                if holding == 0 {
                    action = opposite(last_entry);
                    last_entry = Action::Hold;
                }
            } else if let (Some(a), Some(t), Some(v)) = (a_ret, t_ret, vol) {
                if v < self.max_anchor_volatility {
                    if a > self.anchor_move && t < self.target_lag {
                        action = Action::Buy;
                    } else if a < -self.anchor_move && t > -self.target_lag {
                        action = Action::Sell;
                    }
                    if action != Action::Hold {
                        last_entry = action;
                        holding = self.hold_bars;
                        debug!(ts = %row.timestamp, %action, anchor_ret = a, target_ret = t, "entry");
                    }
                }
            }

            out.push(Signal::new(row.timestamp, action));
        }

        Ok(out)
    }
}

fn opposite(a: Action) -> Action {
    match a {
        Action::Buy => Action::Sell,
        _ => Action::Buy,
    }
}

/// Simple returns; `None` for the first element and after a zero price.
fn pct_change(values: impl Iterator<Item = f64>) -> Vec<Option<f64>> {
    let mut out = Vec::new();
    let mut prev: Option<f64> = None;
    for v in values {
        out.push(match prev {
            Some(p) if p != 0.0 => Some((v - p) / p),
            _ => None,
        });
        prev = Some(v);
    }
    out
}

/// Sample stdev over the trailing `window` values ending at each index.
/// `None` until the window holds `window` defined values.
fn rolling_stdev(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window < 2 || i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let xs: Option<Vec<f64>> = slice.iter().copied().collect();
            xs.map(|xs| {
                let n = xs.len() as f64;
                let mean = xs.iter().sum::<f64>() / n;
                let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
                var.sqrt()
            })
        })
        .collect()
}
