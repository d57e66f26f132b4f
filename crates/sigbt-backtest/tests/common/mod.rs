#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sigbt_backtest::PricePoint;
use sigbt_md::Candle;
use sigbt_strategy::{Action, Signal};

pub fn t(i: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::hours(i)
}

pub fn candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle::new(t(i as i64), c, c, c, c, 1.0))
        .collect()
}

pub fn prices(closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::new(t(i as i64), c))
        .collect()
}

pub fn signals(actions: &[Action]) -> Vec<Signal> {
    actions
        .iter()
        .enumerate()
        .map(|(i, &a)| Signal::new(t(i as i64), a))
        .collect()
}

/// Deterministic pseudo-random action stream (LCG).
pub fn scrambled_actions(n: usize, seed: u64) -> Vec<Action> {
    let mut x = seed;
    (0..n)
        .map(|_| {
            x = x.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            match (x >> 33) % 3 {
                0 => Action::Buy,
                1 => Action::Sell,
                _ => Action::Hold,
            }
        })
        .collect()
}

/// Deterministic positive price walk.
pub fn walk(n: usize, seed: u64) -> Vec<f64> {
    let mut x = seed;
    let mut p = 100.0;
    (0..n)
        .map(|_| {
            x = x.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            let step = ((x >> 40) % 2001) as f64 / 1000.0 - 1.0; // [-1, 1]
            p *= 1.0 + 0.05 * step;
            p
        })
        .collect()
}

pub fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}
