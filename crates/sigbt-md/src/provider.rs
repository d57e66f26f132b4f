//! Historical candle providers.
//!
//! The provider pages through an upstream OHLCV source and returns an ordered
//! candle sequence. Persistence to a flat file is the caller's job
//! (see [`crate::write_candles_csv`] and [`candle_file_name`]).

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::info;

use crate::{Candle, Interval};

/// Binance caps a klines page at 1000 rows.
const PAGE_LIMIT: u32 = 1_000;

/// Pause between pages unless overridden.
const DEFAULT_PACING: Duration = Duration::from_millis(200);

/// Fetch request for one (symbol, interval) series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub symbol: String,
    pub interval: Interval,
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end: candles opening at or after `end` are dropped.
    pub end: DateTime<Utc>,
}

/// Pluggable historical provider interface.
#[async_trait::async_trait]
pub trait HistoricalProvider: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Candles for `req`, sorted ascending, clipped to `[start, end)`.
    async fn fetch_candles(&self, req: &FetchRequest) -> Result<Vec<Candle>>;
}

/// Binance spot klines provider (public endpoint, no key).
#[derive(Debug, Clone)]
pub struct BinanceKlinesProvider {
    http: reqwest::Client,
    base_url: String,
    pacing: Duration,
}

impl Default for BinanceKlinesProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BinanceKlinesProvider {
    pub fn new() -> Self {
        Self::new_with_base_url("https://api.binance.com".to_string())
    }

    pub fn new_with_base_url(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            pacing: DEFAULT_PACING,
        }
    }

    /// Override the pause between pages (tests use zero).
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    fn klines_url(&self) -> String {
        format!("{}/api/v3/klines", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_page(
        &self,
        req: &FetchRequest,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Candle>> {
        let resp = self
            .http
            .get(self.klines_url())
            .query(&[
                ("symbol", req.symbol.to_ascii_uppercase()),
                ("interval", req.interval.as_str().to_string()),
                ("startTime", start_ms.to_string()),
                ("endTime", end_ms.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ])
            .send()
            .await
            .context("binance klines request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "failed to fetch klines: status={} body={}",
                status.as_u16(),
                body
            );
        }

        let rows: Vec<Vec<Value>> = resp
            .json()
            .await
            .context("binance klines json decode failed")?;

        rows.iter().map(|r| parse_kline(r)).collect()
    }
}

#[async_trait::async_trait]
impl HistoricalProvider for BinanceKlinesProvider {
    fn source_name(&self) -> &'static str {
        "binance"
    }

    async fn fetch_candles(&self, req: &FetchRequest) -> Result<Vec<Candle>> {
        let start_ms = req.start.timestamp_millis();
        let end_ms = req.end.timestamp_millis();

        info!(symbol = %req.symbol, interval = %req.interval, "starting download");

        let mut all: Vec<Candle> = Vec::new();
        let mut cursor = start_ms;

        while cursor < end_ms {
            let page = self.fetch_page(req, cursor, end_ms).await?;
            let (first, last) = match (page.first(), page.last()) {
                (Some(f), Some(l)) => (f.timestamp, l.timestamp),
                _ => {
                    info!(symbol = %req.symbol, "no more data returned");
                    break;
                }
            };

            info!(
                symbol = %req.symbol,
                rows = page.len(),
                from = %first,
                to = %last,
                "fetched page"
            );

            let next = last.timestamp_millis() + 1;
            all.extend(page);
            if next <= cursor {
                break;
            }
            cursor = next;

            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        if all.is_empty() {
            bail!(
                "no data returned for {} from {} to {}",
                req.symbol,
                req.start.to_rfc3339(),
                req.end.to_rfc3339()
            );
        }

        all.retain(|c| c.timestamp < req.end);
        all.sort_by_key(|c| c.timestamp);
        all.dedup_by_key(|c| c.timestamp);

        info!(symbol = %req.symbol, rows = all.len(), "finished download");
        Ok(all)
    }
}

/// Decode one kline row:
/// `[open_time_ms, "open", "high", "low", "close", "volume", close_time_ms, ...]`.
fn parse_kline(row: &[Value]) -> Result<Candle> {
    if row.len() < 6 {
        bail!("kline row has {} fields, expected at least 6", row.len());
    }

    let open_ms = row[0]
        .as_i64()
        .ok_or_else(|| anyhow!("kline open time is not an integer: {}", row[0]))?;
    let timestamp = Utc
        .timestamp_millis_opt(open_ms)
        .single()
        .ok_or_else(|| anyhow!("kline open time out of range: {open_ms}"))?;

    Ok(Candle {
        timestamp,
        open: decimal_field(&row[1], "open")?,
        high: decimal_field(&row[2], "high")?,
        low: decimal_field(&row[3], "low")?,
        close: decimal_field(&row[4], "close")?,
        volume: decimal_field(&row[5], "volume")?,
    })
}

/// Binance sends decimals as strings; accept bare numbers too.
fn decimal_field(v: &Value, name: &str) -> Result<f64> {
    match v {
        Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("kline {name} is not a decimal: {s}")),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| anyhow!("kline {name} out of range: {n}")),
        other => Err(anyhow!("kline {name} has unexpected type: {other}")),
    }
}

/// Canonical flat-file name for a fetched series, e.g. `LTCUSDT_4h.csv`.
pub fn candle_file_name(symbol: &str, interval: Interval) -> String {
    format!("{}_{}.csv", symbol.trim().to_ascii_uppercase(), interval.as_str())
}

/// Fetch several named series sequentially (one provider, shared pacing).
pub async fn fetch_all(
    provider: &dyn HistoricalProvider,
    requests: &[(String, FetchRequest)],
) -> Result<BTreeMap<String, Vec<Candle>>> {
    let mut out = BTreeMap::new();
    for (name, req) in requests {
        let candles = provider
            .fetch_candles(req)
            .await
            .with_context(|| format!("fetch failed for {name} ({})", req.symbol))?;
        info!(
            name = %name,
            symbol = %req.symbol,
            rows = candles.len(),
            source = provider.source_name(),
            "series retained"
        );
        out.insert(name.clone(), candles);
    }
    Ok(out)
}
