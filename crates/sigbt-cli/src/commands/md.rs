//! Market-data command handlers: `sigbt md fetch` and `sigbt md quality`.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use sigbt_md::{
    build_quality_report, candle_file_name, fetch_all, parse_timestamp, write_candles_csv,
    BinanceKlinesProvider, FetchRequest, Interval,
};
use tracing::info;

use super::{load_settings, read_candles};

/// Env override for the Binance REST endpoint.
const ENV_BINANCE_BASE_URL: &str = "SIGBT_BINANCE_BASE_URL";

#[derive(Args)]
pub struct FetchArgs {
    /// Comma-separated symbols (default: config target + anchors)
    #[arg(long)]
    symbols: Option<String>,

    /// Kline interval, e.g. 1h, 4h (default: config /data/interval)
    #[arg(long)]
    interval: Option<String>,

    /// Inclusive start (YYYY-MM-DD, RFC 3339 or epoch ms)
    #[arg(long)]
    start: String,

    /// Exclusive end (YYYY-MM-DD, RFC 3339 or epoch ms)
    #[arg(long)]
    end: String,

    /// Output directory (default: config /data/dir)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Pause between pages, milliseconds
    #[arg(long, default_value_t = 200)]
    pacing_ms: u64,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    config_paths: Vec<String>,
}

pub async fn md_fetch(args: FetchArgs) -> Result<()> {
    let (_, settings) = load_settings(&args.config_paths, false)?;

    let symbols: Vec<String> = match &args.symbols {
        Some(s) => s
            .split(',')
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect(),
        None => std::iter::once(settings.target.clone())
            .chain(settings.anchors.iter().cloned())
            .collect(),
    };
    if symbols.is_empty() {
        bail!("--symbols must contain at least one symbol");
    }

    let interval = match &args.interval {
        Some(s) => Interval::parse(s)?,
        None => settings.interval,
    };
    let start = parse_timestamp(&args.start).context("invalid --start")?;
    let end = parse_timestamp(&args.end).context("invalid --end")?;
    if end <= start {
        bail!("--end must be after --start");
    }
    let out_dir = args.out_dir.unwrap_or(settings.data_dir);

    let provider = match std::env::var(ENV_BINANCE_BASE_URL) {
        Ok(url) => BinanceKlinesProvider::new_with_base_url(url),
        Err(_) => BinanceKlinesProvider::new(),
    }
    .with_pacing(Duration::from_millis(args.pacing_ms));

    let requests: Vec<(String, FetchRequest)> = symbols
        .iter()
        .map(|symbol| {
            (
                symbol.clone(),
                FetchRequest {
                    symbol: symbol.clone(),
                    interval,
                    start,
                    end,
                },
            )
        })
        .collect();

    let series = fetch_all(&provider, &requests).await?;

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("create data dir failed: {}", out_dir.display()))?;
    for (symbol, candles) in &series {
        let path = out_dir.join(candle_file_name(symbol, interval));
        write_candles_csv(&path, candles)?;
        info!(%symbol, rows = candles.len(), path = %path.display(), "saved");
        println!("saved symbol={} rows={} path={}", symbol, candles.len(), path.display());
    }

    Ok(())
}

#[derive(Args)]
pub struct QualityArgs {
    /// Candle CSV to inspect
    #[arg(long)]
    candles: PathBuf,

    /// Expected bar interval, e.g. 1h
    #[arg(long)]
    interval: String,

    /// Also write the full report as JSON
    #[arg(long)]
    out: Option<PathBuf>,

    /// Exit non-zero when any issue is found
    #[arg(long, default_value_t = false)]
    strict: bool,
}

pub fn md_quality(args: QualityArgs) -> Result<()> {
    let interval = Interval::parse(&args.interval)?;
    let candles = read_candles(&args.candles)?;
    let report = build_quality_report(&candles, interval);

    println!("total_candles={}", report.total_candles);
    println!("duplicates={}", report.duplicates.len());
    println!("monotonicity_violations={}", report.monotonicity_violations.len());
    println!("gaps={}", report.gaps.len());
    println!("ohlc_violations={}", report.ohlc_violations.len());
    println!("clean={}", report.is_clean());

    if let Some(out) = &args.out {
        let json = serde_json::to_string_pretty(&report).context("serialize report json failed")?;
        fs::write(out, format!("{json}\n"))
            .with_context(|| format!("write report failed: {}", out.display()))?;
        println!("report_path={}", out.display());
    }

    if args.strict && !report.is_clean() {
        bail!("data quality check failed:\n{report}");
    }
    Ok(())
}
