//! `sigbt backtest`: ALIGN -> SIMULATE -> EVALUATE, then export artifacts.
//!
//! Parameter precedence: command-line flag, then layered config, then the
//! built-in default.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use sigbt_artifacts::{write_run_artifacts, WriteRunArtifactsArgs};
use sigbt_backtest::{run_backtest, SimulationConfig, SizingMode};
use sigbt_strategy::{producer_by_name, read_signals_csv, Signal};
use tracing::info;
use uuid::Uuid;

use super::{load_anchor_candles, load_settings, read_candles};

#[derive(Args)]
pub struct BacktestArgs {
    /// Target candle CSV (default: <data dir>/<TARGET>_<interval>.csv from config)
    #[arg(long)]
    candles: Option<PathBuf>,

    /// Precomputed signal CSV
    #[arg(long, conflicts_with = "strategy")]
    signals: Option<PathBuf>,

    /// Generate signals in-process with this producer instead of reading a file
    #[arg(long)]
    strategy: Option<String>,

    /// Anchor candle CSV(s) for --strategy (default: config anchors)
    #[arg(long = "anchor", requires = "strategy")]
    anchors: Vec<PathBuf>,

    /// Fee per trade side, fraction in [0, 1)
    #[arg(long)]
    fee: Option<f64>,

    /// Starting cash
    #[arg(long)]
    initial_capital: Option<f64>,

    /// full | fractional
    #[arg(long)]
    sizing: Option<String>,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    config_paths: Vec<String>,

    /// Fail on config keys nothing reads
    #[arg(long, default_value_t = false)]
    strict_config: bool,

    /// Artifact root; each run writes <exports>/<run_id>/
    #[arg(long, default_value = "exports")]
    exports: PathBuf,

    /// Skip artifact export
    #[arg(long, default_value_t = false)]
    no_export: bool,
}

pub fn backtest(args: BacktestArgs) -> Result<()> {
    let (loaded, settings) = load_settings(&args.config_paths, args.strict_config)?;

    let sizing = match args.sizing.as_deref() {
        None => settings.sizing,
        Some(s) => parse_sizing(s)?,
    };
    let config = SimulationConfig::new(
        args.fee.unwrap_or(settings.fee),
        args.initial_capital.unwrap_or(settings.initial_capital),
        sizing,
    )?;

    let candles_path = args.candles.clone().unwrap_or_else(|| settings.target_csv());
    let candles = read_candles(&candles_path)?;

    let (strategy_name, signals): (String, Vec<Signal>) = match (&args.signals, &args.strategy) {
        (Some(path), _) => {
            let signals = read_signals_csv(path)
                .with_context(|| format!("read signals failed: {}", path.display()))?;
            ("file".to_string(), signals)
        }
        (None, Some(name)) => {
            let producer = producer_by_name(name)?;
            let anchor_paths = if args.anchors.is_empty() {
                settings.anchor_csvs()
            } else {
                args.anchors.clone()
            };
            let anchors = load_anchor_candles(producer.as_ref(), &anchor_paths)?;
            let signals = producer
                .generate(&candles, &anchors)
                .with_context(|| format!("strategy '{}' failed", producer.name()))?;
            (producer.name().to_string(), signals)
        }
        (None, None) => bail!("one of --signals or --strategy is required"),
    };

    let report = run_backtest(&signals, &candles, &config)?;
    let m = report.metrics.rounded();

    let run_id = Uuid::new_v4();
    println!("run_id={}", run_id);
    println!("strategy={}", strategy_name);
    println!("config_hash={}", loaded.config_hash);
    println!("rows={}", report.samples.len());
    println!("executed_trades={}", report.executed_trades());
    println!("dropped_signals={}", report.dropped_signals);
    println!("dropped_candles={}", report.dropped_candles);
    println!("final_capital={:.2}", m.final_capital);
    println!("final_return_pct={:.2}", m.final_return_pct);
    println!("sharpe_ratio={:.4}", m.sharpe_ratio);
    println!("max_drawdown_pct={:.2}", m.max_drawdown_pct);

    if args.no_export {
        return Ok(());
    }

    let candles_source = candles_path.display().to_string();
    let signals_source = args.signals.as_ref().map(|p| p.display().to_string());
    let out = write_run_artifacts(WriteRunArtifactsArgs {
        exports_root: &args.exports,
        run_id,
        strategy: &strategy_name,
        config_hash: &loaded.config_hash,
        candles_source: Some(&candles_source),
        signals_source: signals_source.as_deref(),
        report: &report,
    })?;

    info!(run_dir = %out.run_dir.display(), "artifacts written");
    println!("artifacts_dir={}", out.run_dir.display());
    Ok(())
}

fn parse_sizing(s: &str) -> Result<SizingMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "full" => Ok(SizingMode::Full),
        "fractional" => Ok(SizingMode::Fractional),
        other => bail!("invalid --sizing '{}'. expected one of: full | fractional", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizing_is_case_insensitive() {
        assert_eq!(parse_sizing("FULL").unwrap(), SizingMode::Full);
        assert_eq!(parse_sizing(" fractional ").unwrap(), SizingMode::Fractional);
        assert!(parse_sizing("half").is_err());
    }
}
