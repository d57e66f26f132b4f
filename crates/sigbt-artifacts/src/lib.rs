use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sigbt_backtest::{BacktestReport, Metrics, SizingMode};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SCHEMA_VERSION: i32 = 1;

pub const MANIFEST_JSON: &str = "manifest.json";
pub const CAPITAL_CURVE_CSV: &str = "capital_curve.csv";
pub const METRICS_JSON: &str = "metrics.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: i32,
    pub run_id: Uuid,
    pub strategy: String,
    pub config_hash: String,
    pub fee: f64,
    pub initial_capital: f64,
    pub sizing: SizingMode,
    pub candles_source: Option<String>,
    pub signals_source: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub artifacts: ArtifactList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactList {
    pub manifest_json: String,
    pub capital_curve_csv: String,
    pub metrics_json: String,
}

/// Contents of `metrics.json`: presentation-rounded metrics plus run counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsFile {
    #[serde(flatten)]
    pub metrics: Metrics,
    pub rows: usize,
    pub executed_trades: usize,
    pub dropped_signals: usize,
    pub dropped_candles: usize,
}

impl MetricsFile {
    pub fn from_report(report: &BacktestReport) -> Self {
        Self {
            metrics: report.metrics.rounded(),
            rows: report.samples.len(),
            executed_trades: report.executed_trades(),
            dropped_signals: report.dropped_signals,
            dropped_candles: report.dropped_candles,
        }
    }
}

#[derive(Debug, Serialize)]
struct CurveRow<'a> {
    timestamp: String,
    action: &'a str,
    close: f64,
    cash: f64,
    holdings_units: f64,
    capital: f64,
    step_return: f64,
}

pub struct WriteRunArtifactsArgs<'a> {
    pub exports_root: &'a Path, // e.g. ./exports
    pub run_id: Uuid,
    pub strategy: &'a str,
    pub config_hash: &'a str,
    pub candles_source: Option<&'a str>,
    pub signals_source: Option<&'a str>,
    pub report: &'a BacktestReport,
}

pub struct WriteRunArtifactsResult {
    pub run_dir: PathBuf,
    pub manifest_path: PathBuf,
}

/// Write `exports/<run_id>/{manifest.json, capital_curve.csv, metrics.json}`.
///
/// Refuses to overwrite a run directory that already holds a manifest.
pub fn write_run_artifacts(args: WriteRunArtifactsArgs<'_>) -> Result<WriteRunArtifactsResult> {
    let run_dir = args.exports_root.join(args.run_id.to_string());
    let manifest_path = run_dir.join(MANIFEST_JSON);
    if manifest_path.exists() {
        bail!("run dir already populated: {}", run_dir.display());
    }
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("create exports dir failed: {}", run_dir.display()))?;

    write_capital_curve(&run_dir.join(CAPITAL_CURVE_CSV), args.report)?;

    let metrics = MetricsFile::from_report(args.report);
    write_json(&run_dir.join(METRICS_JSON), &metrics)?;

    let manifest = RunManifest {
        schema_version: SCHEMA_VERSION,
        run_id: args.run_id,
        strategy: args.strategy.to_string(),
        config_hash: args.config_hash.to_string(),
        fee: args.report.config_fee,
        initial_capital: args.report.config_initial_capital,
        sizing: args.report.sizing,
        candles_source: args.candles_source.map(str::to_string),
        signals_source: args.signals_source.map(str::to_string),
        created_at_utc: Utc::now(),
        artifacts: ArtifactList {
            manifest_json: MANIFEST_JSON.to_string(),
            capital_curve_csv: CAPITAL_CURVE_CSV.to_string(),
            metrics_json: METRICS_JSON.to_string(),
        },
    };
    // manifest last: its presence marks a complete run dir
    write_json(&manifest_path, &manifest)?;

    Ok(WriteRunArtifactsResult {
        run_dir,
        manifest_path,
    })
}

fn write_capital_curve(path: &Path, report: &BacktestReport) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("create capital curve failed: {}", path.display()))?;
    let returns = report.step_returns();
    for (s, r) in report.samples.iter().zip(returns) {
        w.serialize(CurveRow {
            timestamp: s.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            action: s.action.as_str(),
            close: s.close,
            cash: s.cash,
            holdings_units: s.holdings_units,
            capital: s.capital,
            step_return: r,
        })
        .context("serialize capital curve row failed")?;
    }
    w.flush()
        .with_context(|| format!("write capital curve failed: {}", path.display()))?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize json failed")?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write failed: {}", path.display()))
}

pub fn read_manifest(run_dir: &Path) -> Result<RunManifest> {
    let path = run_dir.join(MANIFEST_JSON);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read manifest failed: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse manifest failed: {}", path.display()))
}
