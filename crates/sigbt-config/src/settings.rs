use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use sigbt_backtest::{SimulationConfig, SizingMode, DEFAULT_FEE, DEFAULT_INITIAL_CAPITAL};
use sigbt_md::{candle_file_name, Interval};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_TARGET: &str = "LTCUSDT";
pub const DEFAULT_ANCHOR: &str = "BTCUSDT";

/// Typed view over the consumed config keys. Missing keys take defaults;
/// present keys with the wrong type are errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSettings {
    pub fee: f64,
    pub initial_capital: f64,
    pub sizing: SizingMode,
    pub data_dir: PathBuf,
    pub target: String,
    pub anchors: Vec<String>,
    pub interval: Interval,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            fee: DEFAULT_FEE,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            sizing: SizingMode::Full,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            target: DEFAULT_TARGET.to_string(),
            anchors: vec![DEFAULT_ANCHOR.to_string()],
            interval: Interval::H1,
        }
    }
}

impl BacktestSettings {
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let d = Self::default();

        let fee = opt_f64(config, "/backtest/fee")?.unwrap_or(d.fee);
        let initial_capital =
            opt_f64(config, "/backtest/initial_capital")?.unwrap_or(d.initial_capital);

        let sizing = match opt_str(config, "/backtest/sizing")? {
            None => d.sizing,
            Some(s) => match s.trim().to_ascii_lowercase().as_str() {
                "full" => SizingMode::Full,
                "fractional" => SizingMode::Fractional,
                other => bail!("/backtest/sizing: expected full|fractional, got {other:?}"),
            },
        };

        let data_dir = opt_str(config, "/data/dir")?
            .map(PathBuf::from)
            .unwrap_or(d.data_dir);
        let target = opt_str(config, "/data/target")?
            .map(str::to_string)
            .unwrap_or(d.target);
        let anchors = opt_str_list(config, "/data/anchors")?.unwrap_or(d.anchors);

        let interval = match opt_str(config, "/data/interval")? {
            None => d.interval,
            Some(s) => Interval::parse(s).context("/data/interval")?,
        };

        Ok(Self {
            fee,
            initial_capital,
            sizing,
            data_dir,
            target,
            anchors,
            interval,
        })
    }

    /// Validated simulator parameters.
    pub fn simulation_config(&self) -> Result<SimulationConfig> {
        SimulationConfig::new(self.fee, self.initial_capital, self.sizing)
            .map_err(|e| anyhow!("backtest config: {e}"))
    }

    /// `<data_dir>/<TARGET>_<interval>.csv`
    pub fn target_csv(&self) -> PathBuf {
        self.data_dir.join(candle_file_name(&self.target, self.interval))
    }

    pub fn anchor_csvs(&self) -> Vec<PathBuf> {
        self.anchors
            .iter()
            .map(|a| self.data_dir.join(candle_file_name(a, self.interval)))
            .collect()
    }
}

fn opt_f64(config: &Value, ptr: &str) -> Result<Option<f64>> {
    match config.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| anyhow!("{ptr}: expected a number, got {v}")),
    }
}

fn opt_str<'a>(config: &'a Value, ptr: &str) -> Result<Option<&'a str>> {
    match config.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| anyhow!("{ptr}: expected a string, got {v}")),
    }
}

fn opt_str_list(config: &Value, ptr: &str) -> Result<Option<Vec<String>>> {
    match config.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("{ptr}: expected strings, got {v}"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(v) => bail!("{ptr}: expected a list, got {v}"),
    }
}
