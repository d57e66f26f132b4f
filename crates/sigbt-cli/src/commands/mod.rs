//! Command handler modules for sigbt-cli.
//!
//! Shared utilities used by multiple command paths live here.

pub mod backtest;
pub mod md;
pub mod signals;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use sigbt_config::{
    load_layered_yaml, report_unused_keys, BacktestSettings, LoadedConfig, UnusedKeyPolicy,
};
use sigbt_md::{read_candles_csv, Candle};
use sigbt_strategy::SignalProducer;
use tracing::warn;

/// Load layered config (or the empty config when no paths are given) and
/// extract typed settings. Unused keys are logged, or fatal under `--strict-config`.
pub fn load_settings(paths: &[String], strict: bool) -> Result<(LoadedConfig, BacktestSettings)> {
    let loaded = if paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        load_layered_yaml(paths)?
    };

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    for p in &report.unused_leaf_pointers {
        warn!(pointer = %p, "unused config key");
    }

    let settings = BacktestSettings::from_config_json(&loaded.config_json)?;
    Ok((loaded, settings))
}

pub fn read_candles(path: &Path) -> Result<Vec<Candle>> {
    read_candles_csv(path).with_context(|| format!("read candles failed: {}", path.display()))
}

/// Pair the producer's declared anchors with anchor files, in order.
pub fn load_anchor_candles(
    producer: &dyn SignalProducer,
    anchor_paths: &[impl AsRef<Path>],
) -> Result<BTreeMap<String, Vec<Candle>>> {
    let declared = producer.metadata().anchors;
    if declared.len() != anchor_paths.len() {
        bail!(
            "strategy '{}' expects {} anchor file(s) ({}), got {}",
            producer.name(),
            declared.len(),
            declared
                .iter()
                .map(|a| a.symbol.as_str())
                .collect::<Vec<_>>()
                .join(","),
            anchor_paths.len()
        );
    }

    let mut out = BTreeMap::new();
    for (asset, path) in declared.iter().zip(anchor_paths) {
        out.insert(asset.symbol.clone(), read_candles(path.as_ref())?);
    }
    Ok(out)
}
