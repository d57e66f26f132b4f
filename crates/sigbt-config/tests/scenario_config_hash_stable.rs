//! Config hash stability.
//!
//! GREEN when:
//! - the same layers hash identically across calls
//! - key order in the source YAML does not change the hash
//! - a changed value changes the hash
//! - an overlay layer overrides the base and the settings see the override

use sigbt_config::{load_layered_yaml, load_layered_yaml_from_strings, BacktestSettings};
use sigbt_backtest::SizingMode;

const BASE_YAML: &str = r#"
backtest:
  fee: 0.001
  initial_capital: 1000
  sizing: full
data:
  dir: "data"
  target: "LTCUSDT"
  anchors: ["BTCUSDT"]
  interval: "1h"
"#;

const BASE_YAML_REORDERED: &str = r#"
data:
  interval: "1h"
  anchors: ["BTCUSDT"]
  target: "LTCUSDT"
  dir: "data"
backtest:
  sizing: full
  initial_capital: 1000
  fee: 0.001
"#;

const OVERLAY_YAML: &str = r#"
backtest:
  fee: 0.0
  sizing: fractional
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(
        a.config_hash, b.config_hash,
        "reordering keys in YAML must not change the hash"
    );
}

#[test]
fn different_values_produce_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, "backtest:\n  fee: 0.002\n"]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_wins_and_reaches_settings() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    let s = BacktestSettings::from_config_json(&loaded.config_json).unwrap();

    assert_eq!(s.fee, 0.0);
    assert_eq!(s.initial_capital, 1_000.0);
    assert_eq!(s.sizing, SizingMode::Fractional);
    assert_eq!(s.anchors, vec!["BTCUSDT".to_string()]);
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn files_hash_like_strings() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let overlay = dir.path().join("overlay.yaml");
    std::fs::write(&base, BASE_YAML).unwrap();
    std::fs::write(&overlay, OVERLAY_YAML).unwrap();

    let from_files = load_layered_yaml(&[&base, &overlay]).unwrap();
    let from_strings = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_eq!(from_files.config_hash, from_strings.config_hash);
}

#[test]
fn missing_file_names_the_path() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
}
