//! Signal files: `timestamp,signal[,position_size]`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::types::{is_valid_position_size, Action, Signal, StrategyError, FULL_POSITION};

#[derive(Debug, Deserialize)]
struct SignalRow {
    timestamp: String,
    signal: String,
    position_size: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SignalRecord<'a> {
    timestamp: String,
    signal: &'a str,
    position_size: f64,
}

pub fn read_signals_csv(path: impl AsRef<Path>) -> Result<Vec<Signal>, StrategyError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| StrategyError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_signals_csv(file)
}

/// Parse signals in file order. A missing or empty `position_size` is 1.0.
pub fn parse_signals_csv<R: Read>(reader: R) -> Result<Vec<Signal>, StrategyError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut out = Vec::new();
    for (idx, rec) in rdr.deserialize::<SignalRow>().enumerate() {
        let line = idx as u64 + 2;
        let row = rec.map_err(|e| StrategyError::BadRow {
            line,
            reason: e.to_string(),
        })?;

        let timestamp = sigbt_md::parse_timestamp(&row.timestamp).map_err(|e| {
            StrategyError::BadRow {
                line,
                reason: e.to_string(),
            }
        })?;
        let action = Action::parse(&row.signal)?;
        let position_size = row.position_size.unwrap_or(FULL_POSITION);
        if !is_valid_position_size(position_size) {
            return Err(StrategyError::InvalidPositionSize {
                line,
                value: position_size,
            });
        }

        out.push(Signal {
            timestamp,
            action,
            position_size,
        });
    }
    Ok(out)
}

pub fn write_signals_csv(path: impl AsRef<Path>, signals: &[Signal]) -> Result<(), StrategyError> {
    let path = path.as_ref();
    let io_err = |message: String| StrategyError::Io {
        path: path.display().to_string(),
        message,
    };

    let mut wtr = csv::Writer::from_path(path).map_err(|e| io_err(e.to_string()))?;
    for s in signals {
        wtr.serialize(SignalRecord {
            timestamp: s.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            signal: s.action.as_str(),
            position_size: s.position_size,
        })
        .map_err(|e| io_err(e.to_string()))?;
    }
    wtr.flush().map_err(|e| io_err(e.to_string()))
}
