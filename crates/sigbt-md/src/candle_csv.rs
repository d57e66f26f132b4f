//! Flat-file persistence for candle series.
//!
//! CSV columns: `timestamp,open,high,low,close,volume`. Additional columns are
//! ignored on read. Timestamps are written as RFC 3339 (UTC, whole seconds).

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::{parse_timestamp, Candle, MdError};

#[derive(Debug, Deserialize)]
struct CandleRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Serialize)]
struct CandleRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Read a candle CSV file. See [`parse_candles_csv`].
pub fn read_candles_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>, MdError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MdError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_candles_csv(file)
}

/// Parse candles from any CSV reader.
///
/// Output is sorted by timestamp ascending. Duplicate timestamps are rejected.
pub fn parse_candles_csv<R: Read>(reader: R) -> Result<Vec<Candle>, MdError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut out: Vec<Candle> = Vec::new();
    for (idx, rec) in rdr.deserialize::<CandleRow>().enumerate() {
        // 1-based, counting the header as line 1
        let line = idx as u64 + 2;
        let row = rec.map_err(|e| MdError::BadRow {
            line,
            reason: e.to_string(),
        })?;
        let timestamp = parse_timestamp(&row.timestamp)?;
        out.push(Candle {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    out.sort_by_key(|c| c.timestamp);

    let mut seen = BTreeSet::new();
    for c in &out {
        if !seen.insert(c.timestamp) {
            return Err(MdError::DuplicateTimestamp(c.timestamp));
        }
    }

    Ok(out)
}

/// Write candles to a CSV file, creating parent directories as needed.
pub fn write_candles_csv(path: impl AsRef<Path>, candles: &[Candle]) -> Result<(), MdError> {
    let path = path.as_ref();
    let io_err = |e: std::io::Error| MdError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let file = File::create(path).map_err(io_err)?;
    write_candles(file, candles).map_err(|message| MdError::Io {
        path: path.display().to_string(),
        message,
    })
}

fn write_candles<W: Write>(w: W, candles: &[Candle]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_writer(w);
    for c in candles {
        wtr.serialize(CandleRecord {
            timestamp: c.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
        })
        .map_err(|e| e.to_string())?;
    }
    wtr.flush().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sorts_and_ignores_extra_columns() {
        let csv = "timestamp,open,high,low,close,volume,close_time\n\
                   2025-01-01 04:00:00,2,3,1,2.5,10,x\n\
                   2025-01-01 00:00:00,1,2,0.5,1.5,20,y\n";
        let candles = parse_candles_csv(csv.as_bytes()).expect("parse");
        assert_eq!(candles.len(), 2);
        assert!(candles[0].timestamp < candles[1].timestamp);
        assert_eq!(candles[0].close, 1.5);
        assert_eq!(candles[1].volume, 10.0);
    }

    #[test]
    fn duplicate_timestamp_is_rejected() {
        let csv = "timestamp,open,high,low,close,volume\n\
                   2025-01-01T00:00:00Z,1,1,1,1,1\n\
                   2025-01-01 00:00:00,1,1,1,1,1\n";
        let err = parse_candles_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, MdError::DuplicateTimestamp(_)));
    }

    #[test]
    fn bad_number_reports_line() {
        let csv = "timestamp,open,high,low,close,volume\n\
                   2025-01-01T00:00:00Z,1,1,1,abc,1\n";
        match parse_candles_csv(csv.as_bytes()).unwrap_err() {
            MdError::BadRow { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("LTCUSDT_4h.csv");
        let candles = vec![
            Candle::new(parse_timestamp("2025-01-01T00:00:00Z").unwrap(), 1.0, 2.0, 0.5, 1.5, 7.0),
            Candle::new(parse_timestamp("2025-01-01T04:00:00Z").unwrap(), 1.5, 2.5, 1.0, 2.0, 8.0),
        ];
        write_candles_csv(&path, &candles).expect("write");
        let back = read_candles_csv(&path).expect("read");
        assert_eq!(back, candles);
    }
}
