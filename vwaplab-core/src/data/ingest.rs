//! CSV ingest of raw 1-minute records.
//!
//! Expected header columns (case-insensitive, any order): a timestamp column
//! named `caldt`, `timestamp`, `datetime` or `date`, then `open`, `high`,
//! `low`, `close`, `volume`. Every field is parsed strictly: a record that
//! cannot be parsed fails the whole ingest with the offending line number.
//! Records are returned in file order; ordering is checked by the aggregator.

use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::Bar;
use crate::session::ExchangeClock;

const TIMESTAMP_COLUMNS: &[&str] = &["caldt", "timestamp", "datetime", "date"];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Data ingestor for CSV minute-bar files.
pub struct DataIngestor {
    clock: ExchangeClock,
}

impl DataIngestor {
    pub fn new(clock: ExchangeClock) -> Self {
        Self { clock }
    }

    /// Ingest a CSV file from disk.
    pub fn ingest_csv(&self, path: &Path) -> Result<Vec<Bar>, DataError> {
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bars = self.ingest_reader(file)?;
        info!(path = %path.display(), records = bars.len(), "ingested raw bars");
        Ok(bars)
    }

    /// Ingest CSV content from any reader.
    pub fn ingest_reader<R: Read>(&self, reader: R) -> Result<Vec<Bar>, DataError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);
        let columns = ColumnMap::from_headers(rdr.headers()?)?;

        let mut bars = Vec::new();
        let mut inconsistent = 0usize;
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let bar = columns.parse(&record, line, &self.clock)?;
            if !bar.is_sane() {
                inconsistent += 1;
            }
            bars.push(bar);
        }

        if inconsistent > 0 {
            warn!(count = inconsistent, "records with inconsistent OHLC ranges");
        }
        Ok(bars)
    }
}

impl Default for DataIngestor {
    fn default() -> Self {
        Self::new(ExchangeClock::default())
    }
}

/// Header positions of the six required columns.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, DataError> {
        let names: Vec<String> = headers.iter().map(|h| h.to_ascii_lowercase()).collect();
        let find = |name: &str| {
            names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| DataError::MissingColumn(name.to_string()))
        };
        let timestamp = TIMESTAMP_COLUMNS
            .iter()
            .find_map(|c| names.iter().position(|n| n == c))
            .ok_or_else(|| DataError::MissingColumn(TIMESTAMP_COLUMNS.join("|")))?;

        Ok(Self {
            timestamp,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }

    fn parse(
        &self,
        record: &StringRecord,
        line: u64,
        clock: &ExchangeClock,
    ) -> Result<Bar, DataError> {
        let raw_ts = field(record, self.timestamp, "timestamp", line)?;
        let timestamp = parse_timestamp(raw_ts, clock)
            .ok_or_else(|| invalid(line, "timestamp", raw_ts, "unrecognised timestamp format"))?;

        let volume = parse_number(record, self.volume, "volume", line)?;
        if volume < 0.0 {
            let raw = field(record, self.volume, "volume", line)?;
            return Err(invalid(line, "volume", raw, "negative volume"));
        }

        Ok(Bar {
            timestamp,
            open: parse_number(record, self.open, "open", line)?,
            high: parse_number(record, self.high, "high", line)?,
            low: parse_number(record, self.low, "low", line)?,
            close: parse_number(record, self.close, "close", line)?,
            volume,
        })
    }
}

fn field<'r>(
    record: &'r StringRecord,
    idx: usize,
    name: &'static str,
    line: u64,
) -> Result<&'r str, DataError> {
    record
        .get(idx)
        .ok_or_else(|| invalid(line, name, "", "missing field"))
}

fn parse_number(
    record: &StringRecord,
    idx: usize,
    name: &'static str,
    line: u64,
) -> Result<f64, DataError> {
    let raw = field(record, idx, name, line)?;
    let value: f64 = raw
        .parse()
        .map_err(|_| invalid(line, name, raw, "not a number"))?;
    if !value.is_finite() {
        return Err(invalid(line, name, raw, "not finite"));
    }
    Ok(value)
}

fn invalid(line: u64, field: &'static str, value: &str, reason: &'static str) -> DataError {
    DataError::InvalidField {
        line,
        field,
        value: value.to_string(),
        reason,
    }
}

/// Parse a source timestamp into exchange-local wall time.
///
/// Offset-bearing timestamps are converted with `clock`; naive ones are taken
/// as already exchange-local.
pub fn parse_timestamp(raw: &str, clock: &ExchangeClock) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(clock.to_local(dt));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(clock.to_local(dt));
        }
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("line {line}: invalid {field} '{value}' ({reason})")]
    InvalidField {
        line: u64,
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("record {index} at {current} is earlier than the previous record at {previous}")]
    Unsorted {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("invalid aggregation interval: {0}")]
    InvalidInterval(String),
}
