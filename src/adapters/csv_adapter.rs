//! CSV file history adapter.
//!
//! Reads `DIR/SYMBOL_INTERVAL.csv` with header
//! `timestamp,open,high,low,close,volume`.

use crate::domain::bar::Bar;
use crate::domain::error::ScreenerError;
use crate::ports::history_port::{HistoryPort, HistoryRequest};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, interval))
    }

    /// Symbols with a file for `interval`, sorted.
    pub fn list_symbols(&self, interval: &str) -> Result<Vec<String>, ScreenerError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ScreenerError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", interval);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| ScreenerError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(&suffix) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ScreenerError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| ScreenerError::DataSource {
            reason: format!("invalid timestamp '{}': {}", value, e),
        })
}

fn parse_price(value: &str, column: &str) -> Result<f64, ScreenerError> {
    value.parse().map_err(|e| ScreenerError::DataSource {
        reason: format!("invalid {} value '{}': {}", column, value, e),
    })
}

fn parse_volume(value: &str) -> Result<u64, ScreenerError> {
    value
        .parse::<u64>()
        .or_else(|_| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
                .ok_or(())
        })
        .map_err(|_| ScreenerError::DataSource {
            reason: format!("invalid volume value '{}'", value),
        })
}

impl HistoryPort for CsvAdapter {
    fn fetch(&self, request: &HistoryRequest) -> Result<Vec<Bar>, ScreenerError> {
        let path = self.csv_path(&request.symbol, &request.interval.to_string());
        if !path.exists() {
            debug!(path = %path.display(), "no history file");
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(|e| ScreenerError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| ScreenerError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let fields: Vec<&str> = (0..6).map(|i| record.get(i).unwrap_or("").trim()).collect();
            if fields.iter().any(|f| f.is_empty()) {
                skipped += 1;
                continue;
            }

            let timestamp = parse_timestamp(fields[0])?;
            let date = timestamp.date();
            if request.start.is_some_and(|s| date < s) || request.end.is_some_and(|e| date > e) {
                continue;
            }

            bars.push(Bar {
                timestamp,
                open: parse_price(fields[1], "open")?,
                high: parse_price(fields[2], "high")?,
                low: parse_price(fields[3], "low")?,
                close: parse_price(fields[4], "close")?,
                volume: parse_volume(fields[5])?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);

        if let Some(latest) = bars.last().map(Bar::date)
            && let Some(floor) = request.period.start_from(latest)
        {
            bars.retain(|b| b.date() > floor);
        }

        if skipped > 0 {
            debug!(symbol = %request.symbol, skipped, "skipped incomplete rows");
        }
        Ok(bars)
    }
}
