//! Configuration loading and validation.
//!
//! Every recognised key is parsed up front so a malformed value is rejected
//! before any history is fetched.

use crate::domain::error::ScreenerError;
use crate::domain::indicator::{DEFAULT_RSI_WINDOW, RsiScope, RsiSettings};
use crate::domain::period::{Interval, Period};
use crate::domain::screen::Criterion;
use crate::domain::statistic::DEFAULT_FIRST_N;
use crate::ports::config_port::ConfigPort;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_PERIOD: &str = "60d";
pub const DEFAULT_REPORT_NAME: &str = "screen";

/// Validated settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: Option<PathBuf>,
    pub rsi: RsiSettings,
    /// Bars per session for FirstN and Gobo.
    pub n: usize,
    pub period: Period,
    pub interval: Interval,
    pub criterion: Criterion,
    pub symbols: Vec<String>,
    /// File with one symbol per line, merged with `symbols`.
    pub symbols_file: Option<PathBuf>,
    pub max_age: Option<u32>,
    pub jobs: usize,
    pub report_dir: PathBuf,
    pub report_name: String,
}

impl Settings {
    /// History directory, required by every command that fetches data.
    pub fn data_dir(&self) -> Result<&Path, ScreenerError> {
        self.data_dir
            .as_deref()
            .ok_or_else(|| ScreenerError::ConfigMissing {
                section: "data".to_string(),
                key: "dir".to_string(),
            })
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parses `[section] key` when present.
fn parse_key<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<T>, ScreenerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    config
        .get_string(section, key)
        .map(|raw| raw.parse::<T>().map_err(|e| invalid(section, key, e.to_string())))
        .transpose()
}

fn at_least(
    value: Option<usize>,
    min: usize,
    default: usize,
    section: &str,
    key: &str,
) -> Result<usize, ScreenerError> {
    match value {
        Some(v) if v < min => Err(invalid(section, key, format!("{} must be at least {}", key, min))),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<Settings, ScreenerError> {
    let window = at_least(
        parse_key(config, "indicator", "rsi_window")?,
        2,
        DEFAULT_RSI_WINDOW,
        "indicator",
        "rsi_window",
    )?;
    let scope: RsiScope = parse_key(config, "indicator", "rsi_scope")?.unwrap_or_default();

    let n = at_least(parse_key(config, "statistic", "n")?, 1, DEFAULT_FIRST_N, "statistic", "n")?;

    let period: Period = match parse_key(config, "history", "period")? {
        Some(p) => p,
        None => DEFAULT_PERIOD
            .parse()
            .map_err(|e: ScreenerError| invalid("history", "period", e.to_string()))?,
    };
    let interval: Interval =
        parse_key(config, "history", "interval")?.unwrap_or_else(|| period.default_interval());

    let criterion: Criterion = parse_key(config, "screen", "criterion")?.unwrap_or_default();
    let max_age = match parse_key::<i64>(config, "screen", "max_age")? {
        Some(v) if v < 0 => return Err(invalid("screen", "max_age", "max_age must be non-negative")),
        Some(v) => Some(
            u32::try_from(v).map_err(|_| invalid("screen", "max_age", "max_age is too large"))?,
        ),
        None => None,
    };
    let jobs = at_least(parse_key(config, "screen", "jobs")?, 1, 1, "screen", "jobs")?;

    Ok(Settings {
        data_dir: config.get_string("data", "dir").map(PathBuf::from),
        rsi: RsiSettings { window, scope },
        n,
        period,
        interval,
        criterion,
        symbols: config.get_list("screen", "symbols"),
        symbols_file: config.get_string("screen", "symbols_file").map(PathBuf::from),
        max_age,
        jobs,
        report_dir: config
            .get_string("report", "dir")
            .map_or_else(|| PathBuf::from("."), PathBuf::from),
        report_name: config
            .get_string("report", "name")
            .unwrap_or_else(|| DEFAULT_REPORT_NAME.to_string()),
    })
}
