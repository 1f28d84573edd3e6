//! Technical indicator types.
//!
//! - `IndicatorPoint`: one timestamped value, `None` while the window warms up
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a column aligned one-to-one with a bar series

pub mod rsi;

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ScreenerError;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Rsi(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

pub const DEFAULT_RSI_WINDOW: usize = 60;

/// Oscillator settings applied when a series is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsiSettings {
    pub window: usize,
    pub scope: RsiScope,
}

impl Default for RsiSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_RSI_WINDOW,
            scope: RsiScope::Series,
        }
    }
}

/// Whether the rolling window runs across the whole series or restarts
/// at every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RsiScope {
    #[default]
    Series,
    Session,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(window) => write!(f, "RSI({})", window),
        }
    }
}

impl FromStr for RsiScope {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "series" => Ok(RsiScope::Series),
            "session" => Ok(RsiScope::Session),
            _ => Err(ScreenerError::invalid(
                "rsi scope",
                s,
                "expected 'series' or 'session'",
            )),
        }
    }
}
