//! Market-data history port.

use crate::domain::bar::Bar;
use crate::domain::error::ScreenerError;
use crate::domain::period::{Interval, Period};
use chrono::NaiveDate;

/// One history pull: symbol, lookback period, bar interval and optional
/// explicit date bounds (inclusive).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub symbol: String,
    pub period: Period,
    pub interval: Interval,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl HistoryRequest {
    pub fn new(symbol: &str, period: Period, interval: Interval) -> Self {
        Self {
            symbol: symbol.to_string(),
            period,
            interval,
            start: None,
            end: None,
        }
    }

    pub fn with_period(&self, period: Period) -> Self {
        Self {
            period,
            ..self.clone()
        }
    }
}

/// Provider of historical bars. An empty vector means "no data".
///
/// Implementations must return promptly: a slow or failing symbol should
/// surface as an error or an empty result rather than block a batch.
pub trait HistoryPort: Send + Sync {
    fn fetch(&self, request: &HistoryRequest) -> Result<Vec<Bar>, ScreenerError>;
}
