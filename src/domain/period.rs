//! History period and bar interval vocabulary.
//!
//! Both parse from the `{digits}{unit}` shorthand used by market-data
//! providers ("60d", "1wk", "3mo"); periods additionally accept `ytd` and
//! `max`.

use crate::domain::error::ScreenerError;
use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Periods in ascending length. Degradation steps backward through this list.
pub const VALID_PERIODS: [&str; 12] = [
    "1d", "7d", "30d", "60d", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

pub const VALID_INTERVALS: [&str; 13] = [
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Span { count: u32, unit: PeriodUnit },
    Ytd,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub count: u32,
    pub unit: IntervalUnit,
}

/// Splits "15wk" into (15, "wk"). The numeric part must be non-empty.
fn split_shorthand(s: &str) -> Option<(u32, &str)> {
    let digits_end = s.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let count: u32 = s[..digits_end].parse().ok()?;
    if count == 0 {
        return None;
    }
    Some((count, &s[digits_end..]))
}

impl FromStr for Period {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "ytd" => return Ok(Period::Ytd),
            "max" => return Ok(Period::Max),
            _ => {}
        }
        let invalid = || {
            ScreenerError::invalid(
                "period",
                s,
                "expected '{n}d', '{n}wk', '{n}mo', '{n}y', 'ytd' or 'max'",
            )
        };
        let (count, unit) = split_shorthand(s).ok_or_else(invalid)?;
        let unit = match unit {
            "d" => PeriodUnit::Day,
            "wk" => PeriodUnit::Week,
            "mo" => PeriodUnit::Month,
            "y" => PeriodUnit::Year,
            _ => return Err(invalid()),
        };
        Ok(Period::Span { count, unit })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Ytd => write!(f, "ytd"),
            Period::Max => write!(f, "max"),
            Period::Span { count, unit } => {
                let suffix = match unit {
                    PeriodUnit::Day => "d",
                    PeriodUnit::Week => "wk",
                    PeriodUnit::Month => "mo",
                    PeriodUnit::Year => "y",
                };
                write!(f, "{}{}", count, suffix)
            }
        }
    }
}

impl Period {
    /// Exclusive lower bound of the dates covered when the period ends on
    /// `latest`. `None` means unbounded (`max`).
    pub fn start_from(&self, latest: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Period::Max => None,
            Period::Ytd => NaiveDate::from_ymd_opt(latest.year() - 1, 12, 31),
            Period::Span { count, unit } => match unit {
                PeriodUnit::Day => latest.checked_sub_days(chrono::Days::new(count as u64)),
                PeriodUnit::Week => latest.checked_sub_days(chrono::Days::new(count as u64 * 7)),
                PeriodUnit::Month => latest.checked_sub_months(Months::new(count)),
                PeriodUnit::Year => count
                    .checked_mul(12)
                    .and_then(|months| latest.checked_sub_months(Months::new(months))),
            },
        }
    }

    /// Shorter periods to retry when this one yields no data, nearest first.
    ///
    /// Periods outside [`VALID_PERIODS`] have no fallbacks.
    pub fn fallbacks(&self) -> Vec<Period> {
        let name = self.to_string();
        match VALID_PERIODS.iter().position(|p| *p == name) {
            Some(idx) => VALID_PERIODS[..idx]
                .iter()
                .rev()
                .filter_map(|p| p.parse().ok())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Interval the provider is asked for when none is given.
    pub fn default_interval(&self) -> Interval {
        let minutes = |count| Interval {
            count,
            unit: IntervalUnit::Minute,
        };
        let daily = Interval {
            count: 1,
            unit: IntervalUnit::Day,
        };
        match self.to_string().as_str() {
            "1d" | "7d" => minutes(1),
            "60d" | "1mo" => minutes(2),
            "3mo" | "6mo" | "ytd" | "1y" | "2y" => minutes(60),
            "5y" | "10y" | "max" => daily,
            _ => daily,
        }
    }
}

impl FromStr for Interval {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || {
            ScreenerError::invalid(
                "interval",
                s,
                "expected '{n}m', '{n}h', '{n}d', '{n}wk' or '{n}mo'",
            )
        };
        let (count, unit) = split_shorthand(s).ok_or_else(invalid)?;
        let unit = match unit {
            "m" => IntervalUnit::Minute,
            "h" => IntervalUnit::Hour,
            "d" => IntervalUnit::Day,
            "wk" => IntervalUnit::Week,
            "mo" => IntervalUnit::Month,
            _ => return Err(invalid()),
        };
        let interval = Interval { count, unit };
        if unit == IntervalUnit::Hour && interval.minutes().is_none() {
            return Err(invalid());
        }
        Ok(interval)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.unit {
            IntervalUnit::Minute => "m",
            IntervalUnit::Hour => "h",
            IntervalUnit::Day => "d",
            IntervalUnit::Week => "wk",
            IntervalUnit::Month => "mo",
        };
        write!(f, "{}{}", self.count, suffix)
    }
}

impl Interval {
    /// Bar length in minutes for sub-daily intervals.
    pub fn minutes(&self) -> Option<u32> {
        match self.unit {
            IntervalUnit::Minute => Some(self.count),
            IntervalUnit::Hour => self.count.checked_mul(60),
            _ => None,
        }
    }

    pub fn is_intraday(&self) -> bool {
        self.minutes().is_some()
    }
}
