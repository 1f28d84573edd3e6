//! Screening criteria and their per-symbol predicate sets.

use crate::domain::bar::BarSeries;
use crate::domain::error::ScreenerError;
use crate::domain::history::load_series;
use crate::domain::numeric::{fraction_change, nan_mean, pct_change, round2};
use crate::domain::period::{Interval, IntervalUnit, Period, PeriodUnit};
use crate::domain::screen::ScreenParams;
use crate::domain::session::segment;
use crate::domain::statistic::{Statistic, compute};
use crate::domain::table::fmt_value;
use crate::ports::history_port::{HistoryPort, HistoryRequest};
use chrono::NaiveTime;
use std::fmt;
use std::str::FromStr;

const fn span(count: u32, unit: PeriodUnit) -> Period {
    Period::Span { count, unit }
}

const fn every(count: u32, unit: IntervalUnit) -> Interval {
    Interval { count, unit }
}

/// Monthly, weekly, daily and hourly pulls behind the Default predicates.
const DEFAULT_PULLS: [(Period, Interval); 4] = [
    (Period::Max, every(1, IntervalUnit::Month)),
    (span(1, PeriodUnit::Year), every(1, IntervalUnit::Week)),
    (span(3, PeriodUnit::Month), every(1, IntervalUnit::Day)),
    (span(3, PeriodUnit::Month), every(60, IntervalUnit::Minute)),
];

const BIG_WAVES_PULL: (Period, Interval) = (
    span(60, PeriodUnit::Day),
    every(2, IntervalUnit::Minute),
);

const MAX_AGE_PULL: (Period, Interval) = (Period::Max, every(1, IntervalUnit::Day));

/// Boundary between the morning and afternoon halves of a session.
const MIDDAY: NaiveTime = match NaiveTime::from_hms_opt(12, 25, 0) {
    Some(t) => t,
    None => panic!("invalid midday"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Criterion {
    #[default]
    Default,
    BigWaves,
    MaxAge,
}

impl Criterion {
    pub const ALL: [Criterion; 3] = [Criterion::Default, Criterion::BigWaves, Criterion::MaxAge];

    pub fn description(&self) -> &'static str {
        match self {
            Criterion::Default => {
                "Criteria:\n    \
                 1. Average monthly price change for period='max' > 0\n    \
                 2. Average weekly price change for period='1y' > 0\n    \
                 3. Average daily price change for period='3mo' > 0\n    \
                 4. Average daily range for period='3mo' > 3%\n"
            }
            Criterion::BigWaves => {
                "Criteria:\n    \
                 1. %Chg 9:30 - 10:30 > 2.0\n    \
                 2. %Chg 10:30 - 11:30 > 1.0\n    \
                 3. %Chg 11:30 - 12:30 > 0.5\n    \
                 4. Avg. Volume 9:30 - 12:30 > 1M\n"
            }
            Criterion::MaxAge => {
                "Criteria:\n    \
                 1. Company's age is less than `max_age` years\n"
            }
        }
    }

    /// Stats column names, one per computed value.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Criterion::Default => &[
                "Avg_Monthly_Chg_(All)",
                "Avg_Weekly_Chg_(1y)",
                "Avg_Daily_Chg_(3mo)",
                "Avg_Daily_Rng_(3mo)",
            ],
            Criterion::BigWaves => &[
                "Hourly_%Chg_1",
                "Hourly_%Chg_2",
                "Hourly_%Chg_3",
                "Avg_Volume",
            ],
            Criterion::MaxAge => &["Age_Years"],
        }
    }

    /// Number of predicates a symbol must satisfy.
    pub fn predicates(&self) -> usize {
        match self {
            Criterion::Default | Criterion::BigWaves => 4,
            Criterion::MaxAge => 1,
        }
    }

    /// Rejects parameter sets the criterion cannot run with.
    pub fn check_params(&self, params: &ScreenParams) -> Result<(), ScreenerError> {
        if *self == Criterion::MaxAge && params.max_age.is_none() {
            return Err(ScreenerError::invalid(
                "max_age",
                "",
                "required by the MaxAge criterion",
            ));
        }
        Ok(())
    }

    /// Pulls the histories this criterion needs for `symbol` and applies its
    /// predicates. Undefined values always fail their predicate.
    pub fn evaluate(
        &self,
        port: &dyn HistoryPort,
        symbol: &str,
        params: &ScreenParams,
    ) -> Evaluation {
        match self {
            Criterion::Default => evaluate_default(port, symbol),
            Criterion::BigWaves => evaluate_big_waves(port, symbol),
            Criterion::MaxAge => evaluate_max_age(port, symbol, params),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Criterion::Default => "Default",
            Criterion::BigWaves => "BigWaves",
            Criterion::MaxAge => "MaxAge",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Criterion {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ScreenerError::invalid("criterion", s, "expected Default, BigWaves or MaxAge")
            })
    }
}

/// A computed stats cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Real(Option<f64>),
    Whole(Option<u64>),
}

impl StatValue {
    fn exceeds(&self, threshold: f64) -> bool {
        match *self {
            StatValue::Real(Some(v)) => v > threshold,
            StatValue::Whole(Some(v)) => v as f64 > threshold,
            _ => false,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Real(v) => write!(f, "{}", fmt_value(*v)),
            StatValue::Whole(Some(v)) => write!(f, "{}", v),
            StatValue::Whole(None) => write!(f, "NaN"),
        }
    }
}

/// One symbol's computed values and predicate outcomes.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub symbol: String,
    pub stats: Vec<StatValue>,
    pub checks: Vec<bool>,
}

impl Evaluation {
    pub fn passed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|&c| c)
    }
}

fn pull(
    port: &dyn HistoryPort,
    symbol: &str,
    (period, interval): (Period, Interval),
) -> Option<BarSeries> {
    load_series(port, &HistoryRequest::new(symbol, period, interval), None)
}

/// Mean bar-to-bar change of the lows, in percent.
fn mean_low_change(series: Option<&BarSeries>) -> Option<f64> {
    let series = series?;
    nan_mean(pct_change(&series.lows())).map(|m| m * 100.0)
}

/// Mean per-session spread between the morning low and the afternoon high
/// floor, in percent. Sessions missing either half are skipped.
fn mean_daily_range(series: Option<&BarSeries>) -> Option<f64> {
    let series = series?;
    let bars = series.bars();
    let ranges = segment(series).into_iter().map(|session| {
        let day = &bars[session.range()];
        let am_low = day
            .iter()
            .filter(|b| b.timestamp.time() <= MIDDAY)
            .map(|b| b.low)
            .reduce(f64::min)?;
        let pm_high = day
            .iter()
            .filter(|b| b.timestamp.time() > MIDDAY)
            .map(|b| b.high)
            .reduce(f64::min)?;
        fraction_change(am_low, pm_high)
    });
    nan_mean(ranges).map(|m| m * 100.0)
}

fn evaluate_default(port: &dyn HistoryPort, symbol: &str) -> Evaluation {
    let [monthly, weekly, daily, hourly] = DEFAULT_PULLS.map(|p| pull(port, symbol, p));
    let monthly = mean_low_change(monthly.as_ref());
    let weekly = mean_low_change(weekly.as_ref());
    let daily = mean_low_change(daily.as_ref());
    let range = mean_daily_range(hourly.as_ref());

    let values = [monthly, weekly, daily, range];
    let thresholds = [0.0, 0.0, 0.0, 3.0];
    let checks = values
        .iter()
        .zip(thresholds)
        .map(|(v, t)| StatValue::Real(*v).exceeds(t))
        .collect();

    Evaluation {
        symbol: symbol.to_string(),
        stats: values.iter().map(|v| StatValue::Real(v.map(round2))).collect(),
        checks,
    }
}

fn evaluate_big_waves(port: &dyn HistoryPort, symbol: &str) -> Evaluation {
    let summary = pull(port, symbol, BIG_WAVES_PULL)
        .and_then(|series| compute(&Statistic::HourlyChg, &series).summary);

    let stats = match summary {
        Some(s) => vec![
            StatValue::Real(s.pct_chg_1),
            StatValue::Real(s.pct_chg_2),
            StatValue::Real(s.pct_chg_3),
            StatValue::Whole(s.avg_volume),
        ],
        None => vec![
            StatValue::Real(None),
            StatValue::Real(None),
            StatValue::Real(None),
            StatValue::Whole(None),
        ],
    };
    let thresholds = [2.0, 1.0, 0.5, 1_000_000.0];
    let checks = stats.iter().zip(thresholds).map(|(v, t)| v.exceeds(t)).collect();

    Evaluation {
        symbol: symbol.to_string(),
        stats,
        checks,
    }
}

fn evaluate_max_age(port: &dyn HistoryPort, symbol: &str, params: &ScreenParams) -> Evaluation {
    let age = pull(port, symbol, MAX_AGE_PULL)
        .and_then(|series| series.first_date())
        .and_then(|first| params.as_of.years_since(first))
        .map(u64::from);

    let check = match (age, params.max_age) {
        (Some(age), Some(max)) => age < u64::from(max),
        _ => false,
    };

    Evaluation {
        symbol: symbol.to_string(),
        stats: vec![StatValue::Whole(age)],
        checks: vec![check],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use chrono::{NaiveDate, NaiveDateTime};

    fn bar(ts: &str, low: f64, high: f64) -> Bar {
        Bar {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            open: low,
            high,
            low,
            close: low,
            volume: 100,
        }
    }

    fn pull_names(pulls: &[(Period, Interval)]) -> Vec<String> {
        pulls.iter().map(|(p, i)| format!("{p}/{i}")).collect()
    }

    #[test]
    fn pulls_use_provider_vocabulary() {
        assert_eq!(
            pull_names(&DEFAULT_PULLS),
            vec!["max/1mo", "1y/1wk", "3mo/1d", "3mo/60m"]
        );
        assert_eq!(pull_names(&[BIG_WAVES_PULL]), vec!["60d/2m"]);
        assert_eq!(pull_names(&[MAX_AGE_PULL]), vec!["max/1d"]);
        for (period, interval) in DEFAULT_PULLS.iter().chain([&BIG_WAVES_PULL, &MAX_AGE_PULL]) {
            assert_eq!(period.to_string().parse::<Period>().unwrap(), *period);
            assert_eq!(interval.to_string().parse::<Interval>().unwrap(), *interval);
        }
    }

    fn hourly(bars: Vec<Bar>) -> BarSeries {
        BarSeries::new("T", "3mo".parse().unwrap(), "60m".parse().unwrap(), bars).unwrap()
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("bigwaves".parse::<Criterion>().unwrap(), Criterion::BigWaves);
        assert_eq!(" MaxAge ".parse::<Criterion>().unwrap(), Criterion::MaxAge);
        assert!(matches!(
            "Momentum".parse::<Criterion>(),
            Err(ScreenerError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn columns_match_predicates() {
        for c in Criterion::ALL {
            assert_eq!(c.columns().len(), c.predicates());
            assert!(c.description().starts_with("Criteria:\n"));
        }
    }

    #[test]
    fn max_age_needs_limit() {
        let params = ScreenParams::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(Criterion::MaxAge.check_params(&params).is_err());
        assert!(Criterion::Default.check_params(&params).is_ok());
        let params = ScreenParams {
            max_age: Some(5),
            ..params
        };
        assert!(Criterion::MaxAge.check_params(&params).is_ok());
    }

    #[test]
    fn undefined_values_fail() {
        assert!(!StatValue::Real(None).exceeds(-1.0));
        assert!(!StatValue::Whole(None).exceeds(-1.0));
        assert!(StatValue::Whole(Some(2_000_000)).exceeds(1_000_000.0));
        assert!(!StatValue::Real(Some(3.0)).exceeds(3.0));
    }

    #[test]
    fn stat_value_display() {
        assert_eq!(StatValue::Real(Some(1.234)).to_string(), "1.23");
        assert_eq!(StatValue::Whole(Some(1_500_000)).to_string(), "1500000");
        assert_eq!(StatValue::Real(None).to_string(), "NaN");
    }

    #[test]
    fn daily_range_uses_morning_low_and_afternoon_high() {
        let series = hourly(vec![
            bar("2024-01-02 09:30:00", 10.0, 10.5),
            bar("2024-01-02 11:30:00", 12.0, 12.5),
            bar("2024-01-02 13:30:00", 11.0, 11.0),
            bar("2024-01-02 14:30:00", 11.0, 12.0),
            // no afternoon bars: skipped
            bar("2024-01-03 09:30:00", 50.0, 51.0),
        ]);
        let range = mean_daily_range(Some(&series)).unwrap();
        approx::assert_relative_eq!(range, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn low_change_mean_in_percent() {
        let series = hourly(vec![
            bar("2024-01-02 09:30:00", 10.0, 10.0),
            bar("2024-01-02 10:30:00", 11.0, 11.0),
            bar("2024-01-02 11:30:00", 11.0, 11.0),
        ]);
        let mean = mean_low_change(Some(&series)).unwrap();
        approx::assert_relative_eq!(mean, 5.0, epsilon = 1e-9);
        assert_eq!(mean_low_change(None), None);
    }

    #[test]
    fn empty_checks_never_pass() {
        let e = Evaluation {
            symbol: "X".into(),
            stats: vec![],
            checks: vec![],
        };
        assert!(!e.passed());
    }
}
