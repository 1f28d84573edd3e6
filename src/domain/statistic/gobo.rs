//! Gobo: good-open / bad-open classification by opening volume.
//!
//! A session opens "Good" when the mean close-to-close change over its first
//! `n` bars is positive. %Down and %Up are the lowest and highest later lows
//! relative to the opening low. Rows are unique per opening volume (first
//! session wins) and sorted by (OpenIs, OpenVol).

use crate::domain::bar::BarSeries;
use crate::domain::numeric::{fraction_change, nan_mean, pct_change, round2};
use crate::domain::session::segment;
use crate::domain::statistic::{Diagnostic, GoboParams, StatisticTable, no_rows};
use crate::domain::table::{TextTable, fmt_value};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpenIs {
    Bad,
    Good,
}

impl fmt::Display for OpenIs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenIs::Bad => write!(f, "Bad"),
            OpenIs::Good => write!(f, "Good"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoboRow {
    pub open_is: OpenIs,
    pub open_vol: u64,
    /// Session the row was taken from.
    pub date: NaiveDate,
    pub pct_down: Option<f64>,
    pub pct_up: Option<f64>,
}

pub(crate) fn calculate(series: &BarSeries, params: &GoboParams) -> Result<StatisticTable, Diagnostic> {
    let bars = series.bars();
    let has_rsi = series.rsi().is_some();
    let mut rows = Vec::new();

    for session in segment(series) {
        let picked: Vec<usize> = session
            .range()
            .filter(|&i| !has_rsi || series.rsi_at(i).is_some())
            .take(params.n)
            .collect();
        let Some(&first) = picked.first() else {
            continue;
        };

        let closes: Vec<f64> = picked.iter().map(|&i| bars[i].close).collect();
        let open_is = match nan_mean(pct_change(&closes)) {
            Some(mean) if mean > 0.0 => OpenIs::Good,
            _ => OpenIs::Bad,
        };

        let open_low = bars[first].low;
        let later: Vec<f64> = picked[1..].iter().map(|&i| bars[i].low).collect();
        let excursion = |extreme: Option<f64>| {
            extreme
                .and_then(|v| fraction_change(open_low, v))
                .map(|c| round2(c * 100.0))
        };

        rows.push(GoboRow {
            open_is,
            open_vol: bars[first].volume,
            date: session.date,
            pct_down: excursion(later.iter().copied().reduce(f64::min)),
            pct_up: excursion(later.iter().copied().reduce(f64::max)),
        });
    }

    if rows.is_empty() {
        return Err(no_rows(series, 1));
    }

    let mut seen = HashSet::new();
    rows.retain(|r| seen.insert(r.open_vol));
    rows.sort_by_key(|r| (r.open_is, r.open_vol));
    Ok(StatisticTable::Gobo(rows))
}

pub(crate) fn to_text(rows: &[GoboRow]) -> TextTable {
    let mut table = TextTable::new(["OpenIs", "OpenVol"], ["Date", "%Down", "%Up"]);
    for row in rows {
        table.push(vec![
            row.open_is.to_string(),
            row.open_vol.to_string(),
            row.date.to_string(),
            fmt_value(row.pct_down),
            fmt_value(row.pct_up),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::statistic::test_support::*;

    fn rows_of(table: StatisticTable) -> Vec<GoboRow> {
        match table {
            StatisticTable::Gobo(rows) => rows,
            other => panic!("unexpected table {:?}", other),
        }
    }

    #[test]
    fn classifies_and_measures_excursions() {
        let mut bars = session_bars("2024-01-02", &[10.0, 11.0, 9.0, 12.0], &[500]);
        bars.extend(session_bars("2024-01-03", &[20.0, 19.0, 18.0], &[300]));
        let s = series("1m", bars);

        let rows = rows_of(calculate(&s, &GoboParams::default()).unwrap());
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].open_is, OpenIs::Bad);
        assert_eq!(rows[0].open_vol, 300);
        assert_eq!(rows[0].pct_down, Some(-10.0));
        assert_eq!(rows[0].pct_up, Some(-5.0));

        assert_eq!(rows[1].open_is, OpenIs::Good);
        assert_eq!(rows[1].open_vol, 500);
        assert_eq!(rows[1].pct_down, Some(-10.0));
        assert_eq!(rows[1].pct_up, Some(20.0));
    }

    #[test]
    fn deduplicates_by_opening_volume() {
        let mut bars = session_bars("2024-01-02", &[10.0, 11.0], &[700]);
        bars.extend(session_bars("2024-01-03", &[10.0, 9.0], &[700]));
        let s = series("1m", bars);

        let rows = rows_of(calculate(&s, &GoboParams::default()).unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn single_bar_session_is_bad_without_excursions() {
        let s = series("1m", session_bars("2024-01-02", &[10.0], &[100]));
        let rows = rows_of(calculate(&s, &GoboParams::default()).unwrap());
        assert_eq!(rows[0].open_is, OpenIs::Bad);
        assert_eq!(rows[0].pct_down, None);
        assert_eq!(rows[0].pct_up, None);
    }

    #[test]
    fn only_first_n_bars_count() {
        let s = series(
            "1m",
            session_bars("2024-01-02", &[10.0, 11.0, 5.0, 50.0], &[100]),
        );
        let rows = rows_of(calculate(&s, &GoboParams { n: 2 }).unwrap());
        assert_eq!(rows[0].open_is, OpenIs::Good);
        assert_eq!(rows[0].pct_down, Some(10.0));
        assert_eq!(rows[0].pct_up, Some(10.0));
    }

    #[test]
    fn skips_bars_without_oscillator_value() {
        let s = with_rsi(
            series("1m", session_bars("2024-01-02", &[10.0, 20.0, 22.0], &[100, 200, 300])),
            &[None, Some(50.0), Some(55.0)],
        );
        let rows = rows_of(calculate(&s, &GoboParams::default()).unwrap());
        assert_eq!(rows[0].open_vol, 200);
        assert_eq!(rows[0].pct_up, Some(10.0));
    }
}
