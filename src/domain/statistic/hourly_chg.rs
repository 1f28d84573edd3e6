//! HourlyChg: low-price range over the first three trading hours.
//!
//! With `k` bars per hour, each session's first `3k + 1` bars are split into
//! three windows. Window `h` ends before bar `(h + 1)(k + 1)`; each later
//! window starts on the last bar of the one before it, so the inclusive
//! spans are `0..=k`, `k..=2k+1` and `2k+1..=3k`. A window's change is
//! `|1 - max/min| * 100` of its lows. Volume is cumulative over all bars
//! taken.

use crate::domain::bar::BarSeries;
use crate::domain::numeric::{nan_mean, round2};
use crate::domain::session::segment;
use crate::domain::statistic::{Diagnostic, StatisticMetadata, StatisticTable, VariantOutput};
use crate::domain::table::{TextTable, fmt_value};
use chrono::NaiveDate;

pub const HOURS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyChgRow {
    pub date: NaiveDate,
    pub pct_chg: [Option<f64>; HOURS],
    pub volume: u64,
}

/// Cross-session averages. Each field is undefined when no session
/// contributes a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlySummary {
    pub pct_chg_1: Option<f64>,
    pub pct_chg_2: Option<f64>,
    pub pct_chg_3: Option<f64>,
    pub avg_volume: Option<u64>,
}

/// Bars per hour for intervals that divide an hour evenly.
pub fn bars_per_hour(minutes: u32) -> Option<usize> {
    if minutes == 0 || 60 % minutes != 0 {
        None
    } else {
        Some((60 / minutes) as usize)
    }
}

/// Half-open bar range of hour `hour` (0-based).
fn window_bounds(hour: usize, per_hour: usize) -> (usize, usize) {
    let end = (hour + 1) * (per_hour + 1);
    let start = if hour == 0 { 0 } else { hour * (per_hour + 1) - 1 };
    (start, end)
}

fn window_change(lows: &[f64]) -> Option<f64> {
    let min = lows.iter().copied().reduce(f64::min)?;
    let max = lows.iter().copied().reduce(f64::max)?;
    if min == 0.0 {
        return None;
    }
    Some(round2((1.0 - max / min).abs() * 100.0))
}

pub(crate) fn calculate(
    series: &BarSeries,
    metadata: &mut StatisticMetadata,
) -> Result<VariantOutput, Diagnostic> {
    let per_hour = series
        .interval
        .minutes()
        .and_then(bars_per_hour)
        .ok_or(Diagnostic::UnsupportedInterval(series.interval))?;
    let n = HOURS * per_hour + 1;
    metadata.note("Bars", n);
    metadata.note("Bars per hour", per_hour);

    let bars = series.bars();
    let mut rows = Vec::new();
    for session in segment(series) {
        let head = &bars[session.head(n)];
        let lows: Vec<f64> = head.iter().map(|b| b.low).collect();

        let mut pct_chg = [None; HOURS];
        for (hour, slot) in pct_chg.iter_mut().enumerate() {
            let (start, end) = window_bounds(hour, per_hour);
            let start = start.min(lows.len());
            let end = end.min(lows.len());
            *slot = window_change(&lows[start..end]);
        }

        rows.push(HourlyChgRow {
            date: session.date,
            pct_chg,
            volume: head.iter().map(|b| b.volume).sum(),
        });
    }

    if rows.is_empty() {
        return Err(Diagnostic::NoSessions);
    }

    let mean_of = |hour: usize| nan_mean(rows.iter().map(|r| r.pct_chg[hour])).map(round2);
    let summary = HourlySummary {
        pct_chg_1: mean_of(0),
        pct_chg_2: mean_of(1),
        pct_chg_3: mean_of(2),
        avg_volume: nan_mean(rows.iter().map(|r| Some(r.volume as f64))).map(|v| v as u64),
    };

    metadata.note("Avg %Chg1", fmt_value(summary.pct_chg_1));
    metadata.note("Avg %Chg2", fmt_value(summary.pct_chg_2));
    metadata.note("Avg %Chg3", fmt_value(summary.pct_chg_3));
    metadata.note(
        "Avg Volume",
        summary
            .avg_volume
            .map_or_else(|| "NaN".to_string(), |v| v.to_string()),
    );

    Ok(VariantOutput {
        table: StatisticTable::HourlyChg(rows),
        summary: Some(summary),
    })
}

pub(crate) fn to_text(rows: &[HourlyChgRow]) -> TextTable {
    let mut table = TextTable::new(["Date"], ["%Chg1", "%Chg2", "%Chg3", "Volume"]);
    for row in rows {
        table.push(vec![
            row.date.to_string(),
            fmt_value(row.pct_chg[0]),
            fmt_value(row.pct_chg[1]),
            fmt_value(row.pct_chg[2]),
            row.volume.to_string(),
        ]);
    }
    table
}
