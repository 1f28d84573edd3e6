//! FirstN: market-open behaviour over the first `n` bars of each session.
//!
//! Bars without an oscillator value are dropped after taking the first `n`.
//! Each session tags its oscillator and price extremes and expresses every
//! bar's volume and low price relative to the session's opening bar.

use crate::domain::bar::BarSeries;
use crate::domain::numeric::{argmax, argmin, fraction_change, round2};
use crate::domain::session::segment;
use crate::domain::statistic::{Diagnostic, FirstNParams, StatisticTable, no_rows, rsi_warmup};
use crate::domain::table::{TextTable, fmt_value};
use chrono::{NaiveDate, NaiveTime};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    MinRsi,
    MinPrice,
    MaxRsi,
    MaxPrice,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Event::MinRsi => "MinRSI",
            Event::MinPrice => "MinPrice",
            Event::MaxRsi => "MaxRSI",
            Event::MaxPrice => "MaxPrice",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FirstNRow {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Tags in MinRSI, MinPrice, MaxRSI, MaxPrice order.
    pub events: Vec<Event>,
    /// Volume as a percentage of the session's opening-bar volume.
    pub pct_vol: Option<f64>,
    pub rsi: f64,
    /// Low-price change from the session's first bar, in percent.
    pub pct_chg: Option<f64>,
}

pub(crate) fn calculate(
    series: &BarSeries,
    params: &FirstNParams,
) -> Result<StatisticTable, Diagnostic> {
    let bars = series.bars();
    let mut rows = Vec::new();

    for session in segment(series) {
        let picked: Vec<(usize, f64)> = session
            .head(params.n)
            .filter_map(|i| series.rsi_at(i).map(|v| (i, v)))
            .collect();
        let Some(&(first, _)) = picked.first() else {
            continue;
        };

        let rsis: Vec<f64> = picked.iter().map(|&(_, v)| v).collect();
        let lows: Vec<f64> = picked.iter().map(|&(i, _)| bars[i].low).collect();
        let tags = [
            (argmin(&rsis), Event::MinRsi),
            (argmin(&lows), Event::MinPrice),
            (argmax(&rsis), Event::MaxRsi),
            (argmax(&lows), Event::MaxPrice),
        ];

        let open_volume = bars[first].volume;
        let open_low = bars[first].low;

        for (pos, &(i, rsi)) in picked.iter().enumerate() {
            let bar = &bars[i];
            let events = tags
                .iter()
                .filter(|(at, _)| *at == Some(pos))
                .map(|&(_, event)| event)
                .collect();
            let pct_vol = if open_volume == 0 {
                None
            } else {
                Some(round2(bar.volume as f64 / open_volume as f64 * 100.0))
            };
            rows.push(FirstNRow {
                date: session.date,
                time: bar.timestamp.time(),
                events,
                pct_vol,
                rsi,
                pct_chg: fraction_change(open_low, bar.low).map(|c| round2(c * 100.0)),
            });
        }
    }

    if rows.is_empty() {
        return Err(no_rows(series, rsi_warmup(series)));
    }
    Ok(StatisticTable::FirstN(rows))
}

pub(crate) fn to_text(rows: &[FirstNRow]) -> TextTable {
    let mut table = TextTable::new(["Date", "Time"], ["Event", "%Vol", "RSI", "%Chg"]);
    for row in rows {
        let events: Vec<String> = row.events.iter().map(Event::to_string).collect();
        table.push(vec![
            row.date.to_string(),
            row.time.format("%H:%M:%S").to_string(),
            events.join(" "),
            fmt_value(row.pct_vol),
            fmt_value(Some(row.rsi)),
            fmt_value(row.pct_chg),
        ]);
    }
    table
}
