//! Oscillator-level outcome statistics (VolRSI, SimpleRSI).
//!
//! For each session and each integer oscillator level between the session's
//! minimum and maximum, the first bar reaching that level is the entry. From
//! the entry to session end every bar's low is compared to the entry low:
//! the share of bars at or below it (%Neg), above it (%Pos), the deepest
//! drawdown (%Loss) and the best gain (%Gain). Entries that never see a gain
//! have no %Gain and are left out of the aggregates.

use crate::domain::bar::BarSeries;
use crate::domain::numeric::{fraction_change, quantile, round2};
use crate::domain::statistic::{
    Diagnostic, StatisticMetadata, StatisticTable, no_rows, rsi_sessions, rsi_warmup,
};
use crate::domain::table::{TextTable, fmt_value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VolLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for VolLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VolLevel::Low => "Low",
            VolLevel::Medium => "Medium",
            VolLevel::High => "High",
        };
        write!(f, "{}", name)
    }
}

/// Aggregated outcome for one oscillator level.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiLevelRow {
    pub rsi: i64,
    /// Share of all qualifying entries that fall in this row.
    pub pct_all: f64,
    pub pct_neg: f64,
    pub pct_pos: f64,
    pub pct_loss: f64,
    pub pct_gain: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolRsiRow {
    pub vol_level: VolLevel,
    pub outcome: RsiLevelRow,
}

/// One entry: the first bar in a session at a given level.
#[derive(Debug, Clone, PartialEq)]
struct LevelOutcome {
    index: usize,
    level: i64,
    pct_neg: f64,
    pct_pos: f64,
    pct_loss: f64,
    pct_gain: Option<f64>,
}

/// Volume thresholds at the 80th and 90th percentile, truncated to whole shares.
#[derive(Debug, Clone, Copy, PartialEq)]
struct VolumeThresholds {
    low_max: u64,
    high_min: u64,
}

impl VolumeThresholds {
    fn from_volumes(volumes: &[f64]) -> Option<Self> {
        Some(Self {
            low_max: quantile(volumes, 0.80)?.trunc() as u64,
            high_min: quantile(volumes, 0.90)?.trunc() as u64,
        })
    }

    fn level(&self, volume: u64) -> VolLevel {
        if volume >= self.high_min {
            VolLevel::High
        } else if volume <= self.low_max {
            VolLevel::Low
        } else {
            VolLevel::Medium
        }
    }
}

fn level_outcomes(series: &BarSeries) -> Vec<LevelOutcome> {
    let bars = series.bars();
    let mut outcomes = Vec::new();

    for session in rsi_sessions(series) {
        let levels: Vec<i64> = session
            .iter()
            .map(|&(_, v)| v.round_ties_even() as i64)
            .collect();
        let (Some(&lo), Some(&hi)) = (levels.iter().min(), levels.iter().max()) else {
            continue;
        };

        for level in lo..=hi {
            let Some(pos) = levels.iter().position(|&l| l == level) else {
                continue;
            };
            let entry = bars[session[pos].0].low;
            let changes: Option<Vec<f64>> = session[pos..]
                .iter()
                .map(|&(i, _)| fraction_change(entry, bars[i].low).map(|c| round2(c * 100.0)))
                .collect();
            let Some(changes) = changes else {
                continue;
            };

            let total = changes.len() as f64;
            let neg: Vec<f64> = changes.iter().copied().filter(|c| *c <= 0.0).collect();
            let pos_changes: Vec<f64> = changes.iter().copied().filter(|c| *c > 0.0).collect();

            outcomes.push(LevelOutcome {
                index: session[pos].0,
                level,
                pct_neg: round2(neg.len() as f64 / total * 100.0),
                pct_pos: round2(pos_changes.len() as f64 / total * 100.0),
                pct_loss: round2(neg.iter().copied().fold(f64::INFINITY, f64::min)),
                pct_gain: pos_changes
                    .iter()
                    .copied()
                    .reduce(f64::max)
                    .map(round2),
            });
        }
    }

    outcomes
}

/// Running sums for one aggregation bucket.
#[derive(Default)]
struct Bucket {
    count: usize,
    neg: f64,
    pos: f64,
    loss: f64,
    gain: f64,
}

impl Bucket {
    fn add(&mut self, o: &LevelOutcome, gain: f64) {
        self.count += 1;
        self.neg += o.pct_neg;
        self.pos += o.pct_pos;
        self.loss += o.pct_loss;
        self.gain += gain;
    }

    fn finish(&self, rsi: i64, total: usize) -> RsiLevelRow {
        let n = self.count as f64;
        RsiLevelRow {
            rsi,
            pct_all: round2(n / total as f64 * 100.0),
            pct_neg: round2(self.neg / n),
            pct_pos: round2(self.pos / n),
            pct_loss: round2(self.loss / n),
            pct_gain: round2(self.gain / n),
        }
    }
}

pub(crate) fn calculate_vol_rsi(
    series: &BarSeries,
    metadata: &mut StatisticMetadata,
) -> Result<StatisticTable, Diagnostic> {
    let bars = series.bars();
    let volumes: Vec<f64> = rsi_sessions(series)
        .iter()
        .flatten()
        .map(|&(i, _)| bars[i].volume as f64)
        .collect();
    let thresholds = VolumeThresholds::from_volumes(&volumes)
        .ok_or_else(|| no_rows(series, rsi_warmup(series)))?;

    metadata.note("Low Vol", format!("Vol <= {}", thresholds.low_max));
    metadata.note(
        "Medium Vol",
        format!("{} < Vol < {}", thresholds.low_max, thresholds.high_min),
    );
    metadata.note("High Vol", format!("Vol >= {}", thresholds.high_min));

    let outcomes = level_outcomes(series);
    let mut buckets: BTreeMap<(VolLevel, i64), Bucket> = BTreeMap::new();
    let mut total = 0;
    for o in &outcomes {
        let Some(gain) = o.pct_gain else { continue };
        let vol_level = thresholds.level(bars[o.index].volume);
        buckets.entry((vol_level, o.level)).or_default().add(o, gain);
        total += 1;
    }

    if total == 0 {
        return Err(no_rows(series, rsi_warmup(series)));
    }

    let rows = buckets
        .iter()
        .map(|(&(vol_level, rsi), bucket)| VolRsiRow {
            vol_level,
            outcome: bucket.finish(rsi, total),
        })
        .collect();
    Ok(StatisticTable::VolRsi(rows))
}

pub(crate) fn calculate_simple_rsi(series: &BarSeries) -> Result<StatisticTable, Diagnostic> {
    let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();
    let mut total = 0;
    for o in &level_outcomes(series) {
        let Some(gain) = o.pct_gain else { continue };
        buckets.entry(o.level).or_default().add(o, gain);
        total += 1;
    }

    if total == 0 {
        return Err(no_rows(series, rsi_warmup(series)));
    }

    let rows = buckets
        .iter()
        .map(|(&rsi, bucket)| bucket.finish(rsi, total))
        .collect();
    Ok(StatisticTable::SimpleRsi(rows))
}

fn outcome_cells(row: &RsiLevelRow) -> Vec<String> {
    [row.pct_all, row.pct_neg, row.pct_pos, row.pct_loss, row.pct_gain]
        .iter()
        .map(|v| fmt_value(Some(*v)))
        .collect()
}

const OUTCOME_COLUMNS: [&str; 5] = ["%All", "%Neg", "%Pos", "%Loss", "%Gain"];

pub(crate) fn vol_rsi_text(rows: &[VolRsiRow]) -> TextTable {
    let mut table = TextTable::new(["VolLvl", "RSI"], OUTCOME_COLUMNS);
    for row in rows {
        let mut cells = vec![row.vol_level.to_string(), row.outcome.rsi.to_string()];
        cells.extend(outcome_cells(&row.outcome));
        table.push(cells);
    }
    table
}

pub(crate) fn simple_rsi_text(rows: &[RsiLevelRow]) -> TextTable {
    let mut table = TextTable::new(["RSI"], OUTCOME_COLUMNS);
    for row in rows {
        let mut cells = vec![row.rsi.to_string()];
        cells.extend(outcome_cells(row));
        table.push(cells);
    }
    table
}
