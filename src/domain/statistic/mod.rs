//! Statistic engine.
//!
//! Five calculation variants over a [`BarSeries`], dispatched through
//! [`compute`]. Every variant fails soft: insufficient data or a missing
//! oscillator produces an empty table plus a [`Diagnostic`], never an error.

pub mod first_n;
pub mod gobo;
pub mod hourly_chg;
pub mod rsi_outcome;

use crate::domain::bar::BarSeries;
use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::period::{Interval, Period};
use crate::domain::table::TextTable;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub use first_n::{Event, FirstNRow};
pub use gobo::{GoboRow, OpenIs};
pub use hourly_chg::{HourlyChgRow, HourlySummary};
pub use rsi_outcome::{RsiLevelRow, VolLevel, VolRsiRow};

/// Layout version of the derived tables.
pub const TABLE_VERSION: u32 = 1;

/// Bars taken from the start of each session by FirstN and Gobo.
pub const DEFAULT_FIRST_N: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatisticKind {
    FirstN,
    VolRsi,
    SimpleRsi,
    Gobo,
    HourlyChg,
}

impl StatisticKind {
    pub const ALL: [StatisticKind; 5] = [
        StatisticKind::FirstN,
        StatisticKind::VolRsi,
        StatisticKind::SimpleRsi,
        StatisticKind::Gobo,
        StatisticKind::HourlyChg,
    ];

    /// Whether the variant reads the oscillator column.
    pub fn needs_rsi(&self) -> bool {
        matches!(
            self,
            StatisticKind::FirstN | StatisticKind::VolRsi | StatisticKind::SimpleRsi
        )
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatisticKind::FirstN => "FirstN",
            StatisticKind::VolRsi => "VolRSI",
            StatisticKind::SimpleRsi => "SimpleRSI",
            StatisticKind::Gobo => "Gobo",
            StatisticKind::HourlyChg => "HourlyChg",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for StatisticKind {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatisticKind::ALL
            .into_iter()
            .find(|k| k.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScreenerError::UnsupportedVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstNParams {
    /// Bars taken from the start of every session.
    pub n: usize,
}

impl Default for FirstNParams {
    fn default() -> Self {
        Self { n: DEFAULT_FIRST_N }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoboParams {
    /// Bars taken from the start of every session.
    pub n: usize,
}

impl Default for GoboParams {
    fn default() -> Self {
        Self { n: DEFAULT_FIRST_N }
    }
}

/// A statistic request: the variant plus its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    FirstN(FirstNParams),
    VolRsi,
    SimpleRsi,
    Gobo(GoboParams),
    /// Bars per hour are derived from the series interval.
    HourlyChg,
}

impl Statistic {
    /// Builds a request from a kind, applying `n` to the variants that take it.
    pub fn new(kind: StatisticKind, n: Option<usize>) -> Result<Self, ScreenerError> {
        let n = match n {
            Some(0) => return Err(ScreenerError::invalid("n", "0", "must be at least 1")),
            Some(n) => n,
            None => DEFAULT_FIRST_N,
        };
        Ok(match kind {
            StatisticKind::FirstN => Statistic::FirstN(FirstNParams { n }),
            StatisticKind::VolRsi => Statistic::VolRsi,
            StatisticKind::SimpleRsi => Statistic::SimpleRsi,
            StatisticKind::Gobo => Statistic::Gobo(GoboParams { n }),
            StatisticKind::HourlyChg => Statistic::HourlyChg,
        })
    }

    pub fn kind(&self) -> StatisticKind {
        match self {
            Statistic::FirstN(_) => StatisticKind::FirstN,
            Statistic::VolRsi => StatisticKind::VolRsi,
            Statistic::SimpleRsi => StatisticKind::SimpleRsi,
            Statistic::Gobo(_) => StatisticKind::Gobo,
            Statistic::HourlyChg => StatisticKind::HourlyChg,
        }
    }

    fn params(&self) -> Vec<(String, String)> {
        match self {
            Statistic::FirstN(p) => vec![("n".into(), p.n.to_string())],
            Statistic::Gobo(p) => vec![("n".into(), p.n.to_string())],
            _ => Vec::new(),
        }
    }
}

/// Why a result came back empty.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    MissingPrerequisite { indicator: &'static str },
    NoSessions,
    InsufficientHistory { bars: usize, minimum: usize },
    UnsupportedInterval(Interval),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingPrerequisite { indicator } => {
                write!(f, "series does not have the {} indicator", indicator)
            }
            Diagnostic::NoSessions => write!(f, "series has no sessions"),
            Diagnostic::InsufficientHistory { bars, minimum } => {
                write!(f, "insufficient history: have {} bars, need {}", bars, minimum)
            }
            Diagnostic::UnsupportedInterval(interval) => {
                write!(f, "interval {} does not divide an hour", interval)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticMetadata {
    pub symbol: String,
    pub period: Period,
    pub interval: Interval,
    pub version: u32,
    pub params: Vec<(String, String)>,
    /// Values derived during the calculation (thresholds, averages).
    pub notes: Vec<(String, String)>,
}

impl StatisticMetadata {
    fn for_series(series: &BarSeries, params: Vec<(String, String)>) -> Self {
        Self {
            symbol: series.symbol.clone(),
            period: series.period,
            interval: series.interval,
            version: TABLE_VERSION,
            params,
            notes: Vec::new(),
        }
    }

    pub fn note(&mut self, key: &str, value: impl ToString) {
        self.notes.push((key.to_string(), value.to_string()));
    }
}

impl fmt::Display for StatisticMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Symbol: {}", self.symbol)?;
        writeln!(f, "Period: {}", self.period)?;
        writeln!(f, "Interval: {}", self.interval)?;
        write!(f, "Version: {}", self.version)?;
        for (k, v) in self.params.iter().chain(self.notes.iter()) {
            write!(f, "\n{}: {}", k, v)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatisticTable {
    FirstN(Vec<FirstNRow>),
    VolRsi(Vec<VolRsiRow>),
    SimpleRsi(Vec<RsiLevelRow>),
    Gobo(Vec<GoboRow>),
    HourlyChg(Vec<HourlyChgRow>),
}

impl StatisticTable {
    fn empty(kind: StatisticKind) -> Self {
        match kind {
            StatisticKind::FirstN => StatisticTable::FirstN(Vec::new()),
            StatisticKind::VolRsi => StatisticTable::VolRsi(Vec::new()),
            StatisticKind::SimpleRsi => StatisticTable::SimpleRsi(Vec::new()),
            StatisticKind::Gobo => StatisticTable::Gobo(Vec::new()),
            StatisticKind::HourlyChg => StatisticTable::HourlyChg(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StatisticTable::FirstN(rows) => rows.len(),
            StatisticTable::VolRsi(rows) => rows.len(),
            StatisticTable::SimpleRsi(rows) => rows.len(),
            StatisticTable::Gobo(rows) => rows.len(),
            StatisticTable::HourlyChg(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_text(&self) -> TextTable {
        match self {
            StatisticTable::FirstN(rows) => first_n::to_text(rows),
            StatisticTable::VolRsi(rows) => rsi_outcome::vol_rsi_text(rows),
            StatisticTable::SimpleRsi(rows) => rsi_outcome::simple_rsi_text(rows),
            StatisticTable::Gobo(rows) => gobo::to_text(rows),
            StatisticTable::HourlyChg(rows) => hourly_chg::to_text(rows),
        }
    }
}

/// A derived table with its metadata. Immutable once returned.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticResult {
    pub kind: StatisticKind,
    pub metadata: StatisticMetadata,
    pub table: StatisticTable,
    /// Cross-session averages, HourlyChg only.
    pub summary: Option<HourlySummary>,
    pub diagnostic: Option<Diagnostic>,
}

impl StatisticResult {
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Display for StatisticResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.kind)?;
        writeln!(f, "--- Metadata ---")?;
        writeln!(f, "{}", self.metadata)?;
        if let Some(diag) = &self.diagnostic {
            writeln!(f, "Diagnostic: {}", diag)?;
        }
        writeln!(f, "--- Data ---")?;
        writeln!(f, "{}", self.table.to_text())
    }
}

/// Output of one variant before it is wrapped into a result.
pub(crate) struct VariantOutput {
    pub table: StatisticTable,
    pub summary: Option<HourlySummary>,
}

impl From<StatisticTable> for VariantOutput {
    fn from(table: StatisticTable) -> Self {
        Self {
            table,
            summary: None,
        }
    }
}

/// Runs `statistic` over `series`.
pub fn compute(statistic: &Statistic, series: &BarSeries) -> StatisticResult {
    let kind = statistic.kind();
    let mut metadata = StatisticMetadata::for_series(series, statistic.params());
    debug!(symbol = %series.symbol, statistic = %kind, bars = series.len(), "calculating");

    let outcome = if kind.needs_rsi() && series.rsi().is_none() {
        Err(Diagnostic::MissingPrerequisite { indicator: "RSI" })
    } else {
        match statistic {
            Statistic::FirstN(params) => first_n::calculate(series, params).map(VariantOutput::from),
            Statistic::VolRsi => {
                rsi_outcome::calculate_vol_rsi(series, &mut metadata).map(VariantOutput::from)
            }
            Statistic::SimpleRsi => {
                rsi_outcome::calculate_simple_rsi(series).map(VariantOutput::from)
            }
            Statistic::Gobo(params) => gobo::calculate(series, params).map(VariantOutput::from),
            Statistic::HourlyChg => hourly_chg::calculate(series, &mut metadata),
        }
    };

    match outcome {
        Ok(output) => StatisticResult {
            kind,
            metadata,
            table: output.table,
            summary: output.summary,
            diagnostic: None,
        },
        Err(diagnostic) => {
            warn!(symbol = %series.symbol, statistic = %kind, %diagnostic, "empty statistic");
            StatisticResult {
                kind,
                metadata,
                table: StatisticTable::empty(kind),
                summary: None,
                diagnostic: Some(diagnostic),
            }
        }
    }
}

/// Looks a variant up by name, then runs it.
pub fn compute_named(
    name: &str,
    n: Option<usize>,
    series: &BarSeries,
) -> Result<StatisticResult, ScreenerError> {
    let statistic = Statistic::new(name.parse()?, n)?;
    Ok(compute(&statistic, series))
}

/// Diagnostic for a variant that found no usable rows.
pub(crate) fn no_rows(series: &BarSeries, minimum: usize) -> Diagnostic {
    if series.is_empty() {
        Diagnostic::NoSessions
    } else {
        Diagnostic::InsufficientHistory {
            bars: series.len(),
            minimum,
        }
    }
}

/// Bars needed before the attached oscillator has its first value.
pub(crate) fn rsi_warmup(series: &BarSeries) -> usize {
    match series.rsi().map(|s| s.indicator_type) {
        Some(IndicatorType::Rsi(window)) => window + 1,
        None => 1,
    }
}

/// Bars with a defined oscillator value grouped by session, as
/// (series index, oscillator value). Sessions left empty are skipped.
pub(crate) fn rsi_sessions(series: &BarSeries) -> Vec<Vec<(usize, f64)>> {
    crate::domain::session::segment(series)
        .iter()
        .map(|s| {
            s.range()
                .filter_map(|i| series.rsi_at(i).map(|v| (i, v)))
                .collect::<Vec<_>>()
        })
        .filter(|g| !g.is_empty())
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn kind_round_trips_names() {
        for kind in StatisticKind::ALL {
            assert_eq!(kind.to_string().parse::<StatisticKind>().unwrap(), kind);
        }
        assert_eq!("volrsi".parse::<StatisticKind>().unwrap(), StatisticKind::VolRsi);
    }

    #[test]
    fn unknown_name_is_unsupported_variant() {
        let s = series("1m", session_bars("2024-01-02", &[1.0], &[]));
        let err = compute_named("Sharpe", None, &s).unwrap_err();
        assert!(matches!(err, ScreenerError::UnsupportedVariant(name) if name == "Sharpe"));
    }

    #[test]
    fn zero_n_is_invalid() {
        assert!(Statistic::new(StatisticKind::FirstN, Some(0)).is_err());
    }

    #[test]
    fn defaults_apply_n() {
        let s = Statistic::new(StatisticKind::Gobo, None).unwrap();
        assert_eq!(s, Statistic::Gobo(GoboParams { n: 9 }));
        let s = Statistic::new(StatisticKind::FirstN, Some(5)).unwrap();
        assert_eq!(s, Statistic::FirstN(FirstNParams { n: 5 }));
    }

    #[test]
    fn missing_oscillator_is_soft_failure() {
        let s = series("1m", session_bars("2024-01-02", &[1.0, 2.0, 3.0], &[]));
        for kind in [StatisticKind::FirstN, StatisticKind::VolRsi, StatisticKind::SimpleRsi] {
            let result = compute(&Statistic::new(kind, None).unwrap(), &s);
            assert!(result.is_empty());
            assert_eq!(
                result.diagnostic,
                Some(Diagnostic::MissingPrerequisite { indicator: "RSI" })
            );
        }
    }

    #[test]
    fn empty_series_reports_no_sessions() {
        let s = series("1m", vec![]);
        let result = compute(&Statistic::HourlyChg, &s);
        assert!(result.is_empty());
        assert!(result.summary.is_none());
        assert_eq!(result.diagnostic, Some(Diagnostic::NoSessions));
    }

    #[test]
    fn display_has_sections() {
        let s = series("1m", session_bars("2024-01-02", &[1.0, 2.0], &[]));
        let text = compute(&Statistic::Gobo(GoboParams::default()), &s).to_string();
        assert!(text.starts_with("=== Gobo ===\n--- Metadata ---\nSymbol: TEST\n"));
        assert!(text.contains("n: 9"));
        assert!(text.contains("--- Data ---\n"));
    }

    #[test]
    fn rsi_sessions_skip_undefined() {
        let mut bars = session_bars("2024-01-02", &[1.0, 2.0], &[]);
        bars.extend(session_bars("2024-01-03", &[3.0, 4.0], &[]));
        let s = with_rsi(series("1m", bars), &[None, None, Some(40.0), None]);
        assert_eq!(rsi_sessions(&s), vec![vec![(2, 40.0)]]);
    }
}
