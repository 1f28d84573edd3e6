//! Screening evaluator.
//!
//! [`screen`] evaluates a [`Criterion`] for every symbol and appends one row
//! per symbol to an explicit [`ScreeningSession`]. Symbols are independent,
//! so they may be evaluated on a worker pool; rows are always appended in
//! sorted-symbol order.

pub mod criterion;

pub use criterion::{Criterion, Evaluation, StatValue};

use crate::domain::error::ScreenerError;
use crate::domain::table::TextTable;
use crate::ports::history_port::HistoryPort;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Inputs shared by every criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenParams {
    /// Upper bound (exclusive) on history age in whole years; MaxAge only.
    pub max_age: Option<u32>,
    /// Date ages are measured against.
    pub as_of: NaiveDate,
    /// Worker threads; 1 evaluates sequentially.
    pub jobs: usize,
}

impl ScreenParams {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            max_age: None,
            as_of,
            jobs: 1,
        }
    }
}

impl Default for ScreenParams {
    fn default() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

/// Accumulated stats and results of one screening run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreeningSession {
    criterion: Criterion,
    rows: Vec<Evaluation>,
}

impl ScreeningSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    pub fn rows(&self) -> &[Evaluation] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Clears both accumulated tables.
    pub fn reset(&mut self) {
        self.rows.clear();
        info!("cleared screening session");
    }

    /// Computed values keyed by symbol. `None` until a row is appended.
    pub fn stats_table(&self) -> Option<TextTable> {
        if self.rows.is_empty() {
            return None;
        }
        let mut table = TextTable::new(["Stock"], self.criterion.columns().iter().copied());
        for row in &self.rows {
            let mut cells = vec![row.symbol.clone()];
            cells.extend(row.stats.iter().map(StatValue::to_string));
            table.push(cells);
        }
        Some(table)
    }

    /// Predicate outcomes keyed by symbol. `None` until a row is appended.
    pub fn results_table(&self) -> Option<TextTable> {
        if self.rows.is_empty() {
            return None;
        }
        let columns = (1..=self.criterion.predicates()).map(|k| format!("Criterion_{}", k));
        let mut table = TextTable::new(["Stock"], columns);
        for row in &self.rows {
            let mut cells = vec![row.symbol.clone()];
            cells.extend(
                row.checks
                    .iter()
                    .map(|&c| if c { "True" } else { "False" }.to_string()),
            );
            table.push(cells);
        }
        Some(table)
    }

    /// Stats and Results sections, as exported.
    pub fn report(&self) -> String {
        let show = |t: Option<TextTable>| t.map_or_else(|| "None".to_string(), |t| t.to_string());
        format!(
            "--- Stats ---\n{}\n\n--- Results ---\n{}\n",
            show(self.stats_table()),
            show(self.results_table())
        )
    }

    /// Criterion description followed by the report.
    pub fn summary(&self) -> String {
        format!("{}\n{}", self.criterion.description(), self.report())
    }

    fn append(&mut self, criterion: Criterion, evaluations: Vec<Evaluation>) {
        if criterion != self.criterion && !self.rows.is_empty() {
            info!(from = %self.criterion, to = %criterion, "criterion changed, clearing session");
            self.rows.clear();
        }
        self.criterion = criterion;
        self.rows.extend(evaluations);
    }
}

/// Evaluates `criterion` for each distinct symbol and returns those that
/// pass every predicate, sorted.
pub fn screen<S: AsRef<str>>(
    session: &mut ScreeningSession,
    port: &dyn HistoryPort,
    symbols: &[S],
    criterion: Criterion,
    params: &ScreenParams,
) -> Result<Vec<String>, ScreenerError> {
    criterion.check_params(params)?;
    if params.jobs == 0 {
        return Err(ScreenerError::invalid("jobs", "0", "must be at least 1"));
    }

    let symbols: Vec<String> = symbols
        .iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    info!(%criterion, symbols = symbols.len(), jobs = params.jobs, "screening");

    let evaluate = |symbol: &String| {
        debug!(%symbol, "screening symbol");
        criterion.evaluate(port, symbol, params)
    };

    let evaluations: Vec<Evaluation> = if params.jobs > 1 && symbols.len() > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.jobs)
            .build()
            .map_err(|e| ScreenerError::invalid("jobs", &params.jobs.to_string(), e.to_string()))?;
        pool.install(|| symbols.par_iter().map(evaluate).collect())
    } else {
        symbols.iter().map(evaluate).collect()
    };

    let passed: Vec<String> = evaluations
        .iter()
        .filter(|e| e.passed())
        .map(|e| e.symbol.clone())
        .collect();
    session.append(criterion, evaluations);

    info!(%criterion, passed = passed.len(), "screen complete");
    Ok(passed)
}
