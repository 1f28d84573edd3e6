//! Plain-text table rendering for statistic and screening output.
//!
//! Index columns are left-aligned, value columns right-aligned; undefined
//! values render as `NaN`.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextTable {
    pub index: Vec<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => "NaN".to_string(),
    }
}

impl TextTable {
    pub fn new<I, C>(index: I, columns: C) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            index: index.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row; index cells first, then value cells.
    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .index
            .iter()
            .chain(self.columns.iter())
            .map(|h| h.len())
            .collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }
        widths
    }
}

impl fmt::Display for TextTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return write!(f, "Empty table");
        }
        let widths = self.widths();
        let n_index = self.index.len();

        let header: Vec<String> = self
            .index
            .iter()
            .chain(self.columns.iter())
            .zip(&widths)
            .enumerate()
            .map(|(i, (h, w))| {
                if i < n_index {
                    format!("{:<w$}", h, w = w)
                } else {
                    format!("{:>w$}", h, w = w)
                }
            })
            .collect();
        write!(f, "{}", header.join("  ").trim_end())?;

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (c, w))| {
                    if i < n_index {
                        format!("{:<w$}", c, w = w)
                    } else {
                        format!("{:>w$}", c, w = w)
                    }
                })
                .collect();
            write!(f, "\n{}", cells.join("  ").trim_end())?;
        }
        Ok(())
    }
}
