//! Screening report export port.

use crate::domain::error::ScreenerError;
use crate::domain::screen::ScreeningSession;
use std::path::{Path, PathBuf};

pub trait ReportPort {
    /// Writes the Stats and Results sections of `session` to `path`.
    fn write(&self, session: &ScreeningSession, path: &Path) -> Result<(), ScreenerError>;

    /// Writes to `dir/name_YYYY-MM-DD.txt` and returns the path used.
    fn write_dated(
        &self,
        session: &ScreeningSession,
        dir: &Path,
        name: &str,
        date: chrono::NaiveDate,
    ) -> Result<PathBuf, ScreenerError> {
        let path = dir.join(format!("{}_{}.txt", name, date.format("%Y-%m-%d")));
        self.write(session, &path)?;
        Ok(path)
    }
}
