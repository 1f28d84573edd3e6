//! Plain-text screening report adapter implementing ReportPort.

use std::fs;
use std::path::Path;

use crate::domain::error::ScreenerError;
use crate::domain::screen::ScreeningSession;
use crate::ports::report_port::ReportPort;

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for TextReportAdapter {
    fn write(&self, session: &ScreeningSession, path: &Path) -> Result<(), ScreenerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, session.report())?;
        Ok(())
    }
}
