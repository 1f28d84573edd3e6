//! Domain error types.
//!
//! Only parameter and configuration problems abort a call. Thin or missing
//! data degrades to undefined values inside results (see
//! [`crate::domain::statistic::Diagnostic`]).

/// Top-level error type for barscreen.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("invalid {name} '{value}': {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("unsupported statistic '{0}' (expected one of FirstN, VolRSI, SimpleRSI, Gobo, HourlyChg)")]
    UnsupportedVariant(String),

    #[error("no data for {symbol} (period {period}, interval {interval})")]
    NoData {
        symbol: String,
        period: String,
        interval: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenerError {
    pub fn invalid(name: &str, value: &str, reason: impl Into<String>) -> Self {
        ScreenerError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) => 1,
            ScreenerError::InvalidParameter { .. }
            | ScreenerError::UnsupportedVariant(_)
            | ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::DataSource { .. } => 3,
            ScreenerError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
