//! Domain logic: bars, sessions, the oscillator, statistics and screening.

pub mod bar;
pub mod config_validation;
pub mod error;
pub mod history;
pub mod indicator;
pub mod numeric;
pub mod period;
pub mod screen;
pub mod session;
pub mod statistic;
pub mod table;
