//! Port traits between the domain and the outside world.

pub mod config_port;
pub mod history_port;
pub mod report_port;
