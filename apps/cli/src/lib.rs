//! # mhost CLI
//!
//! Operator tool over a host configuration file: lists shells with their feature order,
//! prints the global feature order and shows which shell a request would be routed to.
//!
//! Commands write to any [`std::io::Write`] so they can be exercised without a terminal.

pub mod args;
pub mod commands;
pub mod features;

use mhost::domain::config::HostConfig;
use mhost_logger::LogConfig;
use serde::Deserialize;

/// Everything the binary reads from its config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub host: HostConfig,
    pub log: LogConfig,
}
