//! Configuration for gh-workflow-exporter
//!
//! This crate provides:
//! - Config file lookup (working directory, then user config directory)
//! - The exporter configuration (`ExporterConfig`)
//! - Human readable duration parsing (`168h`, `1h30m`)

pub mod config_file;
pub mod duration;
pub mod exporter_config;
pub mod paths;

pub use config_file::load_config_file;
pub use duration::{format_duration, parse_duration};
pub use exporter_config::{
    property_label_name, ExporterConfig, GitHubAppConfig, GitHubConfig, LogConfig,
    RepositoriesConfig, ScrapeConfig, ServerConfig, WorkflowsConfig,
};
