//! Logging to stderr using env_logger
//!
//! The level comes from `RUST_LOG` (default `info`); `log.debug` forces
//! debug output for the exporter crates. With `log.json` every record is
//! written as a single JSON object per line.

use std::io::Write;

use env_logger::{Builder, Env};
use gh_workflow_config::LogConfig;
use log::{LevelFilter, Record};

/// Crates whose debug output is enabled by `log.debug`
const EXPORTER_CRATES: &[&str] = &[
    "gh_workflow_exporter",
    "gh_workflow_metrics",
    "gh_workflow_config",
    "gh_client",
];

/// Initialize the global logger
pub fn init(config: &LogConfig) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    if config.debug {
        for name in EXPORTER_CRATES {
            builder.filter_module(name, LevelFilter::Debug);
        }
    }

    if config.json {
        builder.format(|buf, record| {
            let line = json_line(record, &chrono::Utc::now().to_rfc3339());
            writeln!(buf, "{}", line)
        });
    } else {
        builder.format_timestamp_secs();
    }

    builder.init();
}

fn json_line(record: &Record, time: &str) -> serde_json::Value {
    serde_json::json!({
        "time": time,
        "level": record.level().as_str().to_lowercase(),
        "target": record.target(),
        "msg": record.args().to_string(),
    })
}
