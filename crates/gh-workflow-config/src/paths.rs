//! Configuration file locations
//!
//! Uses XDG directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.config/gh-workflow-exporter/config.toml`
//! - macOS: `~/Library/Application Support/gh-workflow-exporter/config.toml`
//! - Windows: `%APPDATA%\gh-workflow-exporter\config.toml`

use std::path::PathBuf;

pub(crate) const APP_NAME: &str = "gh-workflow-exporter";

/// Config file looked up in the current working directory
pub const LOCAL_CONFIG_FILE: &str = "gh-workflow-exporter.toml";

/// Get the application config directory, if the platform has one
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_NAME))
}

/// Get path to the global config file
pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_path() {
        if let Some(path) = global_config_path() {
            assert!(path.ends_with("config.toml"));
            assert!(path.parent().unwrap().ends_with(APP_NAME));
        }
    }
}
