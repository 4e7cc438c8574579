use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::paths::{global_config_path, LOCAL_CONFIG_FILE};

/// Load config file content
///
/// With an explicit `path` the file must exist. Otherwise searches for:
/// 1. `gh-workflow-exporter.toml` in the current working directory
/// 2. `config.toml` in the user config directory
///
/// Returns the file path and content if found, None otherwise.
pub fn load_config_file(path: Option<&Path>) -> Result<Option<(PathBuf, String)>> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        return Ok(Some((path.to_path_buf(), content)));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if let Ok(content) = std::fs::read_to_string(&local) {
        log::debug!("Loaded config from {}", local.display());
        return Ok(Some((local, content)));
    }

    if let Some(global) = global_config_path() {
        if let Ok(content) = std::fs::read_to_string(&global) {
            log::debug!("Loaded config from {}", global.display());
            return Ok(Some((global, content)));
        }
    }

    Ok(None)
}
