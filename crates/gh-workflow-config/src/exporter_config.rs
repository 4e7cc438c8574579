//! Exporter configuration
//!
//! Configuration loaded from a TOML file. Every field has a default so a
//! partial file (or none at all) is valid; `validate` checks the values
//! that have no sensible default.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::duration::serde_duration;

/// Exporter configuration loaded from gh-workflow-exporter.toml
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ExporterConfig {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// GitHub connection and scrape scope
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GitHubConfig {
    /// Organization whose repositories are scraped
    #[serde(default)]
    pub organization: String,

    /// GitHub Enterprise Server URL (self hosted)
    #[serde(default)]
    pub enterprise_url: Option<String>,

    /// Personal access token, never written back out
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// GitHub App authentication, used when no token is set
    #[serde(default)]
    pub app: GitHubAppConfig,

    #[serde(default)]
    pub workflows: WorkflowsConfig,

    #[serde(default)]
    pub repositories: RepositoriesConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GitHubAppConfig {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub installation_id: Option<u64>,

    /// Path to the app's PEM encoded private key
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,
}

impl GitHubAppConfig {
    /// Whether any app setting is present
    pub fn is_configured(&self) -> bool {
        self.id.is_some() || self.installation_id.is_some() || self.private_key_file.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkflowsConfig {
    /// How far back workflow runs are fetched
    #[serde(default = "default_timeframe", with = "serde_duration")]
    pub timeframe: Duration,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RepositoriesConfig {
    /// Repository custom properties exported as `prop_<name>` labels
    #[serde(default)]
    pub custom_properties: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScrapeConfig {
    /// Time between the start of two scrape cycles
    #[serde(default = "default_scrape_interval", with = "serde_duration")]
    pub interval: Duration,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Listen address of the metrics server
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Limit for reading a request
    #[serde(default = "default_read_timeout", with = "serde_duration")]
    pub read_timeout: Duration,

    /// Limit for producing a response
    #[serde(default = "default_write_timeout", with = "serde_duration")]
    pub write_timeout: Duration,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LogConfig {
    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,

    /// Log one JSON object per line
    #[serde(default)]
    pub json: bool,
}

fn default_timeframe() -> Duration {
    Duration::from_secs(168 * 60 * 60)
}

fn default_scrape_interval() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_write_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for WorkflowsConfig {
    fn default() -> Self {
        Self {
            timeframe: default_timeframe(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            interval: default_scrape_interval(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            read_timeout: default_read_timeout(),
            write_timeout: default_write_timeout(),
        }
    }
}

impl ExporterConfig {
    /// Load config from `path`, the working directory or the user config
    /// directory, falling back to defaults when no file exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match crate::load_config_file(path)? {
            Some((source, content)) => {
                let config = Self::from_toml(&content)
                    .with_context(|| format!("Failed to parse config file: {}", source.display()))?;
                log::info!("Loaded exporter config from {}", source.display());
                Ok(config)
            }
            None => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render the config as TOML (the token is never included)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize config")
    }

    /// Check values that have no usable default
    pub fn validate(&self) -> Result<()> {
        if self.github.organization.trim().is_empty() {
            bail!("GitHub organization is not set");
        }
        if self.github.workflows.timeframe.is_zero() {
            bail!("workflow timeframe must be greater than zero");
        }
        if self.scrape.interval.is_zero() {
            bail!("scrape interval must be greater than zero");
        }
        if self.server.bind.trim().is_empty() {
            bail!("server bind address is not set");
        }
        if self.server.read_timeout.is_zero() || self.server.write_timeout.is_zero() {
            bail!("server timeouts must be greater than zero");
        }
        self.validate_app()?;
        self.validate_custom_properties()
    }

    fn validate_app(&self) -> Result<()> {
        let app = &self.github.app;
        if !app.is_configured() {
            return Ok(());
        }
        if app.id.is_none() {
            bail!("GitHub app id is not set");
        }
        if app.installation_id.is_none() {
            bail!("GitHub app installation id is not set");
        }
        if app.private_key_file.is_none() {
            bail!("GitHub app private key file is not set");
        }
        Ok(())
    }

    /// Every custom property must map to its own `prop_<name>` label
    fn validate_custom_properties(&self) -> Result<()> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for name in &self.github.repositories.custom_properties {
            if name.trim().is_empty() {
                bail!("custom property names must not be empty");
            }
            let label = property_label_name(name);
            if let Some(previous) = seen.insert(label.clone(), name) {
                bail!(
                    "custom properties '{}' and '{}' both map to label {}",
                    previous,
                    name,
                    label
                );
            }
        }
        Ok(())
    }
}

/// Label name of a custom property: `prop_<name>` with every character
/// outside `[a-zA-Z0-9_]` replaced by `_`
pub fn property_label_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("prop_{}", sanitized)
}
