//! Command line arguments
//!
//! Every option can also be set through the environment. Options given here
//! override the config file.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use gh_workflow_config::{parse_duration, ExporterConfig};

#[derive(Parser, Debug, Default)]
#[command(name = "gh-workflow-exporter", version)]
#[command(about = "Prometheus exporter for GitHub Actions workflow runs")]
pub struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// GitHub organization name
    #[arg(long = "github-organization", env = "GITHUB_ORGANIZATION")]
    pub organization: Option<String>,

    /// GitHub enterprise url (self hosted)
    #[arg(long = "github-enterprise-url", env = "GITHUB_ENTERPRISE_URL")]
    pub enterprise_url: Option<String>,

    /// GitHub personal access token
    #[arg(long = "github-token", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub app auth: App ID
    #[arg(long = "github-app-id", env = "GITHUB_APP_ID")]
    pub app_id: Option<u64>,

    /// GitHub app auth: App installation ID
    #[arg(long = "github-app-installation-id", env = "GITHUB_APP_INSTALLATION_ID")]
    pub app_installation_id: Option<u64>,

    /// GitHub app auth: Private key (path to file)
    #[arg(long = "github-app-keyfile", env = "GITHUB_APP_PRIVATE_KEY")]
    pub app_private_key_file: Option<PathBuf>,

    /// How far back workflow runs are fetched (e.g. 168h)
    #[arg(
        long = "github-workflows-timeframe",
        env = "GITHUB_WORKFLOWS_TIMEFRAME",
        value_parser = duration_arg
    )]
    pub timeframe: Option<Duration>,

    /// Repository custom properties exported as labels (comma separated)
    #[arg(
        long = "github-repositories-customprops",
        env = "GITHUB_REPOSITORIES_CUSTOMPROPERTIES",
        value_delimiter = ','
    )]
    pub custom_properties: Vec<String>,

    /// Time between scrape cycles (e.g. 30m)
    #[arg(long = "scrape-time", env = "SCRAPE_TIME", value_parser = duration_arg)]
    pub scrape_interval: Option<Duration>,

    /// Server address
    #[arg(long = "server-bind", env = "SERVER_BIND")]
    pub bind: Option<String>,

    /// Server read timeout (e.g. 5s)
    #[arg(long = "server-timeout-read", env = "SERVER_TIMEOUT_READ", value_parser = duration_arg)]
    pub read_timeout: Option<Duration>,

    /// Server write timeout (e.g. 10s)
    #[arg(long = "server-timeout-write", env = "SERVER_TIMEOUT_WRITE", value_parser = duration_arg)]
    pub write_timeout: Option<Duration>,

    /// Debug logging
    #[arg(long = "log-debug", env = "LOG_DEBUG")]
    pub log_debug: bool,

    /// Log output as JSON lines
    #[arg(long = "log-json", env = "LOG_JSON")]
    pub log_json: bool,
}

fn duration_arg(value: &str) -> Result<Duration, String> {
    parse_duration(value).map_err(|e| e.to_string())
}

impl Args {
    /// Override config values with the ones given on the command line
    pub fn apply(&self, config: &mut ExporterConfig) {
        if let Some(ref org) = self.organization {
            config.github.organization = org.clone();
        }
        if let Some(ref url) = self.enterprise_url {
            config.github.enterprise_url = Some(url.clone());
        }
        if let Some(ref token) = self.token {
            config.github.token = Some(token.clone());
        }
        if let Some(id) = self.app_id {
            config.github.app.id = Some(id);
        }
        if let Some(id) = self.app_installation_id {
            config.github.app.installation_id = Some(id);
        }
        if let Some(ref path) = self.app_private_key_file {
            config.github.app.private_key_file = Some(path.clone());
        }
        if let Some(timeframe) = self.timeframe {
            config.github.workflows.timeframe = timeframe;
        }
        if !self.custom_properties.is_empty() {
            config.github.repositories.custom_properties = self
                .custom_properties
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Some(interval) = self.scrape_interval {
            config.scrape.interval = interval;
        }
        if let Some(ref bind) = self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(timeout) = self.read_timeout {
            config.server.read_timeout = timeout;
        }
        if let Some(timeout) = self.write_timeout {
            config.server.write_timeout = timeout;
        }
        config.log.debug |= self.log_debug;
        config.log.json |= self.log_json;
    }
}
