//! GitHub connection setup
//!
//! Picks an authentication mode (token or GitHub App installation) and builds
//! an `OctocrabClient` for github.com or a GitHub Enterprise Server instance.

use crate::{OctocrabClient, DEFAULT_HOST};
use anyhow::{Context, Result};
use log::{debug, info};
use octocrab::models::{AppId, InstallationId};
use octocrab::Octocrab;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolves GitHub tokens for a host
///
/// Tries multiple sources in order:
/// 1. Explicitly configured token
/// 2. Generic `GITHUB_TOKEN` or `GH_TOKEN`
/// 3. Host-specific env var (e.g., `GITHUB_TOKEN_GHE_EXAMPLE_COM`)
/// 4. `gh auth token --hostname {host}` command
#[derive(Debug, Clone)]
pub struct TokenResolver {
    /// Token passed in through configuration
    configured_token: Option<String>,
    /// Cached default token from GITHUB_TOKEN/GH_TOKEN
    default_token: Option<String>,
}

impl TokenResolver {
    /// Create a new token resolver
    pub fn new(configured_token: Option<String>) -> Self {
        let default_token = std::env::var("GITHUB_TOKEN")
            .or_else(|_| std::env::var("GH_TOKEN"))
            .ok()
            .filter(|t| !t.is_empty());

        Self {
            configured_token: configured_token.filter(|t| !t.is_empty()),
            default_token,
        }
    }

    /// Get a token for the given host
    pub async fn get_token(&self, host: &str) -> Result<String> {
        if let Some(ref token) = self.configured_token {
            debug!("Using configured token for host {}", host);
            return Ok(token.clone());
        }

        if let Some(ref token) = self.default_token {
            debug!("Using default token (GITHUB_TOKEN/GH_TOKEN) for host {}", host);
            return Ok(token.clone());
        }

        let env_key = host_env_key(host);
        if let Ok(token) = std::env::var(&env_key) {
            debug!("Using token from env var {} for host {}", env_key, host);
            return Ok(token);
        }

        debug!("Trying gh auth token for host {}", host);
        let output = tokio::process::Command::new("gh")
            .args(["auth", "token", "--hostname", host])
            .output()
            .await
            .context("Failed to run 'gh auth token'")?;

        if output.status.success() {
            let token = String::from_utf8(output.stdout)
                .context("Invalid UTF-8 in gh auth token output")?
                .trim()
                .to_string();
            if !token.is_empty() {
                debug!("Using token from gh CLI for host {}", host);
                return Ok(token);
            }
        }

        Err(anyhow::anyhow!(
            "No token found for host '{}'. \
             Set GITHUB_TOKEN, {} or run 'gh auth login --hostname {}'",
            host,
            env_key,
            host
        ))
    }
}

/// GitHub App installation credentials
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub app_id: u64,
    pub installation_id: u64,
    /// PEM encoded RSA private key of the app
    pub private_key_file: PathBuf,
}

/// Connection settings for the GitHub API
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Explicit API token
    pub token: Option<String>,
    /// GitHub App credentials, used when no explicit token is set
    pub app: Option<AppCredentials>,
    /// Base URL of a GitHub Enterprise Server (e.g., `https://ghe.example.com`)
    pub enterprise_url: Option<String>,
}

#[derive(Debug)]
enum Auth {
    Token(String),
    App(AppCredentials),
}

/// Explicit token, then app credentials, then the token lookup chain
async fn resolve_auth(options: &ConnectOptions, host: &str) -> Result<Auth> {
    if let Some(token) = options.token.as_ref().filter(|t| !t.is_empty()) {
        return Ok(Auth::Token(token.clone()));
    }
    if let Some(ref app) = options.app {
        return Ok(Auth::App(app.clone()));
    }

    TokenResolver::new(None)
        .get_token(host)
        .await
        .map(Auth::Token)
        .context(
            "No GitHub authentication configured: set a token (GITHUB_TOKEN) or \
             app credentials (GITHUB_APP_ID, GITHUB_APP_INSTALLATION_ID, GITHUB_APP_PRIVATE_KEY)",
        )
}

fn read_app_key(app: &AppCredentials) -> Result<jsonwebtoken::EncodingKey> {
    let pem = std::fs::read(&app.private_key_file).with_context(|| {
        format!(
            "Failed to read GitHub app private key {}",
            app.private_key_file.display()
        )
    })?;
    jsonwebtoken::EncodingKey::from_rsa_pem(&pem).with_context(|| {
        format!(
            "Invalid GitHub app private key {}",
            app.private_key_file.display()
        )
    })
}

/// Build an authenticated client from the given options
pub async fn connect(options: &ConnectOptions) -> Result<OctocrabClient> {
    let enterprise = options
        .enterprise_url
        .as_deref()
        .filter(|url| !url.is_empty());
    let host = enterprise.map(host_of).unwrap_or(DEFAULT_HOST);
    info!("Creating GitHub client for host: {}", host);

    let auth = resolve_auth(options, host).await?;
    let mut builder = match auth {
        Auth::Token(ref token) => {
            info!("Using GitHub token auth");
            Octocrab::builder().personal_token(token.clone())
        }
        Auth::App(ref app) => {
            info!(
                "Using GitHub app auth (app {}, installation {})",
                app.app_id, app.installation_id
            );
            Octocrab::builder().app(AppId(app.app_id), read_app_key(app)?)
        }
    };
    if let Some(url) = enterprise {
        let api_url = enterprise_api_url(url);
        debug!("Using GitHub Enterprise API at {}", api_url);
        builder = builder
            .base_uri(api_url.as_str())
            .context("Failed to set base URI")?;
    }

    let mut octocrab = builder.build().context("Failed to build Octocrab client")?;
    if let Auth::App(ref app) = auth {
        octocrab = octocrab
            .installation(InstallationId(app.installation_id))
            .context("Failed to create GitHub app installation client")?;
    }
    info!("GitHub client created for host: {}", host);

    Ok(OctocrabClient::new(Arc::new(octocrab)))
}

/// Env var name holding a token for `host`
fn host_env_key(host: &str) -> String {
    format!(
        "GITHUB_TOKEN_{}",
        host.replace(['.', '-'], "_").to_uppercase()
    )
}

/// Host part of a URL (`https://ghe.example.com/api/v3` -> `ghe.example.com`)
fn host_of(url: &str) -> &str {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme.split('/').next().unwrap_or(without_scheme)
}

/// Normalize an enterprise URL so it points at the REST API root
fn enterprise_api_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/api/v3") {
        trimmed.to_string()
    } else {
        format!("{}/api/v3", trimmed)
    }
}
