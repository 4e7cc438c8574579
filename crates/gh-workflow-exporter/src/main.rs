use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gh_client::{AppCredentials, ConnectOptions};
use gh_workflow_config::{format_duration, ExporterConfig, GitHubAppConfig};
use gh_workflow_metrics::WalkSettings;

mod cli;
mod exposition;
mod logger;
mod scheduler;
mod server;
mod store;

use cli::Args;
use scheduler::Scheduler;
use store::MetricStore;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut config = ExporterConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    logger::init(&config.log);
    config.validate()?;

    log::info!("Starting gh-workflow-exporter v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Effective config:\n{}", config.to_toml()?);

    let org = config.github.organization.clone();
    let client = gh_client::connect(&ConnectOptions {
        token: config.github.token.clone(),
        app: app_credentials(&config.github.app),
        enterprise_url: config.github.enterprise_url.clone(),
    })
    .await?;
    client
        .verify_organization(&org)
        .await
        .with_context(|| format!("Unable to fetch GitHub organization '{}'", org))?;

    log::info!(
        "Scraping {} every {} (runs of the last {})",
        org,
        format_duration(config.scrape.interval),
        format_duration(config.github.workflows.timeframe)
    );

    let store = Arc::new(MetricStore::new());
    let settings = WalkSettings {
        organization: org,
        lookback: config.github.workflows.timeframe,
        custom_properties: config.github.repositories.custom_properties.clone(),
    };
    let scheduler = Scheduler::new(
        Arc::new(client),
        settings,
        config.scrape.interval,
        store.clone(),
    );
    tokio::spawn(scheduler.run());

    server::serve(&config.server, store).await
}

/// App credentials when all app settings are present (checked by `validate`)
fn app_credentials(app: &GitHubAppConfig) -> Option<AppCredentials> {
    Some(AppCredentials {
        app_id: app.id?,
        installation_id: app.installation_id?,
        private_key_file: app.private_key_file.clone()?,
    })
}
