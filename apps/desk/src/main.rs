use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use cli::Cli;
use shared_api::WebApiClient;
use shared_config::AppConfig;
use shared_utils::session::FileSessionStore;
use shared_utils::NotificationCenter;

/// Everything a command needs: one API client (and so one session) shared by every service.
pub struct Desk {
    pub config: AppConfig,
    pub api: WebApiClient,
    pub notifier: NotificationCenter,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hospital_desk=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    info!("Hospital desk talking to {}", config.api_base_url);

    let session = Arc::new(FileSessionStore::open(&config.session_file));
    debug!("Session file: {}", session.path().display());
    let api = WebApiClient::new(&config, session)?;

    let desk = Desk {
        config,
        api,
        notifier: NotificationCenter::new(),
    };
    commands::run(&desk, cli.command).await
}
