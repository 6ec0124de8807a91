//! LGTM service binary.
//!
//! Standalone HTTP service that receives GitHub webhooks and manages the
//! `lgtm` label.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lgtm::{server, Config, GitHubApi, GitHubClient, GitHubOwnersResolver};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("lgtm=info".parse()?))
        .init();

    info!("Starting LGTM service...");

    let config = Config::default();
    let plugin_config = config
        .load_plugin_config()
        .context("Failed to load plugin configuration")?;
    info!(
        entries = plugin_config.lgtm.len(),
        "Loaded plugin configuration"
    );

    let token = config
        .github_token
        .as_deref()
        .context("GITHUB_TOKEN is required")?;

    let mut github = GitHubClient::new(
        token,
        &config.github_api_url,
        config.bot_login.as_deref().unwrap_or_default(),
    )
    .context("Failed to create GitHub client")?;

    if config.bot_login.is_none() {
        let login = github
            .fetch_authenticated_login()
            .await
            .context("Failed to look up the bot login; set LGTM_BOT_LOGIN to skip")?;
        github = github.with_bot_login(&login);
    }
    info!(bot = %github.bot_login(), "GitHub API client configured");

    if config.webhook_secret.is_none() {
        warn!("No GITHUB_WEBHOOK_SECRET configured - webhook signatures will not be verified");
    }

    let state = server::AppState {
        config: Arc::new(plugin_config),
        github: Arc::new(github.clone()),
        owners: Arc::new(GitHubOwnersResolver::new(github)),
        webhook_secret: config.webhook_secret.clone(),
    };

    let app = server::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, "LGTM service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
