mod config;
mod links;
mod reply;
mod resolver;
mod telegram;
mod update;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::resolver::HttpResolver;
use crate::telegram::TelegramSender;
use crate::webhook::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tiklink=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let webhook_path = config.webhook_path();
    info!("Configuration loaded successfully");
    info!("  Bind address: {}", config.server.bind_address);
    info!("  Webhook path: {}", webhook_path);
    info!("  Resolver: {}", config.resolver.endpoint);

    let bot = Bot::new(&config.telegram.bot_token);

    if let Some(url) = &config.telegram.webhook_url {
        if let Err(e) = register_webhook(&bot, url).await {
            warn!("Webhook registration failed: {:#}", e);
        }
    }

    let state = Arc::new(AppState::new(
        Arc::new(TelegramSender::new(bot)),
        Arc::new(HttpResolver::new(config.resolver.clone())),
    ));
    let app = webhook::router(state, &webhook_path);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_address))?;

    info!("Webhook server listening on {}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                // Without a signal handler, keep serving until the process is killed.
                std::future::pending::<()>().await;
            }
            info!("Shutting down...");
        })
        .await
        .context("Server error")?;

    Ok(())
}

async fn register_webhook(bot: &Bot, url: &str) -> Result<()> {
    let url = reqwest::Url::parse(url).with_context(|| format!("Invalid webhook_url: {}", url))?;
    bot.set_webhook(url.clone())
        .await
        .context("setWebhook request failed")?;
    info!("Registered webhook {}", url);
    Ok(())
}
