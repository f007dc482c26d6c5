use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Environment variable that overrides `[telegram] bot_token`.
pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";

/// Environment variable that overrides the port of `[server] bind_address`.
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Public URL registered with `setWebhook` at startup, if set.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            webhook_path: default_webhook_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResolverConfig {
    #[serde(default = "default_resolver_endpoint")]
    pub endpoint: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_resolver_endpoint(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/api/telegram".to_string()
}

fn default_resolver_endpoint() -> String {
    "https://nikahin.xyz/cok.php".to_string()
}

impl Config {
    /// Load the config file if it exists, then apply environment overrides.
    ///
    /// A missing file is fine: every field has a default and the token
    /// usually comes from `TELEGRAM_TOKEN`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Config::default()
        };

        config.apply_overrides(
            std::env::var(TOKEN_ENV).ok(),
            std::env::var(PORT_ENV).ok(),
        )?;

        if !config.has_token() {
            warn!("{} not set and no bot_token configured; Telegram calls will fail", TOKEN_ENV);
        }

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML")
    }

    fn apply_overrides(&mut self, token: Option<String>, port: Option<String>) -> Result<()> {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = token.trim().to_string();
        }

        if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid port: {}", PORT_ENV, port))?;
            let host = self
                .server
                .bind_address
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or(self.server.bind_address.as_str());
            self.server.bind_address = format!("{}:{}", host, port);
        }

        Ok(())
    }

    pub fn has_token(&self) -> bool {
        !self.telegram.bot_token.is_empty()
    }

    /// Webhook path normalized to start with `/`.
    pub fn webhook_path(&self) -> String {
        let path = self.server.webhook_path.trim();
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        }
    }
}
