//! Environment-driven configuration for both services.
//!
//! Every value can come from the process environment (a `.env` file is
//! loaded by the binaries before this module is consulted). The API and
//! the bot read disjoint sections of the same `Settings` struct, so a
//! compose file can share one environment between containers.

use std::collections::HashSet;
use std::env;

use anyhow::{Context, Result};

/// Settings for the HTTP API server itself.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

impl ApiSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    /// Full connection string, including the password.
    pub fn dsn(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }

    /// Connection string with the password masked, safe for logs.
    pub fn dsn_as_safe_url(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.name
        )
    }
}

/// Qdrant vector store settings.
#[derive(Debug, Clone)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub collection_name: String,
    /// Dimension of the all-MiniLM-L6-v2 embeddings.
    pub vector_size: u64,
}

/// Telegram bot settings.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub token: String,
    pub admin_ids: HashSet<u64>,
    pub api_base_url: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub db: DatabaseSettings,
    pub qdrant: QdrantSettings,
}

impl Settings {
    /// Load API-side settings from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api: ApiSettings {
                host: env_or("API_HOST", "0.0.0.0"),
                port: parse_env("API_PORT", 8000)?,
            },
            db: DatabaseSettings {
                host: env_or("DATABASE_HOST", "localhost"),
                port: parse_env("DATABASE_PORT", 5432)?,
                name: env_or("DATABASE_NAME", "nomad"),
                user: env_or("DATABASE_USER", "nomad"),
                password: env_or("DATABASE_PASSWORD", "nomadpass"),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 50)?,
            },
            qdrant: QdrantSettings {
                url: env_or("QDRANT_URL", "http://localhost:6333"),
                api_key: env::var("QDRANT_API_KEY").ok().filter(|v| !v.is_empty()),
                collection_name: env_or("QDRANT_COLLECTION", "places"),
                vector_size: 384,
            },
        })
    }
}

impl BotSettings {
    /// Load bot-side settings from the environment.
    ///
    /// Fails when `BOT_TOKEN` is absent; the bot cannot authenticate
    /// without it.
    pub fn from_env() -> Result<Self> {
        let token = env::var("BOT_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .context("BOT_TOKEN must be set")?;

        Ok(Self {
            token,
            admin_ids: split_admin_ids(env::var("ADMIN_IDS").ok().as_deref()),
            api_base_url: env_or("API_BASE_URL", "http://localhost:8000"),
            data_dir: env_or("DATA_DIR", "/app/data"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.is_empty() => raw
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw}")),
        _ => Ok(default),
    }
}

/// Parse a comma-separated list of Telegram user ids, skipping junk.
pub fn split_admin_ids(raw: Option<&str>) -> HashSet<u64> {
    raw.map(|value| {
        value
            .split(',')
            .filter_map(|item| item.trim().parse().ok())
            .collect()
    })
    .unwrap_or_default()
}
