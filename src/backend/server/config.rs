/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration and
 * the database connection built from it.
 *
 * # Configuration Sources
 *
 * Configuration is read from environment variables (after `dotenv` has
 * loaded a `.env` file, if present), with defaults for local development:
 *
 * | Key                  | Default                         |
 * |----------------------|---------------------------------|
 * | `HOST`               | `0.0.0.0`                       |
 * | `PORT`               | `5000`                          |
 * | `DATABASE_URL`       | `sqlite://todolist.db?mode=rwc` |
 * | `JWT_SECRET`         | unset                           |
 * | `CHAT_PAGE_SIZE`     | `20`                            |
 * | `CHAT_MAX_PAGE_SIZE` | `100`                           |
 * | `RUST_LOG`           | `info,taskchat=debug`           |
 *
 * # Error Handling
 *
 * Unlike optional integrations, a bad value here aborts startup with a
 * `ConfigError`.
 */

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::lookup_host;

use crate::backend::store::{SqliteStore, StoreError};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://todolist.db?mode=rwc";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_LOG_FILTER: &str = "info,taskchat=debug";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    ZeroValue { key: &'static str },
    #[error("CHAT_PAGE_SIZE ({page_size}) exceeds CHAT_MAX_PAGE_SIZE ({max_page_size})")]
    PageSizeAboveMax { page_size: u32, max_page_size: u32 },
    #[error("invalid bind address: {0}")]
    InvalidAddress(String),
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// When unset, signed tokens are not accepted and only raw identifiers resolve
    pub jwt_secret: Option<String>,
    /// History page size when the client does not ask for one
    pub page_size: u32,
    /// Upper bound applied to a client-supplied `per_page`
    pub max_page_size: u32,
    /// Fallback `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            jwt_secret: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfigBuilder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(host) = get("HOST") {
            builder = builder.host(host);
        }
        if let Some(port) = get("PORT") {
            builder = builder.port(parse_number("PORT", &port)?);
        }
        if let Some(url) = get("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Some(secret) = get("JWT_SECRET") {
            builder = builder.jwt_secret(secret);
        }
        if let Some(size) = get("CHAT_PAGE_SIZE") {
            builder = builder.page_size(parse_number("CHAT_PAGE_SIZE", &size)?);
        }
        if let Some(size) = get("CHAT_MAX_PAGE_SIZE") {
            builder = builder.max_page_size(parse_number("CHAT_MAX_PAGE_SIZE", &size)?);
        }

        builder.build()
    }

    /// Socket address to bind
    ///
    /// `HOST` may be an IP literal or a host name; names resolve to their
    /// first address.
    pub async fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let invalid = || ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port));
        lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|_| invalid())?
            .next()
            .ok_or_else(invalid)
    }

    /// Clamp a requested page size to `[1, max_page_size]`
    pub fn clamp_page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.page_size)
            .clamp(1, self.max_page_size)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    page_size: Option<u32>,
    max_page_size: Option<u32>,
    log_filter: Option<String>,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = Some(size);
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let defaults = ServerConfig::default();
        let config = ServerConfig {
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            database_url: self.database_url.unwrap_or(defaults.database_url),
            jwt_secret: self.jwt_secret,
            page_size: self.page_size.unwrap_or(defaults.page_size),
            max_page_size: self.max_page_size.unwrap_or(defaults.max_page_size),
            log_filter: self.log_filter.unwrap_or(defaults.log_filter),
        };

        if config.page_size == 0 {
            return Err(ConfigError::ZeroValue {
                key: "CHAT_PAGE_SIZE",
            });
        }
        if config.max_page_size == 0 {
            return Err(ConfigError::ZeroValue {
                key: "CHAT_MAX_PAGE_SIZE",
            });
        }
        if config.page_size > config.max_page_size {
            return Err(ConfigError::PageSizeAboveMax {
                page_size: config.page_size,
                max_page_size: config.max_page_size,
            });
        }

        Ok(config)
    }
}

/// Open the SQLite database and apply migrations
///
/// # Errors
///
/// Startup cannot continue without the message store, so connection and
/// migration failures are returned rather than swallowed.
pub async fn load_database(config: &ServerConfig) -> Result<SqliteStore, StoreError> {
    let store = SqliteStore::connect(&config.database_url).await.map_err(|e| {
        tracing::error!("[Server] Failed to open database {}: {}", config.database_url, e);
        e
    })?;
    tracing::info!("[Server] Database ready");
    Ok(store)
}
