//! # configs
//!
//! Environment-sourced settings for the Campus-Board binary. Everything is
//! read from `CB__`-prefixed variables (a local `.env` file is honored),
//! e.g. `CB__SERVER__PORT=8080`, `CB__DATABASE__URL=postgres://...`.
//! Secrets stay wrapped in `SecretString` so they never hit logs.

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[cfg(feature = "db-postgres")]
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: SecretString,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[cfg(feature = "auth-jwt")]
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    /// Token lifetime in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,
}

#[cfg(feature = "media-local")]
#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    #[serde(default = "default_media_root")]
    pub root: String,
    #[serde(default = "default_media_prefix")]
    pub url_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[cfg(feature = "db-postgres")]
    pub database: DatabaseSettings,
    #[cfg(feature = "auth-jwt")]
    pub auth: AuthSettings,
    #[cfg(feature = "media-local")]
    #[serde(default)]
    pub media: MediaSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[cfg(feature = "media-local")]
impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            url_prefix: default_media_prefix(),
        }
    }
}

impl Settings {
    /// Loads settings from the process environment, honoring `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        // Missing .env is the common production case, not an error.
        if dotenvy::dotenv().is_err() {
            tracing::debug!("no .env file found; relying on process environment");
        }
        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("CB")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(feature = "db-postgres")]
fn default_max_connections() -> u32 {
    10
}

#[cfg(feature = "auth-jwt")]
fn default_token_ttl() -> i64 {
    60 * 24
}

#[cfg(feature = "media-local")]
fn default_media_root() -> String {
    "./data/uploads".to_string()
}

#[cfg(feature = "media-local")]
fn default_media_prefix() -> String {
    "/static/uploads".to_string()
}
