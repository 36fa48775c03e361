//! # configs
//!
//! Layered settings: built-in defaults, then an optional `config/default.toml`,
//! then `CBRA__SECTION__KEY` environment variables (a `.env` file is read
//! first if present). Secrets stay wrapped in [`SecretString`].

use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub storage: StorageSettings,
    pub policy: PolicySettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: Option<SecretString>,
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Root directory for case file attachments.
    pub root: PathBuf,
    pub max_upload_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicySettings {
    /// `warn` or `enforce`; how a reviewer holding two roles is handled.
    pub reviewer_policy: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Settings {
    /// Defaults only; callers add sources or overrides on top.
    pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.max_connections", 10)?
            .set_default("auth.token_ttl_secs", 8 * 60 * 60)?
            .set_default("storage.root", "./data")?
            .set_default("storage.max_upload_bytes", 2 * 1024 * 1024)?
            .set_default("policy.reviewer_policy", "warn")?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?)
    }

    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(%err, "ignoring unreadable .env file");
            }
        }

        let config = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("CBRA")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid { key: "server.port", reason: "must be non-zero".into() });
        }
        if !matches!(self.policy.reviewer_policy.to_ascii_lowercase().as_str(), "warn" | "enforce") {
            return Err(ConfigError::Invalid {
                key: "policy.reviewer_policy",
                reason: format!("expected 'warn' or 'enforce', got '{}'", self.policy.reviewer_policy),
            });
        }
        if cfg!(feature = "db-postgres") && self.database.url.is_none() {
            return Err(ConfigError::Missing("database.url"));
        }
        if cfg!(feature = "auth-jwt") && self.auth.jwt_secret.is_none() {
            return Err(ConfigError::Missing("auth.jwt_secret"));
        }
        Ok(())
    }
}
