//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use tally_identity::{IdentityError, TokenTable};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Originator token settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// How long a writer waits for the database lock, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "tally_events=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Originator token configuration.
///
/// Tokens are credentials; `Debug` prints only how many are configured.
#[derive(Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Token → region code table.
    #[serde(default)]
    pub key_claim_tokens: BTreeMap<String, String>,

    /// Tokens in `token=region:token=region` form. Replaces
    /// `key_claim_tokens` when set.
    #[serde(default)]
    pub key_claim_token: Option<String>,
}

impl AuthConfig {
    /// Builds the token table the process authenticates originators with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Tokens` for a malformed token list, for a
    /// table entry with an empty token or region, or for two table keys that
    /// name the same token once trimmed.
    pub fn token_table(&self) -> Result<TokenTable, ConfigError> {
        if let Some(list) = &self.key_claim_token {
            return Ok(TokenTable::parse(list)?);
        }

        let mut pairs = Vec::with_capacity(self.key_claim_tokens.len());
        let mut seen = HashSet::new();
        for (index, (token, region)) in self.key_claim_tokens.iter().enumerate() {
            let (token, region) = (token.trim(), region.trim());
            if token.is_empty() || region.is_empty() {
                return Err(IdentityError::MalformedTokenEntry { index }.into());
            }
            if !seen.insert(token) {
                return Err(IdentityError::DuplicateToken { index }.into());
            }
            pairs.push((token, region));
        }

        Ok(TokenTable::from_pairs(pairs))
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("key_claim_tokens", &self.key_claim_tokens.len())
            .field("key_claim_token", &self.key_claim_token.is_some())
            .finish()
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> String {
    "tally.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    tally_db::DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    tally_db::DbRuntimeSettings::default().pool_max_size
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    /// Pool tunables for [`tally_db::create_pool`].
    pub fn runtime_settings(&self) -> tally_db::DbRuntimeSettings {
        tally_db::DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The originator token settings are invalid.
    #[error("invalid key claim tokens: {0}")]
    Tokens(#[from] IdentityError),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `TALLY_HOST` overrides `server.host`
/// - `TALLY_PORT` overrides `server.port`
/// - `TALLY_DB_PATH` overrides `database.path`
/// - `TALLY_LOG_LEVEL` overrides `logging.level`
/// - `TALLY_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `KEY_CLAIM_TOKEN` overrides `auth.key_claim_token`
///
/// The token settings are validated before returning.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if the token settings are malformed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.auth.token_table()?;

    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("TALLY_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("TALLY_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = var("TALLY_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("TALLY_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("TALLY_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(list) = var("KEY_CLAIM_TOKEN") {
        config.auth.key_claim_token = Some(list);
    }
}
