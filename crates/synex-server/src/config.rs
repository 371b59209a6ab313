//! Server configuration.
//!
//! # Load order
//!
//! 1. Default values
//! 2. TOML file (`--config`, or `synex.toml` in the working directory)
//! 3. Environment variables (`SYNEX_*`)
//!
//! Each layer overrides the previous. A missing default file is ignored;
//! a missing file named on the command line is an error.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use synex_auth::{AuthConfig, PermissionConfig};
use synex_db::DbConfig;
use thiserror::Error;
use tracing::debug;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "synex.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },
}

impl ConfigError {
    fn invalid_env_var(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Everything the server needs at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub permissions: PermissionConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "synex=info".into(),
            json: true,
        }
    }
}

impl ServerConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Builds a [`ServerConfig`] from defaults, a TOML file and the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this file instead of [`DEFAULT_CONFIG_FILE`]. It must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    pub fn load(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.path {
            Some(path) => load_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    load_file(path)?
                } else {
                    ServerConfig::default()
                }
            }
        };

        if !self.skip_env {
            apply_env(&mut config, |name| std::env::var(name).ok())?;
        }
        Ok(config)
    }
}

fn load_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let config = ServerConfig::from_toml(&content).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Apply `SYNEX_*` overrides, reading variables through `lookup`.
fn apply_env(
    config: &mut ServerConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let string_vars: [(&str, &mut String); 9] = [
        ("SYNEX_DB_URL", &mut config.db.url),
        ("SYNEX_DB_NAMESPACE", &mut config.db.namespace),
        ("SYNEX_DB_DATABASE", &mut config.db.database),
        ("SYNEX_DB_USERNAME", &mut config.db.username),
        ("SYNEX_DB_PASSWORD", &mut config.db.password),
        ("SYNEX_JWT_PRIVATE_KEY_PEM", &mut config.auth.jwt_private_key_pem),
        ("SYNEX_JWT_PUBLIC_KEY_PEM", &mut config.auth.jwt_public_key_pem),
        ("SYNEX_JWT_ISSUER", &mut config.auth.jwt_issuer),
        ("SYNEX_LOG", &mut config.log.filter),
    ];
    for (name, field) in string_vars {
        if let Some(value) = lookup(name) {
            *field = value;
        }
    }

    let bool_vars: [(&str, &mut bool); 3] = [
        ("SYNEX_OVERRIDES_ENABLED", &mut config.permissions.overrides_enabled),
        ("SYNEX_ADMIN_BYPASS", &mut config.permissions.admin_bypass),
        ("SYNEX_LOG_JSON", &mut config.log.json),
    ];
    for (name, field) in bool_vars {
        if let Some(value) = lookup(name) {
            *field = parse_bool(&value)
                .ok_or_else(|| ConfigError::invalid_env_var(name, "expected bool"))?;
        }
    }

    if let Some(value) = lookup("SYNEX_ACCESS_TOKEN_LIFETIME_SECS") {
        config.auth.access_token_lifetime_secs = value.trim().parse().map_err(|_| {
            ConfigError::invalid_env_var("SYNEX_ACCESS_TOKEN_LIFETIME_SECS", "expected seconds")
        })?;
    }

    if let Some(value) = lookup("SYNEX_ADMIN_ROLES") {
        config.permissions.admin_roles = value
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
    }

    Ok(())
}

/// Accepts `true/false`, `1/0`, `yes/no`, `on/off`, case-insensitively.
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
