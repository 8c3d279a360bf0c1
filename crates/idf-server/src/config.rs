//! Server configuration
//!
//! Layered lowest to highest: defaults, optional TOML file, environment,
//! command line flags.

use idf_auth::{verifying_key_from_hex, AuthError, SignedTokenVerifier};
use idf_store::PgConnectionOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error("identity: {0}")]
    Identity(#[from] AuthError),

    #[error("no identity public key configured (set AUTH_PUBLIC_KEY)")]
    MissingPublicKey,

    #[error("no identity issuer configured (set AUTH_ISSUER)")]
    MissingIssuer,

    #[error("no identity audience configured (set AUTH_AUDIENCE)")]
    MissingAudience,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// PostgreSQL settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: Option<String>,
    pub max_conns: u32,
}

impl DatabaseConfig {
    /// Store connection options for these settings
    #[must_use]
    pub fn connect_options(&self) -> PgConnectionOptions {
        PgConnectionOptions {
            app_name: String::from("identifire"),
            host: self.host.clone(),
            port: self.port,
            database: self.name.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            max_conns: self.max_conns,
            ..PgConnectionOptions::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: PgConnectionOptions::DEFAULT_HOST.to_string(),
            port: PgConnectionOptions::DEFAULT_PORT,
            name: PgConnectionOptions::DEFAULT_DATABASE.to_string(),
            username: String::from("postgres"),
            password: None,
            max_conns: PgConnectionOptions::DEFAULT_MAX_CONNS,
        }
    }
}

/// Identity token settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Expected `iss`
    pub issuer: Option<String>,
    /// Expected `aud`
    pub audience: Option<String>,
    /// Email is read from `<namespace>/email`
    pub namespace: Option<String>,
    /// Hex ed25519 verifying key
    pub public_key: Option<String>,
}

impl IdentityConfig {
    /// Verifier for these settings
    pub fn verifier(&self) -> Result<SignedTokenVerifier, ConfigError> {
        let key = self
            .public_key
            .as_deref()
            .ok_or(ConfigError::MissingPublicKey)?;
        let issuer = required(self.issuer.as_deref()).ok_or(ConfigError::MissingIssuer)?;
        let audience = required(self.audience.as_deref()).ok_or(ConfigError::MissingAudience)?;
        Ok(
            SignedTokenVerifier::new(verifying_key_from_hex(key)?, issuer, audience)
                .with_namespace(self.namespace.as_deref()),
        )
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    /// Frontend build served for non-API paths
    pub static_dir: Option<PathBuf>,
    pub log_format: LogFormat,
    /// Use the in-memory store instead of PostgreSQL
    pub in_memory: bool,
}

impl ServerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with a TOML file, if given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Overlay process environment variables
    pub fn with_process_env(self) -> Result<Self, ConfigError> {
        self.with_env(|key| std::env::var(key).ok())
    }

    /// Overlay variables from `lookup`
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(port) = parse_var(&lookup, "PORT")? {
            self.port = port;
        }
        if let Some(host) = lookup("DATABASE_HOST") {
            self.database.host = host;
        }
        if let Some(port) = parse_var(&lookup, "DATABASE_PORT")? {
            self.database.port = port;
        }
        if let Some(name) = lookup("DATABASE_NAME") {
            self.database.name = name;
        }
        if let Some(username) = lookup("DATABASE_USERNAME") {
            self.database.username = username;
        }
        if let Some(password) = lookup("DATABASE_PASSWORD") {
            self.database.password = Some(password);
        }
        if let Some(issuer) = lookup("AUTH_ISSUER") {
            self.identity.issuer = Some(issuer);
        }
        if let Some(audience) = lookup("AUTH_AUDIENCE") {
            self.identity.audience = Some(audience);
        }
        if let Some(namespace) = lookup("AUTH_NAMESPACE") {
            self.identity.namespace = Some(namespace);
        }
        if let Some(key) = lookup("AUTH_PUBLIC_KEY") {
            self.identity.public_key = Some(key);
        }
        Ok(self)
    }

    /// With listen port
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// With listen host
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// With static frontend directory
    #[inline]
    #[must_use]
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// With log format
    #[inline]
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// With in-memory storage
    #[inline]
    #[must_use]
    pub fn with_in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// `host:port` to bind
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 5000,
            database: DatabaseConfig::default(),
            identity: IdentityConfig::default(),
            static_dir: None,
            log_format: LogFormat::default(),
            in_memory: false,
        }
    }
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { key, value })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::new();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 8080\nlog_format = \"json\"\n[database]\nname = \"from_file\"\nhost = \"db\""
        )
        .unwrap();

        let config = ServerConfig::load(Some(file.path()))
            .unwrap()
            .with_env(env(&[("DATABASE_NAME", "from_env"), ("AUTH_NAMESPACE", "https://idf")]))
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.name, "from_env");
        assert_eq!(config.identity.namespace.as_deref(), Some("https://idf"));
    }

    #[test]
    fn test_bad_port_is_reported() {
        let err = ServerConfig::new()
            .with_env(env(&[("PORT", "eighty")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid value for PORT: 'eighty'");
    }

    #[test]
    fn test_verifier_needs_key() {
        assert!(matches!(
            IdentityConfig::default().verifier(),
            Err(ConfigError::MissingPublicKey)
        ));

        let key = idf_auth::generate_signing_key().verifying_key();
        let identity = IdentityConfig {
            issuer: Some("https://identity.example/".to_string()),
            audience: Some("identifire-api".to_string()),
            public_key: Some(hex::encode(key.as_bytes())),
            ..IdentityConfig::default()
        };
        assert!(identity.verifier().is_ok());
    }

    #[test]
    fn test_verifier_needs_issuer_and_audience() {
        let key = hex::encode(idf_auth::generate_signing_key().verifying_key().as_bytes());
        let keyed = ServerConfig::new()
            .with_env(env(&[("AUTH_PUBLIC_KEY", key.as_str())]))
            .unwrap()
            .identity;
        assert!(matches!(keyed.verifier(), Err(ConfigError::MissingIssuer)));

        let no_audience = IdentityConfig {
            issuer: Some("https://identity.example/".to_string()),
            audience: Some("  ".to_string()),
            ..keyed.clone()
        };
        assert!(matches!(
            no_audience.verifier(),
            Err(ConfigError::MissingAudience)
        ));

        let full = ServerConfig::new()
            .with_env(env(&[
                ("AUTH_PUBLIC_KEY", key.as_str()),
                ("AUTH_ISSUER", "https://identity.example/"),
                ("AUTH_AUDIENCE", "identifire-api"),
            ]))
            .unwrap()
            .identity;
        assert!(full.verifier().is_ok());
    }
}
