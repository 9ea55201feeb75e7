use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app_name: String,
    pub app_port: u16,
    pub ops_port: u16,
    /// Host used when building `self` links in responses.
    pub public_host: String,
    pub storage: StorageBackend,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_timeout_secs: u64,
    pub db_max_connections: u32,
    pub shutdown_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "payments-api".to_string(),
            app_port: 8080,
            ops_port: 8081,
            public_host: "localhost:8080".to_string(),
            storage: StorageBackend::Postgres,
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_name: "payments".to_string(),
            db_user: "postgres".to_string(),
            db_password: String::new(),
            db_timeout_secs: 5,
            db_max_connections: 10,
            shutdown_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Command-line overrides, applied on top of the file or environment.
#[derive(Debug, Parser)]
#[command(name = "payments-api", about = "CRUD HTTP API for payment resources")]
pub struct Cli {
    /// TOML file read when ENVIRONMENT=dev
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub ops_port: Option<u16>,

    #[arg(long, value_enum)]
    pub storage: Option<StorageBackend>,
}

impl Config {
    /// Builds the configuration once at startup: TOML file in dev, environment
    /// variables otherwise, then command-line overrides.
    pub fn load(cli: &Cli) -> Self {
        let is_dev = env::var("ENVIRONMENT")
            .map(|e| e.eq_ignore_ascii_case("dev"))
            .unwrap_or(false);

        let mut config = if is_dev {
            match Self::from_file(&cli.config) {
                Ok(config) => {
                    info!("Loaded configuration from {}", cli.config.display());
                    config
                }
                Err(e) => {
                    error!("{}", e);
                    Self::default()
                }
            }
        } else {
            Self::from_env()
        };

        config.apply(cli);
        config
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads every setting through `lookup`; unset or unparsable values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: FromStr>(value: Option<String>, default: T) -> T {
            value.and_then(|v| v.parse().ok()).unwrap_or(default)
        }

        let defaults = Self::default();
        Self {
            app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
            app_port: parsed(lookup("APP_PORT"), defaults.app_port),
            ops_port: parsed(lookup("OPS_PORT"), defaults.ops_port),
            public_host: lookup("PUBLIC_HOST").unwrap_or(defaults.public_host),
            storage: parsed(lookup("STORAGE"), defaults.storage),
            db_host: lookup("DB_HOST").unwrap_or(defaults.db_host),
            db_port: parsed(lookup("DB_PORT"), defaults.db_port),
            db_name: lookup("DB_NAME").unwrap_or(defaults.db_name),
            db_user: lookup("DB_USER").unwrap_or(defaults.db_user),
            db_password: lookup("DB_PASSWORD").unwrap_or(defaults.db_password),
            db_timeout_secs: parsed(lookup("DB_TIMEOUT"), defaults.db_timeout_secs),
            db_max_connections: parsed(lookup("DB_MAX_CONNECTIONS"), defaults.db_max_connections),
            shutdown_timeout_secs: parsed(
                lookup("SHUTDOWN_TIMEOUT"),
                defaults.shutdown_timeout_secs,
            ),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.app_port = port;
        }
        if let Some(port) = cli.ops_port {
            self.ops_port = port;
        }
        if let Some(storage) = cli.storage {
            self.storage = storage;
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
