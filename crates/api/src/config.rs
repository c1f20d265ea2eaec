//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use thiserror::Error;

/// A configuration value was missing or malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Which storage backend serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid {
                key: "STORE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::Invalid {
                key: "LOG_FORMAT",
                value: s.to_string(),
            }),
        }
    }
}

/// PostgreSQL connection settings.
///
/// `url` (from `DATABASE_URL`) wins over the individual fields when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub application_name: String,
}

impl DatabaseConfig {
    /// Defaults for a local database named `name`.
    pub fn local(name: &str, application_name: &str) -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "myuser".to_string(),
            password: "secret".to_string(),
            name: name.to_string(),
            ssl_mode: "disable".to_string(),
            max_connections: 100,
            connect_timeout: Duration::from_secs(10),
            application_name: application_name.to_string(),
        }
    }

    /// Rejects settings that cannot produce a connection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_some() {
            return Ok(());
        }
        if self.host.is_empty() {
            return Err(ConfigError::Missing("DB_HOST"));
        }
        if self.user.is_empty() {
            return Err(ConfigError::Missing("DB_USER"));
        }
        if self.name.is_empty() {
            return Err(ConfigError::Missing("DB_NAME"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Returns a `postgres://` URL with the password masked, for logging.
    pub fn redacted_url(&self) -> String {
        match &self.url {
            Some(_) => "DATABASE_URL".to_string(),
            None => format!(
                "postgres://{}:***@{}:{}/{}?sslmode={}",
                self.user, self.host, self.port, self.name, self.ssl_mode
            ),
        }
    }

    /// Builds connection options for the pool.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        self.validate()?;

        let options = match &self.url {
            Some(url) => url.parse::<PgConnectOptions>().map_err(|_| ConfigError::Invalid {
                key: "DATABASE_URL",
                value: "<redacted>".to_string(),
            })?,
            None => {
                let ssl_mode =
                    self.ssl_mode
                        .parse::<PgSslMode>()
                        .map_err(|_| ConfigError::Invalid {
                            key: "DB_SSL_MODE",
                            value: self.ssl_mode.clone(),
                        })?;
                PgConnectOptions::new()
                    .host(&self.host)
                    .port(self.port)
                    .username(&self.user)
                    .password(&self.password)
                    .database(&self.name)
                    .ssl_mode(ssl_mode)
            }
        };

        Ok(options.application_name(&self.application_name))
    }

    /// Pool options sized from this configuration.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connect_timeout)
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json`
/// - `STORE_BACKEND`: `postgres` or `memory`
/// - `DATABASE_URL`, or `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`,
///   `DB_NAME`, `DB_SSL_MODE`
/// - `DB_MAX_CONNECTIONS`, `DB_CONNECT_TIMEOUT` (seconds), `DB_APPLICATION_NAME`
/// - `TX_TIMEOUT_MS`: write transaction bound (default: 5000)
/// - `RUN_MIGRATIONS`: apply migrations at startup (default: true)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub store_backend: StoreBackend,
    pub database: DatabaseConfig,
    pub tx_timeout: Duration,
    pub run_migrations: bool,
}

/// Per-binary defaults.
#[derive(Debug, Clone, Copy)]
pub struct ServiceDefaults {
    pub port: u16,
    pub database_name: &'static str,
    pub application_name: &'static str,
}

impl ServiceDefaults {
    pub const ORDERS: ServiceDefaults = ServiceDefaults {
        port: 8080,
        database_name: "orders",
        application_name: "order-service",
    };

    pub const PRODUCTS: ServiceDefaults = ServiceDefaults {
        port: 8081,
        database_name: "products",
        application_name: "product-service",
    };
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env(defaults: ServiceDefaults) -> Result<Self, ConfigError> {
        Self::from_lookup(defaults, |key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(defaults: ServiceDefaults, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::defaults(defaults);

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = parse(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(level) = lookup("RUST_LOG") {
            config.log_level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.log_format = format.parse()?;
        }
        if let Some(backend) = lookup("STORE_BACKEND") {
            config.store_backend = backend.parse()?;
        }
        if let Some(ms) = parse::<u64, _>(&lookup, "TX_TIMEOUT_MS")? {
            config.tx_timeout = Duration::from_millis(ms);
        }
        if let Some(run) = parse(&lookup, "RUN_MIGRATIONS")? {
            config.run_migrations = run;
        }

        let db = &mut config.database;
        db.url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if let Some(host) = lookup("DB_HOST") {
            db.host = host;
        }
        if let Some(port) = parse(&lookup, "DB_PORT")? {
            db.port = port;
        }
        if let Some(user) = lookup("DB_USER") {
            db.user = user;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            db.password = password;
        }
        if let Some(name) = lookup("DB_NAME") {
            db.name = name;
        }
        if let Some(ssl_mode) = lookup("DB_SSL_MODE") {
            db.ssl_mode = ssl_mode;
        }
        if let Some(max) = parse(&lookup, "DB_MAX_CONNECTIONS")? {
            db.max_connections = max;
        }
        if let Some(secs) = parse::<u64, _>(&lookup, "DB_CONNECT_TIMEOUT")? {
            db.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(name) = lookup("DB_APPLICATION_NAME") {
            db.application_name = name;
        }

        if config.store_backend == StoreBackend::Postgres {
            config.database.validate()?;
        }
        Ok(config)
    }

    fn defaults(defaults: ServiceDefaults) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: defaults.port,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            store_backend: StoreBackend::Postgres,
            database: DatabaseConfig::local(defaults.database_name, defaults.application_name),
            tx_timeout: service::DEFAULT_TX_TIMEOUT,
            run_migrations: true,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
