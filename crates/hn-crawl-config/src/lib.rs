//! Centralized configuration for the crawler.
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. Environment variable overrides
//! 3. Runtime validation

pub mod error;
pub mod validation;

pub use error::{ConfigError, ConfigResult};

// =============================================================================
// SAFE DEFAULTS - Work for any environment (dev, staging, prod, test)
// =============================================================================

// Database Configuration (safe local defaults)
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_NAME: &str = "hn_crawl";
const DEFAULT_DB_USER: &str = "hn_crawl";
const DEFAULT_DB_PASSWORD: &str = "localdev123";
const DEFAULT_DB_SSL_MODE: &str = "disable";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_MIN_CONNECTIONS: u32 = 2;
const DEFAULT_DB_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_DB_IDLE_TIMEOUT_SECONDS: u64 = 300;

// Coordinator configuration
const DEFAULT_NUM_WORKERS: usize = 8;
const DEFAULT_CHUNK_SIZE: i64 = 1000;
const DEFAULT_STALE_TIMEOUT_SECONDS: u64 = 900; // 15 minutes
const DEFAULT_MONITOR_INTERVAL_SECONDS: u64 = 4;

// Worker / upstream client configuration
const DEFAULT_UPSTREAM_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
const DEFAULT_CONCURRENT_REQUESTS: usize = 300;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_BATCH_SIZE: usize = 500;

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use std::time::Duration;

/// Top-level configuration for the crawler binary.
///
/// All settings have safe defaults and can be overridden via environment
/// variables. No profile/environment selection is needed - the same
/// defaults work everywhere.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrawlConfig {
    pub database: DatabaseConfig,
    pub coordinator: CoordinatorConfig,
    pub worker: WorkerConfig,

    /// Destroy and recreate all tables before populating the queue.
    #[serde(default)]
    pub reset: bool,
}

impl CrawlConfig {
    /// Load configuration from environment variables with safe defaults.
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            coordinator: CoordinatorConfig::from_env(),
            worker: WorkerConfig::from_env(),
            reset: std::env::var("HN_CRAWL_RESET_DB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }
}

impl validation::Validate for CrawlConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.database.validate()?;
        self.coordinator.validate()?;
        self.worker.validate()?;
        Ok(())
    }
}

/// `PostgreSQL` connection and pool configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (full connection string)
    pub url: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub ssl_mode: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let host = std::env::var("HN_CRAWL_DATABASE_HOST")
            .or_else(|_| std::env::var("DB_HOST"))
            .unwrap_or_else(|_| DEFAULT_DB_HOST.to_string());

        let port = std::env::var("HN_CRAWL_DATABASE_PORT")
            .or_else(|_| std::env::var("DB_PORT"))
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_PORT);

        let database = std::env::var("HN_CRAWL_DATABASE_NAME")
            .or_else(|_| std::env::var("DB_NAME"))
            .unwrap_or_else(|_| DEFAULT_DB_NAME.to_string());

        let username = std::env::var("HN_CRAWL_DATABASE_USERNAME")
            .or_else(|_| std::env::var("DB_USER"))
            .unwrap_or_else(|_| DEFAULT_DB_USER.to_string());

        let password = std::env::var("HN_CRAWL_DATABASE_PASSWORD")
            .or_else(|_| std::env::var("DB_PASSWORD"))
            .unwrap_or_else(|_| {
                tracing::warn!(
                    "Using default database password '{}' - set HN_CRAWL_DATABASE_PASSWORD or DB_PASSWORD. Never use the default in production!",
                    DEFAULT_DB_PASSWORD
                );
                DEFAULT_DB_PASSWORD.to_string()
            });

        let ssl_mode = std::env::var("HN_CRAWL_DATABASE_SSL_MODE")
            .or_else(|_| std::env::var("DB_SSLMODE"))
            .unwrap_or_else(|_| DEFAULT_DB_SSL_MODE.to_string());

        let max_connections = std::env::var("HN_CRAWL_DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

        let min_connections = std::env::var("HN_CRAWL_DATABASE_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_MIN_CONNECTIONS);

        let timeout_seconds = std::env::var("HN_CRAWL_DATABASE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_TIMEOUT_SECONDS);

        let idle_timeout_seconds = std::env::var("HN_CRAWL_DATABASE_IDLE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_IDLE_TIMEOUT_SECONDS);

        let url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("HN_CRAWL_DATABASE_URL"))
            .unwrap_or_else(|_| {
                format!("postgresql://{username}:{password}@{host}:{port}/{database}")
            });

        Self {
            url,
            host,
            port,
            database,
            username,
            password,
            ssl_mode,
            max_connections,
            min_connections,
            timeout_seconds,
            idle_timeout_seconds,
        }
    }

    fn parse_ssl_mode(&self) -> PgSslMode {
        match self.ssl_mode.as_str() {
            "disable" => PgSslMode::Disable,
            "require" => PgSslMode::Require,
            _ => PgSslMode::Prefer,
        }
    }

    /// Build `PostgreSQL` connection options by parsing `url`, so that an
    /// explicit `--database-url`/`DATABASE_URL` override is actually honored
    /// rather than shadowed by the discrete host/port/user fields.
    ///
    /// # Errors
    /// Returns an error if `url` is not a valid `PostgreSQL` connection string.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        self.url
            .parse::<PgConnectOptions>()
            .map(|opts| opts.ssl_mode(self.parse_ssl_mode()))
    }

    /// Create a `PostgreSQL` connection pool with proper configuration
    ///
    /// # Errors
    /// Returns an error if `url` is invalid or connection to the database fails.
    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.timeout_seconds))
            .idle_timeout(Duration::from_secs(self.idle_timeout_seconds))
            .connect_with(self.connect_options()?)
            .await
    }

    /// Connection info safe for logging (never includes the password).
    pub fn safe_connection_string(&self) -> String {
        format!(
            "{}@{}:{}/{} (ssl: {:?})",
            self.username, self.host, self.port, self.database, self.ssl_mode
        )
    }
}

impl validation::Validate for DatabaseConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.url, "url")?;
        validation::validate_range(u64::from(self.max_connections), 1, 1000, "max_connections")?;
        validation::validate_range(self.timeout_seconds, 1, 3600, "timeout_seconds")?;
        Ok(())
    }
}

/// Coordinator configuration: chunking, staleness, pool sizing.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CoordinatorConfig {
    /// Number of worker tasks to launch.
    pub num_workers: usize,
    /// Number of item IDs covered by a single chunk.
    pub chunk_size: i64,
    /// How long an `in_progress` chunk may go without an update before reclaim.
    pub stale_timeout_seconds: u64,
    /// Progress-poll cadence.
    pub monitor_interval_seconds: u64,
}

impl CoordinatorConfig {
    pub fn from_env() -> Self {
        Self {
            num_workers: std::env::var("HN_CRAWL_NUM_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_NUM_WORKERS),
            chunk_size: std::env::var("HN_CRAWL_CHUNK_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            stale_timeout_seconds: std::env::var("HN_CRAWL_STALE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_STALE_TIMEOUT_SECONDS),
            monitor_interval_seconds: std::env::var("HN_CRAWL_MONITOR_INTERVAL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MONITOR_INTERVAL_SECONDS),
        }
    }
}

impl validation::Validate for CoordinatorConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.num_workers as u64, 1, 512, "num_workers")?;
        validation::validate_range(self.chunk_size.max(0) as u64, 1, 1_000_000, "chunk_size")?;
        validation::validate_range(self.stale_timeout_seconds, 1, 86_400, "stale_timeout_seconds")?;
        validation::validate_range(
            self.monitor_interval_seconds,
            1,
            3600,
            "monitor_interval_seconds",
        )?;
        Ok(())
    }
}

/// Per-worker fetch configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WorkerConfig {
    /// Base URL of the upstream item API.
    pub upstream_base_url: String,
    /// Maximum number of in-flight HTTP requests per worker.
    pub concurrent_requests: usize,
    /// Per-request HTTP timeout.
    pub request_timeout_seconds: u64,
    /// Number of items accumulated before a bulk upsert flush.
    pub batch_size: usize,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            upstream_base_url: std::env::var("HN_CRAWL_UPSTREAM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_BASE_URL.to_string()),
            concurrent_requests: std::env::var("HN_CRAWL_CONCURRENT_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONCURRENT_REQUESTS),
            request_timeout_seconds: std::env::var("HN_CRAWL_REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            batch_size: std::env::var("HN_CRAWL_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BATCH_SIZE),
        }
    }
}

impl validation::Validate for WorkerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_url(&self.upstream_base_url, "upstream_base_url")?;
        validation::validate_range(
            self.concurrent_requests as u64,
            1,
            10_000,
            "concurrent_requests",
        )?;
        validation::validate_range(
            self.request_timeout_seconds,
            1,
            600,
            "request_timeout_seconds",
        )?;
        validation::validate_range(self.batch_size as u64, 1, 1_000_000, "batch_size")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Validate;

    #[test]
    fn from_env_produces_valid_config() {
        let config = CrawlConfig::from_env();
        assert!(config.validate().is_ok());
        assert_eq!(config.coordinator.num_workers, DEFAULT_NUM_WORKERS);
        assert_eq!(config.worker.concurrent_requests, DEFAULT_CONCURRENT_REQUESTS);
    }

    #[test]
    fn rejects_zero_workers() {
        let mut config = CrawlConfig::from_env();
        config.coordinator.num_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_http_upstream_url() {
        let mut config = CrawlConfig::from_env();
        config.worker.upstream_base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn safe_connection_string_never_contains_password() {
        let mut config = DatabaseConfig::from_env();
        config.password = "super-secret".to_string();
        assert!(!config.safe_connection_string().contains("super-secret"));
    }

    #[test]
    fn env_var_overrides_default() {
        unsafe {
            std::env::set_var("HN_CRAWL_CHUNK_SIZE", "4242");
        }
        let config = CoordinatorConfig::from_env();
        assert_eq!(config.chunk_size, 4242);
        unsafe {
            std::env::remove_var("HN_CRAWL_CHUNK_SIZE");
        }
    }
}
