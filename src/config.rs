//! Pipeline configuration.
//!
//! Loaded once at startup from `LOGIN_ETL_*` environment variables and
//! passed into the collaborators' constructors.

use std::time::Duration;

use anyhow::{ensure, Result};
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// Largest batch a single receive may request.
pub const MAX_BATCH_SIZE: usize = 10;

/// Longest long-poll window a single receive may request.
pub const MAX_WAIT_TIME_SECS: u64 = 20;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PipelineConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Queue configuration
    /// Login queue URL
    #[serde(default = "default_queue_url")]
    pub queue_url: String,

    /// Maximum messages requested per cycle
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Long-poll window when the queue is empty, in seconds
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,

    // PostgreSQL configuration
    /// PostgreSQL host
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    /// PostgreSQL database name
    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    /// PostgreSQL username
    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    /// PostgreSQL password
    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    /// Target table for transformed rows
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Upper bound on a single row write, in seconds
    #[serde(default = "default_sink_write_timeout_secs")]
    pub sink_write_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_queue_url() -> String {
    "http://localhost:4566/000000000000/login-queue".to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_wait_time_secs() -> u64 {
    10
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "postgres".to_string()
}

fn default_postgres_username() -> String {
    "postgres".to_string()
}

fn default_postgres_password() -> String {
    "postgres".to_string()
}

fn default_table_name() -> String {
    crate::storage::queries::DEFAULT_TABLE.to_string()
}

fn default_sink_write_timeout_secs() -> u64 {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            queue_url: default_queue_url(),
            batch_size: default_batch_size(),
            wait_time_secs: default_wait_time_secs(),
            postgres_host: default_postgres_host(),
            postgres_port: default_postgres_port(),
            postgres_database: default_postgres_database(),
            postgres_username: default_postgres_username(),
            postgres_password: default_postgres_password(),
            table_name: default_table_name(),
            sink_write_timeout_secs: default_sink_write_timeout_secs(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from `LOGIN_ETL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("LOGIN_ETL").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Reject values the queue or database would refuse.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MAX_BATCH_SIZE).contains(&self.batch_size),
            "batch_size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE,
            self.batch_size
        );
        ensure!(
            self.wait_time_secs <= MAX_WAIT_TIME_SECS,
            "wait_time_secs must be at most {}, got {}",
            MAX_WAIT_TIME_SECS,
            self.wait_time_secs
        );
        ensure!(
            self.sink_write_timeout_secs > 0,
            "sink_write_timeout_secs must be positive"
        );
        ensure!(!self.queue_url.is_empty(), "queue_url must not be empty");
        ensure!(!self.table_name.is_empty(), "table_name must not be empty");
        Ok(())
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }

    pub fn sink_write_timeout(&self) -> Duration {
        Duration::from_secs(self.sink_write_timeout_secs)
    }

    /// libpq-style connection string for the sink's connection.
    pub fn postgres_connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.postgres_host,
            self.postgres_port,
            self.postgres_database,
            self.postgres_username,
            self.postgres_password
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-wide; keep env tests serial.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.wait_time(), Duration::from_secs(10));
        assert_eq!(config.table_name, "user_logins");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_overrides() {
        let _guard = TEST_LOCK.lock().unwrap();
        std::env::set_var("LOGIN_ETL_BATCH_SIZE", "5");
        std::env::set_var("LOGIN_ETL_TABLE_NAME", "logins_test");

        let config = PipelineConfig::from_env().unwrap();

        std::env::remove_var("LOGIN_ETL_BATCH_SIZE");
        std::env::remove_var("LOGIN_ETL_TABLE_NAME");

        assert_eq!(config.batch_size, 5);
        assert_eq!(config.table_name, "logins_test");
        assert_eq!(config.wait_time_secs, 10);
    }

    #[test]
    fn test_validate_rejects_oversized_batch() {
        let config = PipelineConfig {
            batch_size: 11,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_long_wait() {
        let config = PipelineConfig {
            wait_time_secs: 21,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_string() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.postgres_connection_string(),
            "host=localhost port=5432 dbname=postgres user=postgres password=postgres"
        );
    }
}
