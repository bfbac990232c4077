use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;

use crate::utils::time::parse_tz;

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Embedded redb file at `<work_dir>/floor.redb`
    Redb,
    /// Process memory, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(StoreBackend::Redb),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 3001 | listen port |
/// | WORK_DIR | ./work_dir | data + logs root |
/// | STORE_BACKEND | redb | `redb` or `memory` |
/// | ENVIRONMENT | development | environment name |
/// | LOG_LEVEL | info | default log filter |
/// | LOG_JSON | false | JSON console logs |
/// | LOG_TO_FILE | false | rotating files under `WORK_DIR/logs` |
/// | BUSINESS_TZ | UTC | time zone for `completedToday` |
/// | SEED_DEMO_DATA | false | seed demo orders on an empty store |
/// | OBSERVER_CHANNEL_CAPACITY | 256 | per-observer event buffer |
/// | TRANSITION_MAX_RETRIES | 3 | CAS retries for status updates |
/// | DOWNTIME_SINGLE_ACTIVE | false | reject a second active downtime per machine |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | graceful shutdown grace period |
///
/// ```ignore
/// HTTP_PORT=8080 STORE_BACKEND=memory SEED_DEMO_DATA=true cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub work_dir: PathBuf,
    pub store_backend: StoreBackend,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_to_file: bool,
    pub business_tz: Tz,
    pub seed_demo_data: bool,
    pub observer_channel_capacity: usize,
    pub transition_max_retries: u32,
    pub downtime_single_active: bool,
    pub shutdown_timeout_ms: u64,
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            http_port: env_parse("HTTP_PORT").unwrap_or(defaults.http_port),
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            store_backend: env_parse("STORE_BACKEND").unwrap_or(defaults.store_backend),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: env_parse("LOG_JSON").unwrap_or(defaults.log_json),
            log_to_file: env_parse("LOG_TO_FILE").unwrap_or(defaults.log_to_file),
            business_tz: std::env::var("BUSINESS_TZ")
                .ok()
                .and_then(|v| parse_tz(&v))
                .unwrap_or(defaults.business_tz),
            seed_demo_data: env_parse("SEED_DEMO_DATA").unwrap_or(defaults.seed_demo_data),
            observer_channel_capacity: env_parse("OBSERVER_CHANNEL_CAPACITY")
                .filter(|c: &usize| *c > 0)
                .unwrap_or(defaults.observer_channel_capacity),
            transition_max_retries: env_parse("TRANSITION_MAX_RETRIES")
                .unwrap_or(defaults.transition_max_retries),
            downtime_single_active: env_parse("DOWNTIME_SINGLE_ACTIVE")
                .unwrap_or(defaults.downtime_single_active),
            shutdown_timeout_ms: env_parse("SHUTDOWN_TIMEOUT_MS")
                .unwrap_or(defaults.shutdown_timeout_ms),
        }
    }

    /// In-memory configuration for tests and throwaway runs
    pub fn ephemeral() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            ..Self::default()
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.work_dir.join("floor.redb")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.work_dir.join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3001,
            work_dir: PathBuf::from("./work_dir"),
            store_backend: StoreBackend::Redb,
            environment: "development".into(),
            log_level: "info".into(),
            log_json: false,
            log_to_file: false,
            business_tz: Tz::UTC,
            seed_demo_data: false,
            observer_channel_capacity: 256,
            transition_max_retries: 3,
            downtime_single_active: false,
            shutdown_timeout_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("redb".parse::<StoreBackend>(), Ok(StoreBackend::Redb));
        assert_eq!(" Memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http_port, 3001);
        assert_eq!(config.transition_max_retries, 3);
        assert_eq!(config.observer_channel_capacity, 256);
        assert_eq!(config.db_path(), PathBuf::from("./work_dir/floor.redb"));
        assert_eq!(config.environment, "development");
    }
}
