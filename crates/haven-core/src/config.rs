//! Configuration for the haven query subsystem.
//!
//! Loaded from `haven.toml` and `HAVEN__`-prefixed environment
//! variables (e.g. `HAVEN__NEO4J__PASSWORD`). Every value is
//! caller-suppliable; the defaults below match a local development
//! Neo4j.

use serde::Deserialize;

use crate::error::{HavenError, Result};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HavenConfig {
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub resilience: ResilienceConfig,
}

/// Connection settings for the backing Neo4j store.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jConfig {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Target database name.
    #[serde(default = "default_database")]
    pub database: String,

    /// Maximum connections held by the driver pool; bounds concurrent
    /// in-flight queries.
    #[serde(default = "default_pool_size")]
    pub max_connection_pool_size: usize,

    /// Rows fetched per pull from the server.
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,

    /// Timeout for establishing the initial connection, in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

/// Query execution settings.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Per-query deadline in seconds.
    #[serde(default = "default_query_timeout")]
    pub timeout_secs: u64,

    /// Limit applied when a request does not specify one.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Hard ceiling on any requested limit.
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

/// Circuit breaker and retry settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ResilienceConfig {
    /// Consecutive failures before a breaker opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds an open breaker waits before allowing a half-open trial.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Total attempts per operation (first try plus retries).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay in milliseconds; doubles per attempt.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_database() -> String {
    "neo4j".to_string()
}

fn default_pool_size() -> usize {
    100
}

fn default_fetch_size() -> usize {
    256
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_query_timeout() -> u64 {
    30
}

fn default_limit() -> u32 {
    20
}

fn default_max_limit() -> u32 {
    100
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_cooldown() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    30_000
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: String::new(),
            database: default_database(),
            max_connection_pool_size: default_pool_size(),
            fetch_size: default_fetch_size(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_query_timeout(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl HavenConfig {
    /// Load configuration from `<prefix>.toml` (optional) and
    /// `HAVEN__` environment variables, env taking priority.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("HAVEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| HavenError::Validation(format!("config: {e}")))?;

        cfg.try_deserialize()
            .map_err(|e| HavenError::Validation(format!("config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HavenConfig::default();
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.neo4j.database, "neo4j");
        assert_eq!(config.neo4j.max_connection_pool_size, 100);
        assert_eq!(config.query.timeout_secs, 30);
        assert_eq!(config.query.max_limit, 100);
        assert_eq!(config.resilience.failure_threshold, 3);
        assert_eq!(config.resilience.max_attempts, 5);
        assert_eq!(config.resilience.base_delay_ms, 1000);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = HavenConfig::load("does-not-exist").unwrap();
        assert_eq!(config.neo4j.user, "neo4j");
        assert_eq!(config.resilience.cooldown_secs, 30);
    }
}
