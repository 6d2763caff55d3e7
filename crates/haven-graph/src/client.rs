//! Neo4j connection lifecycle management.
//!
//! [`GraphClient`] owns the pooled driver connection. Analytical code
//! acquires a scoped handle per operation; the driver returns pooled
//! connections on drop, on every exit path including cancellation.

use std::time::Duration;

use neo4rs::{ConfigBuilder, Graph};
use tokio::sync::RwLock;

use haven_core::config::Neo4jConfig;
use haven_core::cypher::CompiledQuery;
use haven_core::{HavenError, Result};

/// Thread-safe graph client with pooled connections.
///
/// All haven query operations flow through this client. Cloning the
/// inner `Graph` is cheap (Arc).
pub struct GraphClient {
    inner: RwLock<Option<Graph>>,
}

impl GraphClient {
    /// Create a disconnected client.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Establish the pooled connection.
    ///
    /// Idempotent: a second call while connected keeps the existing
    /// pool. Unreachable endpoints and rejected credentials surface as
    /// [`HavenError::Connection`].
    pub async fn connect(&self, config: &Neo4jConfig) -> Result<()> {
        let mut guard = self.inner.write().await;
        if guard.is_some() {
            tracing::debug!("connect called while already connected; keeping existing pool");
            return Ok(());
        }

        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connection_pool_size)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| HavenError::Connection(e.to_string()))?;

        let connect = Graph::connect(neo_config);
        let timeout = Duration::from_secs(config.connection_timeout_secs);
        let graph = match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(graph)) => graph,
            Ok(Err(e)) => return Err(HavenError::Connection(e.to_string())),
            Err(_) => {
                return Err(HavenError::Connection(format!(
                    "connection to {} timed out after {}s",
                    config.uri, config.connection_timeout_secs
                )))
            }
        };

        tracing::info!(uri = %config.uri, database = %config.database, "connected to Neo4j");
        *guard = Some(graph);
        Ok(())
    }

    /// Scoped acquisition of the pooled driver handle.
    pub async fn acquire(&self) -> Result<Graph> {
        self.inner
            .read()
            .await
            .clone()
            .ok_or_else(|| HavenError::Connection("not connected".into()))
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Trivial probe query under a timeout.
    ///
    /// Used by liveness reporting and as the half-open trial for the
    /// connect breaker.
    pub async fn health_check(&self, timeout: Duration) -> Result<bool> {
        let probe = CompiledQuery::new("RETURN 1 AS health_check");
        let outcome = self.execute(&probe, timeout).await?;
        let healthy = outcome
            .rows
            .first()
            .and_then(|row| row.get::<i64>("health_check").ok())
            == Some(1);
        if !healthy {
            return Err(HavenError::Connection(
                "health check returned unexpected result".into(),
            ));
        }
        Ok(true)
    }

    /// Drop the pool. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        let mut guard = self.inner.write().await;
        if guard.take().is_some() {
            tracing::info!("disconnected from Neo4j");
        }
    }
}

impl Default for GraphClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_before_connect_is_connection_error() {
        let client = GraphClient::new();
        assert!(!client.is_connected().await);
        let err = client.acquire().await.err().unwrap();
        assert!(matches!(err, HavenError::Connection(_)));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let client = GraphClient::new();
        client.disconnect().await;
        client.disconnect().await;
        assert!(!client.is_connected().await);
    }
}
