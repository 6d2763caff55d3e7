//! Query execution: one compiled query, one timeout, one consumption
//! of the row stream.
//!
//! The row stream is materialized exactly once; the execution summary
//! is assembled strictly after the final row has been consumed. Never
//! touch the stream again after that point.

use std::time::Duration;

use tokio::time::Instant;

use haven_core::cypher::{CompiledQuery, ParamValue};
use haven_core::{HavenError, Result};

use crate::client::GraphClient;

/// Execution metadata captured after the stream is drained.
#[derive(Debug, Clone)]
pub struct QuerySummary {
    pub elapsed_ms: u64,
    pub record_count: usize,
}

/// Materialized rows plus the post-consumption summary.
#[derive(Debug)]
pub struct QueryOutcome {
    pub rows: Vec<neo4rs::Row>,
    pub summary: QuerySummary,
}

impl GraphClient {
    /// Run a compiled query under a deadline.
    ///
    /// Deadline expiry drops the in-flight future, which cancels the
    /// store operation and returns the pooled connection.
    pub async fn execute(
        &self,
        compiled: &CompiledQuery,
        timeout: Duration,
    ) -> Result<QueryOutcome> {
        let graph = self.acquire().await?;
        let started = Instant::now();

        let mut q = neo4rs::query(&compiled.text);
        for (name, value) in &compiled.params {
            q = match value {
                ParamValue::Str(s) => q.param(name, s.clone()),
                ParamValue::Int(i) => q.param(name, *i),
                ParamValue::StrList(l) => q.param(name, l.clone()),
            };
        }

        let consume = async {
            let mut stream = graph.execute(q).await.map_err(classify)?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next().await.map_err(classify)? {
                rows.push(row);
            }
            Ok::<_, HavenError>(rows)
        };

        let rows = match tokio::time::timeout(timeout, consume).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "query execution failed");
                return Err(e);
            }
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::warn!(elapsed_ms, "query cancelled by deadline");
                return Err(HavenError::Timeout { elapsed_ms });
            }
        };

        // Stream fully consumed; summary comes only from here on.
        let summary = QuerySummary {
            elapsed_ms: started.elapsed().as_millis() as u64,
            record_count: rows.len(),
        };
        tracing::debug!(
            elapsed_ms = summary.elapsed_ms,
            records = summary.record_count,
            "query executed"
        );

        Ok(QueryOutcome { rows, summary })
    }
}

/// Map a driver error into the haven taxonomy by its diagnostic text.
///
/// Unrecognized failures default to `Query` (non-retryable), so a new
/// driver error class can never trigger a retry storm.
pub fn classify(err: neo4rs::Error) -> HavenError {
    classify_message(err.to_string())
}

fn classify_message(msg: String) -> HavenError {
    let lower = msg.to_lowercase();

    const CONNECTION_MARKERS: [&str; 8] = [
        "connection refused",
        "connection failed",
        "connection lost",
        "connection reset",
        "network error",
        "host unreachable",
        "broken pipe",
        "io error",
    ];
    const TIMEOUT_MARKERS: [&str; 3] = ["timeout", "timed out", "deadline exceeded"];

    if CONNECTION_MARKERS.iter().any(|m| lower.contains(m)) {
        HavenError::Connection(msg)
    } else if TIMEOUT_MARKERS.iter().any(|m| lower.contains(m)) {
        // Store-side timeouts are transient like transport failures.
        HavenError::Connection(msg)
    } else {
        HavenError::Query(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failures_are_retryable() {
        let err = classify_message("Connection refused (os error 111)".into());
        assert!(matches!(err, HavenError::Connection(_)));
        assert!(err.is_retryable());

        let err = classify_message("connection lost mid-stream".into());
        assert!(err.is_retryable());

        let err = classify_message("IO error: broken pipe".into());
        assert!(matches!(err, HavenError::Connection(_)));
    }

    #[test]
    fn test_store_timeouts_are_retryable() {
        let err = classify_message("transaction timed out on server".into());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_store_rejections_are_not_retried() {
        let err = classify_message("Invalid input 'MTCH': syntax error".into());
        assert!(matches!(err, HavenError::Query(_)));
        assert!(!err.is_retryable());

        // Unknown failures default to non-retryable.
        let err = classify_message("something novel".into());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_execute_without_connection_fails_fast() {
        let client = GraphClient::new();
        let q = CompiledQuery::new("RETURN 1");
        let err = client
            .execute(&q, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, HavenError::Connection(_)));
    }
}
