//! Error taxonomy for the haven query subsystem.
//!
//! Callers always receive one of these variants, never a raw driver
//! error. Classification of driver failures into `Connection` / `Query`
//! happens in haven-graph at the execution boundary.

use thiserror::Error;

/// Top-level error type for all query operations.
#[derive(Error, Debug)]
pub enum HavenError {
    /// Malformed or out-of-range request. Never retried.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Graph store unreachable or the connection was lost. Retryable.
    #[error("connection error: {0}")]
    Connection(String),

    /// The store rejected the query. Carries the store diagnostic.
    #[error("query rejected: {0}")]
    Query(String),

    /// The query exceeded its deadline. Retryable up to budget.
    #[error("query timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The circuit breaker for this operation category is open.
    #[error("circuit breaker '{category}' is open")]
    CircuitOpen { category: String },

    /// Retry budget exhausted; wraps the last underlying failure.
    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<HavenError>,
    },
}

impl HavenError {
    /// Whether the resilience layer may retry this failure.
    ///
    /// Only transient transport failures qualify; validation and store
    /// rejections propagate immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout { .. })
    }

    /// Stable category tag used by health reporting and protocol
    /// adapters when mapping to wire status codes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Connection(_) => "connection",
            Self::Query(_) => "query",
            Self::Timeout { .. } => "timeout",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

pub type Result<T> = std::result::Result<T, HavenError>;
