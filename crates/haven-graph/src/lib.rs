//! haven-graph — resilient Neo4j access for the haven query subsystem.
//!
//! This crate owns the three failure-prone layers between analytical
//! code and the graph store: connection lifecycle ([`GraphClient`]),
//! single-consumption query execution with deadlines, and the circuit
//! breaker / retry policy ([`Resilience`]). All reads flow through
//! here; the subsystem performs no writes.

pub mod client;
pub mod executor;
pub mod resilience;

pub use client::GraphClient;
pub use executor::{QueryOutcome, QuerySummary};
pub use resilience::{CircuitBreaker, CircuitState, Resilience};
