//! haven-query — Cypher templates, result normalization, and the
//! operation facade for the haven offshore-leaks query subsystem.
//!
//! The flow per operation: a request value object validates itself,
//! a template compiles it into query text plus parameter bindings,
//! the resilient executor runs it, and the normalizer maps rows into
//! the typed result shapes.

pub mod filters;
pub mod normalize;
pub mod service;
pub mod templates;

pub use service::{HavenService, HealthReport, CATEGORY_CONNECT, CATEGORY_QUERY};
