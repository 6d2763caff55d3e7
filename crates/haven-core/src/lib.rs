//! haven-core: Shared types, configuration, and error handling for the
//! haven graph-query subsystem.
//!
//! This crate provides the foundational pieces used across all haven
//! components:
//! - Typed result shapes (entities, officers, paths, patterns, ...)
//! - Validated analytical request value objects
//! - The error taxonomy surfaced to every caller
//! - Configuration management

pub mod config;
pub mod cypher;
pub mod error;
pub mod request;
pub mod types;

pub use config::HavenConfig;
pub use error::{HavenError, Result};
