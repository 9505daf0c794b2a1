//! Shared test utilities used across dendro crates.

pub mod ci;
pub mod tracing;
