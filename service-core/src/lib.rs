//! service-core: Shared infrastructure for the workshop services.
pub mod config;
pub mod observability;
pub mod retry;

pub use tracing;
