//! Workshop Service - quotes, work orders and payment settlement for a
//! repair shop.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod startup;
pub mod store;

pub use error::WorkshopError;
pub use startup::{init_telemetry, Workshop};
