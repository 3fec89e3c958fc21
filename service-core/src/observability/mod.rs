pub mod logging;

pub use logging::{ObservabilityError, init_tracing};
