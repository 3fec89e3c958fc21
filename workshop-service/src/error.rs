//! Error type shared by every workshop operation.

use service_core::retry::Retryable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkshopError {
    #[error("Validation error: {0}")]
    Validation(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Invalid state: {0}")]
    InvalidState(anyhow::Error),

    #[error("Transaction conflict: {0}")]
    TransactionConflict(anyhow::Error),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(anyhow::Error),

    #[error("Store error: {0}")]
    Store(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),
}

impl WorkshopError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkshopError::Validation(_) => "validation",
            WorkshopError::NotFound(_) => "not_found",
            WorkshopError::InvalidState(_) => "invalid_state",
            WorkshopError::TransactionConflict(_) => "transaction_conflict",
            WorkshopError::StoreUnavailable(_) => "store_unavailable",
            WorkshopError::Store(_) => "store",
            WorkshopError::Config(_) => "config",
        }
    }

    pub(crate) fn validation(message: impl std::fmt::Display) -> Self {
        WorkshopError::Validation(anyhow::anyhow!("{}", message))
    }

    pub(crate) fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        WorkshopError::NotFound(anyhow::anyhow!("{} {} not found", entity, id))
    }
}

impl Retryable for WorkshopError {
    fn is_retryable(&self) -> bool {
        matches!(self, WorkshopError::TransactionConflict(_))
    }
}

impl From<validator::ValidationErrors> for WorkshopError {
    fn from(err: validator::ValidationErrors) -> Self {
        WorkshopError::Validation(anyhow::Error::new(err))
    }
}

impl From<service_core::config::LoadError> for WorkshopError {
    fn from(err: service_core::config::LoadError) -> Self {
        WorkshopError::Config(anyhow::Error::new(err))
    }
}

/// Classify a sqlx failure, keeping `context` in the message.
///
/// Serialization failures and deadlocks (SQLSTATE 40001 / 40P01) and unique
/// violations raised by a concurrent writer are conflicts; connection-level
/// failures mean the store is unavailable.
pub(crate) fn store_error(context: &str, err: sqlx::Error) -> WorkshopError {
    match &err {
        sqlx::Error::Database(db_err)
            if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) =>
        {
            WorkshopError::TransactionConflict(anyhow::anyhow!("{}: {}", context, err))
        }
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            WorkshopError::TransactionConflict(anyhow::anyhow!("{}: {}", context, err))
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => {
            WorkshopError::StoreUnavailable(anyhow::anyhow!("{}: {}", context, err))
        }
        _ => WorkshopError::Store(anyhow::anyhow!("{}: {}", context, err)),
    }
}
