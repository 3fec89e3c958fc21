//! Services module for workshop-service.

pub mod calculator;
pub mod dashboard;
pub mod documents;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod quotes;
pub mod sequence;

pub use calculator::{line_total, round2, subtotal, totals, Totals};
pub use dashboard::DashboardStats;
pub use documents::{Branding, DocumentLine, OrderDocument, QuoteDocument};
pub use metrics::{get_metrics, init_metrics};
pub use orders::{derive_pay_status, recompute_final_total, settle, OrderService};
pub use payments::PaymentJournal;
pub use quotes::{AcceptOutcome, QuoteService};
pub use sequence::{format_code, SequenceAllocator, SequenceKind};

use crate::error::WorkshopError;
use metrics::{ERRORS_TOTAL, TRANSACTION_RETRIES_TOTAL};
use service_core::retry::{retry_with_backoff, RetryConfig};
use std::future::Future;

/// Run a transactional unit of work, starting it over on conflicts.
///
/// `f` must open its own transaction on every call.
pub(crate) async fn in_transaction<F, Fut, T>(
    retry: &RetryConfig,
    operation: &'static str,
    mut f: F,
) -> Result<T, WorkshopError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WorkshopError>>,
{
    let mut attempts = 0u32;
    let result = retry_with_backoff(retry, operation, || {
        attempts += 1;
        f()
    })
    .await;

    if attempts > 1 {
        TRANSACTION_RETRIES_TOTAL
            .with_label_values(&[operation])
            .inc_by(f64::from(attempts - 1));
    }
    if let Err(err) = &result {
        ERRORS_TOTAL.with_label_values(&[err.kind()]).inc();
    }
    result
}
