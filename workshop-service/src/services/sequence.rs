//! Yearly document numbering.

use super::in_transaction;
use crate::error::WorkshopError;
use crate::store::{DocumentStore, StoreTransaction};
use service_core::retry::RetryConfig;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Kind of document a sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Quote,
    Order,
}

impl SequenceKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            SequenceKind::Quote => "P",
            SequenceKind::Order => "OT",
        }
    }

    pub fn counter_key(&self, year: i32) -> String {
        match self {
            SequenceKind::Quote => format!("quote-{}", year),
            SequenceKind::Order => format!("order-{}", year),
        }
    }
}

/// `P-2025-0007` / `OT-2025-0007`.
pub fn format_code(kind: SequenceKind, year: i32, sequence: i32) -> String {
    format!("{}-{}-{:04}", kind.prefix(), year, sequence)
}

/// A sequence number together with its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub year: i32,
    pub sequence: i32,
    pub code: String,
}

/// Allocate inside the caller's transaction, so the number is only consumed
/// if the document that uses it is committed.
pub(crate) async fn allocate<T: StoreTransaction>(
    tx: &mut T,
    kind: SequenceKind,
    year: i32,
) -> Result<Allocation, WorkshopError> {
    let sequence = tx.next_sequence(&kind.counter_key(year)).await?;
    let code = format_code(kind, year, sequence);
    debug!(code = %code, "Allocated sequence");
    Ok(Allocation {
        year,
        sequence,
        code,
    })
}

/// Standalone allocator, each call committing its own increment.
pub struct SequenceAllocator<S: DocumentStore> {
    store: Arc<S>,
    retry: RetryConfig,
}

impl<S: DocumentStore> SequenceAllocator<S> {
    pub fn new(store: Arc<S>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    /// Next number for `(kind, year)`. The first call for a year returns 1.
    #[instrument(skip(self))]
    pub async fn next_sequence(&self, kind: SequenceKind, year: i32) -> Result<i32, WorkshopError> {
        let store = &self.store;
        in_transaction(&self.retry, "next_sequence", move || async move {
            let mut tx = store.begin().await?;
            let allocation = allocate(&mut tx, kind, year).await?;
            tx.commit().await?;
            Ok(allocation.sequence)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_zero_padded() {
        assert_eq!(format_code(SequenceKind::Quote, 2025, 7), "P-2025-0007");
        assert_eq!(format_code(SequenceKind::Order, 2025, 7), "OT-2025-0007");
        assert_eq!(format_code(SequenceKind::Order, 2026, 12345), "OT-2026-12345");
    }

    #[test]
    fn counters_are_keyed_by_kind_and_year() {
        assert_eq!(SequenceKind::Quote.counter_key(2025), "quote-2025");
        assert_eq!(SequenceKind::Order.counter_key(2025), "order-2025");
    }
}
