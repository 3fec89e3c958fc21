//! Persistence contract for workshop documents.
//!
//! Every mutating workflow runs inside a [`StoreTransaction`] obtained from
//! [`DocumentStore::begin`]. Transactions are serializable: two transactions
//! touching the same document never interleave, one of them fails with
//! [`WorkshopError::TransactionConflict`] instead. Dropping a transaction
//! without calling [`StoreTransaction::commit`] discards every staged write.

mod memory;
mod postgres;

pub use memory::{FaultPoint, MemoryStore};
pub use postgres::PgStore;

use crate::error::WorkshopError;
use crate::models::{BusinessSettings, Payment, Quote, WorkOrder};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEFAULT_QUOTE_PAGE_SIZE: u32 = 20;
pub const DEFAULT_ORDER_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Position in a newest-first listing. Documents sharing a creation
/// instant are ordered by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageCursor {
    pub created_utc: DateTime<Utc>,
    pub id: Uuid,
}

impl PageCursor {
    pub fn new(created_utc: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_utc, id }
    }
}

/// Cursor-based page request over documents ordered by creation time,
/// newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<u32>,
    /// Only documents positioned strictly after this cursor are returned.
    pub after: Option<PageCursor>,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            after: None,
        }
    }

    pub fn after(limit: u32, cursor: PageCursor) -> Self {
        Self {
            limit: Some(limit),
            after: Some(cursor),
        }
    }

    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn resolve_limit(&self, default: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Position of the last item, present only when the page is full.
    pub next_cursor: Option<PageCursor>,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, limit: u32, cursor: impl Fn(&T) -> PageCursor) -> Self {
        let next_cursor = if items.len() == limit as usize {
            items.last().map(cursor)
        } else {
            None
        };
        Self { items, next_cursor }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    type Tx: StoreTransaction;

    /// Open a serializable transaction.
    async fn begin(&self) -> Result<Self::Tx, WorkshopError>;

    async fn quote(&self, id: Uuid) -> Result<Option<Quote>, WorkshopError>;

    async fn order(&self, id: Uuid) -> Result<Option<WorkOrder>, WorkshopError>;

    /// Quotes by creation time, newest first.
    async fn list_quotes(
        &self,
        limit: u32,
        after: Option<PageCursor>,
    ) -> Result<Vec<Quote>, WorkshopError>;

    /// Orders by creation time, newest first.
    async fn list_orders(
        &self,
        limit: u32,
        after: Option<PageCursor>,
    ) -> Result<Vec<WorkOrder>, WorkshopError>;

    /// Payments of one order, oldest first.
    async fn list_payments(&self, order_id: Uuid) -> Result<Vec<Payment>, WorkshopError>;

    async fn settings(&self) -> Result<Option<BusinessSettings>, WorkshopError>;

    async fn save_settings(&self, settings: &BusinessSettings) -> Result<(), WorkshopError>;

    async fn health_check(&self) -> Result<(), WorkshopError>;
}

#[async_trait]
pub trait StoreTransaction: Send {
    /// Read a quote, locking it for the rest of the transaction.
    async fn quote(&mut self, id: Uuid) -> Result<Option<Quote>, WorkshopError>;

    /// Insert or replace a quote.
    async fn save_quote(&mut self, quote: &Quote) -> Result<(), WorkshopError>;

    /// Read an order, locking it for the rest of the transaction.
    async fn order(&mut self, id: Uuid) -> Result<Option<WorkOrder>, WorkshopError>;

    /// Insert or replace an order.
    async fn save_order(&mut self, order: &WorkOrder) -> Result<(), WorkshopError>;

    async fn payment(&mut self, id: Uuid) -> Result<Option<Payment>, WorkshopError>;

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), WorkshopError>;

    async fn delete_payment(&mut self, id: Uuid) -> Result<(), WorkshopError>;

    /// Increment the counter under `key` and return the new value. A missing
    /// counter starts at 1.
    async fn next_sequence(&mut self, key: &str) -> Result<i32, WorkshopError>;

    async fn commit(self) -> Result<(), WorkshopError>;
}
