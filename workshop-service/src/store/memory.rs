//! In-process document store.
//!
//! A transaction owns the lock over the whole state, so transactions are
//! fully serialized. Writes are staged on a copy that replaces the shared
//! state only on commit.

use super::{DocumentStore, PageCursor, StoreTransaction};
use crate::error::WorkshopError;
use crate::models::{BusinessSettings, Payment, Quote, WorkOrder};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    quotes: HashMap<Uuid, Quote>,
    orders: HashMap<Uuid, WorkOrder>,
    payments: HashMap<Uuid, Payment>,
    counters: HashMap<String, i32>,
    settings: Option<BusinessSettings>,
}

/// Collection whose next write can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    QuoteWrite,
    OrderWrite,
    PaymentWrite,
}

#[derive(Debug, Default)]
struct Faults {
    quote_write: AtomicBool,
    order_write: AtomicBool,
    payment_write: AtomicBool,
    conflicting_commits: AtomicU32,
    unavailable: AtomicBool,
}

impl Faults {
    fn flag(&self, point: FaultPoint) -> &AtomicBool {
        match point {
            FaultPoint::QuoteWrite => &self.quote_write,
            FaultPoint::OrderWrite => &self.order_write,
            FaultPoint::PaymentWrite => &self.payment_write,
        }
    }

    fn check_write(&self, point: FaultPoint) -> Result<(), WorkshopError> {
        if self.flag(point).swap(false, Ordering::SeqCst) {
            warn!(?point, "Injected write failure");
            return Err(WorkshopError::Store(anyhow::anyhow!(
                "Injected failure on {:?}",
                point
            )));
        }
        Ok(())
    }

    fn check_available(&self) -> Result<(), WorkshopError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(WorkshopError::StoreUnavailable(anyhow::anyhow!(
                "Memory store marked unavailable"
            )));
        }
        Ok(())
    }

    fn take_conflict(&self) -> bool {
        self.conflicting_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Document store kept in process memory, with fault injection for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write into `point` fail with a store error.
    pub fn fail_next(&self, point: FaultPoint) {
        self.faults.flag(point).store(true, Ordering::SeqCst);
    }

    /// Make the next `n` commits fail with a transaction conflict.
    pub fn conflict_on_next_commits(&self, n: u32) {
        self.faults.conflicting_commits.store(n, Ordering::SeqCst);
    }

    /// While set, every operation fails with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of orders created from `quote_id`.
    pub async fn orders_for_quote(&self, quote_id: Uuid) -> usize {
        let state = self.state.lock().await;
        state
            .orders
            .values()
            .filter(|o| o.quote_id == quote_id)
            .count()
    }
}

fn newest_first<T>(
    docs: impl Iterator<Item = T>,
    position: impl Fn(&T) -> PageCursor,
    limit: u32,
    after: Option<PageCursor>,
) -> Vec<T> {
    let mut docs: Vec<T> = docs
        .filter(|d| after.map_or(true, |cursor| position(d) < cursor))
        .collect();
    docs.sort_by_key(|d| std::cmp::Reverse(position(d)));
    docs.truncate(limit as usize);
    docs
}

#[async_trait]
impl DocumentStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, WorkshopError> {
        self.faults.check_available()?;
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = (*guard).clone();
        Ok(MemoryTransaction {
            guard,
            staged,
            faults: Arc::clone(&self.faults),
        })
    }

    async fn quote(&self, id: Uuid) -> Result<Option<Quote>, WorkshopError> {
        self.faults.check_available()?;
        Ok(self.state.lock().await.quotes.get(&id).cloned())
    }

    async fn order(&self, id: Uuid) -> Result<Option<WorkOrder>, WorkshopError> {
        self.faults.check_available()?;
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn list_quotes(
        &self,
        limit: u32,
        after: Option<PageCursor>,
    ) -> Result<Vec<Quote>, WorkshopError> {
        self.faults.check_available()?;
        let state = self.state.lock().await;
        Ok(newest_first(
            state.quotes.values().cloned(),
            |q| PageCursor::new(q.created_utc, q.id),
            limit,
            after,
        ))
    }

    async fn list_orders(
        &self,
        limit: u32,
        after: Option<PageCursor>,
    ) -> Result<Vec<WorkOrder>, WorkshopError> {
        self.faults.check_available()?;
        let state = self.state.lock().await;
        Ok(newest_first(
            state.orders.values().cloned(),
            |o| PageCursor::new(o.created_utc, o.id),
            limit,
            after,
        ))
    }

    async fn list_payments(&self, order_id: Uuid) -> Result<Vec<Payment>, WorkshopError> {
        self.faults.check_available()?;
        let state = self.state.lock().await;
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.created_utc, p.id));
        Ok(payments)
    }

    async fn settings(&self) -> Result<Option<BusinessSettings>, WorkshopError> {
        self.faults.check_available()?;
        Ok(self.state.lock().await.settings.clone())
    }

    async fn save_settings(&self, settings: &BusinessSettings) -> Result<(), WorkshopError> {
        self.faults.check_available()?;
        self.state.lock().await.settings = Some(settings.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), WorkshopError> {
        self.faults.check_available()
    }
}

/// Open transaction on a [`MemoryStore`]. Holds the store lock until it is
/// committed or dropped.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    faults: Arc<Faults>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn quote(&mut self, id: Uuid) -> Result<Option<Quote>, WorkshopError> {
        Ok(self.staged.quotes.get(&id).cloned())
    }

    async fn save_quote(&mut self, quote: &Quote) -> Result<(), WorkshopError> {
        self.faults.check_write(FaultPoint::QuoteWrite)?;
        self.staged.quotes.insert(quote.id, quote.clone());
        Ok(())
    }

    async fn order(&mut self, id: Uuid) -> Result<Option<WorkOrder>, WorkshopError> {
        Ok(self.staged.orders.get(&id).cloned())
    }

    async fn save_order(&mut self, order: &WorkOrder) -> Result<(), WorkshopError> {
        self.faults.check_write(FaultPoint::OrderWrite)?;
        let duplicate = self
            .staged
            .orders
            .values()
            .any(|o| o.quote_id == order.quote_id && o.id != order.id);
        if duplicate {
            return Err(WorkshopError::TransactionConflict(anyhow::anyhow!(
                "Quote {} already has an order",
                order.quote_id
            )));
        }
        self.staged.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn payment(&mut self, id: Uuid) -> Result<Option<Payment>, WorkshopError> {
        Ok(self.staged.payments.get(&id).cloned())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), WorkshopError> {
        self.faults.check_write(FaultPoint::PaymentWrite)?;
        self.staged.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn delete_payment(&mut self, id: Uuid) -> Result<(), WorkshopError> {
        self.faults.check_write(FaultPoint::PaymentWrite)?;
        self.staged.payments.remove(&id);
        Ok(())
    }

    async fn next_sequence(&mut self, key: &str) -> Result<i32, WorkshopError> {
        let counter = self.staged.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn commit(mut self) -> Result<(), WorkshopError> {
        self.faults.check_available()?;
        if self.faults.take_conflict() {
            debug!("Injected commit conflict");
            return Err(WorkshopError::TransactionConflict(anyhow::anyhow!(
                "Injected serialization failure"
            )));
        }
        *self.guard = self.staged;
        Ok(())
    }
}
