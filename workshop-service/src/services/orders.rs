//! Work order ledger: billed entries, totals, balance and status.

use super::calculator::round2;
use super::documents::{order_document, OrderDocument};
use super::in_transaction;
use super::metrics::ORDERS_TOTAL;
use super::quotes::sync_into_quote;
use crate::error::WorkshopError;
use crate::models::{
    LaborEntry, OrderPatch, OrderSummary, PartEntry, PayStatus, WorkOrder, WorkStatus,
};
use crate::store::{
    DocumentStore, Page, PageCursor, PageRequest, StoreTransaction, DEFAULT_ORDER_PAGE_SIZE,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::retry::RetryConfig;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// `unpaid` until something was paid, `paid` once nothing is owed,
/// `partial` in between. `refunded` is never derived.
pub fn derive_pay_status(paid_to_date: Decimal, balance: Decimal) -> PayStatus {
    if paid_to_date <= Decimal::ZERO {
        PayStatus::Unpaid
    } else if balance <= Decimal::ZERO {
        PayStatus::Paid
    } else {
        PayStatus::Partial
    }
}

/// Outstanding balance, floored at zero, and the pay status it implies.
pub fn settle(final_total: Decimal, paid_to_date: Decimal) -> (Decimal, PayStatus) {
    let balance = round2(final_total - paid_to_date).max(Decimal::ZERO);
    (balance, derive_pay_status(paid_to_date, balance))
}

/// `final_total = estimated_total + labor + parts`, then settle the balance.
pub fn recompute_final_total(order: &mut WorkOrder) {
    let labor: Decimal = order.labor.iter().map(LaborEntry::billed).sum();
    let parts: Decimal = order.parts.iter().map(PartEntry::billed).sum();
    order.final_total = order.estimated_total + labor + parts;

    let (balance, pay_status) = settle(order.final_total, order.paid_to_date);
    order.balance = balance;
    order.pay_status = pay_status;
}

/// Move to `status`, stamping the first start and each completion and
/// delivery. Any status may follow any other.
fn apply_status(order: &mut WorkOrder, status: WorkStatus, now: DateTime<Utc>) {
    if order.status == status {
        return;
    }
    match status {
        WorkStatus::InProgress if order.started_utc.is_none() => order.started_utc = Some(now),
        WorkStatus::Completed => order.completed_utc = Some(now),
        WorkStatus::Delivered => order.delivered_utc = Some(now),
        _ => {}
    }
    order.status = status;
}

fn validate_labor(entry: &LaborEntry) -> Result<(), WorkshopError> {
    if entry.description.trim().is_empty() {
        return Err(WorkshopError::validation("Labor entry needs a description"));
    }
    let negative = |v: Option<Decimal>| v.is_some_and(|v| v < Decimal::ZERO);
    if negative(entry.price) || negative(entry.hours) {
        return Err(WorkshopError::validation(format!(
            "Labor entry '{}' must not have negative price or hours",
            entry.description
        )));
    }
    Ok(())
}

fn validate_part(entry: &PartEntry) -> Result<(), WorkshopError> {
    if entry.description.trim().is_empty() {
        return Err(WorkshopError::validation("Part entry needs a description"));
    }
    if entry.quantity < 1 {
        return Err(WorkshopError::validation(format!(
            "Part '{}' quantity must be at least 1",
            entry.description
        )));
    }
    let negative = |v: Option<Decimal>| v.is_some_and(|v| v < Decimal::ZERO);
    if negative(entry.price) || negative(entry.cost) {
        return Err(WorkshopError::validation(format!(
            "Part '{}' must not have negative price or cost",
            entry.description
        )));
    }
    Ok(())
}

pub struct OrderService<S: DocumentStore> {
    store: Arc<S>,
    retry: RetryConfig,
}

impl<S: DocumentStore> OrderService<S> {
    pub fn new(store: Arc<S>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    pub async fn get(&self, id: Uuid) -> Result<WorkOrder, WorkshopError> {
        self.store
            .order(id)
            .await?
            .ok_or_else(|| WorkshopError::not_found("Order", id))
    }

    /// Orders newest first.
    pub async fn list(&self, page: PageRequest) -> Result<Page<OrderSummary>, WorkshopError> {
        let limit = page.resolve_limit(DEFAULT_ORDER_PAGE_SIZE);
        let orders = self.store.list_orders(limit, page.after).await?;
        let summaries = orders.iter().map(OrderSummary::from).collect();
        Ok(Page::new(summaries, limit, |s: &OrderSummary| {
            PageCursor::new(s.created_utc, s.id)
        }))
    }

    pub async fn add_labor(
        &self,
        order_id: Uuid,
        entry: LaborEntry,
    ) -> Result<WorkOrder, WorkshopError> {
        validate_labor(&entry)?;
        self.mutate(order_id, "add_labor", false, |order, _| {
            order.labor.push(entry.clone());
            Ok(())
        })
        .await
    }

    pub async fn add_part(
        &self,
        order_id: Uuid,
        entry: PartEntry,
    ) -> Result<WorkOrder, WorkshopError> {
        validate_part(&entry)?;
        self.mutate(order_id, "add_part", false, |order, _| {
            order.parts.push(entry.clone());
            Ok(())
        })
        .await
    }

    pub async fn remove_labor(
        &self,
        order_id: Uuid,
        entry_id: Uuid,
    ) -> Result<WorkOrder, WorkshopError> {
        self.mutate(order_id, "remove_labor", false, |order, _| {
            let before = order.labor.len();
            order.labor.retain(|e| e.id != entry_id);
            if order.labor.len() == before {
                return Err(WorkshopError::not_found("Labor entry", entry_id));
            }
            Ok(())
        })
        .await
    }

    pub async fn remove_part(
        &self,
        order_id: Uuid,
        entry_id: Uuid,
    ) -> Result<WorkOrder, WorkshopError> {
        self.mutate(order_id, "remove_part", false, |order, _| {
            let before = order.parts.len();
            order.parts.retain(|e| e.id != entry_id);
            if order.parts.len() == before {
                return Err(WorkshopError::not_found("Part entry", entry_id));
            }
            Ok(())
        })
        .await
    }

    pub async fn set_status(
        &self,
        order_id: Uuid,
        status: WorkStatus,
    ) -> Result<WorkOrder, WorkshopError> {
        self.mutate(order_id, "set_order_status", false, |order, now| {
            apply_status(order, status, now);
            Ok(())
        })
        .await
    }

    /// Persist the patched fields together and sync the linked quote.
    pub async fn save(
        &self,
        order_id: Uuid,
        patch: OrderPatch,
    ) -> Result<WorkOrder, WorkshopError> {
        if let Some(labor) = &patch.labor {
            labor.iter().try_for_each(validate_labor)?;
        }
        if let Some(parts) = &patch.parts {
            parts.iter().try_for_each(validate_part)?;
        }

        self.mutate(order_id, "save_order", true, |order, now| {
            let patch = patch.clone();
            if let Some(device) = patch.device {
                order.device = device;
            }
            if let Some(diagnosis) = patch.diagnosis {
                order.diagnosis = Some(diagnosis);
            }
            if let Some(delivery_notes) = patch.delivery_notes {
                order.delivery_notes = Some(delivery_notes);
            }
            if let Some(notes) = patch.notes {
                order.notes = Some(notes);
            }
            if let Some(days) = patch.warranty_days {
                order.warranty_days = Some(days);
            }
            if let Some(labor) = patch.labor {
                order.labor = labor;
            }
            if let Some(parts) = patch.parts {
                order.parts = parts;
            }
            if let Some(status) = patch.status {
                apply_status(order, status, now);
            }
            Ok(())
        })
        .await
    }

    /// Save `patch` and mark the order completed in the same transaction.
    pub async fn complete(
        &self,
        order_id: Uuid,
        patch: OrderPatch,
    ) -> Result<WorkOrder, WorkshopError> {
        self.save(
            order_id,
            OrderPatch {
                status: Some(WorkStatus::Completed),
                ..patch
            },
        )
        .await
    }

    /// Printable view of an order.
    pub async fn document(&self, order_id: Uuid) -> Result<OrderDocument, WorkshopError> {
        let order = self.get(order_id).await?;
        let quote = self.store.quote(order.quote_id).await?;
        let settings = self.store.settings().await?.unwrap_or_default();
        Ok(order_document(
            &order,
            quote.as_ref().map(|q| q.code.as_str()),
            &settings,
        ))
    }

    /// Read-modify-write of one order in a transaction, recomputing totals.
    /// With `sync_quote`, the linked quote is synced in the same transaction.
    #[instrument(skip(self, apply), fields(order_id = %order_id))]
    async fn mutate<F>(
        &self,
        order_id: Uuid,
        operation: &'static str,
        sync_quote: bool,
        apply: F,
    ) -> Result<WorkOrder, WorkshopError>
    where
        F: Fn(&mut WorkOrder, DateTime<Utc>) -> Result<(), WorkshopError>,
    {
        let store = &self.store;
        let apply = &apply;
        let (order, previous) = in_transaction(&self.retry, operation, move || async move {
            let mut tx = store.begin().await?;
            let mut order = tx
                .order(order_id)
                .await?
                .ok_or_else(|| WorkshopError::not_found("Order", order_id))?;
            let previous = order.status;
            let now = Utc::now();

            apply(&mut order, now)?;
            recompute_final_total(&mut order);
            tx.save_order(&order).await?;

            if sync_quote {
                match tx.quote(order.quote_id).await? {
                    Some(mut quote) => {
                        if sync_into_quote(&mut quote, &order) > 0 {
                            quote.updated_utc = Some(now);
                            tx.save_quote(&quote).await?;
                        }
                    }
                    None => {
                        warn!(quote_id = %order.quote_id, "Linked quote missing, skipping sync")
                    }
                }
            }

            tx.commit().await?;
            Ok((order, previous))
        })
        .await?;

        if order.status != previous {
            ORDERS_TOTAL
                .with_label_values(&[order.status.as_str()])
                .inc();
        }
        info!(
            operation = operation,
            status = %order.status,
            final_total = %order.final_total,
            balance = %order.balance,
            "Order updated"
        );

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pay_status_follows_paid_and_balance() {
        assert_eq!(derive_pay_status(dec!(0), dec!(100)), PayStatus::Unpaid);
        assert_eq!(derive_pay_status(dec!(40), dec!(60)), PayStatus::Partial);
        assert_eq!(derive_pay_status(dec!(100), dec!(0)), PayStatus::Paid);
    }

    #[test]
    fn settle_floors_balance_at_zero() {
        assert_eq!(settle(dec!(100), dec!(150)), (dec!(0), PayStatus::Paid));
        assert_eq!(
            settle(dec!(1143.45), dec!(300)),
            (dec!(843.45), PayStatus::Partial)
        );
    }
}
