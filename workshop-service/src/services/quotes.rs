//! Quote lifecycle: creation, edits, status transitions and the conversion
//! of an accepted quote into a work order.

use super::calculator::{line_total, totals};
use super::documents::{quote_document, QuoteDocument};
use super::in_transaction;
use super::metrics::QUOTES_TOTAL;
use super::sequence::{allocate, Allocation, SequenceKind};
use crate::error::WorkshopError;
use crate::models::{
    Acceptance, Currency, Device, ItemKind, LineItem, NewQuote, PayStatus, Quote, QuotePatch,
    QuoteStatus, QuoteSummary, WorkOrder, WorkStatus,
};
use crate::store::{
    DocumentStore, Page, PageCursor, PageRequest, StoreTransaction, DEFAULT_QUOTE_PAGE_SIZE,
};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use service_core::retry::RetryConfig;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Result of accepting a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// A new work order was created.
    Accepted(Uuid),
    /// The quote had already been converted; carries the existing order.
    AlreadyAccepted(Uuid),
}

impl AcceptOutcome {
    pub fn order_id(&self) -> Uuid {
        match self {
            AcceptOutcome::Accepted(id) | AcceptOutcome::AlreadyAccepted(id) => *id,
        }
    }
}

pub struct QuoteService<S: DocumentStore> {
    store: Arc<S>,
    retry: RetryConfig,
    default_currency: Currency,
}

fn validate_items(items: &[LineItem]) -> Result<(), WorkshopError> {
    if items.is_empty() {
        return Err(WorkshopError::validation(
            "At least one line item is required",
        ));
    }
    items.iter().try_for_each(LineItem::validate)
}

fn validate_client(client_name: &str) -> Result<(), WorkshopError> {
    if client_name.trim().is_empty() {
        return Err(WorkshopError::validation("Client name is required"));
    }
    Ok(())
}

/// Append every labor and part entry of `order` that is not yet a line of
/// `quote`, raising the quote total by the appended amount. Existing lines
/// are never touched. Returns the number of appended lines.
pub(crate) fn sync_into_quote(quote: &mut Quote, order: &WorkOrder) -> usize {
    let known: HashSet<Uuid> = quote.items.iter().map(|item| item.id).collect();

    let labor = order.labor.iter().map(|entry| {
        let mut line = LineItem::new(ItemKind::Repair, &entry.description, 1, entry.billed());
        line.id = entry.id;
        line
    });
    let parts = order.parts.iter().map(|entry| {
        let mut line = LineItem::new(
            ItemKind::Product,
            &entry.description,
            entry.quantity,
            entry.price.unwrap_or(Decimal::ZERO),
        );
        line.id = entry.id;
        line.serial = entry.lot_serial.clone();
        line
    });

    let mut appended = 0;
    for line in labor.chain(parts) {
        if known.contains(&line.id) {
            continue;
        }
        quote.total += line_total(&line);
        quote.items.push(line);
        appended += 1;
    }
    appended
}

/// Snapshot of an accepted quote as a fresh work order.
fn order_from_quote(quote: &Quote, allocation: Allocation, now: DateTime<Utc>) -> WorkOrder {
    let device = quote
        .items
        .first()
        .map(|item| Device {
            brand: item.brand.clone(),
            model: item.model.clone(),
            serial: item.serial.clone(),
            ..Device::default()
        })
        .unwrap_or_default();

    WorkOrder {
        id: Uuid::new_v4(),
        quote_id: quote.id,
        client_name: quote.client_name.clone(),
        device,
        diagnosis: None,
        labor: Vec::new(),
        parts: Vec::new(),
        quoted_items: quote.items.clone(),
        currency: quote.currency.clone(),
        status: WorkStatus::Pending,
        pay_status: PayStatus::Unpaid,
        warranty_days: None,
        delivery_notes: None,
        notes: None,
        estimated_total: quote.total,
        final_total: quote.total,
        paid_to_date: Decimal::ZERO,
        balance: quote.total,
        year: allocation.year,
        sequence: allocation.sequence,
        code: allocation.code,
        created_utc: now,
        started_utc: None,
        completed_utc: None,
        delivered_utc: None,
    }
}

impl<S: DocumentStore> QuoteService<S> {
    pub fn new(store: Arc<S>, retry: RetryConfig, default_currency: Currency) -> Self {
        Self {
            store,
            retry,
            default_currency,
        }
    }

    /// Create a draft quote with the next `P-<year>-<seq>` code.
    #[instrument(skip(self, input), fields(client = %input.client_name))]
    pub async fn create(&self, input: NewQuote) -> Result<Quote, WorkshopError> {
        input.validate()?;
        validate_client(&input.client_name)?;
        validate_items(&input.items)?;

        let now = Utc::now();
        let draft = Quote {
            id: Uuid::new_v4(),
            client_name: input.client_name.trim().to_string(),
            date: input.date.unwrap_or_else(|| now.date_naive()),
            currency: input
                .currency
                .clone()
                .unwrap_or_else(|| self.default_currency.clone()),
            total: totals(&input.items, &input.pricing).total,
            items: input.items,
            pricing: input.pricing,
            notes: input.notes,
            year: now.year(),
            sequence: 0,
            code: String::new(),
            status: QuoteStatus::Draft,
            acceptance: None,
            order_id: None,
            created_utc: now,
            updated_utc: None,
        };

        let store = &self.store;
        let draft = &draft;
        let quote = in_transaction(&self.retry, "create_quote", move || async move {
            let mut tx = store.begin().await?;
            let allocation = allocate(&mut tx, SequenceKind::Quote, draft.year).await?;
            let quote = Quote {
                sequence: allocation.sequence,
                code: allocation.code,
                ..draft.clone()
            };
            tx.save_quote(&quote).await?;
            tx.commit().await?;
            Ok(quote)
        })
        .await?;

        QUOTES_TOTAL.with_label_values(&["draft"]).inc();
        info!(quote_id = %quote.id, code = %quote.code, total = %quote.total, "Quote created");

        Ok(quote)
    }

    pub async fn get(&self, id: Uuid) -> Result<Quote, WorkshopError> {
        self.store
            .quote(id)
            .await?
            .ok_or_else(|| WorkshopError::not_found("Quote", id))
    }

    /// Quotes newest first.
    pub async fn list(&self, page: PageRequest) -> Result<Page<QuoteSummary>, WorkshopError> {
        let limit = page.resolve_limit(DEFAULT_QUOTE_PAGE_SIZE);
        let quotes = self.store.list_quotes(limit, page.after).await?;
        let summaries = quotes.iter().map(QuoteSummary::from).collect();
        Ok(Page::new(summaries, limit, |s: &QuoteSummary| {
            PageCursor::new(s.created_utc, s.id)
        }))
    }

    /// Edit a quote that has not been accepted. The total is recomputed from
    /// the resulting items and pricing.
    #[instrument(skip(self, patch), fields(quote_id = %id))]
    pub async fn update(&self, id: Uuid, patch: QuotePatch) -> Result<Quote, WorkshopError> {
        if let Some(client_name) = &patch.client_name {
            validate_client(client_name)?;
        }
        if let Some(items) = &patch.items {
            validate_items(items)?;
        }

        let store = &self.store;
        let patch = &patch;
        let quote = in_transaction(&self.retry, "update_quote", move || async move {
            let mut tx = store.begin().await?;
            let mut quote = tx
                .quote(id)
                .await?
                .ok_or_else(|| WorkshopError::not_found("Quote", id))?;

            if quote.status == QuoteStatus::Accepted {
                return Err(WorkshopError::InvalidState(anyhow::anyhow!(
                    "Quote {} is accepted and can no longer be edited",
                    quote.code
                )));
            }

            if let Some(client_name) = &patch.client_name {
                quote.client_name = client_name.trim().to_string();
            }
            if let Some(date) = patch.date {
                quote.date = date;
            }
            if let Some(currency) = &patch.currency {
                quote.currency = currency.clone();
            }
            if let Some(items) = &patch.items {
                quote.items = items.clone();
            }
            if let Some(pricing) = patch.pricing {
                quote.pricing = pricing;
            }
            if let Some(notes) = &patch.notes {
                quote.notes = Some(notes.clone());
            }
            quote.total = totals(&quote.items, &quote.pricing).total;
            quote.updated_utc = Some(Utc::now());

            tx.save_quote(&quote).await?;
            tx.commit().await?;
            Ok(quote)
        })
        .await?;

        info!(code = %quote.code, total = %quote.total, "Quote updated");
        Ok(quote)
    }

    /// `draft -> sent`.
    pub async fn send(&self, id: Uuid) -> Result<Quote, WorkshopError> {
        self.transition(id, QuoteStatus::Sent, None).await
    }

    /// `draft | sent -> rejected`.
    pub async fn reject(&self, id: Uuid) -> Result<Quote, WorkshopError> {
        self.transition(id, QuoteStatus::Rejected, None).await
    }

    /// Void a non-accepted quote, appending `reason` to its notes.
    pub async fn void(&self, id: Uuid, reason: &str) -> Result<Quote, WorkshopError> {
        self.transition(id, QuoteStatus::Voided, Some(reason)).await
    }

    /// Move a quote to `target`. Already being there is not an error.
    #[instrument(skip(self, reason), fields(quote_id = %id, target = %target))]
    async fn transition(
        &self,
        id: Uuid,
        target: QuoteStatus,
        reason: Option<&str>,
    ) -> Result<Quote, WorkshopError> {
        let store = &self.store;
        let operation = match target {
            QuoteStatus::Sent => "send_quote",
            QuoteStatus::Rejected => "reject_quote",
            _ => "void_quote",
        };

        let (quote, changed) = in_transaction(&self.retry, operation, move || async move {
            let mut tx = store.begin().await?;
            let mut quote = tx
                .quote(id)
                .await?
                .ok_or_else(|| WorkshopError::not_found("Quote", id))?;

            if quote.status == target {
                return Ok((quote, false));
            }
            if !quote.status.can_transition_to(target) {
                return Err(WorkshopError::InvalidState(anyhow::anyhow!(
                    "Quote {} cannot move from {} to {}",
                    quote.code,
                    quote.status,
                    target
                )));
            }

            quote.status = target;
            quote.updated_utc = Some(Utc::now());
            if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
                let line = format!("[{}]: {}", target, reason);
                quote.notes = Some(match quote.notes.take() {
                    Some(notes) if !notes.is_empty() => format!("{}\n{}", notes, line),
                    _ => line,
                });
            }

            tx.save_quote(&quote).await?;
            tx.commit().await?;
            Ok((quote, true))
        })
        .await?;

        if changed {
            QUOTES_TOTAL.with_label_values(&[target.as_str()]).inc();
            info!(code = %quote.code, status = %quote.status, "Quote status changed");
        }
        Ok(quote)
    }

    /// Accept a quote and create its work order in one transaction.
    ///
    /// Accepting an already converted quote yields
    /// [`AcceptOutcome::AlreadyAccepted`] with the existing order id, also
    /// when two callers race on the same quote.
    #[instrument(skip(self, acceptance), fields(quote_id = %id))]
    pub async fn accept(
        &self,
        id: Uuid,
        acceptance: Acceptance,
    ) -> Result<AcceptOutcome, WorkshopError> {
        if acceptance.name.trim().is_empty() {
            return Err(WorkshopError::validation(
                "Acceptance requires the accepting party's name",
            ));
        }

        let acceptance = &acceptance;
        let outcome = in_transaction(&self.retry, "accept_quote", move || {
            self.accept_once(id, acceptance)
        })
        .await?;

        match outcome {
            AcceptOutcome::Accepted(order_id) => {
                QUOTES_TOTAL.with_label_values(&["accepted"]).inc();
                info!(order_id = %order_id, "Quote accepted, work order created");
            }
            AcceptOutcome::AlreadyAccepted(order_id) => {
                warn!(order_id = %order_id, "Quote was already accepted");
            }
        }
        Ok(outcome)
    }

    async fn accept_once(
        &self,
        id: Uuid,
        acceptance: &Acceptance,
    ) -> Result<AcceptOutcome, WorkshopError> {
        let mut tx = self.store.begin().await?;
        let mut quote = tx
            .quote(id)
            .await?
            .ok_or_else(|| WorkshopError::not_found("Quote", id))?;

        if let (QuoteStatus::Accepted, Some(order_id)) = (quote.status, quote.order_id) {
            return Ok(AcceptOutcome::AlreadyAccepted(order_id));
        }
        if !quote.status.can_transition_to(QuoteStatus::Accepted) {
            return Err(WorkshopError::InvalidState(anyhow::anyhow!(
                "Quote {} is {} and cannot be accepted",
                quote.code,
                quote.status
            )));
        }

        let now = Utc::now();
        let allocation = allocate(&mut tx, SequenceKind::Order, now.year()).await?;
        let order = order_from_quote(&quote, allocation, now);
        tx.save_order(&order).await?;

        quote.status = QuoteStatus::Accepted;
        quote.acceptance = Some(acceptance.clone());
        quote.order_id = Some(order.id);
        quote.updated_utc = Some(now);
        tx.save_quote(&quote).await?;

        tx.commit().await?;
        Ok(AcceptOutcome::Accepted(order.id))
    }

    /// Push labor and parts added on the order back into its quote.
    #[instrument(skip(self), fields(order_id = %order_id, quote_id = %quote_id))]
    pub async fn sync(&self, order_id: Uuid, quote_id: Uuid) -> Result<Quote, WorkshopError> {
        let store = &self.store;
        let quote = in_transaction(&self.retry, "sync_quote", move || async move {
            let mut tx = store.begin().await?;
            let order = tx
                .order(order_id)
                .await?
                .ok_or_else(|| WorkshopError::not_found("Order", order_id))?;
            if order.quote_id != quote_id {
                return Err(WorkshopError::validation(format!(
                    "Order {} was not created from quote {}",
                    order.code, quote_id
                )));
            }
            let mut quote = tx
                .quote(quote_id)
                .await?
                .ok_or_else(|| WorkshopError::not_found("Quote", quote_id))?;

            if sync_into_quote(&mut quote, &order) > 0 {
                quote.updated_utc = Some(Utc::now());
                tx.save_quote(&quote).await?;
                tx.commit().await?;
            }
            Ok(quote)
        })
        .await?;

        info!(total = %quote.total, "Quote synced from order");
        Ok(quote)
    }

    /// Printable view of a quote.
    pub async fn document(&self, id: Uuid) -> Result<QuoteDocument, WorkshopError> {
        let quote = self.get(id).await?;
        let settings = self.store.settings().await?.unwrap_or_default();
        Ok(quote_document(&quote, &settings))
    }
}
