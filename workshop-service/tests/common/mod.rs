//! Common test utilities for workshop-service integration tests.

#![allow(dead_code)]

use rust_decimal_macros::dec;
use std::sync::Once;
use workshop_service::config::{RetrySettings, WorkshopConfig};
use workshop_service::models::{
    Acceptance, AcceptanceChannel, Currency, ItemKind, LineItem, NewQuote, PricingOptions, Quote,
    WorkOrder,
};
use workshop_service::store::MemoryStore;
use workshop_service::Workshop;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,workshop_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Config with short retry backoffs.
pub fn test_config() -> WorkshopConfig {
    WorkshopConfig {
        service_name: "workshop-service-test".to_string(),
        log_level: "debug".to_string(),
        retry: RetrySettings {
            max_retries: 2,
            initial_backoff_ms: 5,
            max_backoff_ms: 50,
        },
        ..WorkshopConfig::default()
    }
}

/// A workshop over a fresh in-memory store.
pub fn spawn_workshop() -> Workshop<MemoryStore> {
    init_tracing();
    Workshop::in_memory(&test_config()).expect("Failed to build workshop")
}

pub fn ars() -> Currency {
    Currency::default()
}

/// Two lines summing to 1000: a screen with device data and 4 hours of labor.
pub fn repair_items() -> Vec<LineItem> {
    vec![
        LineItem::new(ItemKind::Product, "Screen replacement", 1, dec!(600)).with_device(
            Some("Lenovo"),
            Some("ThinkPad T14"),
            Some("PF-3XK91"),
        ),
        LineItem::new(ItemKind::Repair, "Bench labor", 1, dec!(0)).with_hours(dec!(4), dec!(100)),
    ]
}

/// Quote input priced at 1143.45 (10% rebate, 5% surcharge, 21% tax).
pub fn priced_quote(client: &str) -> NewQuote {
    NewQuote {
        pricing: PricingOptions {
            rebate_pct: Some(dec!(10)),
            surcharge_pct: Some(dec!(5)),
            tax_pct: Some(dec!(21)),
        },
        ..NewQuote::new(client, repair_items())
    }
}

pub fn acceptance() -> Acceptance {
    Acceptance::new("Ana Ruiz", AcceptanceChannel::Whatsapp)
}

pub async fn create_quote(workshop: &Workshop<MemoryStore>) -> Quote {
    workshop
        .quotes()
        .create(priced_quote("Ana Ruiz"))
        .await
        .expect("Failed to create quote")
}

/// Create, accept and load the resulting order.
pub async fn accepted_order(workshop: &Workshop<MemoryStore>) -> (Quote, WorkOrder) {
    let quote = create_quote(workshop).await;
    let outcome = workshop
        .quotes()
        .accept(quote.id, acceptance())
        .await
        .expect("Failed to accept quote");
    let order = workshop
        .orders()
        .get(outcome.order_id())
        .await
        .expect("Order should exist");
    (quote, order)
}
