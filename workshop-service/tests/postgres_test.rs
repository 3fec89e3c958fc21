//! Postgres store integration tests.
//!
//! Run with: TEST_DATABASE_URL=postgres://... cargo test -p workshop-service -- --ignored

mod common;

use common::{acceptance, ars, init_tracing, priced_quote};
use futures::future::join_all;
use rust_decimal_macros::dec;
use serial_test::serial;
use workshop_service::config::{DatabaseConfig, WorkshopConfig};
use workshop_service::models::{NewPayment, PartEntry, PayStatus, PaymentMethod, QuoteStatus};
use workshop_service::services::{AcceptOutcome, SequenceKind};
use workshop_service::store::PgStore;
use workshop_service::Workshop;

async fn spawn_pg_workshop() -> Workshop<PgStore> {
    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run Postgres tests");

    let config = WorkshopConfig {
        service_name: "workshop-service-test".to_string(),
        database: DatabaseConfig {
            url: Some(database_url),
            max_connections: 8,
            min_connections: 1,
            ..DatabaseConfig::default()
        },
        ..WorkshopConfig::default()
    };

    Workshop::connect(&config)
        .await
        .expect("Failed to connect to test database")
}

#[tokio::test]
#[ignore]
#[serial]
async fn accept_and_settle_round_trip() {
    let workshop = spawn_pg_workshop().await;
    workshop.health_check().await.unwrap();

    let quote = workshop.quotes().create(priced_quote("Ana Ruiz")).await.unwrap();
    assert_eq!(quote.total, dec!(1143.45));

    let outcome = workshop.quotes().accept(quote.id, acceptance()).await.unwrap();
    let again = workshop.quotes().accept(quote.id, acceptance()).await.unwrap();
    assert_eq!(again, AcceptOutcome::AlreadyAccepted(outcome.order_id()));

    let accepted = workshop.quotes().get(quote.id).await.unwrap();
    assert_eq!(accepted.status, QuoteStatus::Accepted);

    let payment = workshop
        .payments()
        .register_payment(NewPayment::new(
            outcome.order_id(),
            dec!(300),
            ars(),
            PaymentMethod::Transfer,
        ))
        .await
        .unwrap();
    let order = workshop.orders().get(outcome.order_id()).await.unwrap();
    assert_eq!(order.balance, dec!(843.45));
    assert_eq!(order.pay_status, PayStatus::Partial);

    let restored = workshop
        .payments()
        .delete_payment(payment.id, order.id)
        .await
        .unwrap();
    assert_eq!(restored.balance, dec!(1143.45));
    assert_eq!(restored.pay_status, PayStatus::Unpaid);
}

#[tokio::test]
#[ignore]
#[serial]
async fn concurrent_accepts_create_one_order() {
    let workshop = spawn_pg_workshop().await;
    let quote = workshop.quotes().create(priced_quote("Luis Gómez")).await.unwrap();

    let outcomes: Vec<AcceptOutcome> =
        join_all((0..4).map(|_| workshop.quotes().accept(quote.id, acceptance())))
            .await
            .into_iter()
            .map(|r| r.expect("Accept should succeed"))
            .collect();

    let created = outcomes
        .iter()
        .filter(|o| matches!(o, AcceptOutcome::Accepted(_)))
        .count();
    assert_eq!(created, 1);
    let order_id = outcomes[0].order_id();
    assert!(outcomes.iter().all(|o| o.order_id() == order_id));
}

#[tokio::test]
#[ignore]
#[serial]
async fn concurrent_sequences_are_contiguous() {
    let workshop = spawn_pg_workshop().await;
    // Counters persist across runs, so only the shape of the batch is checked.
    let year = 2025;

    let mut allocated: Vec<i32> = join_all(
        (0..10).map(|_| workshop.sequences().next_sequence(SequenceKind::Order, year)),
    )
    .await
    .into_iter()
    .map(|r| r.expect("Allocation should succeed"))
    .collect();
    allocated.sort_unstable();

    let first = allocated[0];
    assert_eq!(allocated, (first..first + 10).collect::<Vec<_>>());
}

#[tokio::test]
#[ignore]
#[serial]
async fn burst_of_creations_all_receive_codes() {
    let workshop = spawn_pg_workshop().await;

    let quotes: Vec<_> = join_all((0..40).map(|i| {
        workshop
            .quotes()
            .create(priced_quote(&format!("Client {}", i)))
    }))
    .await
    .into_iter()
    .map(|r| r.expect("Creation should succeed after retries"))
    .collect();

    let mut sequences: Vec<i32> = quotes.iter().map(|q| q.sequence).collect();
    sequences.sort_unstable();
    let first = sequences[0];
    assert_eq!(sequences, (first..first + 40).collect::<Vec<_>>());
}

#[tokio::test]
#[ignore]
#[serial]
async fn order_save_syncs_quote_in_store() {
    let workshop = spawn_pg_workshop().await;
    let quote = workshop.quotes().create(priced_quote("Ana Ruiz")).await.unwrap();
    let outcome = workshop.quotes().accept(quote.id, acceptance()).await.unwrap();

    workshop
        .orders()
        .add_part(outcome.order_id(), PartEntry::new("Fan", 2, dec!(35)))
        .await
        .unwrap();
    let saved = workshop
        .orders()
        .save(outcome.order_id(), Default::default())
        .await
        .unwrap();

    let synced = workshop.quotes().get(quote.id).await.unwrap();
    assert_eq!(synced.total, saved.final_total);
    assert_eq!(synced.items.len(), quote.items.len() + 1);
}
