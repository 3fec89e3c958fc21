//! Dashboard aggregate tests.

mod common;

use common::{accepted_order, acceptance, ars, create_quote, spawn_workshop};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use workshop_service::models::{NewPayment, PaymentMethod, WorkStatus};

#[tokio::test]
async fn empty_workshop_has_zero_totals() {
    let workshop = spawn_workshop();

    let stats = workshop.dashboard().await.unwrap();

    assert_eq!(stats.quotes_total, 0);
    assert_eq!(stats.orders_total, 0);
    assert_eq!(stats.acceptance_rate, Decimal::ZERO);
    assert_eq!(stats.completion_rate, Decimal::ZERO);
    assert_eq!(stats.total_paid, Decimal::ZERO);
    assert_eq!(stats.total_outstanding, Decimal::ZERO);
}

#[tokio::test]
async fn totals_follow_payments_and_statuses() {
    let workshop = spawn_workshop();
    let (_, paid) = accepted_order(&workshop).await;
    let (_, unpaid) = accepted_order(&workshop).await;
    create_quote(&workshop).await;

    workshop
        .payments()
        .register_payment(NewPayment::new(paid.id, dec!(300), ars(), PaymentMethod::Cash))
        .await
        .unwrap();
    workshop
        .orders()
        .set_status(paid.id, WorkStatus::InProgress)
        .await
        .unwrap();
    workshop
        .orders()
        .set_status(unpaid.id, WorkStatus::Completed)
        .await
        .unwrap();

    let stats = workshop.dashboard().await.unwrap();

    assert_eq!(stats.quotes_total, 3);
    assert_eq!(stats.quotes_accepted, 2);
    assert_eq!(stats.acceptance_rate, dec!(66.7));
    assert_eq!(stats.orders_total, 2);
    assert_eq!(stats.orders_active, 1);
    assert_eq!(stats.orders_completed, 1);
    assert_eq!(stats.completion_rate, dec!(50));
    assert_eq!(stats.total_paid, dec!(300));
    assert_eq!(stats.total_outstanding, dec!(1986.90));
}

#[tokio::test]
async fn settled_order_moves_balance_into_paid() {
    let workshop = spawn_workshop();
    let (_, order) = accepted_order(&workshop).await;

    let before = workshop.dashboard().await.unwrap();
    assert_eq!(before.total_outstanding, dec!(1143.45));

    workshop
        .payments()
        .register_payment(NewPayment::new(order.id, dec!(1143.45), ars(), PaymentMethod::Transfer))
        .await
        .unwrap();

    let after = workshop.dashboard().await.unwrap();
    assert_eq!(after.total_paid, dec!(1143.45));
    assert_eq!(after.total_outstanding, dec!(0));
}

#[tokio::test]
async fn counts_span_more_than_one_page() {
    let workshop = spawn_workshop();
    for _ in 0..105 {
        create_quote(&workshop).await;
    }
    let quote = create_quote(&workshop).await;
    workshop.quotes().accept(quote.id, acceptance()).await.unwrap();

    let stats = workshop.dashboard().await.unwrap();

    assert_eq!(stats.quotes_total, 106);
    assert_eq!(stats.quotes_accepted, 1);
    assert_eq!(stats.orders_total, 1);
}
