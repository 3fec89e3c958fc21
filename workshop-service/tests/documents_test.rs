//! Printable document view model tests.

mod common;

use common::{accepted_order, ars, create_quote, spawn_workshop};
use rust_decimal_macros::dec;
use workshop_service::models::{BusinessSettings, NewPayment, PartEntry, PaymentMethod};
use workshop_service::WorkshopError;

fn settings() -> BusinessSettings {
    BusinessSettings {
        name: "FixIT Taller".to_string(),
        address: "Av. Corrientes 1234, CABA".to_string(),
        phone: "+54 11 5555-0000".to_string(),
        email: "hola@fixit.example".to_string(),
        logo_url: None,
        footer_text: Some("Garantía de 90 días".to_string()),
    }
}

#[tokio::test]
async fn quote_document_flattens_lines_and_branding() {
    let workshop = spawn_workshop();
    workshop.save_settings(settings()).await.unwrap();
    let quote = create_quote(&workshop).await;

    let doc = workshop.quotes().document(quote.id).await.unwrap();

    assert_eq!(doc.code, quote.code);
    assert_eq!(doc.client_name, "Ana Ruiz");
    assert_eq!(doc.currency, "ARS");
    assert_eq!(doc.lines.len(), 2);
    assert_eq!(doc.lines[0].description, "Screen replacement");
    assert_eq!(doc.lines[0].total, dec!(600));
    assert_eq!(doc.lines[1].unit_price, dec!(400));
    assert_eq!(doc.subtotal, dec!(1000));
    assert_eq!(doc.total, dec!(1143.45));
    assert_eq!(doc.branding.name, "FixIT Taller");
    assert_eq!(doc.branding.footer_text.as_deref(), Some("Garantía de 90 días"));
}

#[tokio::test]
async fn order_document_reports_entries_and_balance() {
    let workshop = spawn_workshop();
    let (quote, order) = accepted_order(&workshop).await;
    workshop
        .orders()
        .add_part(order.id, PartEntry::new("Hinge kit", 2, dec!(37.5)))
        .await
        .unwrap();
    workshop
        .payments()
        .register_payment(NewPayment::new(order.id, dec!(500), ars(), PaymentMethod::Cash))
        .await
        .unwrap();

    let doc = workshop.orders().document(order.id).await.unwrap();

    assert_eq!(doc.quote_code.as_deref(), Some(quote.code.as_str()));
    assert_eq!(doc.order_code, order.code);
    assert_eq!(doc.device.brand.as_deref(), Some("Lenovo"));
    assert_eq!(doc.parts.len(), 1);
    assert_eq!(doc.parts[0].quantity, 2);
    assert_eq!(doc.parts[0].total, dec!(75));
    assert_eq!(doc.final_total, dec!(1218.45));
    assert_eq!(doc.paid_to_date, dec!(500));
    assert_eq!(doc.balance, dec!(718.45));
    assert!(doc.branding.name.is_empty());
}

#[tokio::test]
async fn settings_require_a_business_name() {
    let workshop = spawn_workshop();

    let err = workshop
        .save_settings(BusinessSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkshopError::Validation(_)));

    workshop.save_settings(settings()).await.unwrap();
    assert_eq!(workshop.settings().await.unwrap(), settings());
}

#[test]
fn documents_omit_absent_fields_when_serialized() {
    let json = serde_json::to_value(workshop_service::services::documents::Branding::from(
        &settings(),
    ))
    .unwrap();
    assert!(json.get("logo_url").is_none());
    assert_eq!(json["footer_text"], "Garantía de 90 días");
}
