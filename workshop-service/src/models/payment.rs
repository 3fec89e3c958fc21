//! Payment model for workshop-service.

use super::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Debit,
    Credit,
    Wallet,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Other => "other",
        }
    }
}

/// Fiscal document issued for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptType {
    Receipt,
    InvoiceA,
    InvoiceB,
    InvoiceC,
}

/// One payment event against a work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: Currency,
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surcharge_pct: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_type: Option<ReceiptType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for registering a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: Uuid,
    pub amount: Decimal,
    pub currency: Currency,
    pub method: PaymentMethod,
    pub installments: Option<u32>,
    pub surcharge_pct: Option<Decimal>,
    pub external_reference: Option<String>,
    pub receipt_type: Option<ReceiptType>,
    pub receipt_number: Option<String>,
}

impl NewPayment {
    pub fn new(order_id: Uuid, amount: Decimal, currency: Currency, method: PaymentMethod) -> Self {
        Self {
            order_id,
            amount,
            currency,
            method,
            installments: None,
            surcharge_pct: None,
            external_reference: None,
            receipt_type: None,
            receipt_number: None,
        }
    }
}
