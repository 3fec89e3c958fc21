//! Work order model for workshop-service.

use super::{Currency, LineItem};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Repair progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Pending,
    InProgress,
    AwaitingParts,
    Paused,
    Completed,
    Delivered,
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Pending => "pending",
            WorkStatus::InProgress => "in_progress",
            WorkStatus::AwaitingParts => "awaiting_parts",
            WorkStatus::Paused => "paused",
            WorkStatus::Completed => "completed",
            WorkStatus::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayStatus {
    Unpaid,
    Partial,
    Paid,
    Refunded,
}

impl PayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayStatus::Unpaid => "unpaid",
            PayStatus::Partial => "partial",
            PayStatus::Paid => "paid",
            PayStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Phone,
    LaptopPc,
    Tablet,
    Printer,
    Other,
}

/// The device left for repair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DeviceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Only when the client chooses to share it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessories: Option<String>,
}

impl Device {
    pub fn is_empty(&self) -> bool {
        *self == Device::default()
    }
}

/// Labor billed on an order after acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborEntry {
    pub id: Uuid,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician: Option<String>,
}

impl LaborEntry {
    pub fn new(description: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            hours: None,
            price: Some(price),
            technician: None,
        }
    }

    /// Amount this entry adds to the order total.
    pub fn billed(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }
}

/// Part used on an order after acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartEntry {
    pub id: Uuid,
    pub description: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_serial: Option<String>,
}

impl PartEntry {
    pub fn new(description: impl Into<String>, quantity: u32, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            quantity,
            cost: None,
            price: Some(price),
            lot_serial: None,
        }
    }

    /// Amount this entry adds to the order total (`price * quantity`).
    pub fn billed(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO) * Decimal::from(self.quantity)
    }
}

/// The operational record created when a quote is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub client_name: String,
    #[serde(default)]
    pub device: Device,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub labor: Vec<LaborEntry>,
    #[serde(default)]
    pub parts: Vec<PartEntry>,
    /// Copy of the quote lines at acceptance. Never modified afterwards.
    #[serde(default)]
    pub quoted_items: Vec<LineItem>,
    #[serde(default)]
    pub currency: Currency,

    pub status: WorkStatus,
    pub pay_status: PayStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub estimated_total: Decimal,
    pub final_total: Decimal,
    pub paid_to_date: Decimal,
    pub balance: Decimal,

    pub year: i32,
    pub sequence: i32,
    pub code: String,

    pub created_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_utc: Option<DateTime<Utc>>,
}

/// Fields persisted together by an order save.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub device: Option<Device>,
    pub diagnosis: Option<String>,
    pub delivery_notes: Option<String>,
    pub notes: Option<String>,
    pub warranty_days: Option<u32>,
    pub labor: Option<Vec<LaborEntry>>,
    pub parts: Option<Vec<PartEntry>>,
    pub status: Option<WorkStatus>,
}

/// Row shown in order listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub code: String,
    pub client_name: String,
    pub status: WorkStatus,
    pub pay_status: PayStatus,
    pub estimated_total: Decimal,
    pub final_total: Decimal,
    pub paid_to_date: Decimal,
    pub balance: Decimal,
    pub created_utc: DateTime<Utc>,
}

impl From<&WorkOrder> for OrderSummary {
    fn from(order: &WorkOrder) -> Self {
        Self {
            id: order.id,
            quote_id: order.quote_id,
            code: order.code.clone(),
            client_name: order.client_name.clone(),
            status: order.status,
            pay_status: order.pay_status,
            estimated_total: order.estimated_total,
            final_total: order.final_total,
            paid_to_date: order.paid_to_date,
            balance: order.balance,
            created_utc: order.created_utc,
        }
    }
}
