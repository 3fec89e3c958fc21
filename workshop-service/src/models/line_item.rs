//! Line item model for quotes.

use crate::error::WorkshopError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a line bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Product,
    Service,
    Repair,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Product => "product",
            ItemKind::Service => "service",
            ItemKind::Repair => "repair",
        }
    }
}

/// Condition of a device sold or received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCondition {
    New,
    Used,
    Refurbished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarrantyUnit {
    Days,
    Months,
    Years,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warranty {
    pub value: u32,
    pub unit: WarrantyUnit,
}

/// One billable line on a quote.
///
/// Priced either by `unit_price` or, when both `hours` and `hourly_rate` are
/// present and non-zero, by `hours * hourly_rate`. Products are always priced
/// by unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Uuid,
    pub kind: ItemKind,
    pub description: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_pct: Option<Decimal>,

    // Device tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<DeviceCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty: Option<Warranty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LineItem {
    /// A unit-priced line with no device metadata.
    pub fn new(
        kind: ItemKind,
        description: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            description: description.into(),
            quantity,
            unit_price,
            hours: None,
            hourly_rate: None,
            discount_pct: None,
            brand: None,
            model: None,
            serial: None,
            condition: None,
            warranty: None,
            note: None,
        }
    }

    pub fn with_hours(mut self, hours: Decimal, hourly_rate: Decimal) -> Self {
        self.hours = Some(hours);
        self.hourly_rate = Some(hourly_rate);
        self
    }

    pub fn with_discount(mut self, discount_pct: Decimal) -> Self {
        self.discount_pct = Some(discount_pct);
        self
    }

    pub fn with_device(
        mut self,
        brand: Option<&str>,
        model: Option<&str>,
        serial: Option<&str>,
    ) -> Self {
        self.brand = brand.map(str::to_string);
        self.model = model.map(str::to_string);
        self.serial = serial.map(str::to_string);
        self
    }

    /// True when the line is priced by hours and rate.
    pub fn is_hourly(&self) -> bool {
        matches!(
            (self.hours, self.hourly_rate),
            (Some(h), Some(r)) if !h.is_zero() && !r.is_zero()
        )
    }

    /// Check the line before it is priced or persisted.
    pub fn validate(&self) -> Result<(), WorkshopError> {
        if self.description.trim().is_empty() {
            return Err(WorkshopError::validation(format!(
                "Line item {} has no description",
                self.id
            )));
        }
        if self.quantity < 1 {
            return Err(WorkshopError::validation(format!(
                "Line item '{}' quantity must be at least 1",
                self.description
            )));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(WorkshopError::validation(format!(
                "Line item '{}' unit price must not be negative",
                self.description
            )));
        }
        for (field, value) in [("hours", self.hours), ("hourly rate", self.hourly_rate)] {
            if value.is_some_and(|v| v < Decimal::ZERO) {
                return Err(WorkshopError::validation(format!(
                    "Line item '{}' {} must not be negative",
                    self.description, field
                )));
            }
        }
        if let Some(pct) = self.discount_pct {
            if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(WorkshopError::validation(format!(
                    "Line item '{}' discount must be between 0 and 100",
                    self.description
                )));
            }
        }
        if self.kind == ItemKind::Product && (self.hours.is_some() || self.hourly_rate.is_some()) {
            return Err(WorkshopError::validation(format!(
                "Product line '{}' must be priced by unit price",
                self.description
            )));
        }
        Ok(())
    }
}
