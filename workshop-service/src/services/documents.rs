//! Flattened view models for printed quotes and work orders.
//!
//! Money is rounded to 2 decimals here and nowhere upstream.

use super::calculator::{line_total, round2};
use crate::models::{BusinessSettings, Device, Quote, WorkOrder};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Business details printed in the document header and footer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Branding {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_text: Option<String>,
}

impl From<&BusinessSettings> for Branding {
    fn from(settings: &BusinessSettings) -> Self {
        Self {
            name: settings.name.clone(),
            address: settings.address.clone(),
            phone: settings.phone.clone(),
            email: settings.email.clone(),
            logo_url: settings.logo_url.clone(),
            footer_text: settings.footer_text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteDocument {
    pub code: String,
    pub client_name: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub currency: String,
    pub lines: Vec<DocumentLine>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub branding: Branding,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_code: Option<String>,
    pub order_code: String,
    pub client_name: String,
    pub date: NaiveDate,
    pub device: Device,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    pub labor: Vec<DocumentLine>,
    pub parts: Vec<DocumentLine>,
    pub final_total: Decimal,
    pub paid_to_date: Decimal,
    pub balance: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_notes: Option<String>,
    pub branding: Branding,
}

pub fn quote_document(quote: &Quote, settings: &BusinessSettings) -> QuoteDocument {
    let lines: Vec<DocumentLine> = quote
        .items
        .iter()
        .map(|item| {
            let quantity = item.quantity.max(1);
            let total = line_total(item);
            // Net of discount, and hours * rate for hourly lines.
            let unit_price = total / Decimal::from(quantity);
            DocumentLine {
                description: item.description.clone(),
                quantity,
                unit_price: round2(unit_price),
                total: round2(total),
            }
        })
        .collect();
    let subtotal = round2(quote.items.iter().map(line_total).sum());

    QuoteDocument {
        code: quote.code.clone(),
        client_name: quote.client_name.clone(),
        date: quote.date,
        notes: quote.notes.clone(),
        currency: quote.currency.to_string(),
        lines,
        subtotal,
        total: round2(quote.total),
        branding: Branding::from(settings),
    }
}

pub fn order_document(
    order: &WorkOrder,
    quote_code: Option<&str>,
    settings: &BusinessSettings,
) -> OrderDocument {
    let labor = order
        .labor
        .iter()
        .map(|entry| DocumentLine {
            description: entry.description.clone(),
            quantity: 1,
            unit_price: round2(entry.billed()),
            total: round2(entry.billed()),
        })
        .collect();
    let parts = order
        .parts
        .iter()
        .map(|entry| DocumentLine {
            description: entry.description.clone(),
            quantity: entry.quantity,
            unit_price: round2(entry.price.unwrap_or(Decimal::ZERO)),
            total: round2(entry.billed()),
        })
        .collect();

    OrderDocument {
        quote_code: quote_code.map(str::to_string),
        order_code: order.code.clone(),
        client_name: order.client_name.clone(),
        date: order.created_utc.date_naive(),
        device: order.device.clone(),
        diagnosis: order.diagnosis.clone(),
        labor,
        parts,
        final_total: round2(order.final_total),
        paid_to_date: round2(order.paid_to_date),
        balance: round2(order.balance),
        currency: order.currency.to_string(),
        delivery_notes: order.delivery_notes.clone(),
        branding: Branding::from(settings),
    }
}
