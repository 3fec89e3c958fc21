//! Quote model for workshop-service.

use super::{Currency, LineItem};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Quote lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Voided,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Voided => "voided",
        }
    }

    /// Whether a quote in this status may move to `next`.
    ///
    /// `accepted` is terminal and only reachable from `draft` or `sent`.
    /// Voiding is allowed from every non-accepted status.
    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        use QuoteStatus::*;
        matches!(
            (self, next),
            (Draft, Sent)
                | (Draft, Accepted)
                | (Sent, Accepted)
                | (Draft, Rejected)
                | (Sent, Rejected)
                | (Draft, Voided)
                | (Sent, Voided)
                | (Rejected, Voided)
        )
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the client approved the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceChannel {
    Signature,
    Email,
    Whatsapp,
    Other,
}

/// Immutable proof that a quote was approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acceptance {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    pub channel: AcceptanceChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_ref: Option<String>,
    pub accepted_utc: DateTime<Utc>,
}

impl Acceptance {
    /// Record an approval happening now.
    pub fn new(name: impl Into<String>, channel: AcceptanceChannel) -> Self {
        Self {
            name: name.into(),
            id_number: None,
            channel,
            signature_ref: None,
            accepted_utc: Utc::now(),
        }
    }
}

/// Document-level price adjustments, all percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebate_pct: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surcharge_pct: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_pct: Option<Decimal>,
}

/// A priced proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub client_name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub currency: Currency,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub pricing: PricingOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub total: Decimal,
    pub year: i32,
    pub sequence: i32,
    pub code: String,
    pub status: QuoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance: Option<Acceptance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_utc: Option<DateTime<Utc>>,
}

/// Input for creating a quote.
#[derive(Debug, Clone, Validate)]
pub struct NewQuote {
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    /// Defaults to the configured currency.
    pub currency: Option<Currency>,
    #[validate(length(min = 1, message = "At least one line item is required"))]
    pub items: Vec<LineItem>,
    pub pricing: PricingOptions,
    pub notes: Option<String>,
}

impl NewQuote {
    pub fn new(client_name: impl Into<String>, items: Vec<LineItem>) -> Self {
        Self {
            client_name: client_name.into(),
            date: None,
            currency: None,
            items,
            pricing: PricingOptions::default(),
            notes: None,
        }
    }
}

/// Editable fields of a quote. Status and the order link are not editable
/// through a patch.
#[derive(Debug, Clone, Default)]
pub struct QuotePatch {
    pub client_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub currency: Option<Currency>,
    pub items: Option<Vec<LineItem>>,
    pub pricing: Option<PricingOptions>,
    pub notes: Option<String>,
}

/// Row shown in quote listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub id: Uuid,
    pub code: String,
    pub client_name: String,
    pub date: NaiveDate,
    pub total: Decimal,
    pub status: QuoteStatus,
    pub order_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
}

impl From<&Quote> for QuoteSummary {
    fn from(quote: &Quote) -> Self {
        Self {
            id: quote.id,
            code: quote.code.clone(),
            client_name: quote.client_name.clone(),
            date: quote.date,
            total: quote.total,
            status: quote.status,
            order_id: quote.order_id,
            created_utc: quote.created_utc,
        }
    }
}
