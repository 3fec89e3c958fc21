//! Domain models for workshop-service.

mod currency;
mod line_item;
mod order;
mod payment;
mod quote;
mod settings;

pub use currency::{Currency, DEFAULT_CURRENCY};
pub use line_item::{DeviceCondition, ItemKind, LineItem, Warranty, WarrantyUnit};
pub use order::{
    Device, DeviceType, LaborEntry, OrderPatch, OrderSummary, PartEntry, PayStatus, WorkOrder,
    WorkStatus,
};
pub use payment::{NewPayment, Payment, PaymentMethod, ReceiptType};
pub use quote::{
    Acceptance, AcceptanceChannel, NewQuote, PricingOptions, Quote, QuotePatch, QuoteStatus,
    QuoteSummary,
};
pub use settings::BusinessSettings;
