//! Business settings used for printable documents.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Branding shown on printed quotes and orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct BusinessSettings {
    #[validate(length(min = 1, message = "Business name is required"))]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_text: Option<String>,
}
