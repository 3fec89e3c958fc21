//! Currency code carried by every monetary document.

use crate::error::WorkshopError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency used when a document does not name one.
pub const DEFAULT_CURRENCY: &str = "ARS";

/// Three-letter, upper-case currency code (e.g. `ARS`, `USD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Parse a currency code, normalising case and surrounding whitespace.
    pub fn parse(code: &str) -> Result<Self, WorkshopError> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code))
        } else {
            Err(WorkshopError::validation(format!(
                "Invalid currency code '{}'",
                code
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(DEFAULT_CURRENCY.to_string())
    }
}

impl TryFrom<String> for Currency {
    type Error = WorkshopError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
