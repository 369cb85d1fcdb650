use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Read-only catalog row as exposed to the assistant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: Decimal,
    pub description: String,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Decimal, description: impl Into<String>) -> Self {
        Self { name: name.into(), price, description: description.into() }
    }

    /// Price without trailing fractional zeros, e.g. `15000.00` renders as `15000`.
    pub fn display_price(&self) -> String {
        self.price.normalize().to_string()
    }
}
