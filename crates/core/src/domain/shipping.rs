use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Courier and price returned by the quote service for a cart + address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub courier: String,
}

impl ShippingQuote {
    pub fn new(price: Decimal, courier: impl Into<String>) -> Self {
        Self { price, courier: courier.into() }
    }
}
