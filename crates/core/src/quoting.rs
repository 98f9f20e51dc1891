use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::cart::{round_money, CartLine};
use crate::domain::customer::CustomerData;
use crate::domain::shipping::ShippingQuote;
use crate::errors::CartError;

pub const MAX_PRODUCT_ID_LEN: usize = 255;
pub const MAX_CUSTOMER_FIELD_LEN: usize = 255;
pub const MAX_PHONE_LEN: usize = 20;

/// One cart line as the quote service expects it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuoteLine {
    #[serde(rename = "productId", deserialize_with = "string_or_number")]
    pub product_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
}

impl ProductQuoteLine {
    pub fn from_line(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            price: line.unit_price,
            quantity: line.quantity,
            discount: round_money(line.discount_amount()),
        }
    }
}

/// Accepts `"16"` as well as `16`, matching how the quote service coerces ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Unsigned(number) => number.to_string(),
        RawId::Signed(number) => number.to_string(),
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub products: Vec<ProductQuoteLine>,
    pub customer_data: CustomerData,
}

/// Normalizes the cart and customer into the quote service payload.
pub fn build_quote_request(lines: &[CartLine], customer: &CustomerData) -> QuoteRequest {
    QuoteRequest {
        products: lines.iter().map(ProductQuoteLine::from_line).collect(),
        customer_data: customer.trimmed(),
    }
}

/// Field-level problem found while checking an incoming quote request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl QuoteRequest {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Checks the payload the way the quote backend accepts it.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.products.is_empty() {
            errors.push(FieldError::new("products", "at least one product is required"));
        }

        for (index, line) in self.products.iter().enumerate() {
            let field = |name: &str| format!("products[{index}].{name}");
            if line.product_id.trim().is_empty() {
                errors.push(FieldError::new(field("productId"), "must not be blank"));
            } else if line.product_id.chars().count() > MAX_PRODUCT_ID_LEN {
                errors.push(FieldError::new(
                    field("productId"),
                    format!("must be at most {MAX_PRODUCT_ID_LEN} characters"),
                ));
            }
            if line.price < Decimal::ZERO {
                errors.push(FieldError::new(field("price"), "must be zero or greater"));
            }
            if line.quantity < 1 {
                errors.push(FieldError::new(field("quantity"), "must be at least 1"));
            }
            if line.discount < Decimal::ZERO {
                errors.push(FieldError::new(field("discount"), "must be zero or greater"));
            }
        }

        let customer = &self.customer_data;
        for missing in customer.missing_fields() {
            errors.push(FieldError::new(format!("customer_data.{missing}"), "must not be blank"));
        }
        let limits = [
            ("name", &customer.name, MAX_CUSTOMER_FIELD_LEN),
            ("shipping_street", &customer.shipping_street, MAX_CUSTOMER_FIELD_LEN),
            ("commune", &customer.commune, MAX_CUSTOMER_FIELD_LEN),
            ("phone", &customer.phone, MAX_PHONE_LEN),
        ];
        for (name, value, max) in limits {
            if value.chars().count() > max {
                errors.push(FieldError::new(
                    format!("customer_data.{name}"),
                    format!("must be at most {max} characters"),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Something that can price a shipment for a cart.
#[async_trait]
pub trait QuoteService: Send + Sync {
    async fn quote_shipping(&self, request: &QuoteRequest) -> Result<ShippingQuote, CartError>;
}

#[async_trait]
impl<T> QuoteService for std::sync::Arc<T>
where
    T: QuoteService + ?Sized,
{
    async fn quote_shipping(&self, request: &QuoteRequest) -> Result<ShippingQuote, CartError> {
        (**self).quote_shipping(request).await
    }
}
