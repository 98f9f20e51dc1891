//! Backend side of a quote: stock verification against the catalog and
//! courier selection.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::customer::CustomerData;
use crate::domain::product::{CatalogProduct, Dimensions};
use crate::domain::shipping::ShippingQuote;
use crate::quoting::QuoteRequest;

pub const STORE_NAME: &str = "Tienda Flapp";
pub const STORE_PHONE: &str = "+569 1234 5678";
pub const STORE_STREET: &str = "Juan de Valiente 3630";
pub const STORE_CITY: &str = "Vitacura";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FulfillmentError {
    #[error("Product with ID {0} not found.")]
    ProductNotFound(String),
    #[error(
        "Insufficient stock for product '{name}' (ID: {product_id}). Requested: {requested}, \
         Available (Sr): {available}"
    )]
    InsufficientStock { product_id: String, name: String, requested: u32, available: u64 },
    #[error("Could not obtain shipping prices from couriers. Please try again.")]
    NoCourierOffer,
}

/// Units the store is willing to promise: `floor(stock / rating)`, zero when
/// the rating is not positive or the quotient does not fit a `Decimal`.
pub fn stock_real(stock: u32, rating: Decimal) -> u64 {
    if rating <= Decimal::ZERO {
        return 0;
    }
    Decimal::from(stock)
        .checked_div(rating)
        .and_then(|units| units.floor().to_u64())
        .unwrap_or(0)
}

/// A requested line matched against its catalog record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReservedItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub quantity: u32,
    pub stock: u32,
    pub rating: Decimal,
    pub stock_real: u64,
    pub dimensions: Dimensions,
}

impl ReservedItem {
    /// Volume of all units of this line.
    pub fn total_volume(&self) -> Decimal {
        self.dimensions.volume() * Decimal::from(self.quantity)
    }
}

/// Matches every requested line to the catalog, then checks stock.
///
/// Unknown products are reported before any stock shortage.
pub fn reserve(
    request: &QuoteRequest,
    catalog: &[CatalogProduct],
) -> Result<Vec<ReservedItem>, FulfillmentError> {
    let mut items = Vec::with_capacity(request.products.len());

    for line in &request.products {
        let product = catalog
            .iter()
            .find(|product| product.id.to_string() == line.product_id)
            .ok_or_else(|| FulfillmentError::ProductNotFound(line.product_id.clone()))?;

        let item = ReservedItem {
            product_id: line.product_id.clone(),
            name: product.title.clone(),
            unit_price: line.price,
            discount: line.discount,
            quantity: line.quantity,
            stock: product.stock,
            rating: product.rating,
            stock_real: stock_real(product.stock, product.rating),
            dimensions: product.dimensions.clone().unwrap_or_default(),
        };
        info!(
            event_name = "fulfillment.item.matched",
            product_id = %item.product_id,
            name = %item.name,
            unit_price = %item.unit_price,
            discount = %item.discount,
            quantity = item.quantity,
            stock = item.stock,
            rating = %item.rating,
            stock_real = item.stock_real,
            "requested product matched"
        );
        items.push(item);
    }

    if let Some(short) = items.iter().find(|item| u64::from(item.quantity) > item.stock_real) {
        return Err(FulfillmentError::InsufficientStock {
            product_id: short.product_id.clone(),
            name: short.name.clone(),
            requested: short.quantity,
            available: short.stock_real,
        });
    }

    Ok(items)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Waypoint {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
}

impl Waypoint {
    pub fn store_origin() -> Self {
        Self {
            name: STORE_NAME.to_owned(),
            phone: STORE_PHONE.to_owned(),
            street: STORE_STREET.to_owned(),
            city: STORE_CITY.to_owned(),
        }
    }

    pub fn customer(customer: &CustomerData) -> Self {
        Self {
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            street: customer.shipping_street.clone(),
            city: customer.commune.clone(),
        }
    }
}

/// Everything a courier needs to price a delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Shipment {
    pub origin: Waypoint,
    pub destination: Waypoint,
    pub items: Vec<ReservedItem>,
}

impl Shipment {
    pub fn from_store(customer: &CustomerData, items: Vec<ReservedItem>) -> Self {
        Self { origin: Waypoint::store_origin(), destination: Waypoint::customer(customer), items }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CourierError {
    #[error("courier transport failed: {0}")]
    Transport(String),
    #[error("courier rejected the shipment: {0}")]
    Rejected(String),
    #[error("courier response had no price")]
    MissingPrice,
}

#[async_trait]
pub trait CourierTarifier: Send + Sync {
    fn name(&self) -> &str;
    async fn price(&self, shipment: &Shipment) -> Result<Decimal, CourierError>;
}

/// Lowest offer; on a tie the earlier courier keeps it.
pub fn cheapest(offers: &[(String, Decimal)]) -> Option<ShippingQuote> {
    offers
        .iter()
        .fold(None::<&(String, Decimal)>, |best, offer| match best {
            Some(current) if current.1 <= offer.1 => Some(current),
            _ => Some(offer),
        })
        .map(|(courier, price)| ShippingQuote::new(*price, courier.clone()))
}

/// Asks every courier in order and returns the cheapest offer.
pub async fn tarify(
    couriers: &[Arc<dyn CourierTarifier>],
    shipment: &Shipment,
) -> Result<ShippingQuote, FulfillmentError> {
    let mut offers = Vec::with_capacity(couriers.len());
    for courier in couriers {
        match courier.price(shipment).await {
            Ok(price) => {
                info!(
                    event_name = "fulfillment.courier.priced",
                    courier = courier.name(),
                    price = %price,
                    "courier offer received"
                );
                offers.push((courier.name().to_owned(), price));
            }
            Err(error) => {
                warn!(
                    event_name = "fulfillment.courier.no_offer",
                    courier = courier.name(),
                    error = %error,
                    "courier returned no offer"
                );
            }
        }
    }

    cheapest(&offers).ok_or(FulfillmentError::NoCourierOffer)
}
