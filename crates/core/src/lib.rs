pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod fulfillment;
pub mod notice;
pub mod quoting;
pub mod store;
pub mod storefront;

pub use catalog::{
    fetch_all_products, fetch_random_cart, CartRandomness, CatalogSource, CatalogWindow,
    RngRandomness,
};
pub use checkout::{CheckoutLine, CheckoutSummary};
pub use domain::cart::CartLine;
pub use domain::customer::CustomerData;
pub use domain::product::{CatalogPage, CatalogProduct, Dimensions, ProductId};
pub use domain::shipping::ShippingQuote;
pub use errors::CartError;
pub use flows::{FlowEngine, FlowEvent, FlowState, FlowTransitionError, Page, ShopFlow};
pub use fulfillment::{CourierError, CourierTarifier, FulfillmentError, Shipment};
pub use notice::{Notice, NoticeLevel};
pub use quoting::{build_quote_request, ProductQuoteLine, QuoteRequest, QuoteService};
pub use store::{CartAction, CartStore, SessionState};
pub use storefront::Storefront;
