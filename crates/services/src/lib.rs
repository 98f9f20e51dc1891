//! HTTP implementations of the catalog, quote and courier seams defined in
//! `cartsim-core`.

pub mod catalog;
pub mod couriers;
pub mod http;
pub mod quote;

pub use catalog::{CatalogHttpError, HttpCatalogClient};
pub use couriers::{build_couriers, TraeloYaTarifier, UderTarifier};
pub use http::{build_client, HttpClientError};
pub use quote::HttpQuoteClient;
