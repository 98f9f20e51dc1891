use async_trait::async_trait;
use cartsim_core::catalog::CatalogSource;
use cartsim_core::config::CatalogConfig;
use cartsim_core::domain::product::CatalogPage;
use cartsim_core::errors::CartError;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::http::{build_client, HttpClientError};

#[derive(Debug, Error)]
pub enum CatalogHttpError {
    #[error("catalog request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("catalog returned status {0}")]
    Status(StatusCode),
    #[error("catalog response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

impl From<CatalogHttpError> for CartError {
    fn from(error: CatalogHttpError) -> Self {
        match error {
            CatalogHttpError::Transport(_) => CartError::Network(error.to_string()),
            CatalogHttpError::Status(_) | CatalogHttpError::Decode(_) => {
                CartError::Service(error.to_string())
            }
        }
    }
}

/// Catalog source backed by a dummyjson-style `products` endpoint.
#[derive(Clone, Debug)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self, HttpClientError> {
        Ok(Self::new(build_client(config.timeout_secs)?, config.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_page(&self, limit: u32, skip: u64) -> Result<CatalogPage, CatalogHttpError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("limit", limit.to_string()), ("skip", skip.to_string())])
            .send()
            .await
            .map_err(CatalogHttpError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogHttpError::Status(status));
        }

        let page: CatalogPage = response.json().await.map_err(CatalogHttpError::Decode)?;
        debug!(
            event_name = "catalog.http.page_fetched",
            limit,
            skip,
            returned = page.products.len(),
            total = page.total,
            "catalog page fetched"
        );
        Ok(page)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogClient {
    async fn fetch_page(&self, limit: u32, skip: u64) -> Result<CatalogPage, CartError> {
        Ok(self.get_page(limit, skip).await?)
    }
}
