use std::sync::Arc;

use cartsim_core::config::{AppConfig, ConfigError, LoadOptions};
use cartsim_services::{build_couriers, HttpCatalogClient, HttpClientError};
use thiserror::Error;
use tracing::info;

use crate::cart::QuoteState;

pub struct Application {
    pub config: AppConfig,
    pub quote_state: QuoteState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    HttpClient(#[from] HttpClientError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    bootstrap_with_config(AppConfig::load(options)?)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate_for_server()?;

    let catalog = HttpCatalogClient::from_config(&config.catalog)?;
    let couriers = build_couriers(&config.couriers)?;
    info!(
        event_name = "system.bootstrap.clients_ready",
        correlation_id = "bootstrap",
        catalog_url = %catalog.base_url(),
        couriers_url = %config.couriers.base_url,
        couriers = couriers.len(),
        "catalog and courier clients initialized"
    );

    Ok(Application { quote_state: QuoteState::new(Arc::new(catalog), couriers), config })
}
