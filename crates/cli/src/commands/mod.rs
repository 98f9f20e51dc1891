pub mod config;
pub mod demo;
pub mod doctor;
pub mod shop;

use cartsim_core::catalog::RngRandomness;
use cartsim_core::config::AppConfig;
use cartsim_core::storefront::Storefront;
use cartsim_services::{HttpCatalogClient, HttpClientError, HttpQuoteClient};
use rand::rngs::StdRng;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Keeps the JSON outcome on the last line, after a human-readable transcript.
    pub fn with_transcript(mut self, transcript: &str) -> Self {
        if !transcript.is_empty() {
            self.output = format!("{transcript}\n{}", self.output);
        }
        self
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub type LiveStorefront = Storefront<HttpCatalogClient, HttpQuoteClient, RngRandomness<StdRng>>;

/// Wires a session to the configured catalog and quote backend.
pub fn live_storefront(
    config: &AppConfig,
    seed: Option<u64>,
) -> Result<LiveStorefront, HttpClientError> {
    let catalog = HttpCatalogClient::from_config(&config.catalog)?;
    let quotes = HttpQuoteClient::from_config(config)?;
    let randomness = match seed {
        Some(seed) => RngRandomness::seeded(seed),
        None => RngRandomness::from_entropy(),
    };
    Ok(Storefront::new(catalog, quotes, randomness))
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| format!("failed to initialize async runtime: {error}"))
}
