use async_trait::async_trait;
use cartsim_core::config::AppConfig;
use cartsim_core::domain::shipping::ShippingQuote;
use cartsim_core::errors::{CartError, QUOTE_CONNECT_FAILED};
use cartsim_core::quoting::{QuoteRequest, QuoteService};
use tracing::{info, warn};

use crate::http::{build_client, join_url, ErrorBody, HttpClientError};

pub const QUOTE_PATH: &str = "/api/cart/";
pub const HEALTH_PATH: &str = "/health";

/// Quote service reached over HTTP at `{backend}/api/cart/`.
#[derive(Clone, Debug)]
pub struct HttpQuoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuoteClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, HttpClientError> {
        Ok(Self::new(build_client(config.backend.timeout_secs)?, config.backend.base_url.clone()))
    }

    pub fn endpoint(&self) -> String {
        join_url(&self.base_url, QUOTE_PATH)
    }

    /// Probes the backend's health route; returns the HTTP status on any answer.
    pub async fn health(&self) -> Result<u16, CartError> {
        let response = self
            .client
            .get(join_url(&self.base_url, HEALTH_PATH))
            .send()
            .await
            .map_err(|error| CartError::Network(format!("backend unreachable: {error}")))?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl QuoteService for HttpQuoteClient {
    async fn quote_shipping(&self, request: &QuoteRequest) -> Result<ShippingQuote, CartError> {
        let endpoint = self.endpoint();
        let response =
            self.client.post(&endpoint).json(request).send().await.map_err(|error| {
                warn!(
                    event_name = "quote.http.transport_failed",
                    endpoint = %endpoint,
                    error = %error,
                    "quote request did not reach the backend"
                );
                CartError::Network(QUOTE_CONNECT_FAILED.to_owned())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            warn!(
                event_name = "quote.http.body_failed",
                status = status.as_u16(),
                error = %error,
                "quote response body could not be read"
            );
            CartError::Network(QUOTE_CONNECT_FAILED.to_owned())
        })?;

        if !status.is_success() {
            let message = ErrorBody::message(&body);
            warn!(
                event_name = "quote.http.rejected",
                status = status.as_u16(),
                message = message.as_deref().unwrap_or(""),
                "quote backend rejected the request"
            );
            return Err(CartError::quote_rejected(message.as_deref()));
        }

        let quote: ShippingQuote = serde_json::from_str(&body).map_err(|error| {
            warn!(
                event_name = "quote.http.decode_failed",
                error = %error,
                "quote response was not a price/courier pair"
            );
            CartError::quote_rejected(None)
        })?;

        info!(
            event_name = "quote.http.quoted",
            courier = %quote.courier,
            price = %quote.price,
            "shipping quote received"
        );
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use cartsim_core::domain::customer::CustomerData;
    use cartsim_core::errors::{CartError, QUOTE_CONNECT_FAILED};
    use cartsim_core::quoting::{ProductQuoteLine, QuoteRequest, QuoteService};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use super::HttpQuoteClient;
    use crate::http::test_support::{closed_port, serve};

    fn request() -> QuoteRequest {
        QuoteRequest {
            products: vec![ProductQuoteLine {
                product_id: "4".to_string(),
                price: Decimal::new(1_250, 2),
                quantity: 2,
                discount: Decimal::new(250, 2),
            }],
            customer_data: CustomerData::new("Ana", "Street 1", "Nunoa", "123"),
        }
    }

    #[tokio::test]
    async fn posts_payload_and_decodes_quote() {
        type Seen = Arc<Mutex<Option<Value>>>;
        let seen: Seen = Arc::default();
        let handler = |State(seen): State<Seen>, Json(body): Json<Value>| async move {
            *seen.lock().expect("seen lock") = Some(body);
            Json(json!({"price": 3490.0, "courier": "Uder"}))
        };
        let router = Router::new().route("/api/cart/", post(handler)).with_state(seen.clone());
        let base = serve(router).await;

        let quote = HttpQuoteClient::new(reqwest::Client::new(), base)
            .quote_shipping(&request())
            .await
            .expect("quote");

        assert_eq!(quote.courier, "Uder");
        assert_eq!(quote.price, Decimal::new(3_490, 0));
        let body = seen.lock().expect("seen lock").clone().expect("request body");
        assert_eq!(body["products"][0]["productId"], "4");
        assert_eq!(body["products"][0]["price"], 12.5);
        assert_eq!(body["customer_data"]["commune"], "Nunoa");
    }

    #[tokio::test]
    async fn rejection_surfaces_backend_message() {
        let router = Router::new().route(
            "/api/cart/",
            post(|| async {
                let body = json!({"error": "Insufficient stock for product 'Mug'"});
                (StatusCode::BAD_REQUEST, Json(body))
            }),
        );
        let base = serve(router).await;

        let error = HttpQuoteClient::new(reqwest::Client::new(), base)
            .quote_shipping(&request())
            .await
            .expect_err("400");

        assert_eq!(
            error,
            CartError::Service(
                "Failed to quote shipping: Insufficient stock for product 'Mug'".to_string()
            )
        );
    }

    #[tokio::test]
    async fn rejection_without_message_uses_unknown_error() {
        let router = Router::new()
            .route("/api/cart/", post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }));
        let base = serve(router).await;

        let error = HttpQuoteClient::new(reqwest::Client::new(), base)
            .quote_shipping(&request())
            .await
            .expect_err("500");

        assert_eq!(error.to_string(), "Failed to quote shipping: An unknown error occurred.");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_connection_failure() {
        let client = HttpQuoteClient::new(reqwest::Client::new(), closed_port().await);

        let error = client.quote_shipping(&request()).await.expect_err("no server");

        assert_eq!(error, CartError::Network(QUOTE_CONNECT_FAILED.to_string()));
        assert!(client.health().await.is_err());
    }

    #[test]
    fn endpoint_keeps_trailing_slash() {
        let client = HttpQuoteClient::new(reqwest::Client::new(), "http://localhost:8000/");
        assert_eq!(client.endpoint(), "http://localhost:8000/api/cart/");
    }
}
