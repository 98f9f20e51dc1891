//! Courier tarification clients used by the quote backend.

use std::sync::Arc;

use async_trait::async_trait;
use cartsim_core::config::CouriersConfig;
use cartsim_core::fulfillment::{CourierError, CourierTarifier, Shipment, Waypoint};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{build_client, join_url, ErrorBody, HttpClientError};

pub const TRAELO_YA: &str = "TraeloYa";
pub const UDER: &str = "Uder";

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Serialize)]
struct TraeloYaRequest {
    items: Vec<TraeloYaItem>,
    waypoints: Vec<TraeloYaWaypoint>,
}

#[derive(Debug, Serialize)]
struct TraeloYaItem {
    quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    volume: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TraeloYaWaypoint {
    #[serde(rename = "type")]
    kind: &'static str,
    address_street: String,
    city: String,
    phone: String,
    name: String,
}

impl TraeloYaWaypoint {
    fn new(kind: &'static str, waypoint: &Waypoint) -> Self {
        Self {
            kind,
            address_street: waypoint.street.clone(),
            city: waypoint.city.clone(),
            phone: waypoint.phone.clone(),
            name: waypoint.name.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraeloYaResponse {
    #[serde(default)]
    delivery_offers: Option<TraeloYaOffer>,
}

#[derive(Debug, Default, Deserialize)]
struct TraeloYaOffer {
    #[serde(default)]
    pricing: Option<TraeloYaPricing>,
}

#[derive(Debug, Default, Deserialize)]
struct TraeloYaPricing {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    total: Option<Decimal>,
}

fn traelo_ya_request(shipment: &Shipment) -> TraeloYaRequest {
    TraeloYaRequest {
        items: shipment
            .items
            .iter()
            .map(|item| TraeloYaItem {
                quantity: item.quantity,
                value: item.unit_price,
                volume: item.total_volume(),
            })
            .collect(),
        waypoints: vec![
            TraeloYaWaypoint::new("PICK_UP", &shipment.origin),
            TraeloYaWaypoint::new("DROP_OFF", &shipment.destination),
        ],
    }
}

#[derive(Debug, Serialize)]
struct UderRequest {
    pickup_address: String,
    pickup_name: String,
    pickup_phone_number: String,
    dropoff_address: String,
    dropoff_name: String,
    dropoff_phone_number: String,
    manifest_items: Vec<UderItem>,
}

#[derive(Debug, Serialize)]
struct UderItem {
    name: String,
    quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    dimensions: UderDimensions,
}

#[derive(Debug, Serialize)]
struct UderDimensions {
    #[serde(with = "rust_decimal::serde::float")]
    width: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    height: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    depth: Decimal,
}

#[derive(Debug, Default, Deserialize)]
struct UderResponse {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    fee: Option<Decimal>,
}

fn uder_request(shipment: &Shipment) -> UderRequest {
    UderRequest {
        pickup_address: shipment.origin.street.clone(),
        pickup_name: shipment.origin.name.clone(),
        pickup_phone_number: shipment.origin.phone.clone(),
        dropoff_address: shipment.destination.street.clone(),
        dropoff_name: shipment.destination.name.clone(),
        dropoff_phone_number: shipment.destination.phone.clone(),
        manifest_items: shipment
            .items
            .iter()
            .map(|item| UderItem {
                name: item.name.clone(),
                quantity: item.quantity,
                price: item.unit_price,
                dimensions: UderDimensions {
                    width: item.dimensions.width,
                    height: item.dimensions.height,
                    depth: item.dimensions.depth,
                },
            })
            .collect(),
    }
}

/// Shared transport for the tarifier endpoints: POST JSON with the courier
/// key, treat non-2xx or an `error` field as "no offer".
#[derive(Clone)]
struct TarifierEndpoint {
    client: reqwest::Client,
    url: String,
    api_key: SecretString,
}

impl TarifierEndpoint {
    async fn post<B>(&self, courier: &str, body: &B) -> Result<String, CourierError>
    where
        B: Serialize + Sync,
    {
        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|error| CourierError::Transport(error.to_string()))?;

        let status = response.status();
        let raw = response.text().await.map_err(|error| CourierError::Transport(error.to_string()))?;
        debug!(
            event_name = "couriers.http.responded",
            courier,
            status = status.as_u16(),
            "courier tarifier responded"
        );

        if !status.is_success() {
            let detail = ErrorBody::message(&raw).unwrap_or_else(|| format!("status {status}"));
            return Err(CourierError::Rejected(detail));
        }
        if let Some(message) = ErrorBody::message(&raw) {
            return Err(CourierError::Rejected(message));
        }
        Ok(raw)
    }
}

pub struct TraeloYaTarifier {
    endpoint: TarifierEndpoint,
}

impl TraeloYaTarifier {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: SecretString) -> Self {
        Self { endpoint: TarifierEndpoint { client, url: join_url(base_url, "traelo_ya"), api_key } }
    }
}

#[async_trait]
impl CourierTarifier for TraeloYaTarifier {
    fn name(&self) -> &str {
        TRAELO_YA
    }

    async fn price(&self, shipment: &Shipment) -> Result<Decimal, CourierError> {
        let raw = self.endpoint.post(TRAELO_YA, &traelo_ya_request(shipment)).await?;
        let response: TraeloYaResponse =
            serde_json::from_str(&raw).map_err(|_| CourierError::MissingPrice)?;
        response
            .delivery_offers
            .and_then(|offer| offer.pricing)
            .and_then(|pricing| pricing.total)
            .ok_or(CourierError::MissingPrice)
    }
}

pub struct UderTarifier {
    endpoint: TarifierEndpoint,
}

impl UderTarifier {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: SecretString) -> Self {
        Self { endpoint: TarifierEndpoint { client, url: join_url(base_url, "uder"), api_key } }
    }
}

#[async_trait]
impl CourierTarifier for UderTarifier {
    fn name(&self) -> &str {
        UDER
    }

    async fn price(&self, shipment: &Shipment) -> Result<Decimal, CourierError> {
        let raw = self.endpoint.post(UDER, &uder_request(shipment)).await?;
        let response: UderResponse =
            serde_json::from_str(&raw).map_err(|_| CourierError::MissingPrice)?;
        response.fee.ok_or(CourierError::MissingPrice)
    }
}

/// Both couriers, TraeloYa first. Missing keys are sent as empty headers and
/// simply yield no offer.
pub fn build_couriers(
    config: &CouriersConfig,
) -> Result<Vec<Arc<dyn CourierTarifier>>, HttpClientError> {
    let client = build_client(config.timeout_secs)?;
    let key = |secret: &Option<SecretString>| {
        secret.clone().unwrap_or_else(|| SecretString::from(String::new()))
    };
    Ok(vec![
        Arc::new(TraeloYaTarifier::new(
            client.clone(),
            &config.base_url,
            key(&config.traelo_ya_api_key),
        )),
        Arc::new(UderTarifier::new(client, &config.base_url, key(&config.uder_api_key))),
    ])
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use cartsim_core::domain::customer::CustomerData;
    use cartsim_core::domain::product::Dimensions;
    use cartsim_core::fulfillment::{
        tarify, CourierError, CourierTarifier, ReservedItem, Shipment,
    };
    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use serde_json::{json, Value};

    use super::{TraeloYaTarifier, UderTarifier};
    use crate::http::test_support::serve;

    type Captured = Arc<Mutex<Vec<(String, Value)>>>;

    fn shipment() -> Shipment {
        let item = ReservedItem {
            product_id: "9".to_string(),
            name: "Desk Lamp".to_string(),
            unit_price: Decimal::new(1_500, 2),
            discount: Decimal::ZERO,
            quantity: 2,
            stock: 40,
            rating: Decimal::new(4, 0),
            stock_real: 10,
            dimensions: Dimensions {
                width: Decimal::new(10, 0),
                height: Decimal::new(20, 0),
                depth: Decimal::new(5, 0),
            },
        };
        Shipment::from_store(
            &CustomerData::new("Ana", "Av. Grecia 10", "Nunoa", "+56 9 2222 3333"),
            vec![item],
        )
    }

    fn key() -> SecretString {
        SecretString::from("test-key".to_string())
    }

    async fn couriers_server(traelo: Value, uder: Value) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let traelo_handler = move |State(captured): State<Captured>,
                                   headers: HeaderMap,
                                   Json(body): Json<Value>| {
            let reply = traelo.clone();
            async move {
                let key = headers
                    .get("x-api-key")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                captured.lock().expect("captured lock").push((key, body));
                Json(reply)
            }
        };
        let uder_handler = move |State(captured): State<Captured>, Json(body): Json<Value>| {
            let reply = uder.clone();
            async move {
                captured.lock().expect("captured lock").push(("uder".to_string(), body));
                Json(reply)
            }
        };
        let router = Router::new()
            .route("/tarifier/traelo_ya", post(traelo_handler))
            .route("/tarifier/uder", post(uder_handler))
            .with_state(captured.clone());
        (format!("{}/tarifier", serve(router).await), captured)
    }

    #[tokio::test]
    async fn traelo_ya_sends_items_and_waypoints() {
        let (base, captured) = couriers_server(
            json!({"deliveryOffers": {"pricing": {"total": 4590.0}}}),
            json!({}),
        )
        .await;
        let courier = TraeloYaTarifier::new(reqwest::Client::new(), &base, key());

        let price = courier.price(&shipment()).await.expect("price");

        assert_eq!(price, Decimal::new(4_590, 0));
        let calls = captured.lock().expect("captured lock");
        let (api_key, body) = &calls[0];
        assert_eq!(api_key, "test-key");
        assert_eq!(body["items"][0], json!({"quantity": 2, "value": 15.0, "volume": 2000.0}));
        assert_eq!(body["waypoints"][0]["type"], "PICK_UP");
        assert_eq!(body["waypoints"][0]["addressStreet"], "Juan de Valiente 3630");
        assert_eq!(body["waypoints"][0]["city"], "Vitacura");
        assert_eq!(body["waypoints"][1]["type"], "DROP_OFF");
        assert_eq!(body["waypoints"][1]["city"], "Nunoa");
        assert_eq!(body["waypoints"][1]["name"], "Ana");
    }

    #[tokio::test]
    async fn uder_sends_manifest_and_reads_fee() {
        let (base, captured) = couriers_server(json!({}), json!({"fee": 3990.0})).await;
        let courier = UderTarifier::new(reqwest::Client::new(), &base, key());

        let price = courier.price(&shipment()).await.expect("price");

        assert_eq!(price, Decimal::new(3_990, 0));
        let calls = captured.lock().expect("captured lock");
        let body = &calls[0].1;
        assert_eq!(body["pickup_name"], "Tienda Flapp");
        assert_eq!(body["pickup_phone_number"], "+569 1234 5678");
        assert_eq!(body["dropoff_address"], "Av. Grecia 10");
        assert_eq!(body["manifest_items"][0]["name"], "Desk Lamp");
        assert_eq!(body["manifest_items"][0]["dimensions"]["height"], 20.0);
    }

    #[tokio::test]
    async fn error_field_means_no_offer() {
        let (base, _) = couriers_server(json!({"error": "out of coverage"}), json!({})).await;
        let courier = TraeloYaTarifier::new(reqwest::Client::new(), &base, key());

        let error = courier.price(&shipment()).await.expect_err("no offer");

        assert_eq!(error, CourierError::Rejected("out of coverage".to_string()));
    }

    #[tokio::test]
    async fn cheapest_courier_wins_over_http() {
        let (base, _) = couriers_server(
            json!({"deliveryOffers": {"pricing": {"total": 5000}}}),
            json!({"fee": 4200}),
        )
        .await;
        let couriers: Vec<Arc<dyn CourierTarifier>> = vec![
            Arc::new(TraeloYaTarifier::new(reqwest::Client::new(), &base, key())),
            Arc::new(UderTarifier::new(reqwest::Client::new(), &base, key())),
        ];

        let quote = tarify(&couriers, &shipment()).await.expect("quote");

        assert_eq!(quote.courier, "Uder");
        assert_eq!(quote.price, Decimal::new(4_200, 0));
    }

    #[tokio::test]
    async fn failing_status_is_rejected() {
        let router = Router::new().route(
            "/tarifier/uder",
            post(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"}))) }),
        );
        let base = format!("{}/tarifier", serve(router).await);
        let courier = UderTarifier::new(reqwest::Client::new(), &base, key());

        let error = courier.price(&shipment()).await.expect_err("401");

        assert_eq!(error, CourierError::Rejected("bad key".to_string()));
    }
}
