use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use cartsim_core::catalog::{fetch_all_products, CatalogSource, FULL_SCAN_PAGE_SIZE};
use cartsim_core::domain::shipping::ShippingQuote;
use cartsim_core::fulfillment::{reserve, tarify, CourierTarifier, FulfillmentError, Shipment};
use cartsim_core::quoting::{FieldError, QuoteRequest};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Dependencies of the quote endpoint, shared across requests.
#[derive(Clone)]
pub struct QuoteState {
    pub catalog: Arc<dyn CatalogSource>,
    pub couriers: Arc<Vec<Arc<dyn CourierTarifier>>>,
}

impl QuoteState {
    pub fn new(catalog: Arc<dyn CatalogSource>, couriers: Vec<Arc<dyn CourierTarifier>>) -> Self {
        Self { catalog, couriers: Arc::new(couriers) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), fields: Vec::new() }
    }
}

type QuoteResult = Result<Json<ShippingQuote>, (StatusCode, Json<ErrorResponse>)>;

pub fn router(state: QuoteState) -> Router {
    Router::new().route("/api/cart/", post(quote_cart)).with_state(state)
}

pub async fn quote_cart(
    State(state): State<QuoteState>,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> QuoteResult {
    let correlation_id = Uuid::new_v4().to_string();

    let Json(request) = payload.map_err(|rejection| {
        warn!(
            event_name = "server.quote.malformed",
            correlation_id = %correlation_id,
            error = %rejection.body_text(),
            "quote payload could not be parsed"
        );
        reject(StatusCode::BAD_REQUEST, ErrorResponse::new(rejection.body_text()))
    })?;

    if let Err(fields) = request.validate() {
        let summary = fields
            .iter()
            .map(|field| format!("{}: {}", field.field, field.message))
            .collect::<Vec<_>>()
            .join("; ");
        warn!(
            event_name = "server.quote.invalid",
            correlation_id = %correlation_id,
            fields = %summary,
            "quote payload failed validation"
        );
        return Err(reject(
            StatusCode::BAD_REQUEST,
            ErrorResponse { error: format!("Invalid cart payload: {summary}"), fields },
        ));
    }

    info!(
        event_name = "server.quote.received",
        correlation_id = %correlation_id,
        products = request.products.len(),
        "quote request accepted"
    );

    let catalog =
        fetch_all_products(state.catalog.as_ref(), FULL_SCAN_PAGE_SIZE).await.map_err(|error| {
            warn!(
                event_name = "server.quote.catalog_failed",
                correlation_id = %correlation_id,
                error = %error,
                "catalog scan failed"
            );
            reject(
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new(format!("Could not read the product catalog: {error}")),
            )
        })?;

    let items = reserve(&request, &catalog)
        .map_err(|error| fulfillment_rejection(&correlation_id, error))?;
    let shipment = Shipment::from_store(&request.customer_data, items);
    let quote = tarify(&state.couriers, &shipment)
        .await
        .map_err(|error| fulfillment_rejection(&correlation_id, error))?;

    info!(
        event_name = "server.quote.completed",
        correlation_id = %correlation_id,
        courier = %quote.courier,
        price = %quote.price,
        "cheapest courier selected"
    );
    Ok(Json(quote))
}

fn fulfillment_rejection(
    correlation_id: &str,
    error: FulfillmentError,
) -> (StatusCode, Json<ErrorResponse>) {
    let status = match error {
        FulfillmentError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        FulfillmentError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
        FulfillmentError::NoCourierOffer => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(
        event_name = "server.quote.rejected",
        correlation_id = %correlation_id,
        status = status.as_u16(),
        error = %error,
        "quote request rejected"
    );
    reject(status, ErrorResponse::new(error.to_string()))
}

fn reject(status: StatusCode, body: ErrorResponse) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(body))
}
