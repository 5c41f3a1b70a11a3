use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::domain::PricingRequest;
use super::service::{PricingService, PricingServiceError, SelectionCheck};
use super::store::{PricingStore, ProductCatalog, StoreError};

/// Router builder exposing the quote and selection-check endpoints.
pub fn pricing_router<C, S>(service: Arc<PricingService<C, S>>) -> Router
where
    C: ProductCatalog + 'static,
    S: PricingStore + 'static,
{
    Router::new()
        .route("/api/v1/pricing/quote", post(quote_handler::<C, S>))
        .route(
            "/api/v1/pricing/selections/validate",
            post(validate_handler::<C, S>),
        )
        .with_state(service)
}

pub(crate) async fn quote_handler<C, S>(
    State(service): State<Arc<PricingService<C, S>>>,
    axum::Json(request): axum::Json<PricingRequest>,
) -> Response
where
    C: ProductCatalog + 'static,
    S: PricingStore + 'static,
{
    match service.quote(request) {
        Ok(quote) => (StatusCode::OK, axum::Json(quote)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn validate_handler<C, S>(
    State(service): State<Arc<PricingService<C, S>>>,
    axum::Json(check): axum::Json<SelectionCheck>,
) -> Response
where
    C: ProductCatalog + 'static,
    S: PricingStore + 'static,
{
    match service.validate(&check) {
        Ok(validation) => (StatusCode::OK, axum::Json(validation)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: PricingServiceError) -> Response {
    let status = match &error {
        PricingServiceError::Pricing(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PricingServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        PricingServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match &error {
        PricingServiceError::Store(StoreError::NotFound) => "product not found".to_string(),
        other => other.to_string(),
    };
    let payload = json!({
        "error": message,
    });
    (status, axum::Json(payload)).into_response()
}
