use crate::config::ConfigError;
use crate::pricing::{PricingServiceError, PropagationError, StoreError, SupplierSheetError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Decode(serde_json::Error),
    Pricing(PricingServiceError),
    SupplierSheet(SupplierSheetError),
    Propagation(PropagationError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Decode(err) => write!(f, "invalid request payload: {}", err),
            AppError::Pricing(err) => write!(f, "pricing error: {}", err),
            AppError::SupplierSheet(err) => write!(f, "supplier sheet error: {}", err),
            AppError::Propagation(err) => write!(f, "supplier sync error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Decode(err) => Some(err),
            AppError::Pricing(err) => Some(err),
            AppError::SupplierSheet(err) => Some(err),
            AppError::Propagation(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Decode(_) | AppError::SupplierSheet(_) => StatusCode::BAD_REQUEST,
            AppError::Pricing(PricingServiceError::Pricing(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Pricing(PricingServiceError::Store(StoreError::NotFound)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Propagation(_)
            | AppError::Pricing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<PricingServiceError> for AppError {
    fn from(value: PricingServiceError) -> Self {
        Self::Pricing(value)
    }
}

impl From<SupplierSheetError> for AppError {
    fn from(value: SupplierSheetError) -> Self {
        Self::SupplierSheet(value)
    }
}

impl From<PropagationError> for AppError {
    fn from(value: PropagationError) -> Self {
        Self::Propagation(value)
    }
}
