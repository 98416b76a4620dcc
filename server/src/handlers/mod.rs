use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod events;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "OK",
        service: "event-finder-api",
    };

    success(payload, "Event Finder API is running").into_response()
}

pub async fn route_not_found() -> Response {
    AppError::NotFound("Route not found".to_string()).into_response()
}
