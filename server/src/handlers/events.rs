//! Event endpoints: thin adapters between HTTP and the store/query engine.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use crate::models::{EventId, NewEvent};
use crate::services::EventFilter;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, data, list};

/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
    filter: Result<Query<EventFilter>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(filter) = filter.map_err(|e| AppError::ValidationError(e.body_text()))?;

    let result = state.engine.list_events(&state.store, &filter)?;

    Ok(list(result.events).into_response())
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    // A non-numeric id can never have been issued.
    let id = raw_id
        .parse::<i64>()
        .map(EventId)
        .map_err(|_| AppError::NotFound("Event not found".to_string()))?;

    let event = state.store.get(id)?;

    Ok(data(event).into_response())
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(fields) = payload.map_err(|e| AppError::ValidationError(e.body_text()))?;

    let event = state.store.create(fields)?;
    info!(id = %event.id, title = %event.title, "Event created");

    Ok(created(event, "Event created successfully").into_response())
}
