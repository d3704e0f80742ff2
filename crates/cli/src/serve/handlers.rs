//! Health, fallback and trip route handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use fleetflow_core::{TripId, TripPriority, TripStatus, VehicleType};
use fleetflow_engine::CreateTripRequest;
use fleetflow_storage::TripQuery;

use super::json_error;
use super::middleware::{Principal, Role};
use super::response::{ok, respond, ApiError};
use super::state::AppState;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

pub(crate) fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// Query string of GET /trips. Values are matched case-insensitively.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TripListParams {
    status: Option<String>,
    priority: Option<String>,
    vehicle_type: Option<String>,
    search: Option<String>,
}

impl TripListParams {
    fn into_query(self) -> Result<TripQuery, ApiError> {
        fn parse<T: std::str::FromStr>(raw: Option<String>) -> Result<Option<T>, ApiError>
        where
            T::Err: std::fmt::Display,
        {
            match raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => v
                    .parse()
                    .map(Some)
                    .map_err(|e: T::Err| ApiError::BadRequest(e.to_string())),
                None => Ok(None),
            }
        }

        Ok(TripQuery {
            status: parse::<TripStatus>(self.status)?,
            priority: parse::<TripPriority>(self.priority)?,
            vehicle_type: parse::<VehicleType>(self.vehicle_type)?,
            search: self.search,
        })
    }
}

/// GET /trips
pub(crate) async fn handle_list_trips(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<TripListParams>,
) -> Result<Response, ApiError> {
    principal.require(Role::TRIP_READERS)?;
    let query = params.into_query()?;
    let trips = state.engine.filter_trips(&query).await?;
    Ok(ok(trips))
}

/// GET /trips/{id}
pub(crate) async fn handle_get_trip(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    principal.require(Role::TRIP_READERS)?;
    let id = path_id(path)?;
    let trip = state.engine.get_trip(TripId(id)).await?;
    Ok(ok(trip))
}

/// POST /trips
pub(crate) async fn handle_create_trip(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<CreateTripRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    principal.require(Role::TRIP_WRITERS)?;
    let request = json_body(body)?;
    let trip = state.engine.create_trip(request, principal.actor).await?;
    Ok(respond(
        StatusCode::CREATED,
        trip,
        Some("Trip created successfully"),
    ))
}

/// PATCH /trips/{id}/advance
pub(crate) async fn handle_advance_trip(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    principal.require(Role::TRIP_WRITERS)?;
    let id = path_id(path)?;
    let trip = state
        .engine
        .advance_status(TripId(id), principal.actor)
        .await?;
    Ok(respond(StatusCode::OK, trip, Some("Status updated")))
}

/// DELETE /trips/{id}
pub(crate) async fn handle_cancel_trip(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    principal.require(Role::MANAGERS)?;
    let id = path_id(path)?;
    state.engine.cancel_trip(TripId(id), principal.actor).await?;
    Ok(respond(StatusCode::OK, (), Some("Trip cancelled")))
}
