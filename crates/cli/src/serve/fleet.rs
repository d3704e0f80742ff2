//! Vehicle and driver route handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::{Extension, Json};
use serde::Deserialize;

use fleetflow_core::{DriverId, DriverStatus, VehicleId, VehicleStatus};
use fleetflow_engine::{DriverUpdate, VehicleUpdate};
use fleetflow_storage::{NewDriver, NewVehicle};

use super::handlers::{json_body, path_id};
use super::middleware::{Principal, Role};
use super::response::{ok, respond, ApiError};
use super::state::AppState;

/// Body of the PATCH .../status routes.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    status: String,
}

impl StatusChange {
    fn parse<T>(self) -> Result<T, ApiError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.status
            .parse()
            .map_err(|e: T::Err| ApiError::BadRequest(e.to_string()))
    }
}

// ── Vehicles ────────────────────────────────────────────────────────────────

/// GET /vehicles
pub(crate) async fn handle_list_vehicles(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    Ok(ok(state.engine.list_vehicles(false).await?))
}

/// GET /vehicles/available
pub(crate) async fn handle_available_vehicles(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    Ok(ok(state.engine.list_vehicles(true).await?))
}

/// GET /vehicles/{id}
pub(crate) async fn handle_get_vehicle(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = path_id(path)?;
    Ok(ok(state.engine.get_vehicle(VehicleId(id)).await?))
}

/// POST /vehicles
pub(crate) async fn handle_register_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<NewVehicle>, JsonRejection>,
) -> Result<Response, ApiError> {
    principal.require(Role::MANAGERS)?;
    let vehicle = state.engine.register_vehicle(json_body(body)?).await?;
    Ok(respond(StatusCode::CREATED, vehicle, Some("Vehicle added")))
}

/// PUT /vehicles/{id}
pub(crate) async fn handle_update_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<VehicleUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    principal.require(Role::MANAGERS)?;
    let id = path_id(path)?;
    let vehicle = state
        .engine
        .update_vehicle(VehicleId(id), json_body(body)?)
        .await?;
    Ok(respond(StatusCode::OK, vehicle, Some("Vehicle updated")))
}

/// PATCH /vehicles/{id}/status
pub(crate) async fn handle_vehicle_status(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<StatusChange>, JsonRejection>,
) -> Result<Response, ApiError> {
    principal.require(Role::MANAGERS)?;
    let id = path_id(path)?;
    let status: VehicleStatus = json_body(body)?.parse()?;
    let vehicle = state
        .engine
        .set_vehicle_status(VehicleId(id), status)
        .await?;
    Ok(respond(StatusCode::OK, vehicle, Some("Status updated")))
}

// ── Drivers ─────────────────────────────────────────────────────────────────

/// GET /drivers
pub(crate) async fn handle_list_drivers(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    Ok(ok(state.engine.list_drivers(false).await?))
}

/// GET /drivers/available
pub(crate) async fn handle_available_drivers(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    Ok(ok(state.engine.list_drivers(true).await?))
}

/// GET /drivers/{id}
pub(crate) async fn handle_get_driver(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = path_id(path)?;
    Ok(ok(state.engine.get_driver(DriverId(id)).await?))
}

/// POST /drivers
pub(crate) async fn handle_register_driver(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<NewDriver>, JsonRejection>,
) -> Result<Response, ApiError> {
    principal.require(Role::MANAGERS)?;
    let driver = state.engine.register_driver(json_body(body)?).await?;
    Ok(respond(StatusCode::CREATED, driver, Some("Driver added")))
}

/// PUT /drivers/{id}
pub(crate) async fn handle_update_driver(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<DriverUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    principal.require(Role::MANAGERS)?;
    let id = path_id(path)?;
    let driver = state
        .engine
        .update_driver(DriverId(id), json_body(body)?)
        .await?;
    Ok(respond(StatusCode::OK, driver, Some("Driver updated")))
}

/// PATCH /drivers/{id}/status
pub(crate) async fn handle_driver_status(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<StatusChange>, JsonRejection>,
) -> Result<Response, ApiError> {
    principal.require(Role::MANAGERS)?;
    let id = path_id(path)?;
    let status: DriverStatus = json_body(body)?.parse()?;
    let driver = state
        .engine
        .set_driver_status(DriverId(id), status)
        .await?;
    Ok(respond(StatusCode::OK, driver, Some("Status updated")))
}
