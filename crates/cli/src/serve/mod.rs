//! `fleetflow serve` -- HTTP JSON API over the trip engine.
//!
//! Endpoints:
//! - GET    /health                  - Server status (no identity required)
//! - GET    /trips                   - List or filter trips
//! - GET    /trips/{id}              - One trip
//! - POST   /trips                   - Create a trip
//! - PATCH  /trips/{id}/advance      - Move a trip one lifecycle step
//! - DELETE /trips/{id}              - Cancel a trip
//! - GET    /vehicles[/available]    - Fleet vehicles
//! - GET    /vehicles/{id}
//! - PUT    /vehicles/{id}           - Edit model, type or capacity
//! - POST   /vehicles                - Register a vehicle
//! - PATCH  /vehicles/{id}/status    - Maintenance / retirement
//! - GET    /drivers[/available]     - Drivers
//! - GET    /drivers/{id}
//! - PUT    /drivers/{id}            - Edit name or licence
//! - POST   /drivers                 - Register a driver
//! - PATCH  /drivers/{id}/status     - Duty / suspension
//!
//! All responses use Content-Type: application/json.

mod fleet;
mod handlers;
mod middleware;
mod response;
mod state;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use fleetflow_engine::{EngineError, TableFuelEstimator, TripEngine};
use fleetflow_storage::MemoryStorage;

use crate::config::FleetConfig;

use self::fleet::{
    handle_available_drivers, handle_available_vehicles, handle_driver_status, handle_get_driver,
    handle_get_vehicle, handle_list_drivers, handle_list_vehicles, handle_register_driver,
    handle_register_vehicle, handle_update_driver, handle_update_vehicle, handle_vehicle_status,
};
use self::handlers::{
    handle_advance_trip, handle_cancel_trip, handle_create_trip, handle_get_trip, handle_health,
    handle_list_trips, handle_not_found,
};
use self::middleware::auth_middleware;
use self::state::{AppState, Engine};

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (
        status,
        Json(serde_json::json!({"success": false, "error": message})),
    )
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    let api = Router::new()
        .route("/trips", get(handle_list_trips).post(handle_create_trip))
        .route(
            "/trips/{id}",
            get(handle_get_trip).delete(handle_cancel_trip),
        )
        .route("/trips/{id}/advance", patch(handle_advance_trip))
        .route(
            "/vehicles",
            get(handle_list_vehicles).post(handle_register_vehicle),
        )
        .route("/vehicles/available", get(handle_available_vehicles))
        .route(
            "/vehicles/{id}",
            get(handle_get_vehicle).put(handle_update_vehicle),
        )
        .route("/vehicles/{id}/status", patch(handle_vehicle_status))
        .route(
            "/drivers",
            get(handle_list_drivers).post(handle_register_driver),
        )
        .route("/drivers/available", get(handle_available_drivers))
        .route(
            "/drivers/{id}",
            get(handle_get_driver).put(handle_update_driver),
        )
        .route("/drivers/{id}/status", patch(handle_driver_status))
        .route_layer(axum_middleware::from_fn(auth_middleware));

    Router::new()
        .route("/health", get(handle_health))
        .merge(api)
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Register the configured seed fleet.
async fn seed(engine: &Engine, config: &FleetConfig) -> Result<(), EngineError> {
    for vehicle in &config.vehicles {
        engine.register_vehicle(vehicle.clone()).await?;
    }
    for driver in &config.drivers {
        engine.register_driver(driver.clone()).await?;
    }
    if !config.vehicles.is_empty() || !config.drivers.is_empty() {
        info!(
            vehicles = config.vehicles.len(),
            drivers = config.drivers.len(),
            "seed fleet registered"
        );
    }
    Ok(())
}

/// Build the engine from `config` and serve HTTP on `port` until Ctrl+C.
pub(crate) async fn start_server(config: FleetConfig, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let fuel = TableFuelEstimator::from_config(&config.fuel)?;
    let engine = TripEngine::new(
        Arc::new(MemoryStorage::new()),
        fuel,
        config.engine.clone(),
    );
    seed(&engine, &config).await?;

    let state = Arc::new(AppState { engine });
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "FleetFlow listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
