//! Shared fixture for engine scenario tests.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use fleetflow_core::{
    ActorId, Driver, DriverId, DriverStatus, TripPriority, Vehicle, VehicleId, VehicleStatus, VehicleType,
};
use fleetflow_engine::{
    CreateTripRequest, EngineConfig, FixedClock, FuelConfig, RouteDistance, TableFuelEstimator,
    TripEngine,
};
use fleetflow_storage::{MemoryStorage, NewDriver, NewVehicle};

pub type Engine = TripEngine<MemoryStorage, TableFuelEstimator, Arc<FixedClock>>;

pub const NOW: OffsetDateTime = datetime!(2025-06-01 08:00 UTC);
pub const DISPATCHER: ActorId = ActorId(42);

pub struct Fixture {
    pub engine: Arc<Engine>,
    pub clock: Arc<FixedClock>,
    pub storage: Arc<MemoryStorage>,
    /// TRUCK, 1000 kg.
    pub truck: Vehicle,
    /// VAN, 500 kg.
    pub van: Vehicle,
    pub alice: Driver,
    pub bob: Driver,
}

pub fn kg(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

pub fn engine_at(now: OffsetDateTime) -> (Arc<Engine>, Arc<FixedClock>, Arc<MemoryStorage>) {
    engine_with_fuel(
        now,
        FuelConfig {
            routes: vec![RouteDistance {
                from: "Mumbai".to_string(),
                to: "Pune".to_string(),
                distance_km: kg(150),
            }],
            ..FuelConfig::default()
        },
    )
}

pub fn engine_with_fuel(
    now: OffsetDateTime,
    fuel: FuelConfig,
) -> (Arc<Engine>, Arc<FixedClock>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(FixedClock::new(now));
    let fuel = TableFuelEstimator::from_config(&fuel).unwrap();
    let engine = Arc::new(TripEngine::with_clock(
        storage.clone(),
        fuel,
        clock.clone(),
        EngineConfig::default(),
    ));
    (engine, clock, storage)
}

pub async fn add_vehicle(engine: &Engine, code: &str, kind: VehicleType, capacity: i64) -> Vehicle {
    engine
        .register_vehicle(NewVehicle {
            vehicle_code: code.to_string(),
            model: "Tata LPT".to_string(),
            vehicle_type: kind,
            capacity_kg: kg(capacity),
            status: VehicleStatus::Available,
        })
        .await
        .unwrap()
}

pub async fn add_driver(engine: &Engine, name: &str) -> Driver {
    engine
        .register_driver(NewDriver {
            full_name: name.to_string(),
            license_number: format!("LIC-{name}"),
            status: DriverStatus::Available,
        })
        .await
        .unwrap()
}

pub async fn fixture() -> Fixture {
    let (engine, clock, storage) = engine_at(NOW);
    let truck = add_vehicle(&engine, "TRK-001", VehicleType::Truck, 1000).await;
    let van = add_vehicle(&engine, "VAN-001", VehicleType::Van, 500).await;
    let alice = add_driver(&engine, "Alice Rao").await;
    let bob = add_driver(&engine, "Bob Singh").await;
    Fixture {
        engine,
        clock,
        storage,
        truck,
        van,
        alice,
        bob,
    }
}

/// Mumbai -> Pune tomorrow, NORMAL priority.
pub fn request(vehicle: VehicleId, driver: DriverId, cargo_kg: i64) -> CreateTripRequest {
    CreateTripRequest {
        vehicle_id: vehicle,
        driver_id: driver,
        origin_city: "Mumbai".to_string(),
        destination_city: "Pune".to_string(),
        cargo_weight_kg: kg(cargo_kg),
        cargo_type: Some("Electronics".to_string()),
        special_instructions: None,
        scheduled_at: NOW + Duration::days(1),
        priority: TripPriority::Normal,
    }
}
