use std::future::Future;

use fleetflow_core::{DriverId, TripId, VehicleId};

use super::{make_driver, make_vehicle, seed_fleet, TestResult};
use crate::{FleetStorage, StorageError};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "error",
        "get_missing_vehicle",
        get_missing_vehicle(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "get_missing_driver",
        get_missing_driver(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "get_missing_trip",
        get_missing_trip(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "lock_missing_trip",
        lock_missing_trip(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "update_missing_vehicle",
        update_missing_vehicle(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "duplicate_vehicle_code_rejected",
        duplicate_vehicle_code_rejected(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "duplicate_license_number_rejected",
        duplicate_license_number_rejected(factory).await,
    ));

    results
}

async fn get_missing_vehicle<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_vehicle(VehicleId(404)).await {
        Err(StorageError::VehicleNotFound { vehicle_id }) if vehicle_id == VehicleId(404) => {
            Ok(())
        }
        other => Err(format!("expected VehicleNotFound(404), got {:?}", other)),
    }
}

async fn get_missing_driver<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_driver(DriverId(404)).await {
        Err(StorageError::DriverNotFound { driver_id }) if driver_id == DriverId(404) => Ok(()),
        other => Err(format!("expected DriverNotFound(404), got {:?}", other)),
    }
}

async fn get_missing_trip<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_trip(TripId(404)).await {
        Err(StorageError::TripNotFound { trip_id }) if trip_id == TripId(404) => Ok(()),
        other => Err(format!("expected TripNotFound(404), got {:?}", other)),
    }
}

async fn lock_missing_trip<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let result = s.get_trip_for_update(&mut snap, TripId(9)).await;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;
    match result {
        Err(StorageError::TripNotFound { .. }) => Ok(()),
        other => Err(format!("expected TripNotFound, got {:?}", other)),
    }
}

async fn update_missing_vehicle<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let (mut vehicle, _) = seed_fleet(&s, "TRK-001", "J. Harris").await?;
    vehicle.id = VehicleId(vehicle.id.get() + 100);

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let result = s.update_vehicle(&mut snap, &vehicle).await;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;
    match result {
        Err(StorageError::VehicleNotFound { .. }) => Ok(()),
        other => Err(format!("expected VehicleNotFound, got {:?}", other)),
    }
}

async fn duplicate_vehicle_code_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed_fleet(&s, "TRK-001", "J. Harris").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let result = s
        .insert_vehicle(
            &mut snap,
            make_vehicle("TRK-001", fleetflow_core::VehicleType::Van),
        )
        .await;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;
    match result {
        Err(StorageError::DuplicateVehicleCode { vehicle_code }) if vehicle_code == "TRK-001" => {
            Ok(())
        }
        other => Err(format!("expected DuplicateVehicleCode, got {:?}", other)),
    }
}

async fn duplicate_license_number_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let (_, first) = seed_fleet(&s, "TRK-001", "J. Harris").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let mut copy = make_driver("K. Osei");
    copy.license_number = first.license_number.clone();
    let inserted = s.insert_driver(&mut snap, copy).await;

    // Unlicensed drivers never collide.
    let mut blank_a = make_driver("A. Blank");
    blank_a.license_number = String::new();
    let mut blank_b = make_driver("B. Blank");
    blank_b.license_number = String::new();
    let blanks = match s.insert_driver(&mut snap, blank_a).await {
        Ok(_) => s.insert_driver(&mut snap, blank_b).await.map(|_| ()),
        Err(e) => Err(e),
    };

    // Re-saving a driver with its own licence is not a duplicate.
    let resaved = s.update_driver(&mut snap, &first).await;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;

    match inserted {
        Err(StorageError::DuplicateLicenseNumber { license_number })
            if license_number == first.license_number => {}
        other => return Err(format!("expected DuplicateLicenseNumber, got {:?}", other)),
    }
    blanks.map_err(|e| format!("blank licences collided: {e}"))?;
    resaved.map_err(|e| format!("re-saving own licence failed: {e}"))
}
