use std::future::Future;

use fleetflow_core::{DriverStatus, TripStatus, VehicleStatus};

use super::{base_time, make_trip, seed_fleet, TestResult};
use crate::FleetStorage;

pub(super) async fn run_commit_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "commit",
        "trip_and_leases_visible_together",
        trip_and_leases_visible_together(factory).await,
    ));
    results.push(TestResult::from_result(
        "commit",
        "trip_fields_preserved",
        trip_fields_preserved(factory).await,
    ));
    results.push(TestResult::from_result(
        "commit",
        "trip_update_persists",
        trip_update_persists(factory).await,
    ));

    results
}

/// Trip insert plus vehicle and driver status flips in one snapshot: all
/// three are visible after commit.
async fn trip_and_leases_visible_together<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let (vehicle, driver) = seed_fleet(&s, "TRK-001", "J. Harris").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let trip = s
        .insert_trip(&mut snap, make_trip(1, &vehicle, &driver, 0))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    let mut v = vehicle.clone();
    v.status = VehicleStatus::OnTrip;
    s.update_vehicle(&mut snap, &v)
        .await
        .map_err(|e| format!("update vehicle: {e}"))?;
    let mut d = driver.clone();
    d.status = DriverStatus::OnTrip;
    s.update_driver(&mut snap, &d)
        .await
        .map_err(|e| format!("update driver: {e}"))?;
    s.commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;

    s.get_trip(trip.id)
        .await
        .map_err(|e| format!("trip missing after commit: {e}"))?;
    let v = s.get_vehicle(vehicle.id).await.map_err(|e| format!("{e}"))?;
    let d = s.get_driver(driver.id).await.map_err(|e| format!("{e}"))?;
    if v.status != VehicleStatus::OnTrip || d.status != DriverStatus::OnTrip {
        return Err(format!(
            "expected both leases committed, got vehicle={} driver={}",
            v.status, d.status
        ));
    }
    Ok(())
}

async fn trip_fields_preserved<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let (vehicle, driver) = seed_fleet(&s, "TRK-001", "J. Harris").await?;

    let mut new_trip = make_trip(1, &vehicle, &driver, 0);
    new_trip.cargo_type = Some("Electronics".to_string());
    new_trip.special_instructions = Some("Fragile".to_string());

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let inserted = s
        .insert_trip(&mut snap, new_trip.clone())
        .await
        .map_err(|e| format!("insert: {e}"))?;
    s.commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;

    let stored = s
        .get_trip(inserted.id)
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored != inserted {
        return Err(format!(
            "stored trip differs from insert result:\n{:?}\n{:?}",
            stored, inserted
        ));
    }
    if stored.trip_code != new_trip.trip_code
        || stored.cargo_type.as_deref() != Some("Electronics")
        || stored.special_instructions.as_deref() != Some("Fragile")
        || stored.status != TripStatus::Scheduled
        || stored.created_at != base_time()
        || stored.updated_at != base_time()
        || stored.dispatched_at.is_some()
        || stored.actual_fuel_cost.is_some()
    {
        return Err(format!("trip fields not preserved: {:?}", stored));
    }
    Ok(())
}

async fn trip_update_persists<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let (vehicle, driver) = seed_fleet(&s, "TRK-001", "J. Harris").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let trip = s
        .insert_trip(&mut snap, make_trip(1, &vehicle, &driver, 0))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    s.commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let mut locked = s
        .get_trip_for_update(&mut snap, trip.id)
        .await
        .map_err(|e| format!("lock: {e}"))?;
    locked.status = TripStatus::Dispatched;
    locked.dispatched_at = Some(base_time());
    s.update_trip(&mut snap, &locked)
        .await
        .map_err(|e| format!("update: {e}"))?;
    s.commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;

    let stored = s.get_trip(trip.id).await.map_err(|e| format!("get: {e}"))?;
    if stored.status != TripStatus::Dispatched || stored.dispatched_at != Some(base_time()) {
        return Err(format!("trip update not persisted: {:?}", stored));
    }
    Ok(())
}
