//! Snapshot isolation conformance tests.
//!
//! Verifies that uncommitted writes are invisible outside a snapshot,
//! visible inside it, and discarded on abort or drop.

use std::future::Future;

use fleetflow_core::{DriverStatus, TripStatus, VehicleStatus};

use super::{make_trip, seed_fleet, TestResult};
use crate::{FleetStorage, StorageError};

pub(super) async fn run_snapshot_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "snapshot",
        "uncommitted_trip_invisible",
        uncommitted_trip_invisible(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "uncommitted_vehicle_update_invisible",
        uncommitted_vehicle_update_invisible(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "snapshot_reads_its_own_writes",
        snapshot_reads_its_own_writes(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "aborted_writes_discarded",
        aborted_writes_discarded(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "dropped_snapshot_discards_writes",
        dropped_snapshot_discards_writes(factory).await,
    ));

    results
}

async fn uncommitted_trip_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
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

    let visible = s.get_trip(trip.id).await;
    let listed = s.list_trips().await.map_err(|e| format!("list: {e}"))?;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;

    if !matches!(visible, Err(StorageError::TripNotFound { .. })) {
        return Err(format!("uncommitted trip visible to get: {:?}", visible));
    }
    if !listed.is_empty() {
        return Err(format!("uncommitted trip visible to list: {} rows", listed.len()));
    }
    Ok(())
}

async fn uncommitted_vehicle_update_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let (vehicle, _) = seed_fleet(&s, "TRK-001", "J. Harris").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let mut locked = s
        .get_vehicle_for_update(&mut snap, vehicle.id)
        .await
        .map_err(|e| format!("lock: {e}"))?;
    locked.status = VehicleStatus::OnTrip;
    s.update_vehicle(&mut snap, &locked)
        .await
        .map_err(|e| format!("update: {e}"))?;

    let outside = s
        .get_vehicle(vehicle.id)
        .await
        .map_err(|e| format!("get: {e}"))?;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;

    if outside.status != VehicleStatus::Available {
        return Err(format!(
            "uncommitted status visible outside snapshot: {}",
            outside.status
        ));
    }
    Ok(())
}

async fn snapshot_reads_its_own_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let (vehicle, driver) = seed_fleet(&s, "TRK-001", "J. Harris").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let mut locked = s
        .get_driver_for_update(&mut snap, driver.id)
        .await
        .map_err(|e| format!("lock: {e}"))?;
    locked.status = DriverStatus::OnTrip;
    s.update_driver(&mut snap, &locked)
        .await
        .map_err(|e| format!("update: {e}"))?;
    let trip = s
        .insert_trip(&mut snap, make_trip(1, &vehicle, &driver, 0))
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let reread = s.get_driver_for_update(&mut snap, driver.id).await;
    let trip_reread = s.get_trip_for_update(&mut snap, trip.id).await;
    let booked = s
        .has_trip_for_vehicle(&mut snap, vehicle.id, &TripStatus::ACTIVE)
        .await;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;

    match reread {
        Ok(d) if d.status == DriverStatus::OnTrip => {}
        other => return Err(format!("expected own driver write, got {:?}", other)),
    }
    if trip_reread.is_err() {
        return Err(format!("own trip insert not readable: {:?}", trip_reread));
    }
    match booked {
        Ok(true) => Ok(()),
        other => Err(format!("own trip insert not seen by existence check: {:?}", other)),
    }
}

async fn aborted_writes_discarded<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let (vehicle, driver) = seed_fleet(&s, "TRK-001", "J. Harris").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    s.insert_trip(&mut snap, make_trip(1, &vehicle, &driver, 0))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    let mut locked = s
        .get_vehicle_for_update(&mut snap, vehicle.id)
        .await
        .map_err(|e| format!("lock: {e}"))?;
    locked.status = VehicleStatus::OnTrip;
    s.update_vehicle(&mut snap, &locked)
        .await
        .map_err(|e| format!("update: {e}"))?;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;

    let count = s.count_trips().await.map_err(|e| format!("count: {e}"))?;
    if count != 0 {
        return Err(format!("expected 0 trips after abort, got {count}"));
    }
    let after = s
        .get_vehicle(vehicle.id)
        .await
        .map_err(|e| format!("get: {e}"))?;
    if after.status != VehicleStatus::Available {
        return Err(format!("vehicle status survived abort: {}", after.status));
    }
    Ok(())
}

async fn dropped_snapshot_discards_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let (vehicle, driver) = seed_fleet(&s, "TRK-001", "J. Harris").await?;

    {
        let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
        s.insert_trip(&mut snap, make_trip(1, &vehicle, &driver, 0))
            .await
            .map_err(|e| format!("insert: {e}"))?;
        // dropped here without commit
    }

    let count = s.count_trips().await.map_err(|e| format!("count: {e}"))?;
    if count != 0 {
        return Err(format!("expected 0 trips after drop, got {count}"));
    }

    // The store must still accept new snapshots after a drop.
    let snap = s
        .begin_snapshot()
        .await
        .map_err(|e| format!("begin after drop: {e}"))?;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;
    Ok(())
}
