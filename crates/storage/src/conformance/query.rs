//! Query conformance tests: ordering, filter predicates, existence checks.

use std::future::Future;

use fleetflow_core::{Driver, Trip, TripPriority, TripStatus, Vehicle, VehicleType};

use super::{make_driver, make_trip, make_vehicle, TestResult};
use crate::{FleetStorage, TripQuery};

pub(super) async fn run_query_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "query",
        "list_trips_newest_first",
        list_trips_newest_first(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "filter_by_status_and_priority",
        filter_by_status_and_priority(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "filter_by_vehicle_type",
        filter_by_vehicle_type(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "filter_by_search_text",
        filter_by_search_text(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "existence_check_respects_status_list",
        existence_check_respects_status_list(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "trips_for_vehicle_sees_buffered_writes",
        trips_for_vehicle_sees_buffered_writes(factory).await,
    ));

    results
}

/// Two trucks' worth of fleet plus one van, with three committed trips:
///
/// | code    | vehicle | status    | priority | route            | created |
/// |---------|---------|-----------|----------|------------------|---------|
/// | TRP-001 | truck   | SCHEDULED | NORMAL   | Mumbai -> Pune   | +0m     |
/// | TRP-002 | van     | CANCELLED | URGENT   | Delhi -> Jaipur  | +10m    |
/// | TRP-003 | truck 2 | DELIVERED | URGENT   | Mumbai -> Nashik | +20m    |
async fn seed_trips<S: FleetStorage>(s: &S) -> Result<Vec<Trip>, String> {
    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let mut vehicles: Vec<Vehicle> = Vec::new();
    for (code, kind) in [
        ("TRK-001", VehicleType::Truck),
        ("VAN-001", VehicleType::Van),
        ("TRK-002", VehicleType::Truck),
    ] {
        vehicles.push(
            s.insert_vehicle(&mut snap, make_vehicle(code, kind))
                .await
                .map_err(|e| format!("insert vehicle: {e}"))?,
        );
    }
    let mut drivers: Vec<Driver> = Vec::new();
    for name in ["A", "B", "C"] {
        drivers.push(
            s.insert_driver(&mut snap, make_driver(name))
                .await
                .map_err(|e| format!("insert driver: {e}"))?,
        );
    }

    let mut first = make_trip(1, &vehicles[0], &drivers[0], 0);
    first.priority = TripPriority::Normal;

    let mut second = make_trip(2, &vehicles[1], &drivers[1], 10);
    second.status = TripStatus::Cancelled;
    second.priority = TripPriority::Urgent;
    second.origin_city = "Delhi".to_string();
    second.destination_city = "Jaipur".to_string();

    let mut third = make_trip(3, &vehicles[2], &drivers[2], 20);
    third.status = TripStatus::Delivered;
    third.priority = TripPriority::Urgent;
    third.destination_city = "Nashik".to_string();

    let mut trips = Vec::new();
    for t in [first, second, third] {
        trips.push(
            s.insert_trip(&mut snap, t)
                .await
                .map_err(|e| format!("insert trip: {e}"))?,
        );
    }
    s.commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;
    Ok(trips)
}

fn codes(trips: &[Trip]) -> Vec<String> {
    trips.iter().map(|t| t.trip_code.to_string()).collect()
}

async fn list_trips_newest_first<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed_trips(&s).await?;
    let listed = s.list_trips().await.map_err(|e| format!("list: {e}"))?;
    let got = codes(&listed);
    if got != ["TRP-003", "TRP-002", "TRP-001"] {
        return Err(format!("expected newest first, got {:?}", got));
    }
    Ok(())
}

async fn filter_by_status_and_priority<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed_trips(&s).await?;

    let urgent = s
        .filter_trips(&TripQuery {
            priority: Some(TripPriority::Urgent),
            ..TripQuery::default()
        })
        .await
        .map_err(|e| format!("filter: {e}"))?;
    if codes(&urgent) != ["TRP-003", "TRP-002"] {
        return Err(format!("priority filter: got {:?}", codes(&urgent)));
    }

    let urgent_cancelled = s
        .filter_trips(&TripQuery {
            status: Some(TripStatus::Cancelled),
            priority: Some(TripPriority::Urgent),
            ..TripQuery::default()
        })
        .await
        .map_err(|e| format!("filter: {e}"))?;
    if codes(&urgent_cancelled) != ["TRP-002"] {
        return Err(format!(
            "status+priority filter: got {:?}",
            codes(&urgent_cancelled)
        ));
    }
    Ok(())
}

async fn filter_by_vehicle_type<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed_trips(&s).await?;

    let trucks = s
        .filter_trips(&TripQuery {
            vehicle_type: Some(VehicleType::Truck),
            ..TripQuery::default()
        })
        .await
        .map_err(|e| format!("filter: {e}"))?;
    if codes(&trucks) != ["TRP-003", "TRP-001"] {
        return Err(format!("vehicle type filter: got {:?}", codes(&trucks)));
    }

    let buses = s
        .filter_trips(&TripQuery {
            vehicle_type: Some(VehicleType::Bus),
            ..TripQuery::default()
        })
        .await
        .map_err(|e| format!("filter: {e}"))?;
    if !buses.is_empty() {
        return Err(format!("expected no bus trips, got {:?}", codes(&buses)));
    }
    Ok(())
}

async fn filter_by_search_text<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed_trips(&s).await?;

    for (needle, expected) in [
        ("mumbai", vec!["TRP-003", "TRP-001"]),
        ("JAIPUR", vec!["TRP-002"]),
        ("trp-003", vec!["TRP-003"]),
        ("chennai", vec![]),
    ] {
        let found = s
            .filter_trips(&TripQuery {
                search: Some(needle.to_string()),
                ..TripQuery::default()
            })
            .await
            .map_err(|e| format!("filter: {e}"))?;
        if codes(&found) != expected {
            return Err(format!(
                "search '{needle}': expected {:?}, got {:?}",
                expected,
                codes(&found)
            ));
        }
    }
    Ok(())
}

async fn existence_check_respects_status_list<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let trips = seed_trips(&s).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let scheduled_vehicle = s
        .has_trip_for_vehicle(&mut snap, trips[0].vehicle_id, &TripStatus::ACTIVE)
        .await;
    let cancelled_vehicle = s
        .has_trip_for_vehicle(&mut snap, trips[1].vehicle_id, &TripStatus::ACTIVE)
        .await;
    let delivered_driver = s
        .has_trip_for_driver(&mut snap, trips[2].driver_id, &TripStatus::ACTIVE)
        .await;
    let delivered_driver_any = s
        .has_trip_for_driver(&mut snap, trips[2].driver_id, &[TripStatus::Delivered])
        .await;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;

    let got = (
        scheduled_vehicle.map_err(|e| format!("{e}"))?,
        cancelled_vehicle.map_err(|e| format!("{e}"))?,
        delivered_driver.map_err(|e| format!("{e}"))?,
        delivered_driver_any.map_err(|e| format!("{e}"))?,
    );
    if got != (true, false, false, true) {
        return Err(format!(
            "expected (true, false, false, true) for (scheduled, cancelled, delivered, delivered-listed), got {:?}",
            got
        ));
    }
    Ok(())
}

async fn trips_for_vehicle_sees_buffered_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let trips = seed_trips(&s).await?;
    let truck = trips[0].vehicle_id;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let before = s.trips_for_vehicle(&mut snap, truck, &TripStatus::ACTIVE).await;
    let mut cancelled = trips[0].clone();
    cancelled.status = TripStatus::Cancelled;
    let update = s.update_trip(&mut snap, &cancelled).await;
    let after = s.trips_for_vehicle(&mut snap, truck, &TripStatus::ACTIVE).await;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;

    update.map_err(|e| format!("update: {e}"))?;
    let before = codes(&before.map_err(|e| format!("{e}"))?);
    let after = after.map_err(|e| format!("{e}"))?;
    if before != ["TRP-001"] || !after.is_empty() {
        return Err(format!(
            "expected [TRP-001] then [], got {:?} then {} trip(s)",
            before,
            after.len()
        ));
    }
    Ok(())
}
