use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use fleetflow_core::{TripCode, TripStatus, VehicleStatus};

use super::{make_trip, seed_fleet, TestResult};
use crate::{FleetStorage, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "concurrent",
        "concurrent_leases_exactly_one_wins",
        concurrent_leases_exactly_one_wins(factory).await,
    ));
    results.push(TestResult::from_result(
        "concurrent",
        "concurrent_sequences_unique",
        concurrent_sequences_unique(factory).await,
    ));

    results
}

// ── Concurrent lease: exactly one wins ──────────────────────────────────────

/// N tasks each open a snapshot, lock the same vehicle, and claim it only if
/// it is AVAILABLE and has no active trip. Exactly one claim may commit.
async fn concurrent_leases_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    let (vehicle, driver) = seed_fleet(storage.as_ref(), "TRK-001", "J. Harris").await?;

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        let (vehicle, driver) = (vehicle.clone(), driver.clone());
        handles.push(tokio::spawn(async move {
            let mut snap = s.begin_snapshot().await?;
            let mut locked = s.get_vehicle_for_update(&mut snap, vehicle.id).await?;
            let booked = s
                .has_trip_for_vehicle(&mut snap, vehicle.id, &TripStatus::ACTIVE)
                .await?;
            if locked.status != VehicleStatus::Available || booked {
                s.abort_snapshot(snap).await?;
                return Ok::<bool, StorageError>(false);
            }
            let seq = s.next_trip_sequence(&mut snap).await?;
            s.insert_trip(&mut snap, make_trip(seq, &vehicle, &driver, i as i64))
                .await?;
            locked.status = VehicleStatus::OnTrip;
            s.update_vehicle(&mut snap, &locked).await?;
            s.commit_snapshot(snap).await?;
            Ok(true)
        }));
    }

    let mut winners = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("storage error: {e}"))?;
        if won {
            winners += 1;
        }
    }

    if winners != 1 {
        return Err(format!("expected exactly 1 winner, got {winners}"));
    }
    let count = storage
        .count_trips()
        .await
        .map_err(|e| format!("count: {e}"))?;
    if count != 1 {
        return Err(format!("expected 1 committed trip, got {count}"));
    }
    Ok(())
}

// ── Concurrent sequences: codes never collide ───────────────────────────────

async fn concurrent_sequences_unique<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    let (vehicle, driver) = seed_fleet(storage.as_ref(), "TRK-001", "J. Harris").await?;

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        let (vehicle, driver) = (vehicle.clone(), driver.clone());
        handles.push(tokio::spawn(async move {
            let mut snap = s.begin_snapshot().await?;
            let seq = s.next_trip_sequence(&mut snap).await?;
            let mut trip = make_trip(seq, &vehicle, &driver, i as i64);
            trip.status = TripStatus::Delivered;
            let inserted = s.insert_trip(&mut snap, trip).await?;
            s.commit_snapshot(snap).await?;
            Ok::<TripCode, StorageError>(inserted.trip_code)
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        let code = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("storage error: {e}"))?;
        if !codes.insert(code.clone()) {
            return Err(format!("trip code {code} handed out twice"));
        }
    }
    if codes.len() != N {
        return Err(format!("expected {N} distinct codes, got {}", codes.len()));
    }
    Ok(())
}
