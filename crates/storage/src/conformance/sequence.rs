use std::future::Future;

use super::{make_trip, seed_fleet, TestResult};
use crate::{FleetStorage, StorageError};

pub(super) async fn run_sequence_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "sequence",
        "sequence_starts_at_one",
        sequence_starts_at_one(factory).await,
    ));
    results.push(TestResult::from_result(
        "sequence",
        "sequence_increases_across_commits",
        sequence_increases_across_commits(factory).await,
    ));
    results.push(TestResult::from_result(
        "sequence",
        "duplicate_trip_code_rejected",
        duplicate_trip_code_rejected(factory).await,
    ));

    results
}

async fn sequence_starts_at_one<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let first = s
        .next_trip_sequence(&mut snap)
        .await
        .map_err(|e| format!("sequence: {e}"))?;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;
    if first != 1 {
        return Err(format!("expected first sequence value 1, got {first}"));
    }
    Ok(())
}

async fn sequence_increases_across_commits<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut seen = Vec::new();
    for _ in 0..3 {
        let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
        let value = s
            .next_trip_sequence(&mut snap)
            .await
            .map_err(|e| format!("sequence: {e}"))?;
        s.commit_snapshot(snap)
            .await
            .map_err(|e| format!("commit: {e}"))?;
        seen.push(value);
    }
    if !seen.windows(2).all(|w| w[0] < w[1]) {
        return Err(format!("sequence not strictly increasing: {:?}", seen));
    }
    Ok(())
}

async fn duplicate_trip_code_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let (vehicle, driver) = seed_fleet(&s, "TRK-001", "J. Harris").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    s.insert_trip(&mut snap, make_trip(5, &vehicle, &driver, 0))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    s.commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;

    let mut snap = s.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    let result = s
        .insert_trip(&mut snap, make_trip(5, &vehicle, &driver, 1))
        .await;
    s.abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;

    match result {
        Err(StorageError::DuplicateTripCode { trip_code }) if trip_code.as_str() == "TRP-005" => {
            Ok(())
        }
        other => Err(format!("expected DuplicateTripCode(TRP-005), got {:?}", other)),
    }
}
