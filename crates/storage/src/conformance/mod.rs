//! Conformance test suite for `FleetStorage` implementations.
//!
//! This module provides a backend-agnostic test suite that any `FleetStorage`
//! implementation can run to verify correctness. The suite covers:
//!
//! - **Snapshot isolation**: uncommitted writes invisible, aborted writes discarded
//! - **Atomic commit**: a trip and the vehicle/driver writes beside it land together
//! - **Sequence**: trip-code sequence values and duplicate-code rejection
//! - **Queries**: ordering, filter predicates, active-trip existence checks
//! - **Error handling**: correct error variants for missing records
//! - **Concurrency**: racing snapshots on the same vehicle, racing sequences
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty storage instance for each test:
//!
//! ```ignore
//! use fleetflow_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_storage().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod commit;
mod concurrent;
mod error;
mod query;
mod sequence;
mod snapshot;

use std::fmt;
use std::future::Future;

use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use fleetflow_core::{
    ActorId, Driver, DriverStatus, TripCode, TripPriority, TripStatus, Vehicle, VehicleStatus,
    VehicleType,
};

use crate::record::{NewDriver, NewTrip, NewVehicle};
use crate::FleetStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "snapshot", "commit").
    pub category: String,
    /// Test name (e.g. "uncommitted_trip_invisible").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// storage instance, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: FleetStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(error::run_error_tests(&factory).await);
    results.extend(snapshot::run_snapshot_tests(&factory).await);
    results.extend(commit::run_commit_tests(&factory).await);
    results.extend(sequence::run_sequence_tests(&factory).await);
    results.extend(query::run_query_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: record constructors with sensible defaults ──────────────────────

fn base_time() -> OffsetDateTime {
    time::macros::datetime!(2025-01-01 00:00 UTC)
}

fn make_vehicle(code: &str, vehicle_type: VehicleType) -> NewVehicle {
    NewVehicle {
        vehicle_code: code.to_string(),
        model: "test-model".to_string(),
        vehicle_type,
        capacity_kg: Decimal::new(1000, 0),
        status: VehicleStatus::Available,
    }
}

fn make_driver(name: &str) -> NewDriver {
    NewDriver {
        full_name: name.to_string(),
        license_number: format!("LIC-{name}"),
        status: DriverStatus::Available,
    }
}

/// A scheduled trip created `minutes` after [`base_time`].
fn make_trip(sequence: u64, vehicle: &Vehicle, driver: &Driver, minutes: i64) -> NewTrip {
    let created_at = base_time() + Duration::minutes(minutes);
    NewTrip {
        trip_code: TripCode::from_sequence(sequence),
        vehicle_id: vehicle.id,
        driver_id: driver.id,
        created_by: ActorId(1),
        origin_city: "Mumbai".to_string(),
        destination_city: "Pune".to_string(),
        distance_km: Decimal::new(150, 0),
        cargo_weight_kg: Decimal::new(500, 0),
        cargo_type: None,
        special_instructions: None,
        status: TripStatus::Scheduled,
        priority: TripPriority::Normal,
        scheduled_at: created_at + Duration::days(1),
        fuel_litres: Decimal::new(20, 0),
        estimated_fuel_cost: Decimal::new(1900, 0),
        created_at,
    }
}

/// Register one vehicle and one driver in a committed snapshot.
async fn seed_fleet<S: FleetStorage>(
    storage: &S,
    code: &str,
    name: &str,
) -> Result<(Vehicle, Driver), String> {
    let mut snap = storage
        .begin_snapshot()
        .await
        .map_err(|e| format!("begin: {e}"))?;
    let vehicle = storage
        .insert_vehicle(&mut snap, make_vehicle(code, VehicleType::Truck))
        .await
        .map_err(|e| format!("insert vehicle: {e}"))?;
    let driver = storage
        .insert_driver(&mut snap, make_driver(name))
        .await
        .map_err(|e| format!("insert driver: {e}"))?;
    storage
        .commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit seed: {e}"))?;
    Ok((vehicle, driver))
}
