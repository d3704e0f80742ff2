//! Creation checks: each rule, and the order in which they fire.

mod common;

use rust_decimal::Decimal;
use time::Duration;

use common::{add_driver, engine_with_fuel, fixture, kg, request, Fixture, DISPATCHER, NOW};
use fleetflow_core::{
    DriverId, DriverStatus, TripCode, TripPriority, TripStatus, VehicleId, VehicleStatus,
    VehicleType,
};
use fleetflow_engine::{Conflict, EngineError, Entity, ErrorKind, FuelConfig};
use fleetflow_storage::{FleetStorage, NewTrip, NewVehicle};

/// Write an active trip straight into storage without flipping any
/// statuses, leaving an AVAILABLE resource that is nevertheless booked.
async fn plant_active_trip(f: &Fixture, vehicle: VehicleId, driver: DriverId) {
    let mut snap = f.storage.begin_snapshot().await.unwrap();
    let seq = f.storage.next_trip_sequence(&mut snap).await.unwrap();
    f.storage
        .insert_trip(
            &mut snap,
            NewTrip {
                trip_code: TripCode::from_sequence(seq),
                vehicle_id: vehicle,
                driver_id: driver,
                created_by: DISPATCHER,
                origin_city: "Delhi".to_string(),
                destination_city: "Agra".to_string(),
                distance_km: kg(230),
                cargo_weight_kg: kg(100),
                cargo_type: None,
                special_instructions: None,
                status: TripStatus::Dispatched,
                priority: TripPriority::Normal,
                scheduled_at: NOW,
                fuel_litres: kg(58),
                estimated_fuel_cost: kg(5510),
                created_at: NOW - Duration::hours(2),
            },
        )
        .await
        .unwrap();
    f.storage.commit_snapshot(snap).await.unwrap();
}

async fn assert_nothing_written(f: &Fixture) {
    assert_eq!(f.storage.count_trips().await.unwrap(), 0);
    for v in f.engine.list_vehicles(false).await.unwrap() {
        assert_ne!(v.status, VehicleStatus::OnTrip, "{}", v.vehicle_code);
    }
    for d in f.engine.list_drivers(false).await.unwrap() {
        assert_ne!(d.status, DriverStatus::OnTrip, "{}", d.full_name);
    }
}

// ── Individual rules ────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_vehicle_is_not_found() {
    let f = fixture().await;
    let err = f
        .engine
        .create_trip(request(VehicleId(99), f.alice.id, 100), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::NotFound {
            entity: Entity::Vehicle,
            id: 99
        }
    ));
    assert_eq!(err.to_string(), "vehicle not found: 99");
    assert_nothing_written(&f).await;
}

#[tokio::test]
async fn vehicle_in_shop_is_unavailable() {
    let f = fixture().await;
    f.engine
        .set_vehicle_status(f.truck.id, VehicleStatus::InShop)
        .await
        .unwrap();

    let err = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 100), DISPATCHER)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "vehicle TRK-001 is not available (status: IN_SHOP)"
    );
    assert_nothing_written(&f).await;
}

#[tokio::test]
async fn cargo_over_capacity_is_rejected_with_both_values() {
    let f = fixture().await;
    let err = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 1200), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::CapacityExceeded { .. })
    ));
    let message = err.to_string();
    assert!(message.contains("1200"), "{message}");
    assert!(message.contains("1000"), "{message}");
    assert_nothing_written(&f).await;
}

#[tokio::test]
async fn cargo_exactly_at_capacity_is_accepted() {
    let f = fixture().await;
    let trip = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 1000), DISPATCHER)
        .await
        .unwrap();
    assert_eq!(trip.cargo_weight_kg, kg(1000));
}

#[tokio::test]
async fn missing_driver_is_not_found() {
    let f = fixture().await;
    let err = f
        .engine
        .create_trip(request(f.truck.id, DriverId(77), 100), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::NotFound {
            entity: Entity::Driver,
            id: 77
        }
    ));
    assert_nothing_written(&f).await;
}

#[tokio::test]
async fn suspended_driver_is_unavailable() {
    let f = fixture().await;
    f.engine
        .set_driver_status(f.alice.id, DriverStatus::Suspended)
        .await
        .unwrap();

    let err = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 100), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::DriverUnavailable {
            status: DriverStatus::Suspended,
            ..
        })
    ));
    assert_nothing_written(&f).await;
}

#[tokio::test]
async fn driver_on_an_active_trip_is_double_booked() {
    let f = fixture().await;
    // Alice holds an active trip on the van but her status still reads AVAILABLE.
    plant_active_trip(&f, f.van.id, f.alice.id).await;

    let err = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 100), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::DriverDoubleBooked { .. })
    ));
    assert_eq!(f.storage.count_trips().await.unwrap(), 1);
}

#[tokio::test]
async fn vehicle_on_an_active_trip_is_double_booked() {
    let f = fixture().await;
    plant_active_trip(&f, f.truck.id, f.bob.id).await;

    let err = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 100), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::VehicleDoubleBooked { .. })
    ));
}

#[tokio::test]
async fn same_city_ignoring_case_is_invalid() {
    let f = fixture().await;
    let mut req = request(f.truck.id, f.alice.id, 100);
    req.destination_city = "mumbai".to_string();

    let err = f.engine.create_trip(req, DISPATCHER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_nothing_written(&f).await;
}

#[tokio::test]
async fn schedule_at_the_current_instant_is_rejected() {
    let f = fixture().await;
    let mut req = request(f.truck.id, f.alice.id, 100);
    req.scheduled_at = NOW;

    let err = f.engine.create_trip(req, DISPATCHER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(
        err.to_string(),
        "scheduled time 2025-06-01T08:00:00Z must be in the future"
    );
    assert_nothing_written(&f).await;
}

#[tokio::test]
async fn schedule_in_the_past_is_rejected_and_one_second_ahead_is_not() {
    let f = fixture().await;
    let mut req = request(f.truck.id, f.alice.id, 100);
    req.scheduled_at = NOW - Duration::days(1);
    let err = f.engine.create_trip(req.clone(), DISPATCHER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    req.scheduled_at = NOW + Duration::seconds(1);
    f.engine.create_trip(req, DISPATCHER).await.unwrap();
}

#[tokio::test]
async fn non_positive_weight_and_blank_cities_are_invalid() {
    let f = fixture().await;

    let err = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 0), DISPATCHER)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let mut req = request(f.truck.id, f.alice.id, 100);
    req.origin_city = " ".to_string();
    let err = f.engine.create_trip(req, DISPATCHER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_nothing_written(&f).await;
}

#[tokio::test]
async fn second_booking_of_a_leased_driver_is_rejected() {
    let f = fixture().await;
    f.engine
        .create_trip(request(f.truck.id, f.alice.id, 100), DISPATCHER)
        .await
        .unwrap();

    // Creation flips Alice to ON_TRIP, so the availability rule fires
    // before the active-trip lookup.
    let err = f
        .engine
        .create_trip(request(f.van.id, f.alice.id, 100), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::DriverUnavailable {
            status: DriverStatus::OnTrip,
            ..
        })
    ));
    assert_eq!(
        err.to_string(),
        "driver Alice Rao is not available (status: ON_TRIP)"
    );
    assert_eq!(f.storage.count_trips().await.unwrap(), 1);
    assert!(f.engine.get_vehicle(f.van.id).await.unwrap().is_available());
}

#[tokio::test]
async fn second_booking_of_a_leased_vehicle_is_rejected() {
    let f = fixture().await;
    f.engine
        .create_trip(request(f.truck.id, f.alice.id, 100), DISPATCHER)
        .await
        .unwrap();

    let err = f
        .engine
        .create_trip(request(f.truck.id, f.bob.id, 100), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::VehicleUnavailable {
            status: VehicleStatus::OnTrip,
            ..
        })
    ));
    assert!(f.engine.get_driver(f.bob.id).await.unwrap().is_available());
}

#[tokio::test]
async fn padded_cities_are_stored_trimmed() {
    let f = fixture().await;
    let mut req = request(f.truck.id, f.alice.id, 800);
    req.origin_city = "  Mumbai ".to_string();
    req.destination_city = "Pune  ".to_string();

    let trip = f.engine.create_trip(req, DISPATCHER).await.unwrap();
    assert_eq!(trip.origin_city, "Mumbai");
    assert_eq!(trip.destination_city, "Pune");
    assert_eq!(trip.distance_km, kg(150));
}

#[tokio::test]
async fn padding_does_not_hide_a_same_city_trip() {
    let f = fixture().await;
    let mut req = request(f.truck.id, f.alice.id, 100);
    req.destination_city = "mumbai ".to_string();

    let err = f.engine.create_trip(req, DISPATCHER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_nothing_written(&f).await;
}

#[tokio::test]
async fn fuel_cost_overflow_is_invalid_and_writes_nothing() {
    let (engine, _clock, storage) = engine_with_fuel(
        NOW,
        FuelConfig {
            default_distance_km: kg(2000),
            ..FuelConfig::default()
        },
    );
    let giant = engine
        .register_vehicle(NewVehicle {
            vehicle_code: "HAUL-001".to_string(),
            model: "Road train".to_string(),
            vehicle_type: VehicleType::Truck,
            capacity_kg: Decimal::MAX,
            status: VehicleStatus::Available,
        })
        .await
        .unwrap();
    let driver = add_driver(&engine, "Alice Rao").await;

    let mut req = request(giant.id, driver.id, 1);
    req.origin_city = "Delhi".to_string();
    req.destination_city = "Chennai".to_string();
    req.cargo_weight_kg = Decimal::MAX;

    let err = engine.create_trip(req, DISPATCHER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("overflows"), "{err}");

    assert_eq!(storage.count_trips().await.unwrap(), 0);
    assert!(engine.get_vehicle(giant.id).await.unwrap().is_available());
    assert!(engine.get_driver(driver.id).await.unwrap().is_available());
}

// ── Ordering: first failing rule wins ───────────────────────────────────────

#[tokio::test]
async fn request_shape_is_checked_before_any_lookup() {
    let f = fixture().await;
    let err = f
        .engine
        .create_trip(request(VehicleId(99), DriverId(99), -5), DISPATCHER)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn unavailable_vehicle_wins_over_capacity() {
    let f = fixture().await;
    f.engine
        .set_vehicle_status(f.truck.id, VehicleStatus::Retired)
        .await
        .unwrap();
    let err = f
        .engine
        .create_trip(request(f.truck.id, DriverId(99), 5000), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::VehicleUnavailable {
            status: VehicleStatus::Retired,
            ..
        })
    ));
}

#[tokio::test]
async fn capacity_wins_over_missing_driver() {
    let f = fixture().await;
    let err = f
        .engine
        .create_trip(request(f.van.id, DriverId(99), 600), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::CapacityExceeded { .. })
    ));
}

#[tokio::test]
async fn driver_double_booking_is_reported_before_vehicle_double_booking() {
    let f = fixture().await;
    plant_active_trip(&f, f.truck.id, f.alice.id).await;

    let err = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 100), DISPATCHER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::DriverDoubleBooked { .. })
    ));
}

#[tokio::test]
async fn double_booking_wins_over_same_city() {
    let f = fixture().await;
    plant_active_trip(&f, f.truck.id, f.bob.id).await;
    let mut req = request(f.truck.id, f.alice.id, 100);
    req.destination_city = "MUMBAI".to_string();

    let err = f.engine.create_trip(req, DISPATCHER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn same_city_wins_over_past_schedule() {
    let f = fixture().await;
    let mut req = request(f.truck.id, f.alice.id, 100);
    req.destination_city = "Mumbai".to_string();
    req.scheduled_at = NOW - Duration::hours(1);

    let err = f.engine.create_trip(req, DISPATCHER).await.unwrap_err();
    assert!(err.to_string().contains("origin and destination"), "{err}");
}
