mod common;

use rust_decimal::Decimal;
use time::Duration;

use common::{fixture, kg, request, DISPATCHER, NOW};
use fleetflow_core::{
    DriverStatus, TripId, TripPriority, TripStatus, VehicleStatus, VehicleType,
};
use fleetflow_engine::{Clock, Conflict, EngineError, ErrorKind};
use fleetflow_storage::{FleetStorage, TripQuery};

#[tokio::test]
async fn create_trip_leases_vehicle_and_driver() {
    let f = fixture().await;

    let trip = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 800), DISPATCHER)
        .await
        .unwrap();

    assert_eq!(trip.trip_code.as_str(), "TRP-001");
    assert_eq!(trip.status, TripStatus::Scheduled);
    assert_eq!(trip.priority, TripPriority::Normal);
    assert_eq!(trip.created_by, DISPATCHER);
    assert_eq!(trip.created_at, NOW);
    assert_eq!(trip.dispatched_at, None);
    assert_eq!(trip.actual_fuel_cost, None);

    // 150 km / 4 km/l * (1 + 0.8 t * 0.05) = 39.00 l at 95/l
    assert_eq!(trip.distance_km, kg(150));
    assert_eq!(trip.fuel_litres, Decimal::new(3900, 2));
    assert_eq!(trip.estimated_fuel_cost, Decimal::new(370500, 2));

    let vehicle = f.engine.get_vehicle(f.truck.id).await.unwrap();
    let driver = f.engine.get_driver(f.alice.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::OnTrip);
    assert_eq!(driver.status, DriverStatus::OnTrip);

    assert_eq!(f.engine.get_trip(trip.id).await.unwrap(), trip);
}

#[tokio::test]
async fn trip_codes_follow_the_store_sequence() {
    let f = fixture().await;

    let first = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 800), DISPATCHER)
        .await
        .unwrap();
    let second = f
        .engine
        .create_trip(request(f.van.id, f.bob.id, 300), DISPATCHER)
        .await
        .unwrap();

    assert_eq!(first.trip_code.as_str(), "TRP-001");
    assert_eq!(second.trip_code.as_str(), "TRP-002");
}

#[tokio::test]
async fn advance_walks_the_lifecycle_and_stamps_each_step() {
    let f = fixture().await;
    let trip = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 800), DISPATCHER)
        .await
        .unwrap();

    f.clock.advance(Duration::hours(1));
    let dispatched = f.engine.advance_status(trip.id, DISPATCHER).await.unwrap();
    assert_eq!(dispatched.status, TripStatus::Dispatched);
    let dispatched_at = dispatched.dispatched_at.unwrap();
    assert!(dispatched_at >= trip.created_at);
    assert_eq!(dispatched_at, NOW + Duration::hours(1));
    assert_eq!(dispatched.arrived_at, None);

    f.clock.advance(Duration::hours(3));
    let in_transit = f.engine.advance_status(trip.id, DISPATCHER).await.unwrap();
    assert_eq!(in_transit.status, TripStatus::InTransit);
    assert_eq!(in_transit.arrived_at, Some(NOW + Duration::hours(4)));
    assert_eq!(in_transit.dispatched_at, Some(dispatched_at));

    // Still leased while in transit.
    let vehicle = f.engine.get_vehicle(f.truck.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::OnTrip);

    f.clock.advance(Duration::minutes(30));
    let delivered = f.engine.advance_status(trip.id, DISPATCHER).await.unwrap();
    assert_eq!(delivered.status, TripStatus::Delivered);
    assert_eq!(
        delivered.delivered_at,
        Some(NOW + Duration::hours(4) + Duration::minutes(30))
    );
    assert_eq!(delivered.updated_at, delivered.delivered_at.unwrap());
}

#[tokio::test]
async fn delivery_releases_resources_and_counts_the_trip() {
    let f = fixture().await;
    let before = f.engine.get_driver(f.alice.id).await.unwrap().total_trips;
    let trip = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 800), DISPATCHER)
        .await
        .unwrap();

    for _ in 0..3 {
        f.clock.advance(Duration::hours(1));
        f.engine.advance_status(trip.id, DISPATCHER).await.unwrap();
    }

    let vehicle = f.engine.get_vehicle(f.truck.id).await.unwrap();
    let driver = f.engine.get_driver(f.alice.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Available);
    assert_eq!(driver.status, DriverStatus::Available);
    assert_eq!(driver.total_trips, before + 1);

    // Released resources can be booked again.
    let mut again = request(f.truck.id, f.alice.id, 500);
    again.scheduled_at = f.clock.now() + Duration::days(1);
    let next = f.engine.create_trip(again, DISPATCHER).await.unwrap();
    assert_eq!(next.trip_code.as_str(), "TRP-002");
}

#[tokio::test]
async fn advancing_a_delivered_trip_is_a_final_state_conflict() {
    let f = fixture().await;
    let trip = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 800), DISPATCHER)
        .await
        .unwrap();
    for _ in 0..3 {
        f.engine.advance_status(trip.id, DISPATCHER).await.unwrap();
    }

    let err = f.engine.advance_status(trip.id, DISPATCHER).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::AlreadyFinal {
            status: TripStatus::Delivered,
            ..
        })
    ));
    assert_eq!(
        err.to_string(),
        "trip TRP-001 is already in final state: DELIVERED"
    );

    // The counter moved exactly once.
    let driver = f.engine.get_driver(f.alice.id).await.unwrap();
    assert_eq!(driver.total_trips, 1);
}

#[tokio::test]
async fn cancel_releases_resources_without_counting_a_trip() {
    let f = fixture().await;
    let trip = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 800), DISPATCHER)
        .await
        .unwrap();

    f.clock.advance(Duration::minutes(5));
    f.engine.cancel_trip(trip.id, DISPATCHER).await.unwrap();

    let cancelled = f.engine.get_trip(trip.id).await.unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);
    assert_eq!(cancelled.updated_at, NOW + Duration::minutes(5));

    let vehicle = f.engine.get_vehicle(f.truck.id).await.unwrap();
    let driver = f.engine.get_driver(f.alice.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Available);
    assert_eq!(driver.status, DriverStatus::Available);
    assert_eq!(driver.total_trips, 0);
}

#[tokio::test]
async fn cancel_from_dispatched_and_in_transit() {
    let f = fixture().await;
    let first = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 800), DISPATCHER)
        .await
        .unwrap();
    let second = f
        .engine
        .create_trip(request(f.van.id, f.bob.id, 300), DISPATCHER)
        .await
        .unwrap();

    f.engine.advance_status(first.id, DISPATCHER).await.unwrap();
    f.engine.advance_status(second.id, DISPATCHER).await.unwrap();
    f.engine.advance_status(second.id, DISPATCHER).await.unwrap();

    f.engine.cancel_trip(first.id, DISPATCHER).await.unwrap();
    f.engine.cancel_trip(second.id, DISPATCHER).await.unwrap();

    let available = f.engine.list_vehicles(true).await.unwrap();
    assert_eq!(available.len(), 2);
    let available = f.engine.list_drivers(true).await.unwrap();
    assert_eq!(available.len(), 2);
}

#[tokio::test]
async fn cancelling_a_finished_trip_is_rejected() {
    let f = fixture().await;
    let delivered = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 800), DISPATCHER)
        .await
        .unwrap();
    for _ in 0..3 {
        f.engine.advance_status(delivered.id, DISPATCHER).await.unwrap();
    }
    let cancelled = f
        .engine
        .create_trip(request(f.van.id, f.bob.id, 300), DISPATCHER)
        .await
        .unwrap();
    f.engine.cancel_trip(cancelled.id, DISPATCHER).await.unwrap();

    let err = f.engine.cancel_trip(delivered.id, DISPATCHER).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::NotCancellable {
            status: TripStatus::Delivered,
            ..
        })
    ));
    let err = f.engine.cancel_trip(cancelled.id, DISPATCHER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        err.to_string(),
        "trip TRP-002 cannot be cancelled (status: CANCELLED)"
    );

    let err = f.engine.advance_status(cancelled.id, DISPATCHER).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(Conflict::AlreadyFinal { .. })
    ));

    assert_eq!(
        f.engine.get_trip(delivered.id).await.unwrap().status,
        TripStatus::Delivered
    );
}

#[tokio::test]
async fn unknown_trip_is_not_found() {
    let f = fixture().await;

    let err = f
        .engine
        .advance_status(TripId(404), DISPATCHER)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "trip not found: 404");

    let err = f.engine.cancel_trip(TripId(404), DISPATCHER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = f.engine.get_trip(TripId(404)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn list_and_filter_trips() {
    let f = fixture().await;
    let first = f
        .engine
        .create_trip(request(f.truck.id, f.alice.id, 800), DISPATCHER)
        .await
        .unwrap();
    f.clock.advance(Duration::minutes(1));
    let mut urgent = request(f.van.id, f.bob.id, 300);
    urgent.destination_city = "Nashik".to_string();
    urgent.priority = TripPriority::Urgent;
    let second = f.engine.create_trip(urgent, DISPATCHER).await.unwrap();

    let all = f.engine.list_trips().await.unwrap();
    assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), [second.id, first.id]);

    let unfiltered = f.engine.filter_trips(&TripQuery::default()).await.unwrap();
    assert_eq!(unfiltered, all);

    let vans = f
        .engine
        .filter_trips(&TripQuery {
            vehicle_type: Some(VehicleType::Van),
            ..TripQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(vans.len(), 1);
    assert_eq!(vans[0].id, second.id);

    let pune = f
        .engine
        .filter_trips(&TripQuery {
            search: Some("PUNE".to_string()),
            status: Some(TripStatus::Scheduled),
            ..TripQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(pune.len(), 1);
    assert_eq!(pune[0].id, first.id);

    assert_eq!(f.storage.count_trips().await.unwrap(), 2);
}
