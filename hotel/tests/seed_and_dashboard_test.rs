//! Seed fixtures feeding the dashboard projection over the event bus.
//!
//! Run with: `cargo test --test seed_and_dashboard_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use common::{hotel, today};
use hotel_manager::projections::{DashboardProjection, spawn_projection};
use hotel_manager::seed::{self, SeedError, SeedFile};
use hotel_manager::types::ReservationStatus;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;

const SEED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/seed.json");

#[tokio::test]
async fn test_seed_file_loads_through_the_service() {
    let hotel = hotel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dashboard = Arc::new(RwLock::new(DashboardProjection::new()));
    let task = spawn_projection(Arc::clone(&dashboard), &hotel.bus, shutdown_rx);

    let fixtures = SeedFile::load(SEED).unwrap();
    let summary = seed::apply(&hotel.service, &fixtures).await.unwrap();
    assert_eq!(summary.rooms, 4);
    assert_eq!(summary.guests, 5);
    assert_eq!(summary.services, 3);
    assert_eq!(summary.reservations, 4);

    let statuses: Vec<ReservationStatus> = hotel
        .service
        .read(|state| state.reservations.values().map(|r| r.status).collect())
        .await;
    assert_eq!(statuses.iter().filter(|s| **s == ReservationStatus::Done).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == ReservationStatus::Cancel).count(), 1);

    let names: Vec<String> = hotel
        .service
        .read(|state| state.guests.values().map(|g| g.name.clone()).collect())
        .await;
    assert!(names.contains(&"Ada Lovelace (2)".to_string()));

    // Give the projection time to drain the bus, then stop it
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(true).unwrap();
    task.await.unwrap();

    let summary = dashboard.read().unwrap().summary(today());
    assert_eq!(summary.reservations, 4);
    assert_eq!(summary.check_ins, 1);
    assert_eq!(summary.in_house, 1);
    assert_eq!(summary.nps.promoters, 1);
    assert_eq!(summary.nps.score, 100);
    assert_eq!(summary.rooms.reserved, 3);
    assert_eq!(summary.rooms.available, 1);
    assert_eq!(summary.services.len(), 3);
    assert_eq!(summary.services[0].name, "Breakfast");
    assert_eq!(summary.services[0].reservations, 2);
}

#[tokio::test]
async fn test_seed_stops_at_unknown_reference() {
    let hotel = hotel();
    let fixtures: SeedFile = serde_json::from_str(
        r#"{
            "rooms": [{ "key": "101", "double_beds": 1, "price": 9000 }],
            "reservations": [{ "key": "ghost", "guest": "nobody", "room": "101", "nights": 1 }]
        }"#,
    )
    .unwrap();

    let error = seed::apply(&hotel.service, &fixtures).await.unwrap_err();
    assert!(matches!(error, SeedError::UnknownKey { kind: "guest", .. }));
    assert_eq!(hotel.service.read(|state| state.rooms.len()).await, 1);
}

#[tokio::test]
async fn test_projection_rebuilds_from_state() {
    let hotel = hotel();
    let fixtures = SeedFile::load(SEED).unwrap();
    seed::apply(&hotel.service, &fixtures).await.unwrap();

    let view = hotel.service.read(DashboardProjection::from_state).await;
    let summary = view.summary(today());
    assert_eq!(summary.reservations, 4);
    assert_eq!(view.status_counts().get("confirm"), Some(&1));
}
