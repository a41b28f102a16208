//! Daily analytics backfill.
//!
//! Run with: `cargo test --test analytics_backfill_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use common::{day, hotel, hotel_with, today};
use hotel_manager::DomainSettings;
use hotel_manager::analytics::compute_snapshot;
use hotel_manager::app::NewReservation;
use hotel_manager::state::JobReport;
use hotel_manager::HotelState;
use hotel_manager::types::{Money, RoomState};

#[tokio::test]
async fn test_backfill_covers_every_day_once() {
    let hotel = hotel();
    let sea = hotel.room(100).await;
    let garden = hotel.room(80).await;
    let _spare = hotel.room(60).await;
    let ada = hotel.guest("Ada", "Lovelace", 36).await;
    let alan = hotel.guest("Alan", "Turing", 41).await;

    let first = hotel
        .service
        .create_reservation(NewReservation {
            guest: ada,
            room: sea,
            check_in: today(),
            check_out: day(3),
            services: Vec::new(),
        })
        .await
        .unwrap();
    hotel
        .service
        .create_reservation(NewReservation {
            guest: alan,
            room: garden,
            check_in: day(2),
            check_out: day(6),
            services: Vec::new(),
        })
        .await
        .unwrap();
    hotel.service.confirm(first).await.unwrap();

    // [D0, D1] = [today, today + 6] → 7 snapshots
    assert_eq!(hotel.service.rebuild_analytics().await.unwrap(), 7);
    let snapshots = hotel.service.snapshots().await;
    assert_eq!(snapshots.len(), 7);
    assert_eq!(snapshots.first().map(|s| s.date), Some(today()));
    assert_eq!(snapshots.last().map(|s| s.date), Some(day(6)));

    // On D0 + 3 the confirmed stay is inside the window
    let d3 = &snapshots[3];
    assert_eq!(d3.room_revenue, Money::from_dollars(300));
    assert_eq!(d3.occupied_rooms, 1);
    assert_eq!(d3.available_rooms, 1);
    assert!((d3.revpar - 300.0).abs() < f64::EPSILON);
    assert!((d3.occupancy_rate - 200.0).abs() < f64::EPSILON);

    // Second run: same count, same values
    assert_eq!(hotel.service.rebuild_analytics().await.unwrap(), 0);
    assert_eq!(hotel.service.snapshots().await, snapshots);
}

#[tokio::test]
async fn test_occupancy_is_zero_without_available_rooms() {
    let hotel = hotel();
    let only = hotel.room(100).await;
    let guest = hotel.guest("Grace", "Hopper", 45).await;
    let reservation = hotel
        .service
        .create_reservation(NewReservation {
            guest,
            room: only,
            check_in: today(),
            check_out: day(1),
            services: Vec::new(),
        })
        .await
        .unwrap();
    hotel.service.confirm(reservation).await.unwrap();

    hotel.service.rebuild_analytics().await.unwrap();
    for snapshot in hotel.service.snapshots().await {
        assert_eq!(snapshot.available_rooms, 0);
        assert!(snapshot.occupancy_rate.abs() < f64::EPSILON);
        assert!(snapshot.revpar.abs() < f64::EPSILON);
        assert!(snapshot.trevpar.abs() < f64::EPSILON);
    }

    let empty = compute_snapshot(&HotelState::new(), today(), today());
    assert!(empty.occupancy_rate.abs() < f64::EPSILON);
    assert!(empty.adr.abs() < f64::EPSILON);
    assert!(empty.repeated_guest_pct.abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_invalidation_recreates_affected_days() {
    let hotel = hotel_with(DomainSettings {
        invalidate_snapshots_on_change: true,
        ..DomainSettings::default()
    });
    let room = hotel.room(100).await;
    let guest = hotel.guest("Ada", "Lovelace", 36).await;
    let reservation = hotel
        .service
        .create_reservation(NewReservation {
            guest,
            room,
            check_in: today(),
            check_out: day(4),
            services: Vec::new(),
        })
        .await
        .unwrap();
    assert_eq!(hotel.service.rebuild_analytics().await.unwrap(), 5);

    // Confirming changes revenue from the check-out day onwards
    hotel.service.confirm(reservation).await.unwrap();
    assert_eq!(hotel.service.snapshots().await.len(), 4);
    assert_eq!(hotel.service.rebuild_analytics().await.unwrap(), 1);

    let last = hotel.service.snapshots().await.pop().unwrap();
    assert_eq!(last.date, day(4));
    assert_eq!(last.room_revenue, Money::from_dollars(400));
}

#[tokio::test]
async fn test_sweep_reconciles_rooms_with_calendar() {
    let hotel = hotel();
    let booked = hotel.room(100).await;
    let guest = hotel.guest("Alan", "Turing", 41).await;
    hotel
        .service
        .create_reservation(NewReservation {
            guest,
            room: booked,
            check_in: today(),
            check_out: day(2),
            services: Vec::new(),
        })
        .await
        .unwrap();

    // An operator frees the room by hand; the sweep takes it back
    hotel.service.mark_available(booked).await.unwrap();
    assert_eq!(
        hotel.service.sweep_rooms().await.unwrap(),
        JobReport::Sweep {
            reserved: 1,
            released: 0
        }
    );

    // After check-out the room is released
    hotel.clock.set_date(day(3));
    assert_eq!(
        hotel.service.sweep_rooms().await.unwrap(),
        JobReport::Sweep {
            reserved: 0,
            released: 1
        }
    );
    assert_eq!(
        hotel.service.room(booked).await.unwrap().state,
        RoomState::Available
    );
}
