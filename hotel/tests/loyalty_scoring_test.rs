//! Loyalty scoring batch against the shipped model artifact.
//!
//! Run with: `cargo test --test loyalty_scoring_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use common::{day, hotel, today};
use hotel_manager::app::NewReservation;

const MODEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/models/loyalty_model.json");

#[tokio::test]
async fn test_high_value_guest_is_flagged_loyal() {
    let hotel = hotel();
    let suite = hotel.room(250).await;
    let regular = hotel.guest("Grace", "Hopper", 45).await;
    let newcomer = hotel.guest("Alan", "Turing", 41).await;
    let browser = hotel.guest("Ada", "Lovelace", 36).await;

    let stay = hotel
        .service
        .create_reservation(NewReservation {
            guest: regular,
            room: suite,
            check_in: today(),
            check_out: day(4),
            services: Vec::new(),
        })
        .await
        .unwrap();
    hotel.service.confirm(stay).await.unwrap();

    let metrics = hotel.service.guest(regular).await.unwrap().metrics;
    assert_eq!(metrics.annual_stay_frequency, 1);
    assert_eq!(metrics.remaining_healthspan, 30);
    assert!(!metrics.clv.is_zero());

    let outcome = hotel.service.score_loyalty(MODEL).await;
    assert_eq!(outcome.guests, 3);
    assert_eq!(outcome.scored, 3);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.aborted, None);
    assert_eq!(outcome.model_version.as_deref(), Some("1.0"));

    assert!(hotel.service.guest(regular).await.unwrap().loyal);
    assert!(!hotel.service.guest(newcomer).await.unwrap().loyal);
    assert!(!hotel.service.guest(browser).await.unwrap().loyal);
}

#[tokio::test]
async fn test_missing_model_aborts_without_touching_guests() {
    let hotel = hotel();
    let guest = hotel.guest("Grace", "Hopper", 45).await;
    hotel.service.set_loyalty(guest, true).await.unwrap();

    let outcome = hotel.service.score_loyalty("models/does_not_exist.json").await;
    assert_eq!(outcome.guests, 1);
    assert_eq!(outcome.scored, 0);
    assert!(outcome.aborted.is_some_and(|reason| reason.contains("does_not_exist")));
    assert!(hotel.service.guest(guest).await.unwrap().loyal);
}

#[tokio::test]
async fn test_empty_guest_list_aborts_at_scaling() {
    let hotel = hotel();
    let outcome = hotel.service.score_loyalty(MODEL).await;
    assert_eq!(outcome.guests, 0);
    assert!(outcome.aborted.is_some());
}
