//! Daily KPI aggregation.
//!
//! A snapshot for day `D` aggregates every reservation whose stay lies
//! inside the window `[first check-in of the corpus, D]`. Room counts and
//! the loyal-guest count are read from the current entity store. Every
//! ratio is zero when its denominator is zero.

use crate::repository::{
    AnalysisRepository, GuestRepository, ReservationRepository, RoomRepository,
};
use crate::types::{DailyAnalysis, Money, Reservation, RoomState};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// `numerator ÷ denominator`, or zero
#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(part: usize, whole: usize) -> f64 {
    ratio(part as f64 * 100.0, whole)
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Room part of a reservation's total, as it was priced and invoiced
const fn room_charge(reservation: &Reservation) -> Money {
    reservation
        .total_price
        .saturating_sub(reservation.services_total)
}

/// KPIs of `date`, aggregating reservations inside `[window_start, date]`.
///
/// The figures are computed in dependency order: guest ratio, revenues and
/// available rooms, RevPAR, ADR, loyal guests, occupancy, TRevPAR.
pub fn compute_snapshot<R>(repo: &R, date: NaiveDate, window_start: NaiveDate) -> DailyAnalysis
where
    R: RoomRepository + GuestRepository + ReservationRepository,
{
    let window = repo.find_reservations_in_window(window_start, date);
    let distinct_guests: BTreeSet<_> = window.iter().map(|r| r.guest).collect();
    let repeated_guest_pct = percentage(distinct_guests.len(), window.len());

    let billable: Vec<&Reservation> = window
        .iter()
        .copied()
        .filter(|r| r.status.is_billable())
        .collect();
    let room_revenue: Money = billable.iter().map(|r| room_charge(r)).sum();
    let other_revenue: Money = billable.iter().map(|r| r.services_total).sum();
    let available = repo.find_available_rooms().len();

    let revpar = ratio(room_revenue.as_f64(), available);
    let adr = ratio(room_revenue.as_f64(), billable.len());
    let loyal = repo.count_loyal_guests();
    let reserved = repo.count_rooms_in_state(RoomState::Reserved);
    let occupancy_rate = percentage(reserved, available);
    let trevpar = ratio((room_revenue + other_revenue).as_f64(), available);

    DailyAnalysis {
        date,
        repeated_guest_pct,
        room_revenue,
        other_revenue,
        available_rooms: count(available),
        occupied_rooms: count(billable.len()),
        revpar,
        adr,
        loyal_guests: count(loyal),
        occupancy_rate,
        trevpar,
    }
}

/// First check-in and last check-out over all reservations
pub fn corpus_span<R: ReservationRepository>(repo: &R) -> Option<(NaiveDate, NaiveDate)> {
    let start = repo.earliest_check_in()?;
    let end = repo.latest_check_out().unwrap_or(start).max(start);
    Some((start, end))
}

/// Days of the corpus span that have no snapshot yet
pub fn missing_days<R>(repo: &R) -> Vec<NaiveDate>
where
    R: ReservationRepository + AnalysisRepository,
{
    let Some((start, end)) = corpus_span(repo) else {
        return Vec::new();
    };
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| repo.find_snapshot(*day).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HotelState;
    use crate::types::{
        CrmMetrics, Guest, GuestId, ReservationId, ReservationStatus, Room, RoomId,
    };

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap_or_default()
    }

    fn room(state: &mut HotelState, price: u64, room_state: RoomState) -> RoomId {
        let id = RoomId::new();
        state.rooms.insert(
            id,
            Room {
                id,
                number: state.sequences.next_room(),
                single_beds: 1,
                double_beds: 0,
                capacity: 1,
                price: Money::from_dollars(price),
                description: None,
                product: None,
                income_account: None,
                state: room_state,
            },
        );
        id
    }

    fn guest(state: &mut HotelState, loyal: bool) -> GuestId {
        let id = GuestId::new();
        state.guests.insert(
            id,
            Guest {
                id,
                first_name: "Guest".into(),
                last_name: id.to_string(),
                name: format!("Guest {id}"),
                age: 40,
                email: None,
                phone: None,
                nin: Some("X".into()),
                country_code: None,
                state_code: None,
                parent: None,
                loyal,
                metrics: CrmMetrics::default(),
            },
        );
        id
    }

    fn stay(
        state: &mut HotelState,
        guest: GuestId,
        room: RoomId,
        (check_in, check_out): (u32, u32),
        status: ReservationStatus,
        services_total: u64,
    ) {
        let id = ReservationId::new();
        let nights = check_out - check_in;
        let services_total = Money::from_dollars(services_total);
        let total_price = state.rooms[&room].price.multiply(nights) + services_total;
        state.reservations.insert(
            id,
            Reservation {
                id,
                number: state.sequences.next_reservation(),
                guest,
                room,
                check_in: date(check_in),
                check_out: date(check_out),
                services: Vec::new(),
                service_lines: Vec::new(),
                guest_lines: Vec::new(),
                status,
                nights,
                services_total,
                total_price,
                num_adults: 1,
                num_kids: 0,
                invoice: None,
                nps: None,
                feedback: None,
                created_at: chrono::Utc::now(),
            },
        );
    }

    #[test]
    fn empty_store_yields_zero_ratios() {
        let state = HotelState::default();
        let snapshot = compute_snapshot(&state, date(1), date(1));
        assert!(snapshot.repeated_guest_pct.abs() < f64::EPSILON);
        assert!(snapshot.revpar.abs() < f64::EPSILON);
        assert!(snapshot.adr.abs() < f64::EPSILON);
        assert!(snapshot.occupancy_rate.abs() < f64::EPSILON);
        assert_eq!(snapshot.room_revenue, Money::ZERO);
        assert!(corpus_span(&state).is_none());
        assert!(missing_days(&state).is_empty());
    }

    #[test]
    fn aggregates_billable_reservations_in_window() {
        let mut state = HotelState::default();
        let free = room(&mut state, 100, RoomState::Available);
        let _spare = room(&mut state, 80, RoomState::Available);
        let held = room(&mut state, 50, RoomState::Reserved);
        let loyal = guest(&mut state, true);
        let other = guest(&mut state, false);

        // 2 nights × 100 + 30 services
        stay(&mut state, loyal, free, (1, 3), ReservationStatus::Done, 30);
        // 1 night × 50 + 10 services
        stay(&mut state, loyal, held, (3, 4), ReservationStatus::Confirm, 10);
        // Draft: in the window but not billable
        stay(&mut state, other, free, (2, 4), ReservationStatus::Draft, 99);
        // Outside the window
        stay(&mut state, other, free, (5, 9), ReservationStatus::Done, 0);

        let snapshot = compute_snapshot(&state, date(4), date(1));

        // 2 distinct guests over 3 window reservations
        assert!((snapshot.repeated_guest_pct - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(snapshot.room_revenue, Money::from_dollars(250));
        assert_eq!(snapshot.other_revenue, Money::from_dollars(40));
        assert_eq!(snapshot.available_rooms, 2);
        assert_eq!(snapshot.occupied_rooms, 2);
        assert!((snapshot.revpar - 125.0).abs() < 1e-9);
        assert!((snapshot.adr - 125.0).abs() < 1e-9);
        assert_eq!(snapshot.loyal_guests, 1);
        assert!((snapshot.occupancy_rate - 50.0).abs() < 1e-9);
        assert!((snapshot.trevpar - 145.0).abs() < 1e-9);
    }

    #[test]
    fn room_revenue_keeps_the_price_a_stay_was_billed_at() {
        let mut state = HotelState::default();
        let suite = room(&mut state, 200, RoomState::Available);
        let g = guest(&mut state, false);
        stay(&mut state, g, suite, (1, 3), ReservationStatus::Done, 20);

        // Repricing the room later does not rewrite closed stays
        if let Some(record) = state.rooms.get_mut(&suite) {
            record.price = Money::from_dollars(500);
        }
        let snapshot = compute_snapshot(&state, date(3), date(1));
        assert_eq!(snapshot.room_revenue, Money::from_dollars(400));
        assert_eq!(snapshot.other_revenue, Money::from_dollars(20));
    }

    #[test]
    fn missing_days_cover_the_corpus_span() {
        let mut state = HotelState::default();
        let r = room(&mut state, 100, RoomState::Available);
        let g = guest(&mut state, false);
        stay(&mut state, g, r, (2, 4), ReservationStatus::Confirm, 0);
        stay(&mut state, g, r, (5, 7), ReservationStatus::Confirm, 0);
        state.insert_snapshot(DailyAnalysis {
            date: date(3),
            ..DailyAnalysis::default()
        });

        assert_eq!(corpus_span(&state), Some((date(2), date(7))));
        assert_eq!(
            missing_days(&state),
            vec![date(2), date(4), date(5), date(6), date(7)]
        );
    }
}
