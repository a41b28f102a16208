//! Repository traits over the entity store.
//!
//! Every "search records matching a filter" query the business logic needs
//! is a named method here. Aggregation code ([`crate::analytics`]) is
//! generic over these traits; [`HotelState`] implements all of them.

use crate::state::HotelState;
use crate::types::{
    DailyAnalysis, Guest, GuestId, Reservation, ReservationId, Room, RoomId, RoomState,
};
use chrono::NaiveDate;

/// Queries over rooms
pub trait RoomRepository {
    /// Look up a room
    fn find_room(&self, id: RoomId) -> Option<&Room>;

    /// Rooms in the available state
    fn find_available_rooms(&self) -> Vec<&Room>;

    /// Number of rooms in `state`
    fn count_rooms_in_state(&self, state: RoomState) -> usize;
}

/// Queries over guests
pub trait GuestRepository {
    /// Look up a guest
    fn find_guest(&self, id: GuestId) -> Option<&Guest>;

    /// Number of guests flagged loyal
    fn count_loyal_guests(&self) -> usize;

    /// Number of guests whose undecorated name is `base_name`
    fn count_with_base_name(&self, base_name: &str) -> usize;

    /// Every guest, in ID order
    fn all_guests(&self) -> Vec<&Guest>;
}

/// Queries over reservations
pub trait ReservationRepository {
    /// Look up a reservation
    fn find_reservation(&self, id: ReservationId) -> Option<&Reservation>;

    /// Reservations with `check_in >= start` and `check_out <= end`
    fn find_reservations_in_window(&self, start: NaiveDate, end: NaiveDate) -> Vec<&Reservation>;

    /// Earliest check-in over all reservations
    fn earliest_check_in(&self) -> Option<NaiveDate>;

    /// Latest check-out over all reservations
    fn latest_check_out(&self) -> Option<NaiveDate>;

    /// Reservations booked by a guest
    fn find_by_guest(&self, guest: GuestId) -> Vec<&Reservation>;

    /// Reservations of a room
    fn find_by_room(&self, room: RoomId) -> Vec<&Reservation>;
}

/// Queries over daily analysis snapshots
pub trait AnalysisRepository {
    /// Snapshot of a day
    fn find_snapshot(&self, date: NaiveDate) -> Option<&DailyAnalysis>;

    /// Store a snapshot unless one exists for that day; returns whether it was inserted
    fn insert_snapshot(&mut self, snapshot: DailyAnalysis) -> bool;

    /// Most recent snapshot
    fn latest_snapshot(&self) -> Option<&DailyAnalysis>;

    /// Dates of snapshots on or after `from`
    fn snapshot_dates_from(&self, from: NaiveDate) -> Vec<NaiveDate>;
}

impl RoomRepository for HotelState {
    fn find_room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    fn find_available_rooms(&self) -> Vec<&Room> {
        self.rooms
            .values()
            .filter(|room| room.state == RoomState::Available)
            .collect()
    }

    fn count_rooms_in_state(&self, state: RoomState) -> usize {
        self.rooms.values().filter(|room| room.state == state).count()
    }
}

impl GuestRepository for HotelState {
    fn find_guest(&self, id: GuestId) -> Option<&Guest> {
        self.guests.get(&id)
    }

    fn count_loyal_guests(&self) -> usize {
        self.guests.values().filter(|guest| guest.loyal).count()
    }

    fn count_with_base_name(&self, base_name: &str) -> usize {
        self.guests
            .values()
            .filter(|guest| guest.base_name() == base_name)
            .count()
    }

    fn all_guests(&self) -> Vec<&Guest> {
        self.guests.values().collect()
    }
}

impl ReservationRepository for HotelState {
    fn find_reservation(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.get(&id)
    }

    fn find_reservations_in_window(&self, start: NaiveDate, end: NaiveDate) -> Vec<&Reservation> {
        self.reservations
            .values()
            .filter(|r| r.check_in >= start && r.check_out <= end)
            .collect()
    }

    fn earliest_check_in(&self) -> Option<NaiveDate> {
        self.reservations.values().map(|r| r.check_in).min()
    }

    fn latest_check_out(&self) -> Option<NaiveDate> {
        self.reservations.values().map(|r| r.check_out).max()
    }

    fn find_by_guest(&self, guest: GuestId) -> Vec<&Reservation> {
        self.reservations.values().filter(|r| r.guest == guest).collect()
    }

    fn find_by_room(&self, room: RoomId) -> Vec<&Reservation> {
        self.reservations.values().filter(|r| r.room == room).collect()
    }
}

impl AnalysisRepository for HotelState {
    fn find_snapshot(&self, date: NaiveDate) -> Option<&DailyAnalysis> {
        self.snapshots.get(&date)
    }

    fn insert_snapshot(&mut self, snapshot: DailyAnalysis) -> bool {
        if self.snapshots.contains_key(&snapshot.date) {
            return false;
        }
        self.snapshots.insert(snapshot.date, snapshot);
        true
    }

    fn latest_snapshot(&self) -> Option<&DailyAnalysis> {
        self.snapshots.values().next_back()
    }

    fn snapshot_dates_from(&self, from: NaiveDate) -> Vec<NaiveDate> {
        self.snapshots.range(from..).map(|(date, _)| *date).collect()
    }
}
