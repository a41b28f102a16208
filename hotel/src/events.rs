//! Domain events of the hotel.
//!
//! Reducers validate a command, turn it into one or more `HotelEvent`s,
//! apply them to the entity store and publish them on the event bus.
//! Applying an event is the only way state changes.

use crate::types::{
    DailyAnalysis, Guest, GuestId, GuestLine, Invoice, Money, Reservation, ReservationId,
    ReservationStatus, Room, RoomId, RoomState, Service, ServiceId, ServiceLine,
};
use chrono::NaiveDate;
use hotel_core::event::DomainEvent;
use serde::{Deserialize, Serialize};

/// Something that happened to the hotel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HotelEvent {
    /// A room was added
    RoomCreated {
        /// The new room
        room: Room,
    },
    /// Bed counts changed
    RoomBedsChanged {
        /// Room
        room: RoomId,
        /// New single bed count
        single_beds: u32,
        /// New double bed count
        double_beds: u32,
    },
    /// Nightly price changed
    RoomPriceChanged {
        /// Room
        room: RoomId,
        /// New price
        price: Money,
    },
    /// Room moved to another occupancy state
    RoomStateChanged {
        /// Room
        room: RoomId,
        /// Previous state
        from: RoomState,
        /// New state
        to: RoomState,
    },
    /// A guest was registered
    GuestRegistered {
        /// The new guest
        guest: Guest,
    },
    /// A guest's age was updated
    GuestAgeChanged {
        /// Guest
        guest: GuestId,
        /// New age
        age: u32,
    },
    /// Loyalty flag set by the classifier or an operator
    GuestLoyaltyChanged {
        /// Guest
        guest: GuestId,
        /// New flag
        loyal: bool,
    },
    /// A catalog service was added
    ServiceCreated {
        /// The new service
        service: Service,
    },
    /// Catalog price changed (existing lines keep their price)
    ServicePriceChanged {
        /// Service
        service: ServiceId,
        /// New catalog price
        price: Money,
    },
    /// A reservation was created with its initial lines
    ReservationCreated {
        /// The new reservation
        reservation: Reservation,
    },
    /// The attached service set was replaced
    ReservationServicesUpdated {
        /// Reservation
        reservation: ReservationId,
        /// New service set
        services: Vec<ServiceId>,
        /// Lines created for services that had none
        added_lines: Vec<ServiceLine>,
    },
    /// A service line quantity changed
    ServiceQuantityChanged {
        /// Reservation
        reservation: ReservationId,
        /// Service of the line
        service: ServiceId,
        /// New quantity
        quantity: u32,
    },
    /// A companion joined the reservation
    CompanionAdded {
        /// Reservation
        reservation: ReservationId,
        /// New guest line
        line: GuestLine,
    },
    /// Stay dates changed
    ReservationRescheduled {
        /// Reservation
        reservation: ReservationId,
        /// New check-in
        check_in: NaiveDate,
        /// New check-out
        check_out: NaiveDate,
    },
    /// Workflow transition
    ReservationStatusChanged {
        /// Reservation
        reservation: ReservationId,
        /// Previous state
        from: ReservationStatus,
        /// New state
        to: ReservationStatus,
    },
    /// An invoice was issued
    InvoiceCreated {
        /// The invoice
        invoice: Invoice,
    },
    /// Guest feedback captured
    NpsRecorded {
        /// Reservation
        reservation: ReservationId,
        /// Score 0..=10
        score: u8,
        /// Free-text feedback
        feedback: Option<String>,
    },
    /// A daily analysis snapshot was materialized
    SnapshotCreated {
        /// The snapshot
        snapshot: DailyAnalysis,
    },
    /// Snapshots dropped after a reservation change
    SnapshotsInvalidated {
        /// Dropped snapshot dates
        dates: Vec<NaiveDate>,
    },
}

impl DomainEvent for HotelEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "RoomCreated.v1",
            Self::RoomBedsChanged { .. } => "RoomBedsChanged.v1",
            Self::RoomPriceChanged { .. } => "RoomPriceChanged.v1",
            Self::RoomStateChanged { .. } => "RoomStateChanged.v1",
            Self::GuestRegistered { .. } => "GuestRegistered.v1",
            Self::GuestAgeChanged { .. } => "GuestAgeChanged.v1",
            Self::GuestLoyaltyChanged { .. } => "GuestLoyaltyChanged.v1",
            Self::ServiceCreated { .. } => "ServiceCreated.v1",
            Self::ServicePriceChanged { .. } => "ServicePriceChanged.v1",
            Self::ReservationCreated { .. } => "ReservationCreated.v1",
            Self::ReservationServicesUpdated { .. } => "ReservationServicesUpdated.v1",
            Self::ServiceQuantityChanged { .. } => "ServiceQuantityChanged.v1",
            Self::CompanionAdded { .. } => "CompanionAdded.v1",
            Self::ReservationRescheduled { .. } => "ReservationRescheduled.v1",
            Self::ReservationStatusChanged { .. } => "ReservationStatusChanged.v1",
            Self::InvoiceCreated { .. } => "InvoiceCreated.v1",
            Self::NpsRecorded { .. } => "NpsRecorded.v1",
            Self::SnapshotCreated { .. } => "SnapshotCreated.v1",
            Self::SnapshotsInvalidated { .. } => "SnapshotsInvalidated.v1",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = HotelEvent::GuestLoyaltyChanged {
            guest: GuestId::new(),
            loyal: true,
        };
        let json = event.to_json().unwrap();
        assert!(json.contains(r#""type":"guest_loyalty_changed""#));
        assert_eq!(event.event_type(), "GuestLoyaltyChanged.v1");
    }
}
