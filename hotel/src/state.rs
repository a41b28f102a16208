//! The in-memory entity store.
//!
//! [`HotelState`] owns every record of the hotel. It changes only through
//! [`HotelState::apply`], which mutates the inputs an event carries and then
//! walks the [`HOTEL_GRAPH`] to recompute the derived fields those inputs
//! feed, including the CRM metrics of affected guests.

use crate::error::HotelError;
use crate::events::HotelEvent;
use crate::recompute::{Field, HOTEL_GRAPH};
use crate::repository::{AnalysisRepository, ReservationRepository};
use crate::types::{
    CrmMetrics, DailyAnalysis, Guest, GuestId, Invoice, InvoiceId, Money, Reservation,
    ReservationId, Room, RoomId, Service, ServiceId,
};
use crate::validation::bed_capacity;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default average lifespan used for the remaining healthspan
pub const DEFAULT_AVERAGE_LIFESPAN: u32 = 75;

/// Inputs of derived fields that do not live in the store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeriveContext {
    /// Current date (annual stay frequency)
    pub today: NaiveDate,
    /// Average lifespan (remaining healthspan)
    pub average_lifespan: u32,
}

/// Counters behind the human-readable record numbers
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    room: u32,
    reservation: u32,
    invoice: u32,
}

impl Sequences {
    /// Next room number (`ROOM/0001`)
    pub fn next_room(&mut self) -> String {
        self.room += 1;
        format!("ROOM/{:04}", self.room)
    }

    /// Next reservation number (`RES/00001`)
    pub fn next_reservation(&mut self) -> String {
        self.reservation += 1;
        format!("RES/{:05}", self.reservation)
    }

    /// Next invoice number (`INV/00001`)
    pub fn next_invoice(&mut self) -> String {
        self.invoice += 1;
        format!("INV/{:05}", self.invoice)
    }

    /// Preview of the next invoice number without consuming it
    #[must_use]
    pub fn peek_invoice(&self) -> String {
        format!("INV/{:05}", self.invoice + 1)
    }
}

/// Result of the last batch action, read back by the service facade
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobReport {
    /// Analytics rebuild
    Analytics {
        /// Snapshots created by this run
        created: usize,
    },
    /// Room sweep
    Sweep {
        /// Rooms moved to reserved
        reserved: usize,
        /// Rooms moved to available
        released: usize,
    },
}

/// All records of the hotel
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HotelState {
    /// Rooms by ID
    pub rooms: BTreeMap<RoomId, Room>,
    /// Guests by ID
    pub guests: BTreeMap<GuestId, Guest>,
    /// Catalog services by ID
    pub services: BTreeMap<ServiceId, Service>,
    /// Reservations by ID
    pub reservations: BTreeMap<ReservationId, Reservation>,
    /// Invoices by ID
    pub invoices: BTreeMap<InvoiceId, Invoice>,
    /// Daily analysis snapshots by date
    pub snapshots: BTreeMap<NaiveDate, DailyAnalysis>,
    /// Record number counters
    pub sequences: Sequences,
    /// Error of the last rejected command
    #[serde(skip)]
    pub last_error: Option<HotelError>,
    /// Outcome of the last batch action
    #[serde(skip)]
    pub last_report: Option<JobReport>,
}

impl HotelState {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and recompute what it affects
    #[allow(clippy::too_many_lines)]
    pub fn apply(&mut self, event: &HotelEvent, ctx: &DeriveContext) {
        match event {
            HotelEvent::RoomCreated { room } => {
                self.rooms.insert(room.id, room.clone());
                self.recompute_room(room.id, &[Field::SingleBeds, Field::DoubleBeds]);
            },
            HotelEvent::RoomBedsChanged {
                room,
                single_beds,
                double_beds,
            } => {
                if let Some(record) = self.rooms.get_mut(room) {
                    record.single_beds = *single_beds;
                    record.double_beds = *double_beds;
                }
                self.recompute_room(*room, &[Field::SingleBeds, Field::DoubleBeds]);
            },
            HotelEvent::RoomPriceChanged { room, price } => {
                if let Some(record) = self.rooms.get_mut(room) {
                    record.price = *price;
                }
                // Closed reservations keep the total they were completed with
                let open: Vec<ReservationId> = self
                    .reservations
                    .values()
                    .filter(|r| r.room == *room && r.status.is_open())
                    .map(|r| r.id)
                    .collect();
                for id in open {
                    self.recompute_reservation(id, &[Field::RoomPrice], ctx);
                }
            },
            HotelEvent::RoomStateChanged { room, to, .. } => {
                if let Some(record) = self.rooms.get_mut(room) {
                    record.state = *to;
                }
            },
            HotelEvent::GuestRegistered { guest } => {
                self.guests.insert(guest.id, guest.clone());
                self.recompute_guest(guest.id, ctx);
            },
            HotelEvent::GuestAgeChanged { guest, age } => {
                if let Some(record) = self.guests.get_mut(guest) {
                    record.age = *age;
                }
                if HOTEL_GRAPH.affected(&[Field::GuestAge]).contains(&Field::GuestCrm) {
                    self.recompute_guest(*guest, ctx);
                }
            },
            HotelEvent::GuestLoyaltyChanged { guest, loyal } => {
                if let Some(record) = self.guests.get_mut(guest) {
                    record.loyal = *loyal;
                }
            },
            HotelEvent::ServiceCreated { service } => {
                self.services.insert(service.id, service.clone());
            },
            HotelEvent::ServicePriceChanged { service, price } => {
                if let Some(record) = self.services.get_mut(service) {
                    record.price = *price;
                }
            },
            HotelEvent::ReservationCreated { reservation } => {
                self.reservations.insert(reservation.id, reservation.clone());
                self.recompute_reservation(
                    reservation.id,
                    &[
                        Field::LineQuantity,
                        Field::CheckIn,
                        Field::CheckOut,
                        Field::GuestLines,
                        Field::Status,
                    ],
                    ctx,
                );
            },
            HotelEvent::ReservationServicesUpdated {
                reservation,
                services,
                added_lines,
            } => {
                if let Some(record) = self.reservations.get_mut(reservation) {
                    record.services.clone_from(services);
                    record.service_lines.extend(added_lines.iter().cloned());
                }
                self.recompute_reservation(*reservation, &[Field::LineQuantity], ctx);
            },
            HotelEvent::ServiceQuantityChanged {
                reservation,
                service,
                quantity,
            } => {
                if let Some(record) = self.reservations.get_mut(reservation) {
                    for line in record.service_lines.iter_mut().filter(|l| l.service == *service) {
                        line.quantity = *quantity;
                    }
                }
                self.recompute_reservation(*reservation, &[Field::LineQuantity], ctx);
            },
            HotelEvent::CompanionAdded { reservation, line } => {
                if let Some(record) = self.reservations.get_mut(reservation) {
                    record.guest_lines.push(line.clone());
                }
                self.recompute_reservation(*reservation, &[Field::GuestLines], ctx);
            },
            HotelEvent::ReservationRescheduled {
                reservation,
                check_in,
                check_out,
            } => {
                if let Some(record) = self.reservations.get_mut(reservation) {
                    record.check_in = *check_in;
                    record.check_out = *check_out;
                }
                self.recompute_reservation(*reservation, &[Field::CheckIn, Field::CheckOut], ctx);
            },
            HotelEvent::ReservationStatusChanged {
                reservation, to, ..
            } => {
                if let Some(record) = self.reservations.get_mut(reservation) {
                    record.status = *to;
                }
                self.recompute_reservation(*reservation, &[Field::Status], ctx);
            },
            HotelEvent::InvoiceCreated { invoice } => {
                if let Some(record) = self.reservations.get_mut(&invoice.reservation) {
                    record.invoice = Some(invoice.id);
                }
                self.invoices.insert(invoice.id, invoice.clone());
            },
            HotelEvent::NpsRecorded {
                reservation,
                score,
                feedback,
            } => {
                if let Some(record) = self.reservations.get_mut(reservation) {
                    record.nps = Some(*score);
                    record.feedback.clone_from(feedback);
                }
            },
            HotelEvent::SnapshotCreated { snapshot } => {
                if !self.insert_snapshot(snapshot.clone()) {
                    tracing::debug!(date = %snapshot.date, "Snapshot already exists, kept");
                }
            },
            HotelEvent::SnapshotsInvalidated { dates } => {
                for date in dates {
                    self.snapshots.remove(date);
                }
            },
        }
    }

    fn recompute_room(&mut self, id: RoomId, changed: &[Field]) {
        let Some(room) = self.rooms.get_mut(&id) else {
            return;
        };
        for field in HOTEL_GRAPH.affected(changed) {
            if field == Field::Capacity {
                // Bed counts are checked before they reach the state
                room.capacity =
                    bed_capacity(room.single_beds, room.double_beds).unwrap_or(u32::MAX);
            }
        }
    }

    fn recompute_reservation(&mut self, id: ReservationId, changed: &[Field], ctx: &DeriveContext) {
        let mut guest_to_refresh = None;
        {
            let Some(reservation) = self.reservations.get_mut(&id) else {
                return;
            };
            let room_price = self.rooms.get(&reservation.room).map_or(Money::ZERO, |r| r.price);

            for field in HOTEL_GRAPH.affected(changed) {
                match field {
                    Field::LineTotal => {
                        for line in &mut reservation.service_lines {
                            line.total_price = line.price_unit.multiply(line.quantity);
                        }
                    },
                    Field::Nights => {
                        let days = (reservation.check_out - reservation.check_in).num_days();
                        reservation.nights = u32::try_from(days.max(0)).unwrap_or(u32::MAX);
                    },
                    Field::ServicesTotal => {
                        reservation.services_total =
                            reservation.service_lines.iter().map(|l| l.total_price).sum();
                    },
                    Field::TotalPrice => {
                        reservation.total_price =
                            total_price(room_price, reservation.nights, reservation.services_total);
                    },
                    Field::NumAdults => {
                        reservation.num_adults = count_lines(reservation, true);
                    },
                    Field::NumKids => {
                        reservation.num_kids = count_lines(reservation, false);
                    },
                    Field::GuestCrm => guest_to_refresh = Some(reservation.guest),
                    _ => {},
                }
            }
        }
        if let Some(guest) = guest_to_refresh {
            self.recompute_guest(guest, ctx);
        }
    }

    /// Recompute the CRM metrics of one guest from their reservations
    pub fn recompute_guest(&mut self, id: GuestId, ctx: &DeriveContext) {
        let stays: Vec<&Reservation> = self
            .find_by_guest(id)
            .into_iter()
            .filter(|r| r.status.counts_as_stay())
            .collect();
        let previous_reservations = u32::try_from(stays.len()).unwrap_or(u32::MAX);
        let total_spend: Money = stays.iter().map(|r| r.total_price).sum();
        let annual = stays
            .iter()
            .filter(|r| r.checks_in_during(ctx.today.year()))
            .count();

        let Some(guest) = self.guests.get_mut(&id) else {
            return;
        };
        let average_spend_per_stay = total_spend.divide(previous_reservations);
        let annual_stay_frequency = u32::try_from(annual).unwrap_or(u32::MAX);
        let remaining_healthspan = ctx.average_lifespan.saturating_sub(guest.age);
        guest.metrics = CrmMetrics {
            previous_reservations,
            average_spend_per_stay,
            annual_stay_frequency,
            remaining_healthspan,
            clv: average_spend_per_stay
                .multiply(annual_stay_frequency)
                .multiply(remaining_healthspan),
        };
    }
}

/// Room price × nights plus services; zero when price or nights is zero
#[must_use]
pub const fn total_price(room_price: Money, nights: u32, services_total: Money) -> Money {
    if room_price.is_zero() || nights == 0 {
        return Money::ZERO;
    }
    Money::from_cents(room_price.multiply(nights).cents().saturating_add(services_total.cents()))
}

fn count_lines(reservation: &Reservation, adults: bool) -> u32 {
    let count = reservation
        .guest_lines
        .iter()
        .filter(|line| (line.age >= crate::types::ADULT_AGE) == adults)
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
