//! Reservation reducer: the booking workflow from draft to invoice.
//!
//! ```text
//! draft ──confirm──> confirm ──complete──> done ──record_nps
//!   │  <──reset────    │
//!   └──cancel──> cancel <┘
//!        └──reset──> draft
//! ```
//!
//! Creating a reservation holds its room; cancelling releases the room
//! unless another open reservation still holds it. Completing issues the
//! invoice in the same step, so a reservation is never `done` without one.

use super::{HotelEnvironment, commit, invalidate_snapshots, reject};
use crate::error::{ConfigurationError, Entity, HotelError, ValidationError};
use crate::events::HotelEvent;
use crate::repository::{GuestRepository, ReservationRepository, RoomRepository};
use crate::state::HotelState;
use crate::types::{
    GuestId, GuestLine, Invoice, InvoiceId, InvoiceKind, InvoiceLine, Reservation,
    ReservationId, ReservationStatus, Room, RoomId, RoomState, ServiceId, ServiceLine,
};
use crate::validation::{validate_nps, validate_stay};
use chrono::NaiveDate;
use hotel_core::{SmallVec, effect::Effect, reducer::Reducer};
use std::collections::BTreeSet;

/// Reservation workflow operations
#[derive(Clone, Debug)]
pub enum ReservationAction {
    /// Book a room for a guest; the reservation starts in draft
    Create {
        /// Caller-chosen ID
        id: ReservationId,
        /// Booking guest, must be an adult
        guest: GuestId,
        /// Room, must be available
        room: RoomId,
        /// Arrival
        check_in: NaiveDate,
        /// Departure
        check_out: NaiveDate,
        /// Services to attach
        services: Vec<ServiceId>,
    },
    /// Replace the attached service set; services without a line get one
    UpdateServices {
        /// Reservation
        reservation: ReservationId,
        /// New service set
        services: Vec<ServiceId>,
    },
    /// Change the quantity of a service line
    SetServiceQuantity {
        /// Reservation
        reservation: ReservationId,
        /// Service of the line
        service: ServiceId,
        /// New quantity, at least 1
        quantity: u32,
    },
    /// Add a companion guest
    AddCompanion {
        /// Reservation
        reservation: ReservationId,
        /// Companion
        guest: GuestId,
    },
    /// Move the stay dates
    Reschedule {
        /// Reservation
        reservation: ReservationId,
        /// New arrival
        check_in: NaiveDate,
        /// New departure
        check_out: NaiveDate,
    },
    /// draft → confirm
    Confirm {
        /// Reservation
        reservation: ReservationId,
    },
    /// draft | confirm → cancel
    Cancel {
        /// Reservation
        reservation: ReservationId,
    },
    /// confirm | cancel → draft
    ResetToDraft {
        /// Reservation
        reservation: ReservationId,
    },
    /// confirm → done, issuing the invoice
    Complete {
        /// Reservation
        reservation: ReservationId,
    },
    /// Issue the invoice without changing the workflow state
    CreateInvoice {
        /// Reservation
        reservation: ReservationId,
    },
    /// Capture the guest's score and feedback on a completed stay
    RecordNps {
        /// Reservation
        reservation: ReservationId,
        /// Score 0..=10
        score: u8,
        /// Free-text feedback
        feedback: Option<String>,
    },
}

/// Reducer for [`ReservationAction`]
#[derive(Clone, Debug, Default)]
pub struct ReservationReducer;

type Outcome = Result<Vec<HotelEvent>, HotelError>;

fn find(state: &HotelState, id: ReservationId) -> Result<&Reservation, HotelError> {
    state
        .find_reservation(id)
        .ok_or(HotelError::NotFound(Entity::Reservation(id)))
}

/// Reservation that still accepts edits (draft or confirm)
fn find_open<'a>(
    state: &'a HotelState,
    id: ReservationId,
    operation: &'static str,
) -> Result<&'a Reservation, HotelError> {
    let reservation = find(state, id)?;
    if !reservation.status.is_open() {
        return Err(HotelError::InvalidTransition {
            operation,
            from: reservation.status,
        });
    }
    Ok(reservation)
}

fn find_room(state: &HotelState, id: RoomId) -> Result<&Room, HotelError> {
    state.find_room(id).ok_or(HotelError::NotFound(Entity::Room(id)))
}

fn ensure_bookable(room: &Room) -> Result<(), ValidationError> {
    if room.state == RoomState::Available {
        Ok(())
    } else {
        Err(ValidationError::RoomUnavailable {
            number: room.number.clone(),
            state: room.state.as_str(),
        })
    }
}

/// Requested services without duplicates, in request order
fn resolve_services(state: &HotelState, services: &[ServiceId]) -> Result<Vec<ServiceId>, HotelError> {
    let mut seen = BTreeSet::new();
    let mut resolved = Vec::with_capacity(services.len());
    for id in services {
        if !state.services.contains_key(id) {
            return Err(HotelError::NotFound(Entity::Service(*id)));
        }
        if seen.insert(*id) {
            resolved.push(*id);
        }
    }
    Ok(resolved)
}

/// Lines for the services in `services` that `existing` has no line for
fn missing_lines(state: &HotelState, existing: &[ServiceLine], services: &[ServiceId]) -> Vec<ServiceLine> {
    services
        .iter()
        .filter(|id| !existing.iter().any(|line| line.service == **id))
        .filter_map(|id| state.services.get(id))
        .map(ServiceLine::for_service)
        .collect()
}

fn transition(reservation: &Reservation, to: ReservationStatus) -> HotelEvent {
    HotelEvent::ReservationStatusChanged {
        reservation: reservation.id,
        from: reservation.status,
        to,
    }
}

/// Invoice lines for the room charge and every service line.
///
/// Fails when the room or a service lacks the product or income account an
/// invoice line needs.
fn build_invoice(
    state: &HotelState,
    reservation: &Reservation,
    number: String,
    date: NaiveDate,
) -> Result<Invoice, HotelError> {
    let room = find_room(state, reservation.room)?;
    let room_label = format!("room {}", room.number);
    let product = room
        .product
        .ok_or_else(|| ConfigurationError::MissingProduct(room_label.clone()))?;
    let account = room
        .income_account
        .ok_or(ConfigurationError::MissingIncomeAccount(room_label))?;

    let mut lines = vec![InvoiceLine {
        description: format!("Room {} ({} nights)", room.number, reservation.nights),
        product,
        account,
        quantity: reservation.nights,
        price_unit: room.price,
        subtotal: room.price.multiply(reservation.nights),
    }];

    for line in &reservation.service_lines {
        let service = state
            .services
            .get(&line.service)
            .ok_or(HotelError::NotFound(Entity::Service(line.service)))?;
        let account = service.income_account.ok_or_else(|| {
            ConfigurationError::MissingIncomeAccount(format!("service {}", service.name))
        })?;
        lines.push(InvoiceLine {
            description: line.name.clone(),
            product: service.product,
            account,
            quantity: line.quantity,
            price_unit: line.price_unit,
            subtotal: line.total_price,
        });
    }

    Ok(Invoice {
        id: InvoiceId::new(),
        number,
        reservation: reservation.id,
        guest: reservation.guest,
        date,
        kind: InvoiceKind::OutInvoice,
        total: lines.iter().map(|l| l.subtotal).sum(),
        lines,
    })
}

impl ReservationReducer {
    #[allow(clippy::too_many_arguments)]
    fn create(
        state: &mut HotelState,
        env: &HotelEnvironment,
        id: ReservationId,
        guest: GuestId,
        room: RoomId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        services: &[ServiceId],
    ) -> Outcome {
        if state.reservations.contains_key(&id) {
            return Err(ValidationError::DuplicateId(format!("Reservation {id}")).into());
        }
        let booker = state
            .find_guest(guest)
            .ok_or(HotelError::NotFound(Entity::Guest(guest)))?;
        let room_record = find_room(state, room)?;
        let services = resolve_services(state, services)?;
        validate_stay(check_in, check_out, env.clock.today())?;
        if !booker.is_adult() {
            return Err(ValidationError::GuestUnderage.into());
        }
        ensure_bookable(room_record)?;

        let primary = GuestLine {
            guest,
            name: booker.name.clone(),
            age: booker.age,
            primary: true,
        };
        let service_lines = missing_lines(state, &[], &services);
        let room_state = room_record.state;
        let number = state.sequences.next_reservation();
        tracing::info!(reservation_id = %id, number = %number, %check_in, %check_out, "Reservation created");

        let reservation = Reservation {
            id,
            number,
            guest,
            room,
            check_in,
            check_out,
            services,
            service_lines,
            guest_lines: vec![primary],
            status: ReservationStatus::Draft,
            nights: 0,
            services_total: crate::types::Money::ZERO,
            total_price: crate::types::Money::ZERO,
            num_adults: 0,
            num_kids: 0,
            invoice: None,
            nps: None,
            feedback: None,
            created_at: env.clock.now(),
        };
        Ok(vec![
            HotelEvent::ReservationCreated { reservation },
            HotelEvent::RoomStateChanged {
                room,
                from: room_state,
                to: RoomState::Reserved,
            },
        ])
    }

    fn cancel(state: &HotelState, id: ReservationId) -> Outcome {
        let reservation = find_open(state, id, "cancel")?;
        let mut events = vec![transition(reservation, ReservationStatus::Cancel)];

        let held_elsewhere = state
            .find_by_room(reservation.room)
            .iter()
            .any(|other| other.id != id && other.status.is_open());
        if let Some(room) = state.find_room(reservation.room) {
            if room.state == RoomState::Reserved && !held_elsewhere {
                events.push(HotelEvent::RoomStateChanged {
                    room: room.id,
                    from: room.state,
                    to: RoomState::Available,
                });
            }
        }
        Ok(events)
    }

    fn reset_to_draft(state: &HotelState, id: ReservationId) -> Outcome {
        let reservation = find(state, id)?;
        match reservation.status {
            ReservationStatus::Confirm => {
                Ok(vec![transition(reservation, ReservationStatus::Draft)])
            },
            ReservationStatus::Cancel => {
                // Reopening needs the room back
                let room = find_room(state, reservation.room)?;
                ensure_bookable(room)?;
                Ok(vec![
                    transition(reservation, ReservationStatus::Draft),
                    HotelEvent::RoomStateChanged {
                        room: room.id,
                        from: room.state,
                        to: RoomState::Reserved,
                    },
                ])
            },
            from => Err(HotelError::InvalidTransition {
                operation: "reset to draft",
                from,
            }),
        }
    }

    fn complete(state: &mut HotelState, env: &HotelEnvironment, id: ReservationId) -> Outcome {
        let reservation = find(state, id)?;
        if reservation.status != ReservationStatus::Confirm {
            return Err(HotelError::InvalidTransition {
                operation: "complete",
                from: reservation.status,
            });
        }
        if reservation.invoice.is_some() {
            return Err(ConfigurationError::InvoiceAlreadyExists.into());
        }
        let invoice = build_invoice(
            state,
            reservation,
            state.sequences.peek_invoice(),
            env.clock.today(),
        )?;
        let done = transition(reservation, ReservationStatus::Done);

        state.sequences.next_invoice();
        tracing::info!(reservation_id = %id, invoice = %invoice.number, total = %invoice.total, "Reservation completed");
        Ok(vec![done, HotelEvent::InvoiceCreated { invoice }])
    }

    fn create_invoice(state: &mut HotelState, env: &HotelEnvironment, id: ReservationId) -> Outcome {
        let reservation = find(state, id)?;
        if reservation.invoice.is_some() {
            return Err(ConfigurationError::InvoiceAlreadyExists.into());
        }
        if reservation.status == ReservationStatus::Cancel {
            return Err(HotelError::InvalidTransition {
                operation: "invoice",
                from: reservation.status,
            });
        }
        let invoice = build_invoice(
            state,
            reservation,
            state.sequences.peek_invoice(),
            env.clock.today(),
        )?;
        state.sequences.next_invoice();
        Ok(vec![HotelEvent::InvoiceCreated { invoice }])
    }

    fn handle(state: &mut HotelState, action: ReservationAction, env: &HotelEnvironment) -> Outcome {
        match action {
            ReservationAction::Create {
                id,
                guest,
                room,
                check_in,
                check_out,
                services,
            } => Self::create(state, env, id, guest, room, check_in, check_out, &services),

            ReservationAction::UpdateServices {
                reservation,
                services,
            } => {
                let record = find_open(state, reservation, "update services of")?;
                let services = resolve_services(state, &services)?;
                let added_lines = missing_lines(state, &record.service_lines, &services);
                Ok(vec![HotelEvent::ReservationServicesUpdated {
                    reservation,
                    services,
                    added_lines,
                }])
            },

            ReservationAction::SetServiceQuantity {
                reservation,
                service,
                quantity,
            } => {
                if quantity == 0 {
                    return Err(ValidationError::ZeroQuantity.into());
                }
                let record = find_open(state, reservation, "change services of")?;
                if !record.service_lines.iter().any(|l| l.service == service) {
                    return Err(HotelError::NotFound(Entity::ServiceLine(reservation, service)));
                }
                Ok(vec![HotelEvent::ServiceQuantityChanged {
                    reservation,
                    service,
                    quantity,
                }])
            },

            ReservationAction::AddCompanion { reservation, guest } => {
                let record = find_open(state, reservation, "add guests to")?;
                let companion = state
                    .find_guest(guest)
                    .ok_or(HotelError::NotFound(Entity::Guest(guest)))?;
                if record.guest_lines.iter().any(|line| line.guest == guest) {
                    return Err(ValidationError::GuestAlreadyOnReservation(guest).into());
                }
                Ok(vec![HotelEvent::CompanionAdded {
                    reservation,
                    line: GuestLine {
                        guest,
                        name: companion.name.clone(),
                        age: companion.age,
                        primary: false,
                    },
                }])
            },

            ReservationAction::Reschedule {
                reservation,
                check_in,
                check_out,
            } => {
                find_open(state, reservation, "reschedule")?;
                validate_stay(check_in, check_out, env.clock.today())?;
                Ok(vec![HotelEvent::ReservationRescheduled {
                    reservation,
                    check_in,
                    check_out,
                }])
            },

            ReservationAction::Confirm { reservation } => {
                let record = find(state, reservation)?;
                if record.status != ReservationStatus::Draft {
                    return Err(HotelError::InvalidTransition {
                        operation: "confirm",
                        from: record.status,
                    });
                }
                Ok(vec![transition(record, ReservationStatus::Confirm)])
            },

            ReservationAction::Cancel { reservation } => Self::cancel(state, reservation),
            ReservationAction::ResetToDraft { reservation } => {
                Self::reset_to_draft(state, reservation)
            },
            ReservationAction::Complete { reservation } => Self::complete(state, env, reservation),
            ReservationAction::CreateInvoice { reservation } => {
                Self::create_invoice(state, env, reservation)
            },

            ReservationAction::RecordNps {
                reservation,
                score,
                feedback,
            } => {
                let record = find(state, reservation)?;
                if record.status != ReservationStatus::Done {
                    return Err(HotelError::InvalidTransition {
                        operation: "record feedback for",
                        from: record.status,
                    });
                }
                validate_nps(score)?;
                Ok(vec![HotelEvent::NpsRecorded {
                    reservation,
                    score,
                    feedback: feedback.filter(|f| !f.trim().is_empty()),
                }])
            },
        }
    }
}

impl Reducer for ReservationReducer {
    type State = HotelState;
    type Action = ReservationAction;
    type Environment = HotelEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut events = match Self::handle(state, action, env) {
            Ok(events) => events,
            Err(error) => return reject(state, error),
        };

        invalidate_snapshots(state, env, &mut events);
        commit(state, events, env)
    }
}
