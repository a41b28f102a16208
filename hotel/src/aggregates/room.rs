//! Room reducer: room records, manual state changes and the room sweep.

use super::{HotelEnvironment, commit, invalidate_snapshots, reject};
use crate::error::{Entity, HotelError, ValidationError};
use crate::events::HotelEvent;
use crate::repository::{ReservationRepository, RoomRepository};
use crate::state::{HotelState, JobReport};
use crate::types::{AccountId, Money, ReservationStatus, Room, RoomId, RoomState};
use crate::validation::bed_capacity;
use hotel_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Room operations
#[derive(Clone, Debug)]
pub enum RoomAction {
    /// Add a room; its number is assigned from the room sequence
    Create {
        /// Caller-chosen ID
        id: RoomId,
        /// Single beds
        single_beds: u32,
        /// Double beds
        double_beds: u32,
        /// Nightly price
        price: Money,
        /// Free-text description
        description: Option<String>,
        /// Sellable product for invoices
        product: Option<crate::types::ProductId>,
        /// Income account for invoices
        income_account: Option<AccountId>,
    },
    /// Change bed counts; capacity follows
    SetBeds {
        /// Room
        room: RoomId,
        /// Single beds
        single_beds: u32,
        /// Double beds
        double_beds: u32,
    },
    /// Change the nightly price; open reservations follow
    SetPrice {
        /// Room
        room: RoomId,
        /// New price
        price: Money,
    },
    /// Operator marks the room available
    MarkAvailable {
        /// Room
        room: RoomId,
    },
    /// Operator marks the room reserved
    MarkReserved {
        /// Room
        room: RoomId,
    },
    /// Operator takes the room out of service
    MarkUnderMaintenance {
        /// Room
        room: RoomId,
    },
    /// Reconcile room states with reservation dates
    Sweep,
}

/// Reducer for [`RoomAction`]
#[derive(Clone, Debug, Default)]
pub struct RoomReducer;

impl RoomReducer {
    fn set_state(
        state: &mut HotelState,
        room: RoomId,
        to: RoomState,
        env: &HotelEnvironment,
    ) -> SmallVec<[Effect<RoomAction>; 4]> {
        let Some(record) = state.find_room(room) else {
            return reject(state, HotelError::NotFound(Entity::Room(room)));
        };
        if record.state == to {
            return SmallVec::new();
        }
        let event = HotelEvent::RoomStateChanged {
            room,
            from: record.state,
            to,
        };
        commit(state, vec![event], env)
    }

    /// Room state changes the sweep would make today.
    ///
    /// Rooms under maintenance are left alone. A room with a non-cancelled
    /// stay that has not checked out yet is reserved; a reserved room whose
    /// stays have all checked out is released.
    fn sweep(state: &HotelState, env: &HotelEnvironment) -> (Vec<HotelEvent>, usize, usize) {
        let today = env.clock.today();
        let mut events = Vec::new();
        let (mut reserved, mut released) = (0, 0);

        for room in state.rooms.values() {
            if room.state == RoomState::UnderMaintenance {
                continue;
            }
            let stays: Vec<_> = state
                .find_by_room(room.id)
                .into_iter()
                .filter(|r| r.status != ReservationStatus::Cancel)
                .collect();
            if stays.is_empty() {
                continue;
            }

            let occupied = stays.iter().any(|r| r.check_out >= today);
            let to = match (room.state, occupied) {
                (RoomState::Available, true) => {
                    reserved += 1;
                    RoomState::Reserved
                },
                (RoomState::Reserved, false) => {
                    released += 1;
                    RoomState::Available
                },
                _ => continue,
            };
            events.push(HotelEvent::RoomStateChanged {
                room: room.id,
                from: room.state,
                to,
            });
        }
        (events, reserved, released)
    }
}

impl Reducer for RoomReducer {
    type State = HotelState;
    type Action = RoomAction;
    type Environment = HotelEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            RoomAction::Create {
                id,
                single_beds,
                double_beds,
                price,
                description,
                product,
                income_account,
            } => {
                if state.rooms.contains_key(&id) {
                    return reject(state, ValidationError::DuplicateId(format!("Room {id}")));
                }
                if let Err(error) = bed_capacity(single_beds, double_beds) {
                    return reject(state, error);
                }
                let number = state.sequences.next_room();
                tracing::info!(room_id = %id, number = %number, "Room created");
                let room = Room {
                    id,
                    number,
                    single_beds,
                    double_beds,
                    capacity: 0,
                    price,
                    description,
                    product,
                    income_account,
                    state: RoomState::Available,
                };
                commit(state, vec![HotelEvent::RoomCreated { room }], env)
            },

            RoomAction::SetBeds {
                room,
                single_beds,
                double_beds,
            } => {
                if state.find_room(room).is_none() {
                    return reject(state, HotelError::NotFound(Entity::Room(room)));
                }
                if let Err(error) = bed_capacity(single_beds, double_beds) {
                    return reject(state, error);
                }
                let event = HotelEvent::RoomBedsChanged {
                    room,
                    single_beds,
                    double_beds,
                };
                commit(state, vec![event], env)
            },

            RoomAction::SetPrice { room, price } => {
                if state.find_room(room).is_none() {
                    return reject(state, HotelError::NotFound(Entity::Room(room)));
                }
                let mut events = vec![HotelEvent::RoomPriceChanged { room, price }];
                invalidate_snapshots(state, env, &mut events);
                commit(state, events, env)
            },

            RoomAction::MarkAvailable { room } => {
                Self::set_state(state, room, RoomState::Available, env)
            },
            RoomAction::MarkReserved { room } => {
                Self::set_state(state, room, RoomState::Reserved, env)
            },
            RoomAction::MarkUnderMaintenance { room } => {
                Self::set_state(state, room, RoomState::UnderMaintenance, env)
            },

            RoomAction::Sweep => {
                let (events, reserved, released) = Self::sweep(state, env);
                tracing::info!(reserved, released, "Room sweep finished");
                state.last_report = Some(JobReport::Sweep { reserved, released });
                commit(state, events, env)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::{HotelReducer, fixtures};
    use crate::types::{Reservation, ReservationId};
    use chrono::NaiveDate;
    use hotel_testing::{ReducerTest, assertions};

    fn stay(
        state: &mut HotelState,
        room: RoomId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        status: ReservationStatus,
    ) {
        let guest = fixtures::guest(state, "Ada", 40);
        let id = ReservationId::new();
        state.reservations.insert(
            id,
            Reservation {
                id,
                number: state.sequences.next_reservation(),
                guest,
                room,
                check_in,
                check_out,
                services: Vec::new(),
                service_lines: Vec::new(),
                guest_lines: Vec::new(),
                status,
                nights: 0,
                services_total: Money::ZERO,
                total_price: Money::ZERO,
                num_adults: 0,
                num_kids: 0,
                invoice: None,
                nps: None,
                feedback: None,
                created_at: chrono::Utc::now(),
            },
        );
    }

    fn set_state(state: &mut HotelState, room: RoomId, to: RoomState) {
        if let Some(record) = state.rooms.get_mut(&room) {
            record.state = to;
        }
    }

    #[test]
    fn create_assigns_number_and_capacity() {
        let id = RoomId::new();
        ReducerTest::new(RoomReducer)
            .with_env(fixtures::env())
            .given_state(HotelState::default())
            .when_action(RoomAction::Create {
                id,
                single_beds: 1,
                double_beds: 2,
                price: Money::from_dollars(120),
                description: Some("Sea view".into()),
                product: None,
                income_account: None,
            })
            .then_state(move |state| {
                let room = &state.rooms[&id];
                assert_eq!(room.number, "ROOM/0001");
                assert_eq!(room.capacity, 5);
                assert_eq!(room.state, RoomState::Available);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn bed_change_recomputes_capacity() {
        let mut state = HotelState::default();
        let room = fixtures::room(&mut state, 100);

        ReducerTest::new(RoomReducer)
            .with_env(fixtures::env())
            .given_state(state)
            .when_action(RoomAction::SetBeds {
                room,
                single_beds: 0,
                double_beds: 3,
            })
            .then_state(move |state| assert_eq!(state.rooms[&room].capacity, 6))
            .run();
    }

    #[test]
    fn overflowing_bed_counts_are_rejected() {
        let mut state = HotelState::default();
        let room = fixtures::room(&mut state, 100);
        let capacity = state.rooms[&room].capacity;

        ReducerTest::new(HotelReducer)
            .with_env(fixtures::env())
            .given_state(state)
            .when_action(
                RoomAction::SetBeds {
                    room,
                    single_beds: 1,
                    double_beds: u32::MAX,
                }
                .into(),
            )
            .then_state(move |state| {
                assert!(matches!(
                    state.last_error,
                    Some(HotelError::Validation(ValidationError::TooManyBeds { .. }))
                ));
                assert_eq!(state.rooms[&room].capacity, capacity);
            })
            .then_effects(assertions::assert_no_effects)
            .run();

        let id = RoomId::new();
        ReducerTest::new(HotelReducer)
            .with_env(fixtures::env())
            .given_state(HotelState::default())
            .when_action(
                RoomAction::Create {
                    id,
                    single_beds: u32::MAX,
                    double_beds: 1,
                    price: Money::from_dollars(90),
                    description: None,
                    product: None,
                    income_account: None,
                }
                .into(),
            )
            .then_state(move |state| {
                assert!(state.last_error.is_some());
                assert!(!state.rooms.contains_key(&id));
            })
            .run();
    }

    #[test]
    fn unknown_room_is_rejected_without_effects() {
        let room = RoomId::new();
        ReducerTest::new(RoomReducer)
            .with_env(fixtures::env())
            .given_state(HotelState::default())
            .when_action(RoomAction::MarkUnderMaintenance { room })
            .then_state(move |state| {
                assert_eq!(
                    state.last_error,
                    Some(HotelError::NotFound(Entity::Room(room)))
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn sweep_reserves_and_releases_rooms() {
        let mut state = HotelState::default();
        let upcoming = fixtures::room(&mut state, 100);
        let past = fixtures::room(&mut state, 100);
        let cancelled = fixtures::room(&mut state, 100);
        let maintenance = fixtures::room(&mut state, 100);
        let idle = fixtures::room(&mut state, 100);

        stay(&mut state, upcoming, fixtures::day(2), fixtures::day(4), ReservationStatus::Confirm);
        stay(&mut state, past, fixtures::day(-5), fixtures::day(-2), ReservationStatus::Done);
        stay(&mut state, cancelled, fixtures::day(1), fixtures::day(3), ReservationStatus::Cancel);
        stay(&mut state, maintenance, fixtures::day(1), fixtures::day(3), ReservationStatus::Draft);
        set_state(&mut state, past, RoomState::Reserved);
        set_state(&mut state, cancelled, RoomState::Reserved);
        set_state(&mut state, maintenance, RoomState::UnderMaintenance);

        ReducerTest::new(RoomReducer)
            .with_env(fixtures::env())
            .given_state(state)
            .when_action(RoomAction::Sweep)
            .then_state(move |state| {
                assert_eq!(state.rooms[&upcoming].state, RoomState::Reserved);
                assert_eq!(state.rooms[&past].state, RoomState::Available);
                // Only cancelled stays: no evidence either way
                assert_eq!(state.rooms[&cancelled].state, RoomState::Reserved);
                assert_eq!(state.rooms[&maintenance].state, RoomState::UnderMaintenance);
                assert_eq!(state.rooms[&idle].state, RoomState::Available);
                assert_eq!(
                    state.last_report,
                    Some(JobReport::Sweep {
                        reserved: 1,
                        released: 1
                    })
                );
            })
            .run();
    }

    #[test]
    fn sweep_keeps_room_reserved_on_checkout_day() {
        let mut state = HotelState::default();
        let room = fixtures::room(&mut state, 100);
        stay(&mut state, room, fixtures::day(-3), fixtures::today(), ReservationStatus::Confirm);
        set_state(&mut state, room, RoomState::Reserved);

        ReducerTest::new(RoomReducer)
            .with_env(fixtures::env())
            .given_state(state)
            .when_action(RoomAction::Sweep)
            .then_state(move |state| {
                assert_eq!(state.rooms[&room].state, RoomState::Reserved);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
