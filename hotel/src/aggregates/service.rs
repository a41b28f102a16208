//! Service catalog reducer.

use super::{HotelEnvironment, commit, reject};
use crate::error::{Entity, HotelError, ValidationError};
use crate::events::HotelEvent;
use crate::state::HotelState;
use crate::types::{AccountId, Money, ProductId, Service, ServiceId};
use hotel_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Service catalog operations
#[derive(Clone, Debug)]
pub enum ServiceAction {
    /// Add a sellable service
    Create {
        /// Caller-chosen ID
        id: ServiceId,
        /// Display name
        name: String,
        /// Catalog price per unit
        price: Money,
        /// Sellable product
        product: ProductId,
        /// Income account for invoices
        income_account: Option<AccountId>,
        /// Color tag
        color: Option<u8>,
    },
    /// Change the catalog price. Existing service lines keep their price.
    SetPrice {
        /// Service
        service: ServiceId,
        /// New price
        price: Money,
    },
}

/// Reducer for [`ServiceAction`]
#[derive(Clone, Debug, Default)]
pub struct ServiceReducer;

impl Reducer for ServiceReducer {
    type State = HotelState;
    type Action = ServiceAction;
    type Environment = HotelEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ServiceAction::Create {
                id,
                name,
                price,
                product,
                income_account,
                color,
            } => {
                if state.services.contains_key(&id) {
                    return reject(state, ValidationError::DuplicateId(format!("Service {id}")));
                }
                let service = Service {
                    id,
                    name,
                    price,
                    product,
                    income_account,
                    color,
                };
                commit(state, vec![HotelEvent::ServiceCreated { service }], env)
            },
            ServiceAction::SetPrice { service, price } => {
                if !state.services.contains_key(&service) {
                    return reject(state, HotelError::NotFound(Entity::Service(service)));
                }
                commit(state, vec![HotelEvent::ServicePriceChanged { service, price }], env)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::fixtures;
    use crate::types::{ReservationId, ServiceLine};
    use hotel_testing::ReducerTest;

    #[test]
    fn price_change_leaves_existing_lines_alone() {
        let mut state = HotelState::default();
        let spa = fixtures::service(&mut state, "Spa", 40);
        let line = ServiceLine::for_service(&state.services[&spa]);
        let reservation = ReservationId::new();
        state.reservations.insert(
            reservation,
            crate::types::Reservation {
                id: reservation,
                number: "RES/00001".into(),
                guest: crate::types::GuestId::new(),
                room: crate::types::RoomId::new(),
                check_in: fixtures::day(1),
                check_out: fixtures::day(2),
                services: vec![spa],
                service_lines: vec![line],
                guest_lines: Vec::new(),
                status: crate::types::ReservationStatus::Draft,
                nights: 1,
                services_total: Money::from_dollars(40),
                total_price: Money::ZERO,
                num_adults: 0,
                num_kids: 0,
                invoice: None,
                nps: None,
                feedback: None,
                created_at: chrono::Utc::now(),
            },
        );

        ReducerTest::new(ServiceReducer)
            .with_env(fixtures::env())
            .given_state(state)
            .when_action(ServiceAction::SetPrice {
                service: spa,
                price: Money::from_dollars(55),
            })
            .then_state(move |state| {
                assert_eq!(state.services[&spa].price, Money::from_dollars(55));
                let line = &state.reservations[&reservation].service_lines[0];
                assert_eq!(line.price_unit, Money::from_dollars(40));
            })
            .run();
    }

    #[test]
    fn unknown_service_is_rejected() {
        let service = ServiceId::new();
        ReducerTest::new(ServiceReducer)
            .with_env(fixtures::env())
            .given_state(HotelState::default())
            .when_action(ServiceAction::SetPrice {
                service,
                price: Money::from_dollars(1),
            })
            .then_state(move |state| {
                assert_eq!(
                    state.last_error,
                    Some(HotelError::NotFound(Entity::Service(service)))
                );
            })
            .run();
    }
}
