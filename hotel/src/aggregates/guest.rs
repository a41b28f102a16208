//! Guest reducer: registration, age updates and the loyalty flag.

use super::{HotelEnvironment, commit, reject};
use crate::error::{Entity, HotelError, ValidationError};
use crate::events::HotelEvent;
use crate::repository::GuestRepository;
use crate::state::HotelState;
use crate::types::{CrmMetrics, Guest, GuestId, base_name};
use crate::validation::{GuestIdentity, validate_guest};
use hotel_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Guest operations
#[derive(Clone, Debug)]
pub enum GuestAction {
    /// Register a guest after validating identity and contact data
    Register {
        /// Caller-chosen ID
        id: GuestId,
        /// First name
        first_name: String,
        /// Last name
        last_name: String,
        /// Age in years
        age: u32,
        /// Email address
        email: Option<String>,
        /// Phone number
        phone: Option<String>,
        /// National identification number
        nin: Option<String>,
        /// ISO country code
        country_code: Option<String>,
        /// State or province code
        state_code: Option<String>,
        /// Parent or guardian
        parent: Option<GuestId>,
    },
    /// Update the age; remaining healthspan and CLV follow
    SetAge {
        /// Guest
        guest: GuestId,
        /// New age
        age: u32,
    },
    /// Set the loyalty flag
    SetLoyalty {
        /// Guest
        guest: GuestId,
        /// New flag
        loyal: bool,
    },
}

/// Reducer for [`GuestAction`]
#[derive(Clone, Debug, Default)]
pub struct GuestReducer;

/// Display name for a new guest: `"First Last"`, or `"First Last (n)"` when
/// `n - 1` guests already carry that name
fn display_name<R: GuestRepository>(repo: &R, first_name: &str, last_name: &str) -> String {
    let base = base_name(first_name, last_name);
    match repo.count_with_base_name(&base) {
        0 => base,
        existing => format!("{base} ({})", existing + 1),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Reducer for GuestReducer {
    type State = HotelState;
    type Action = GuestAction;
    type Environment = HotelEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            GuestAction::Register {
                id,
                first_name,
                last_name,
                age,
                email,
                phone,
                nin,
                country_code,
                state_code,
                parent,
            } => {
                if state.guests.contains_key(&id) {
                    return reject(state, ValidationError::DuplicateId(format!("Guest {id}")));
                }

                let identity = GuestIdentity {
                    first_name: &first_name,
                    last_name: &last_name,
                    age,
                    email: email.as_deref(),
                    phone: phone.as_deref(),
                    nin: nin.as_deref(),
                    has_guardian: parent.is_some(),
                };
                if let Err(error) = validate_guest(&identity) {
                    return reject(state, error);
                }
                if let Some(parent) = parent {
                    if state.find_guest(parent).is_none() {
                        return reject(state, ValidationError::UnknownGuardian(parent));
                    }
                }

                let name = display_name(state, &first_name, &last_name);
                tracing::info!(guest_id = %id, name = %name, "Guest registered");
                let guest = Guest {
                    id,
                    first_name: first_name.trim().to_string(),
                    last_name: last_name.trim().to_string(),
                    name,
                    age,
                    email: non_blank(email),
                    phone: non_blank(phone),
                    nin: non_blank(nin),
                    country_code: non_blank(country_code),
                    state_code: non_blank(state_code),
                    parent,
                    loyal: false,
                    metrics: CrmMetrics::default(),
                };
                commit(state, vec![HotelEvent::GuestRegistered { guest }], env)
            },

            GuestAction::SetAge { guest, age } => {
                if state.find_guest(guest).is_none() {
                    return reject(state, HotelError::NotFound(Entity::Guest(guest)));
                }
                commit(state, vec![HotelEvent::GuestAgeChanged { guest, age }], env)
            },

            GuestAction::SetLoyalty { guest, loyal } => {
                let Some(record) = state.find_guest(guest) else {
                    return reject(state, HotelError::NotFound(Entity::Guest(guest)));
                };
                if record.loyal == loyal {
                    return SmallVec::new();
                }
                commit(state, vec![HotelEvent::GuestLoyaltyChanged { guest, loyal }], env)
            },
        }
    }
}
