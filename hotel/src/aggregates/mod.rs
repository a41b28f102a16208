//! Reducers of the hotel.
//!
//! One reducer per record family, all operating on the shared
//! [`HotelState`]. [`HotelReducer`] combines them behind a single action
//! type so one Store serializes every operation.
//!
//! Every reducer follows the same shape:
//!
//! 1. validate the command against the current state
//! 2. on failure, record the error in `state.last_error` and return no effects
//! 3. on success, build the [`HotelEvent`]s, apply them, and return an effect
//!    publishing them on the event bus

use crate::error::HotelError;
use crate::events::HotelEvent;
use crate::repository::{AnalysisRepository, ReservationRepository};
use crate::state::{DEFAULT_AVERAGE_LIFESPAN, DeriveContext, HotelState};
use crate::types::ReservationId;
use chrono::NaiveDate;
use hotel_core::event_bus::EventBus;
use hotel_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use std::sync::Arc;

pub mod analytics;
pub mod guest;
pub mod reservation;
pub mod room;
pub mod service;

pub use analytics::{AnalyticsAction, AnalyticsReducer};
pub use guest::{GuestAction, GuestReducer};
pub use reservation::{ReservationAction, ReservationReducer};
pub use room::{RoomAction, RoomReducer};
pub use service::{ServiceAction, ServiceReducer};

// ============================================================================
// Environment
// ============================================================================

/// Business settings that influence derived fields and invalidation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainSettings {
    /// Average lifespan for the remaining healthspan
    pub average_lifespan: u32,
    /// Drop affected snapshots when a reservation changes
    pub invalidate_snapshots_on_change: bool,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            average_lifespan: DEFAULT_AVERAGE_LIFESPAN,
            invalidate_snapshots_on_change: false,
        }
    }
}

/// Environment dependencies shared by every hotel reducer
#[derive(Clone)]
pub struct HotelEnvironment {
    /// Clock for "today" and timestamps
    pub clock: Arc<dyn Clock>,
    /// Bus the applied events are published on
    pub events: Arc<dyn EventBus<HotelEvent>>,
    /// Business settings
    pub settings: DomainSettings,
}

impl HotelEnvironment {
    /// Creates a new `HotelEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventBus<HotelEvent>>,
        settings: DomainSettings,
    ) -> Self {
        Self {
            clock,
            events,
            settings,
        }
    }

    /// Context for derived-field recomputation
    #[must_use]
    pub fn derive_context(&self) -> DeriveContext {
        DeriveContext {
            today: self.clock.today(),
            average_lifespan: self.settings.average_lifespan,
        }
    }
}

// ============================================================================
// Shared reducer steps
// ============================================================================

/// Earliest check-out whose revenue `events` change, read against the
/// state before they are applied
fn earliest_affected_checkout(state: &HotelState, events: &[HotelEvent]) -> Option<NaiveDate> {
    let current = |id: &ReservationId| state.find_reservation(*id).map(|r| r.check_out);
    events
        .iter()
        .filter_map(|event| match event {
            HotelEvent::ReservationCreated { reservation } => Some(reservation.check_out),
            HotelEvent::ReservationRescheduled {
                reservation,
                check_out,
                ..
            } => Some(current(reservation).map_or(*check_out, |old| old.min(*check_out))),
            HotelEvent::ReservationServicesUpdated { reservation, .. }
            | HotelEvent::ServiceQuantityChanged { reservation, .. }
            | HotelEvent::ReservationStatusChanged { reservation, .. } => current(reservation),
            // Repricing moves the totals of the room's open stays
            HotelEvent::RoomPriceChanged { room, .. } => state
                .find_by_room(*room)
                .into_iter()
                .filter(|r| r.status.is_open())
                .map(|r| r.check_out)
                .min(),
            _ => None,
        })
        .min()
}

/// Append a [`HotelEvent::SnapshotsInvalidated`] for the snapshots `events`
/// make stale, when invalidation is enabled
pub(crate) fn invalidate_snapshots(
    state: &HotelState,
    env: &HotelEnvironment,
    events: &mut Vec<HotelEvent>,
) {
    if !env.settings.invalidate_snapshots_on_change {
        return;
    }
    let Some(from) = earliest_affected_checkout(state, events) else {
        return;
    };
    let dates = state.snapshot_dates_from(from);
    if !dates.is_empty() {
        tracing::debug!(%from, count = dates.len(), "Invalidating snapshots");
        events.push(HotelEvent::SnapshotsInvalidated { dates });
    }
}

/// Apply events to state and return the effect that publishes them
pub(crate) fn commit<A: Send + 'static>(
    state: &mut HotelState,
    events: Vec<HotelEvent>,
    env: &HotelEnvironment,
) -> SmallVec<[Effect<A>; 4]> {
    if events.is_empty() {
        return SmallVec::new();
    }

    let ctx = env.derive_context();
    for event in &events {
        state.apply(event, &ctx);
        crate::metrics::record_event(event);
    }

    let bus = Arc::clone(&env.events);
    smallvec![Effect::Future(Box::pin(async move {
        for event in events {
            let event_type = hotel_core::event::DomainEvent::event_type(&event);
            if let Err(error) = bus.publish(event) {
                tracing::warn!(event_type, error = %error, "Failed to publish event");
            }
        }
        None
    }))]
}

/// Record a rejected command
pub(crate) fn reject<A>(
    state: &mut HotelState,
    error: impl Into<HotelError>,
) -> SmallVec<[Effect<A>; 4]> {
    let error = error.into();
    tracing::debug!(error = %error, "Command rejected");
    state.last_error = Some(error);
    SmallVec::new()
}

// ============================================================================
// Combined reducer
// ============================================================================

/// Any operation on the hotel
#[derive(Clone, Debug)]
pub enum HotelAction {
    /// Room operations and the room sweep
    Room(RoomAction),
    /// Guest operations
    Guest(GuestAction),
    /// Service catalog operations
    Service(ServiceAction),
    /// Reservation workflow
    Reservation(ReservationAction),
    /// Daily analytics
    Analytics(AnalyticsAction),
}

impl From<RoomAction> for HotelAction {
    fn from(action: RoomAction) -> Self {
        Self::Room(action)
    }
}

impl From<GuestAction> for HotelAction {
    fn from(action: GuestAction) -> Self {
        Self::Guest(action)
    }
}

impl From<ServiceAction> for HotelAction {
    fn from(action: ServiceAction) -> Self {
        Self::Service(action)
    }
}

impl From<ReservationAction> for HotelAction {
    fn from(action: ReservationAction) -> Self {
        Self::Reservation(action)
    }
}

impl From<AnalyticsAction> for HotelAction {
    fn from(action: AnalyticsAction) -> Self {
        Self::Analytics(action)
    }
}

/// Routes each action to the reducer of its record family
#[derive(Clone, Debug, Default)]
pub struct HotelReducer;

impl HotelReducer {
    /// Creates a new `HotelReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn lift<A, F>(effects: SmallVec<[Effect<A>; 4]>, f: F) -> SmallVec<[Effect<HotelAction>; 4]>
where
    A: 'static,
    F: Fn(A) -> HotelAction + Send + Sync + Clone + 'static,
{
    effects.into_iter().map(|effect| effect.map(f.clone())).collect()
}

impl Reducer for HotelReducer {
    type State = HotelState;
    type Action = HotelAction;
    type Environment = HotelEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        state.last_error = None;
        state.last_report = None;

        match action {
            HotelAction::Room(action) => {
                lift(RoomReducer.reduce(state, action, env), HotelAction::Room)
            },
            HotelAction::Guest(action) => {
                lift(GuestReducer.reduce(state, action, env), HotelAction::Guest)
            },
            HotelAction::Service(action) => {
                lift(ServiceReducer.reduce(state, action, env), HotelAction::Service)
            },
            HotelAction::Reservation(action) => lift(
                ReservationReducer.reduce(state, action, env),
                HotelAction::Reservation,
            ),
            HotelAction::Analytics(action) => {
                lift(AnalyticsReducer.reduce(state, action, env), HotelAction::Analytics)
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::fixtures;
    use crate::types::Money;
    use hotel_testing::{ReducerTest, reducer_test::collect_actions};

    #[test]
    fn routes_room_actions_and_clears_previous_error() {
        let mut state = HotelState::default();
        state.last_error = Some(HotelError::Store("stale".into()));

        ReducerTest::new(HotelReducer)
            .with_env(fixtures::env())
            .given_state(state)
            .when_action(HotelAction::Room(RoomAction::Create {
                id: crate::types::RoomId::new(),
                single_beds: 2,
                double_beds: 0,
                price: Money::from_dollars(90),
                description: None,
                product: None,
                income_account: None,
            }))
            .then_state(|state| {
                assert!(state.last_error.is_none());
                assert_eq!(state.rooms.len(), 1);
            })
            .run();
    }

    #[tokio::test]
    async fn committed_events_are_published() {
        let (env, bus) = fixtures::env_with(DomainSettings::default());
        let mut state = HotelState::default();
        let effects = HotelReducer.reduce(
            &mut state,
            ServiceAction::Create {
                id: crate::types::ServiceId::new(),
                name: "Breakfast".into(),
                price: Money::from_dollars(15),
                product: crate::types::ProductId::new(),
                income_account: None,
                color: Some(3),
            }
            .into(),
            &env,
        );

        let feedback = collect_actions(effects.into_vec()).await;
        assert!(feedback.is_empty());
        assert_eq!(bus.event_types(), vec!["ServiceCreated.v1"]);
    }
}
