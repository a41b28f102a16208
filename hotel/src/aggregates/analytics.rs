//! Analytics reducer: materializes missing daily snapshots.

use super::{HotelEnvironment, commit};
use crate::analytics::{compute_snapshot, corpus_span, missing_days};
use crate::events::HotelEvent;
use crate::state::{HotelState, JobReport};
use hotel_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Analytics operations
#[derive(Clone, Debug)]
pub enum AnalyticsAction {
    /// Create a snapshot for every day of the corpus span that has none.
    /// Existing snapshots are kept, so running it twice creates nothing new.
    Rebuild,
}

/// Reducer for [`AnalyticsAction`]
#[derive(Clone, Debug, Default)]
pub struct AnalyticsReducer;

impl Reducer for AnalyticsReducer {
    type State = HotelState;
    type Action = AnalyticsAction;
    type Environment = HotelEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AnalyticsAction::Rebuild => {
                let Some((window_start, _)) = corpus_span(&*state) else {
                    tracing::info!("No reservations, nothing to analyse");
                    state.last_report = Some(JobReport::Analytics { created: 0 });
                    return SmallVec::new();
                };

                let repo: &HotelState = state;
                let events: Vec<HotelEvent> = missing_days(repo)
                    .into_iter()
                    .map(|day| HotelEvent::SnapshotCreated {
                        snapshot: compute_snapshot(repo, day, window_start),
                    })
                    .collect();

                let created = events.len();
                tracing::info!(created, %window_start, "Analytics rebuilt");
                state.last_report = Some(JobReport::Analytics { created });
                commit(state, events, env)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::fixtures;
    use crate::aggregates::{ReservationAction, ReservationReducer};
    use crate::types::ReservationId;
    use hotel_testing::{ReducerTest, assertions};

    #[test]
    fn rebuild_on_empty_store_creates_nothing() {
        ReducerTest::new(AnalyticsReducer)
            .with_env(fixtures::env())
            .given_state(HotelState::default())
            .when_action(AnalyticsAction::Rebuild)
            .then_state(|state| {
                assert!(state.snapshots.is_empty());
                assert_eq!(state.last_report, Some(JobReport::Analytics { created: 0 }));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn rebuild_fills_span_and_is_idempotent() {
        let mut state = HotelState::default();
        let room = fixtures::room(&mut state, 100);
        let guest = fixtures::guest(&mut state, "Ada", 40);
        let env = fixtures::env();
        let _ = ReservationReducer.reduce(
            &mut state,
            ReservationAction::Create {
                id: ReservationId::new(),
                guest,
                room,
                check_in: fixtures::day(2),
                check_out: fixtures::day(6),
                services: Vec::new(),
            },
            &env,
        );

        ReducerTest::new(AnalyticsReducer)
            .with_env(env)
            .given_state(state)
            .when_actions([AnalyticsAction::Rebuild, AnalyticsAction::Rebuild])
            .then_state(|state| {
                assert_eq!(state.snapshots.len(), 5);
                assert_eq!(state.last_report, Some(JobReport::Analytics { created: 0 }));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
