//! Ergonomic testing utilities for reducers
//!
//! Given-When-Then builder for reducers, plus helpers to inspect and run the
//! effects a reducer returns.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use hotel_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// When several actions are given, they are reduced in order against the
/// same state and the effect assertions see the effects of the last one.
///
/// # Example
///
/// ```ignore
/// use hotel_testing::ReducerTest;
///
/// ReducerTest::new(GuestReducer)
///     .with_env(test_environment())
///     .given_state(HotelState::default())
///     .when_action(GuestAction::Register { .. })
///     .then_state(|state| assert_eq!(state.guests.len(), 1))
///     .then_effects(|effects| assert_eq!(effects.len(), 1))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to reduce (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions to reduce in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Run effects to completion and collect the actions they feed back.
///
/// `Parallel` children are awaited in declaration order, which keeps the
/// result deterministic for assertions.
pub async fn collect_actions<A: Send + 'static>(effects: Vec<Effect<A>>) -> Vec<A> {
    let mut actions = Vec::new();
    let mut queue: std::collections::VecDeque<Effect<A>> = effects.into();
    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::None => {},
            Effect::Future(fut) => {
                if let Some(action) = fut.await {
                    actions.push(action);
                }
            },
            Effect::Parallel(children) | Effect::Sequential(children) => {
                for (offset, child) in children.into_iter().enumerate() {
                    queue.insert(offset, child);
                }
            },
        }
    }
    actions
}

/// Helper assertions for effects
pub mod assertions {
    use hotel_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotel_core::effect::Effect;
    use hotel_core::reducer::Reducer;
    use hotel_core::{SmallVec, smallvec};

    #[derive(Clone, Debug)]
    struct Occupancy {
        occupied: u32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Desk {
        CheckIn,
        CheckOut,
        Announce,
    }

    struct DeskReducer;

    impl Reducer for DeskReducer {
        type State = Occupancy;
        type Action = Desk;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Occupancy,
            action: Desk,
            _env: &(),
        ) -> SmallVec<[Effect<Desk>; 4]> {
            match action {
                Desk::CheckIn => {
                    state.occupied += 1;
                    smallvec![Effect::Future(Box::pin(async { Some(Desk::Announce) }))]
                },
                Desk::CheckOut => {
                    state.occupied = state.occupied.saturating_sub(1);
                    smallvec![Effect::None]
                },
                Desk::Announce => SmallVec::new(),
            }
        }
    }

    #[test]
    fn reduces_every_action_in_order() {
        ReducerTest::new(DeskReducer)
            .with_env(())
            .given_state(Occupancy { occupied: 0 })
            .when_actions([Desk::CheckIn, Desk::CheckIn, Desk::CheckOut])
            .then_state(|state| assert_eq!(state.occupied, 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn effects_come_from_last_action() {
        ReducerTest::new(DeskReducer)
            .with_env(())
            .given_state(Occupancy { occupied: 0 })
            .when_action(Desk::CheckIn)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[tokio::test]
    async fn collect_actions_flattens_nested_effects() {
        let effects = vec![Effect::merge(vec![
            Effect::Future(Box::pin(async { Some(Desk::CheckIn) })),
            Effect::chain(vec![
                Effect::None,
                Effect::Future(Box::pin(async { Some(Desk::CheckOut) })),
            ]),
        ])];
        assert_eq!(collect_actions(effects).await, vec![Desk::CheckIn, Desk::CheckOut]);
    }
}
