//! # Hotel Testing
//!
//! Testing utilities and helpers for the hotel manager.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `ManualClock`)
//! - An event bus that records everything published to it
//! - The `ReducerTest` Given-When-Then builder and effect assertions
//! - proptest strategies for calendar dates and stays
//!
//! ## Example
//!
//! ```ignore
//! use hotel_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(RoomReducer)
//!     .with_env(test_environment())
//!     .given_state(HotelState::default())
//!     .when_action(RoomAction::Create { .. })
//!     .then_state(|s| assert_eq!(s.rooms.len(), 1))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use hotel_core::environment::Clock;

/// Ergonomic reducer tests
pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::{Duration, NaiveDate};
    use hotel_core::event::{DomainEvent, EventEnvelope};
    use hotel_core::event_bus::{EventBus, EventBusError, EventStream};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use hotel_testing::mocks::FixedClock;
    /// use hotel_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Fixed clock at noon UTC of the given date
        #[must_use]
        pub fn on(date: NaiveDate) -> Self {
            Self::new(date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc())
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// another to the environment.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a manual clock starting at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to noon UTC of `date`
        pub fn set_date(&self, date: NaiveDate) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time = date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc();
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-06-15 12:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-06-15T12:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Event bus that remembers every published event
    ///
    /// Subscriptions are not supported; tests inspect [`RecordingEventBus::published`].
    #[derive(Debug)]
    pub struct RecordingEventBus<E> {
        published: Mutex<Vec<E>>,
    }

    impl<E: DomainEvent> RecordingEventBus<E> {
        /// Create an empty recording bus
        #[must_use]
        pub const fn new() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
            }
        }

        /// Snapshot of everything published so far, in order
        #[must_use]
        pub fn published(&self) -> Vec<E> {
            self.published
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Versioned type names of the published events, in order
        #[must_use]
        pub fn event_types(&self) -> Vec<&'static str> {
            self.published().iter().map(DomainEvent::event_type).collect()
        }
    }

    impl<E: DomainEvent> Default for RecordingEventBus<E> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<E: DomainEvent> EventBus<E> for RecordingEventBus<E> {
        fn publish(&self, event: E) -> Result<u64, EventBusError> {
            let mut published = self.published.lock().unwrap_or_else(PoisonError::into_inner);
            published.push(event);
            Ok(published.len() as u64)
        }

        fn subscribe(&self) -> EventStream<E> {
            Box::pin(futures::stream::empty::<Result<EventEnvelope<E>, EventBusError>>())
        }
    }
}

/// Property-based testing utilities using proptest
pub mod properties {
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    /// Any date within `days` days after `origin`
    pub fn date_after(origin: NaiveDate, days: u32) -> impl Strategy<Value = NaiveDate> {
        (0..=i64::from(days)).prop_map(move |offset| origin + Duration::days(offset))
    }

    /// A `(check_in, check_out)` pair starting within `days` of `origin`
    /// and lasting between 1 and `max_nights` nights
    pub fn stay(
        origin: NaiveDate,
        days: u32,
        max_nights: u32,
    ) -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
        (date_after(origin, days), 1..=i64::from(max_nights.max(1)))
            .prop_map(|(check_in, nights)| (check_in, check_in + Duration::days(nights)))
    }
}

pub use mocks::{FixedClock, ManualClock, RecordingEventBus, test_clock};
