//! Event bus abstraction for propagating domain events.
//!
//! Reducers never call subscribers directly. They return an effect that
//! publishes the events they applied; the bus fans each event out to every
//! subscriber (dashboard projection, audit logging, tests).
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │   Reducer   │────>│  Event Bus  │────>│  Dashboard   │
//! │ (applies +  │     │ (broadcast) │     │  projection  │
//! │  emits)     │     └──────┬──────┘     └──────────────┘
//! └─────────────┘            │
//!                            └──────────> other subscribers
//! ```
//!
//! # Key Principles
//!
//! - **In-order per publisher**: events from one reducer call arrive in the
//!   order they were applied
//! - **Best effort for slow subscribers**: a subscriber that falls behind the
//!   channel capacity receives [`EventBusError::Lagged`] and keeps going
//! - **Publishing never blocks**: with no subscribers the event is dropped

use crate::event::{DomainEvent, EventEnvelope};
use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    /// The subscriber fell behind and missed events
    #[error("Subscriber lagged behind and skipped {0} events")]
    Lagged(u64),

    /// The bus has been closed
    #[error("Event bus closed")]
    Closed,
}

/// Stream of events from a subscription.
pub type EventStream<E> =
    Pin<Box<dyn Stream<Item = Result<EventEnvelope<E>, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// # Dyn Compatibility
///
/// The trait is object safe so environments can hold `Arc<dyn EventBus<E>>`
/// and reducers can capture it inside `Effect::Future`.
pub trait EventBus<E: DomainEvent>: Send + Sync {
    /// Publish an event to every current subscriber.
    ///
    /// Returns the sequence number assigned to the event.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::Closed`] if the bus no longer accepts events.
    fn publish(&self, event: E) -> Result<u64, EventBusError>;

    /// Subscribe to all events published from now on.
    fn subscribe(&self) -> EventStream<E>;
}

/// In-process event bus backed by a tokio broadcast channel.
///
/// # Example
///
/// ```ignore
/// let bus = InMemoryEventBus::<HotelEvent>::new(256);
/// let mut stream = bus.subscribe();
/// bus.publish(HotelEvent::SnapshotCreated { date, revpar })?;
/// let envelope = stream.next().await;
/// ```
#[derive(Debug)]
pub struct InMemoryEventBus<E> {
    sender: broadcast::Sender<EventEnvelope<E>>,
    sequence: AtomicU64,
}

impl<E: DomainEvent> InMemoryEventBus<E> {
    /// Create a bus whose subscribers buffer up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: AtomicU64::new(0),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: DomainEvent> Default for InMemoryEventBus<E> {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl<E: DomainEvent> EventBus<E> for InMemoryEventBus<E> {
    fn publish(&self, event: E) -> Result<u64, EventBusError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(sequence, event_type = event.event_type(), "Publishing event");

        // A send error only means nobody is listening right now
        if self.sender.send(EventEnvelope { sequence, event }).is_err() {
            tracing::trace!(sequence, "No subscribers, event dropped");
        }
        Ok(sequence)
    }

    fn subscribe(&self) -> EventStream<E> {
        let receiver = self.sender.subscribe();
        Box::pin(futures::stream::unfold(receiver, |mut receiver| async move {
            match receiver.recv().await {
                Ok(envelope) => Some((Ok(envelope), receiver)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    Some((Err(EventBusError::Lagged(skipped)), receiver))
                },
                Err(broadcast::error::RecvError::Closed) => None,
            }
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Ping(u32);

    impl DomainEvent for Ping {
        fn event_type(&self) -> &'static str {
            "Ping.v1"
        }
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let bus = InMemoryEventBus::new(16);
        let mut stream = bus.subscribe();

        bus.publish(Ping(1)).unwrap();
        bus.publish(Ping(2)).unwrap();

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.event, Ping(1));
        assert_eq!(second.event, Ping(2));
        assert!(first.sequence < second.sequence);
    }

    #[test]
    fn publishing_without_subscribers_still_assigns_sequence() {
        let bus = InMemoryEventBus::new(4);
        assert_eq!(bus.publish(Ping(1)).unwrap(), 1);
        assert_eq!(bus.publish(Ping(2)).unwrap(), 2);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_sees_lag() {
        let bus = InMemoryEventBus::new(2);
        let mut stream = bus.subscribe();
        for n in 0..5 {
            bus.publish(Ping(n)).unwrap();
        }
        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(EventBusError::Lagged(_))));
    }
}
