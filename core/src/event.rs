//! Domain event trait and envelope.
//!
//! Domain events are immutable facts about things that have happened in the
//! hotel: a reservation was confirmed, a snapshot was created, a guest was
//! scored as loyal. Reducers emit them after mutating state; the event bus
//! carries them to subscribers such as the dashboard projection.
//!
//! # Example
//!
//! ```
//! use hotel_core::event::DomainEvent;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! enum RoomEvent {
//!     RoomCreated { number: String },
//!     RoomFreed { number: String },
//! }
//!
//! impl DomainEvent for RoomEvent {
//!     fn event_type(&self) -> &'static str {
//!         match self {
//!             RoomEvent::RoomCreated { .. } => "RoomCreated.v1",
//!             RoomEvent::RoomFreed { .. } => "RoomFreed.v1",
//!         }
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),
}

/// An immutable fact emitted by a reducer.
///
/// The `event_type()` method returns a stable identifier that includes a
/// version suffix (`"ReservationConfirmed.v1"`) so subscribers can evolve
/// independently of the emitting code.
pub trait DomainEvent: Clone + Send + Sync + 'static {
    /// Returns the versioned event type identifier.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to JSON for logs and exports.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SerializationError`] if the event cannot be serialized.
    fn to_json(&self) -> Result<String, EventError>
    where
        Self: Serialize,
    {
        serde_json::to_string(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }
}

/// A published event together with its position in the bus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    /// Monotonic sequence number assigned at publish time (starts at 1)
    pub sequence: u64,
    /// The event itself
    pub event: E,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    enum Sample {
        Happened { id: u32 },
    }

    impl DomainEvent for Sample {
        fn event_type(&self) -> &'static str {
            "Happened.v1"
        }
    }

    #[test]
    fn to_json_includes_variant_name() {
        let json = Sample::Happened { id: 3 }.to_json().unwrap();
        assert!(json.contains("Happened"));
        assert!(json.contains('3'));
        assert_eq!(Sample::Happened { id: 3 }.event_type(), "Happened.v1");
    }
}
