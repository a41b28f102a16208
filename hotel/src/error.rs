//! Error taxonomy of the hotel manager.
//!
//! Reducers record a [`HotelError`] in `HotelState::last_error` when they
//! reject a command; the service facade turns it into a `Result`.

use crate::types::{GuestId, ReservationId, ReservationStatus, RoomId, ServiceId};
use chrono::NaiveDate;
use hotel_runtime::StoreError;
use thiserror::Error;

/// Any error an operation on the hotel can fail with
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HotelError {
    /// Input rejected by a validation gate
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Master data is incomplete for the operation
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Referenced record does not exist
    #[error("{0} not found")]
    NotFound(Entity),

    /// Workflow state does not allow the operation
    #[error("Cannot {operation} a reservation in state {from}")]
    InvalidTransition {
        /// Attempted operation
        operation: &'static str,
        /// Current state
        from: ReservationStatus,
    },

    /// Runtime refused the action
    #[error("Store unavailable: {0}")]
    Store(String),
}

impl From<StoreError> for HotelError {
    fn from(error: StoreError) -> Self {
        Self::Store(error.to_string())
    }
}

/// Reference to a record, for not-found errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// Room
    Room(RoomId),
    /// Guest
    Guest(GuestId),
    /// Catalog service
    Service(ServiceId),
    /// Reservation
    Reservation(ReservationId),
    /// Service line of a reservation
    ServiceLine(ReservationId, ServiceId),
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Room(id) => write!(f, "Room {id}"),
            Self::Guest(id) => write!(f, "Guest {id}"),
            Self::Service(id) => write!(f, "Service {id}"),
            Self::Reservation(id) => write!(f, "Reservation {id}"),
            Self::ServiceLine(reservation, service) => {
                write!(f, "Service {service} on reservation {reservation}")
            },
        }
    }
}

/// Input rejected by a validation gate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email does not match the accepted pattern
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Phone does not match the accepted pattern
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    /// Minor registered without a parent or guardian
    #[error("A guest under 18 must have a parent or guardian")]
    GuardianRequired,

    /// Guardian reference points nowhere
    #[error("Unknown parent or guardian {0}")]
    UnknownGuardian(GuestId),

    /// Adult registered without any way to identify or reach them
    #[error("An adult guest needs at least one of email, phone number or national ID")]
    ContactRequired,

    /// First or last name is blank
    #[error("Guest first and last name are required")]
    NameRequired,

    /// Score outside 0..=10
    #[error("NPS score must be between 0 and 10, got {0}")]
    NpsOutOfRange(u8),

    /// Check-out not after check-in
    #[error("Check-out ({check_out}) must be after check-in ({check_in})")]
    CheckOutBeforeCheckIn {
        /// Arrival
        check_in: NaiveDate,
        /// Departure
        check_out: NaiveDate,
    },

    /// Check-in before today
    #[error("Check-in date {check_in} is in the past (today is {today})")]
    CheckInInPast {
        /// Arrival
        check_in: NaiveDate,
        /// Current date
        today: NaiveDate,
    },

    /// Booking guest is a minor
    #[error("The booking guest must be at least 18 years old")]
    GuestUnderage,

    /// Room cannot be chosen in its current state
    #[error("Room {number} is {state} and cannot be booked")]
    RoomUnavailable {
        /// Room number
        number: String,
        /// Current room state
        state: &'static str,
    },

    /// Service line quantity of zero
    #[error("Service quantity must be at least 1")]
    ZeroQuantity,

    /// Bed counts whose capacity does not fit a `u32`
    #[error("Room capacity overflows with {single_beds} single and {double_beds} double beds")]
    TooManyBeds {
        /// Single beds
        single_beds: u32,
        /// Double beds
        double_beds: u32,
    },

    /// Companion already on the reservation
    #[error("Guest {0} is already on this reservation")]
    GuestAlreadyOnReservation(GuestId),

    /// Entity id reused
    #[error("{0} already exists")]
    DuplicateId(String),
}

/// Master data is incomplete or the invoice step was already done
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Room or service has no sellable product
    #[error("{0} has no linked product")]
    MissingProduct(String),

    /// Room or service has no income account
    #[error("There is no income account defined for {0}")]
    MissingIncomeAccount(String),

    /// Invoice creation repeated
    #[error("This reservation already has an invoice.")]
    InvoiceAlreadyExists,
}

/// Failures of the loyalty model pipeline
///
/// These never reach callers of the scoring batch; they are logged and the
/// batch is aborted.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Artifact missing or unreadable
    #[error("Cannot read model artifact {path}: {source}")]
    Io {
        /// Configured path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Artifact is not valid JSON for the expected layout
    #[error("Cannot parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    /// Wrong `format` tag
    #[error("Unsupported model format '{0}'")]
    UnsupportedFormat(String),

    /// Version newer than this build understands, or unparsable
    #[error("Unsupported model version '{0}'")]
    UnsupportedVersion(String),

    /// Feature list differs from the one the scorer provides
    #[error("Model expects features {expected:?}, scorer provides {provided:?}")]
    FeatureMismatch {
        /// Features listed in the artifact
        expected: Vec<String>,
        /// Features the scorer computes
        provided: Vec<String>,
    },

    /// Estimator parameters are inconsistent
    #[error("Malformed estimator: {0}")]
    MalformedEstimator(String),

    /// Feature matrix cannot be standardized
    #[error("Cannot scale features: {0}")]
    Scaling(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_error_message_matches_desk_wording() {
        let error = HotelError::from(ConfigurationError::InvoiceAlreadyExists);
        assert_eq!(error.to_string(), "This reservation already has an invoice.");
    }

    #[test]
    fn invalid_transition_names_state() {
        let error = HotelError::InvalidTransition {
            operation: "confirm",
            from: ReservationStatus::Done,
        };
        assert_eq!(error.to_string(), "Cannot confirm a reservation in state done");
    }

    #[test]
    fn store_error_converts() {
        let error = HotelError::from(StoreError::ShutdownInProgress);
        assert!(matches!(error, HotelError::Store(_)));
    }
}
