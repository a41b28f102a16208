//! Fixture loading.
//!
//! A seed file describes rooms, guests, services and reservations in JSON.
//! Records reference each other by a local `key`; stay dates are given as
//! offsets from today so a fixture stays valid whatever day it is loaded.
//! Everything goes through [`HotelService`], so fixtures are validated like
//! any other input.

use crate::app::{HotelService, NewGuest, NewReservation, NewRoom, NewService};
use crate::error::HotelError;
use crate::types::{
    AccountId, GuestId, Money, ProductId, ReservationStatus, RoomId, ServiceId,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors while loading a seed file
#[derive(Error, Debug)]
pub enum SeedError {
    /// File missing or unreadable
    #[error("Cannot read seed file {path}: {source}")]
    Io {
        /// Path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Not valid fixture JSON
    #[error("Cannot parse seed file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A record references a key defined nowhere earlier in the file
    #[error("Unknown {kind} key '{key}'")]
    UnknownKey {
        /// Record family
        kind: &'static str,
        /// Referenced key
        key: String,
    },

    /// An operation was rejected
    #[error("Seed record '{key}' rejected: {source}")]
    Rejected {
        /// Key of the record
        key: String,
        /// Rejection
        #[source]
        source: HotelError,
    },
}

/// Contents of a seed file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedFile {
    /// Rooms
    pub rooms: Vec<SeedRoom>,
    /// Guests; guardians must come before their wards
    pub guests: Vec<SeedGuest>,
    /// Catalog services
    pub services: Vec<SeedService>,
    /// Reservations
    pub reservations: Vec<SeedReservation>,
}

fn yes() -> bool {
    true
}

/// Room fixture
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedRoom {
    /// Local key
    pub key: String,
    /// Single beds
    #[serde(default)]
    pub single_beds: u32,
    /// Double beds
    #[serde(default)]
    pub double_beds: u32,
    /// Nightly price in cents
    pub price: Money,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Link a product and an income account
    #[serde(default = "yes")]
    pub invoiceable: bool,
}

/// Guest fixture
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedGuest {
    /// Local key
    pub key: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Age
    pub age: u32,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Phone
    #[serde(default)]
    pub phone: Option<String>,
    /// National identification number
    #[serde(default)]
    pub nin: Option<String>,
    /// Country code
    #[serde(default)]
    pub country_code: Option<String>,
    /// Key of the guardian
    #[serde(default)]
    pub parent: Option<String>,
    /// Initial loyalty flag
    #[serde(default)]
    pub loyal: bool,
}

/// Service fixture
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedService {
    /// Local key
    pub key: String,
    /// Name
    pub name: String,
    /// Catalog price in cents
    pub price: Money,
    /// Color tag
    #[serde(default)]
    pub color: Option<u8>,
    /// Link an income account
    #[serde(default = "yes")]
    pub invoiceable: bool,
}

/// Reservation fixture
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedReservation {
    /// Local key, for error messages
    pub key: String,
    /// Guest key
    pub guest: String,
    /// Room key
    pub room: String,
    /// Check-in, in days from today
    #[serde(default)]
    pub check_in_in_days: u32,
    /// Length of stay
    pub nights: u32,
    /// Service keys
    #[serde(default)]
    pub services: Vec<String>,
    /// Companion guest keys
    #[serde(default)]
    pub companions: Vec<String>,
    /// Workflow state to drive the reservation to
    #[serde(default = "draft")]
    pub status: ReservationStatus,
    /// Feedback score, for done reservations
    #[serde(default)]
    pub nps: Option<u8>,
}

const fn draft() -> ReservationStatus {
    ReservationStatus::Draft
}

/// Records created by a seed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    /// Rooms
    pub rooms: usize,
    /// Guests
    pub guests: usize,
    /// Services
    pub services: usize,
    /// Reservations
    pub reservations: usize,
}

impl SeedFile {
    /// Read a seed file
    ///
    /// # Errors
    ///
    /// [`SeedError::Io`] or [`SeedError::Parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn lookup<T: Copy>(
    keys: &HashMap<String, T>,
    kind: &'static str,
    key: &str,
) -> Result<T, SeedError> {
    keys.get(key).copied().ok_or_else(|| SeedError::UnknownKey {
        kind,
        key: key.to_string(),
    })
}

fn rejected(key: &str) -> impl FnOnce(HotelError) -> SeedError + '_ {
    move |source| SeedError::Rejected {
        key: key.to_string(),
        source,
    }
}

/// Create every record of `seed`, in file order
///
/// # Errors
///
/// Stops at the first unknown key or rejected record; records created
/// before it stay.
#[tracing::instrument(skip_all)]
pub async fn apply(service: &HotelService, seed: &SeedFile) -> Result<SeedSummary, SeedError> {
    let mut rooms: HashMap<String, RoomId> = HashMap::new();
    let mut guests: HashMap<String, GuestId> = HashMap::new();
    let mut services: HashMap<String, ServiceId> = HashMap::new();

    for room in &seed.rooms {
        let id = service
            .create_room(NewRoom {
                single_beds: room.single_beds,
                double_beds: room.double_beds,
                price: room.price,
                description: room.description.clone(),
                product: room.invoiceable.then(ProductId::new),
                income_account: room.invoiceable.then(AccountId::new),
            })
            .await
            .map_err(rejected(&room.key))?;
        rooms.insert(room.key.clone(), id);
    }

    for guest in &seed.guests {
        let parent = guest
            .parent
            .as_deref()
            .map(|key| lookup(&guests, "guest", key))
            .transpose()?;
        let id = service
            .register_guest(NewGuest {
                first_name: guest.first_name.clone(),
                last_name: guest.last_name.clone(),
                age: guest.age,
                email: guest.email.clone(),
                phone: guest.phone.clone(),
                nin: guest.nin.clone(),
                country_code: guest.country_code.clone(),
                state_code: None,
                parent,
            })
            .await
            .map_err(rejected(&guest.key))?;
        if guest.loyal {
            service
                .set_loyalty(id, true)
                .await
                .map_err(rejected(&guest.key))?;
        }
        guests.insert(guest.key.clone(), id);
    }

    for item in &seed.services {
        let id = service
            .create_service(NewService {
                name: item.name.clone(),
                price: item.price,
                product: ProductId::new(),
                income_account: item.invoiceable.then(AccountId::new),
                color: item.color,
            })
            .await
            .map_err(rejected(&item.key))?;
        services.insert(item.key.clone(), id);
    }

    let today = service.store().environment().clock.today();
    for fixture in &seed.reservations {
        let check_in = today + Duration::days(i64::from(fixture.check_in_in_days));
        let attached = fixture
            .services
            .iter()
            .map(|key| lookup(&services, "service", key))
            .collect::<Result<Vec<_>, _>>()?;
        let id = service
            .create_reservation(NewReservation {
                guest: lookup(&guests, "guest", &fixture.guest)?,
                room: lookup(&rooms, "room", &fixture.room)?,
                check_in,
                check_out: check_in + Duration::days(i64::from(fixture.nights)),
                services: attached,
            })
            .await
            .map_err(rejected(&fixture.key))?;

        for companion in &fixture.companions {
            let guest = lookup(&guests, "guest", companion)?;
            service
                .add_companion(id, guest)
                .await
                .map_err(rejected(&fixture.key))?;
        }

        match fixture.status {
            ReservationStatus::Draft => {},
            ReservationStatus::Confirm => {
                service.confirm(id).await.map_err(rejected(&fixture.key))?;
            },
            ReservationStatus::Cancel => {
                service.cancel(id).await.map_err(rejected(&fixture.key))?;
            },
            ReservationStatus::Done => {
                service.confirm(id).await.map_err(rejected(&fixture.key))?;
                service.complete(id).await.map_err(rejected(&fixture.key))?;
                if let Some(score) = fixture.nps {
                    service
                        .record_nps(id, score, None)
                        .await
                        .map_err(rejected(&fixture.key))?;
                }
            },
        }
    }

    let summary = SeedSummary {
        rooms: rooms.len(),
        guests: guests.len(),
        services: services.len(),
        reservations: seed.reservations.len(),
    };
    tracing::info!(?summary, "Seed data loaded");
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let json = r#"{
            "rooms": [{ "key": "101", "double_beds": 1, "price": 12000 }],
            "reservations": [{ "key": "a", "guest": "ada", "room": "101", "nights": 2 }]
        }"#;
        let Ok(seed) = serde_json::from_str::<SeedFile>(json) else {
            panic!("fixture should parse");
        };
        assert!(seed.rooms[0].invoiceable);
        assert_eq!(seed.rooms[0].price, Money::from_dollars(120));
        assert!(seed.guests.is_empty());
        assert_eq!(seed.reservations[0].status, ReservationStatus::Draft);
        assert_eq!(seed.reservations[0].check_in_in_days, 0);
    }

    #[test]
    fn unknown_key_names_the_family() {
        let keys: HashMap<String, RoomId> = HashMap::new();
        let Err(error) = lookup(&keys, "room", "404") else {
            panic!("lookup should fail");
        };
        assert_eq!(error.to_string(), "Unknown room key '404'");
    }
}
