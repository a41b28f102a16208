//! Domain types for the hotel manager.
//!
//! Identifiers, money, workflow states and the entity records kept in the
//! [`HotelState`](crate::state::HotelState) entity store.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a room
    RoomId
);
entity_id!(
    /// Unique identifier for a guest
    GuestId
);
entity_id!(
    /// Unique identifier for a catalog service
    ServiceId
);
entity_id!(
    /// Unique identifier for a reservation
    ReservationId
);
entity_id!(
    /// Unique identifier for an invoice
    InvoiceId
);
entity_id!(
    /// Sellable product an invoice line is booked against
    ProductId
);
entity_id!(
    /// Income account an invoice line is booked to
    AccountId
);

// ============================================================================
// Money
// ============================================================================

/// Monetary amount in cents
///
/// Arithmetic saturates instead of wrapping; hotel amounts never get close
/// to the limit.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole dollars
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Difference, floored at zero
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Multiply by a quantity (nights, units)
    #[must_use]
    pub const fn multiply(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }

    /// Divide into `parts`, rounding half up; zero when `parts` is zero
    #[must_use]
    pub const fn divide(self, parts: u32) -> Self {
        if parts == 0 {
            return Self(0);
        }
        let parts = parts as u64;
        Self(self.0.saturating_add(parts / 2) / parts)
    }

    /// Amount in currency units as a float, for ratios and model features
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl std::ops::Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Workflow states
// ============================================================================

/// Occupancy state of a room
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    /// Free to be booked
    Available,
    /// Held by a reservation
    Reserved,
    /// Taken out of service by an operator
    UnderMaintenance,
}

impl RoomState {
    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::UnderMaintenance => "under_maintenance",
        }
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reservation workflow state
///
/// ```text
/// draft ──confirm──> confirm ──complete──> done
///   │  <──reset────    │
///   └──cancel──> cancel <┘
///        └──reset──> draft
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Being prepared
    Draft,
    /// Confirmed with the guest
    Confirm,
    /// Stay completed and invoiced
    Done,
    /// Cancelled
    Cancel,
}

impl ReservationStatus {
    /// Stable lowercase name, used as metric label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirm => "confirm",
            Self::Done => "done",
            Self::Cancel => "cancel",
        }
    }

    /// Draft or confirm: the reservation still holds its room
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Draft | Self::Confirm)
    }

    /// Counted in revenue and occupied-room figures
    #[must_use]
    pub const fn is_billable(self) -> bool {
        !matches!(self, Self::Draft | Self::Cancel)
    }

    /// Counted in a guest's CRM metrics
    #[must_use]
    pub const fn counts_as_stay(self) -> bool {
        matches!(self, Self::Confirm | Self::Done)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A bookable room
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Room ID
    pub id: RoomId,
    /// Sequential number (`ROOM/0001`)
    pub number: String,
    /// Number of single beds
    pub single_beds: u32,
    /// Number of double beds
    pub double_beds: u32,
    /// Derived: singles + 2 × doubles
    pub capacity: u32,
    /// Nightly price
    pub price: Money,
    /// Free-text description
    pub description: Option<String>,
    /// Sellable product used on invoices
    pub product: Option<ProductId>,
    /// Income account used on invoices
    pub income_account: Option<AccountId>,
    /// Occupancy state
    pub state: RoomState,
}

/// Derived customer-relationship metrics of a guest
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CrmMetrics {
    /// Reservations in confirm or done
    pub previous_reservations: u32,
    /// Σ total price ÷ previous reservations
    pub average_spend_per_stay: Money,
    /// Counted reservations checking in during the current year
    pub annual_stay_frequency: u32,
    /// Average lifespan minus age, floored at zero
    pub remaining_healthspan: u32,
    /// Customer lifetime value
    pub clv: Money,
}

/// A hotel guest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    /// Guest ID
    pub id: GuestId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Display name, deduplicated with a ` (n)` suffix
    pub name: String,
    /// Age in years
    pub age: u32,
    /// Email address
    pub email: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// National identification number
    pub nin: Option<String>,
    /// ISO country code
    pub country_code: Option<String>,
    /// State or province code
    pub state_code: Option<String>,
    /// Parent or guardian, required under 18
    pub parent: Option<GuestId>,
    /// Loyalty flag (classifier output or operator override)
    pub loyal: bool,
    /// Derived CRM metrics
    pub metrics: CrmMetrics,
}

impl Guest {
    /// `"First Last"` without any dedup suffix
    #[must_use]
    pub fn base_name(&self) -> String {
        base_name(&self.first_name, &self.last_name)
    }

    /// Adult guests may book reservations and need contact data
    #[must_use]
    pub const fn is_adult(&self) -> bool {
        self.age >= ADULT_AGE
    }
}

/// Age from which a guest is an adult
pub const ADULT_AGE: u32 = 18;

/// Join first and last name the way display names are built
#[must_use]
pub fn base_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
}

/// A sellable extra (breakfast, spa, parking)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Service ID
    pub id: ServiceId,
    /// Display name
    pub name: String,
    /// Catalog price per unit
    pub price: Money,
    /// Sellable product
    pub product: ProductId,
    /// Income account used on invoices
    pub income_account: Option<AccountId>,
    /// Color tag for boards
    pub color: Option<u8>,
}

/// Guest attached to a reservation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuestLine {
    /// Guest
    pub guest: GuestId,
    /// Display name at the time of attachment
    pub name: String,
    /// Age at the time of attachment
    pub age: u32,
    /// The booking guest
    pub primary: bool,
}

/// Service booked on a reservation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceLine {
    /// Catalog service
    pub service: ServiceId,
    /// Service name at line creation
    pub name: String,
    /// Units, at least 1
    pub quantity: u32,
    /// Catalog price captured at line creation
    pub price_unit: Money,
    /// Derived: quantity × unit price
    pub total_price: Money,
}

impl ServiceLine {
    /// One unit of `service` at its current catalog price
    #[must_use]
    pub fn for_service(service: &Service) -> Self {
        Self {
            service: service.id,
            name: service.name.clone(),
            quantity: 1,
            price_unit: service.price,
            total_price: service.price,
        }
    }
}

/// A reservation of a room by a guest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation ID
    pub id: ReservationId,
    /// Sequential number (`RES/00001`)
    pub number: String,
    /// Booking guest
    pub guest: GuestId,
    /// Booked room
    pub room: RoomId,
    /// Arrival date
    pub check_in: NaiveDate,
    /// Departure date
    pub check_out: NaiveDate,
    /// Attached service set
    pub services: Vec<ServiceId>,
    /// Service lines
    pub service_lines: Vec<ServiceLine>,
    /// Guest lines, primary guest first
    pub guest_lines: Vec<GuestLine>,
    /// Workflow state
    pub status: ReservationStatus,
    /// Derived: check-out minus check-in in days
    pub nights: u32,
    /// Derived: Σ service line totals
    pub services_total: Money,
    /// Derived: room price × nights + services total
    pub total_price: Money,
    /// Derived: adult guest lines
    pub num_adults: u32,
    /// Derived: child guest lines
    pub num_kids: u32,
    /// Invoice, created at most once
    pub invoice: Option<InvoiceId>,
    /// Net promoter score, once captured
    pub nps: Option<u8>,
    /// Free-text feedback
    pub feedback: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Whether the reservation checks in during the given calendar year
    #[must_use]
    pub fn checks_in_during(&self, year: i32) -> bool {
        self.check_in.year() == year
    }
}

/// Invoice kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    /// Customer invoice
    OutInvoice,
}

/// A line of an invoice
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Line label
    pub description: String,
    /// Product booked
    pub product: ProductId,
    /// Income account
    pub account: AccountId,
    /// Quantity
    pub quantity: u32,
    /// Unit price
    pub price_unit: Money,
    /// quantity × unit price
    pub subtotal: Money,
}

/// Customer invoice for a reservation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice ID
    pub id: InvoiceId,
    /// Sequential number (`INV/00001`)
    pub number: String,
    /// Invoiced reservation
    pub reservation: ReservationId,
    /// Invoiced guest
    pub guest: GuestId,
    /// Invoice date
    pub date: NaiveDate,
    /// Kind
    pub kind: InvoiceKind,
    /// Lines: room first, then services
    pub lines: Vec<InvoiceLine>,
    /// Σ line subtotals
    pub total: Money,
}

/// Pre-aggregated KPIs for one calendar day
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyAnalysis {
    /// Snapshot date
    pub date: NaiveDate,
    /// Distinct guests ÷ reservations in the window, as a percentage
    pub repeated_guest_pct: f64,
    /// Σ room charges of billable window reservations
    pub room_revenue: Money,
    /// Σ service totals of billable window reservations
    pub other_revenue: Money,
    /// Rooms in the available state
    pub available_rooms: u32,
    /// Billable window reservations
    pub occupied_rooms: u32,
    /// Revenue per available room
    pub revpar: f64,
    /// Average daily rate
    pub adr: f64,
    /// Guests flagged loyal
    pub loyal_guests: u32,
    /// Reserved rooms ÷ available rooms, as a percentage
    pub occupancy_rate: f64,
    /// Total revenue per available room
    pub trevpar: f64,
}

/// Follow-up question sent once a stay is completed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpsPrompt {
    /// Completed reservation
    pub reservation: ReservationId,
    /// Reservation number
    pub number: String,
    /// Guest display name
    pub guest_name: String,
    /// Question shown to the guest
    pub question: String,
}
