//! Service facade over the hotel Store.
//!
//! Each method sends exactly one action, so every operation is applied
//! atomically under the Store's write lock. The outcome is read back under
//! the same lock through `send_and_inspect`.

use crate::aggregates::{
    AnalyticsAction, GuestAction, HotelAction, HotelEnvironment, HotelReducer, ReservationAction,
    RoomAction, ServiceAction,
};
use crate::error::{Entity, HotelError};
use crate::events::HotelEvent;
use crate::loyalty::{LoyaltyClassifier, ScoringOutcome};
use crate::repository::GuestRepository;
use crate::state::{HotelState, JobReport};
use crate::types::{
    AccountId, DailyAnalysis, Guest, GuestId, Invoice, Money, NpsPrompt, ProductId, Reservation,
    ReservationId, Room, RoomId, Service, ServiceId,
};
use chrono::NaiveDate;
use hotel_core::event_bus::EventBus;
use hotel_runtime::{EffectHandle, Store};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The Store type of the hotel
pub type HotelStore = Store<HotelState, HotelAction, HotelEnvironment, HotelReducer>;

/// Question shown to the guest once a stay is completed
pub const NPS_QUESTION: &str =
    "On a scale from 0 to 10, how likely are you to recommend us to a friend or colleague?";

/// Input of [`HotelService::register_guest`]
#[derive(Clone, Debug, Default)]
pub struct NewGuest {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Age in years
    pub age: u32,
    /// Email address
    pub email: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// National identification number
    pub nin: Option<String>,
    /// Country code
    pub country_code: Option<String>,
    /// State code
    pub state_code: Option<String>,
    /// Guardian, required under 18
    pub parent: Option<GuestId>,
}

/// Input of [`HotelService::create_room`]
#[derive(Clone, Debug, Default)]
pub struct NewRoom {
    /// Single beds
    pub single_beds: u32,
    /// Double beds
    pub double_beds: u32,
    /// Nightly price
    pub price: Money,
    /// Free-text description
    pub description: Option<String>,
    /// Sellable product invoiced for the stay
    pub product: Option<ProductId>,
    /// Income account of the room line
    pub income_account: Option<AccountId>,
}

/// Input of [`HotelService::create_service`]
#[derive(Clone, Debug)]
pub struct NewService {
    /// Name
    pub name: String,
    /// Catalog price
    pub price: Money,
    /// Sellable product
    pub product: ProductId,
    /// Income account of service lines
    pub income_account: Option<AccountId>,
    /// Color tag
    pub color: Option<u8>,
}

/// Input of [`HotelService::create_reservation`]
#[derive(Clone, Debug)]
pub struct NewReservation {
    /// Primary guest
    pub guest: GuestId,
    /// Room
    pub room: RoomId,
    /// Check-in date
    pub check_in: NaiveDate,
    /// Check-out date
    pub check_out: NaiveDate,
    /// Services to attach
    pub services: Vec<ServiceId>,
}

/// Hotel operations over a shared Store
#[derive(Clone)]
pub struct HotelService {
    store: HotelStore,
}

impl HotelService {
    /// Wrap an existing Store
    #[must_use]
    pub const fn new(store: HotelStore) -> Self {
        Self { store }
    }

    /// Build a Store over `state` and wrap it
    #[must_use]
    pub fn with_state(state: HotelState, env: HotelEnvironment) -> Self {
        Self::new(Store::new(state, HotelReducer::new(), env))
    }

    /// The underlying Store
    #[must_use]
    pub const fn store(&self) -> &HotelStore {
        &self.store
    }

    /// Bus the applied events are published on
    #[must_use]
    pub fn events(&self) -> Arc<dyn EventBus<HotelEvent>> {
        Arc::clone(&self.store.environment().events)
    }

    /// Stop accepting commands and wait for in-flight effects
    ///
    /// # Errors
    ///
    /// [`HotelError::Store`] when effects are still running after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), HotelError> {
        self.store.shutdown(timeout).await.map_err(HotelError::from)
    }

    /// Send one action and surface the error the reducer recorded
    async fn dispatch(&self, action: impl Into<HotelAction>) -> Result<EffectHandle, HotelError> {
        let (handle, error) = self
            .store
            .send_and_inspect(action.into(), |state| state.last_error.clone())
            .await?;
        error.map_or(Ok(handle), Err)
    }

    /// Send a batch action and read back its report
    async fn dispatch_job(
        &self,
        action: impl Into<HotelAction>,
    ) -> Result<Option<JobReport>, HotelError> {
        let (_handle, (error, report)) = self
            .store
            .send_and_inspect(action.into(), |state| {
                (state.last_error.clone(), state.last_report.clone())
            })
            .await?;
        error.map_or(Ok(report), Err)
    }

    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// Add a room; it starts available
    ///
    /// # Errors
    ///
    /// Rejections recorded by the room reducer, or [`HotelError::Store`].
    pub async fn create_room(&self, room: NewRoom) -> Result<RoomId, HotelError> {
        let id = RoomId::new();
        self.dispatch(RoomAction::Create {
            id,
            single_beds: room.single_beds,
            double_beds: room.double_beds,
            price: room.price,
            description: room.description,
            product: room.product,
            income_account: room.income_account,
        })
        .await?;
        Ok(id)
    }

    /// Change bed counts; capacity follows
    ///
    /// # Errors
    ///
    /// [`HotelError::NotFound`] for an unknown room.
    pub async fn set_beds(
        &self,
        room: RoomId,
        single_beds: u32,
        double_beds: u32,
    ) -> Result<(), HotelError> {
        self.dispatch(RoomAction::SetBeds {
            room,
            single_beds,
            double_beds,
        })
        .await
        .map(drop)
    }

    /// Change the nightly price
    ///
    /// # Errors
    ///
    /// [`HotelError::NotFound`] for an unknown room.
    pub async fn set_room_price(&self, room: RoomId, price: Money) -> Result<(), HotelError> {
        self.dispatch(RoomAction::SetPrice { room, price })
            .await
            .map(drop)
    }

    /// Operator action: mark the room available
    ///
    /// # Errors
    ///
    /// [`HotelError::NotFound`] for an unknown room.
    pub async fn mark_available(&self, room: RoomId) -> Result<(), HotelError> {
        self.dispatch(RoomAction::MarkAvailable { room }).await.map(drop)
    }

    /// Operator action: mark the room reserved
    ///
    /// # Errors
    ///
    /// [`HotelError::NotFound`] for an unknown room.
    pub async fn mark_reserved(&self, room: RoomId) -> Result<(), HotelError> {
        self.dispatch(RoomAction::MarkReserved { room }).await.map(drop)
    }

    /// Operator action: take the room out of service
    ///
    /// # Errors
    ///
    /// [`HotelError::NotFound`] for an unknown room.
    pub async fn mark_under_maintenance(&self, room: RoomId) -> Result<(), HotelError> {
        self.dispatch(RoomAction::MarkUnderMaintenance { room })
            .await
            .map(drop)
    }

    // ------------------------------------------------------------------
    // Guests
    // ------------------------------------------------------------------

    /// Register a guest
    ///
    /// # Errors
    ///
    /// [`HotelError::Validation`] for bad contact data or a missing
    /// guardian.
    pub async fn register_guest(&self, guest: NewGuest) -> Result<GuestId, HotelError> {
        let id = GuestId::new();
        self.dispatch(GuestAction::Register {
            id,
            first_name: guest.first_name,
            last_name: guest.last_name,
            age: guest.age,
            email: guest.email,
            phone: guest.phone,
            nin: guest.nin,
            country_code: guest.country_code,
            state_code: guest.state_code,
            parent: guest.parent,
        })
        .await?;
        Ok(id)
    }

    /// Update a guest's age
    ///
    /// # Errors
    ///
    /// [`HotelError::NotFound`] or [`HotelError::Validation`].
    pub async fn set_guest_age(&self, guest: GuestId, age: u32) -> Result<(), HotelError> {
        self.dispatch(GuestAction::SetAge { guest, age }).await.map(drop)
    }

    /// Set the loyalty flag
    ///
    /// # Errors
    ///
    /// [`HotelError::NotFound`] for an unknown guest.
    pub async fn set_loyalty(&self, guest: GuestId, loyal: bool) -> Result<(), HotelError> {
        self.dispatch(GuestAction::SetLoyalty { guest, loyal })
            .await
            .map(drop)
    }

    // ------------------------------------------------------------------
    // Service catalog
    // ------------------------------------------------------------------

    /// Add a catalog service
    ///
    /// # Errors
    ///
    /// Rejections recorded by the service reducer.
    pub async fn create_service(&self, service: NewService) -> Result<ServiceId, HotelError> {
        let id = ServiceId::new();
        self.dispatch(ServiceAction::Create {
            id,
            name: service.name,
            price: service.price,
            product: service.product,
            income_account: service.income_account,
            color: service.color,
        })
        .await?;
        Ok(id)
    }

    /// Change a catalog price; existing lines keep theirs
    ///
    /// # Errors
    ///
    /// [`HotelError::NotFound`] for an unknown service.
    pub async fn set_service_price(&self, service: ServiceId, price: Money) -> Result<(), HotelError> {
        self.dispatch(ServiceAction::SetPrice { service, price })
            .await
            .map(drop)
    }

    // ------------------------------------------------------------------
    // Reservations
    // ------------------------------------------------------------------

    /// Create a draft reservation and reserve its room
    ///
    /// # Errors
    ///
    /// [`HotelError::Validation`] for bad dates, an underage guest or an
    /// unavailable room; [`HotelError::NotFound`] for unknown references.
    #[tracing::instrument(skip(self, request), fields(room = %request.room))]
    pub async fn create_reservation(
        &self,
        request: NewReservation,
    ) -> Result<ReservationId, HotelError> {
        let id = ReservationId::new();
        self.dispatch(ReservationAction::Create {
            id,
            guest: request.guest,
            room: request.room,
            check_in: request.check_in,
            check_out: request.check_out,
            services: request.services,
        })
        .await?;
        Ok(id)
    }

    /// Replace the attached services
    ///
    /// # Errors
    ///
    /// [`HotelError::InvalidTransition`] once done or cancelled.
    pub async fn update_services(
        &self,
        reservation: ReservationId,
        services: Vec<ServiceId>,
    ) -> Result<(), HotelError> {
        self.dispatch(ReservationAction::UpdateServices {
            reservation,
            services,
        })
        .await
        .map(drop)
    }

    /// Change the quantity of one service line
    ///
    /// # Errors
    ///
    /// [`HotelError::Validation`] for a zero quantity,
    /// [`HotelError::NotFound`] when the line does not exist.
    pub async fn set_service_quantity(
        &self,
        reservation: ReservationId,
        service: ServiceId,
        quantity: u32,
    ) -> Result<(), HotelError> {
        self.dispatch(ReservationAction::SetServiceQuantity {
            reservation,
            service,
            quantity,
        })
        .await
        .map(drop)
    }

    /// Add a companion guest line
    ///
    /// # Errors
    ///
    /// [`HotelError::NotFound`] or [`HotelError::InvalidTransition`].
    pub async fn add_companion(
        &self,
        reservation: ReservationId,
        guest: GuestId,
    ) -> Result<(), HotelError> {
        self.dispatch(ReservationAction::AddCompanion { reservation, guest })
            .await
            .map(drop)
    }

    /// Move the stay dates
    ///
    /// # Errors
    ///
    /// [`HotelError::Validation`] for bad dates.
    pub async fn reschedule(
        &self,
        reservation: ReservationId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<(), HotelError> {
        self.dispatch(ReservationAction::Reschedule {
            reservation,
            check_in,
            check_out,
        })
        .await
        .map(drop)
    }

    /// draft → confirm
    ///
    /// # Errors
    ///
    /// [`HotelError::InvalidTransition`] from any other state.
    pub async fn confirm(&self, reservation: ReservationId) -> Result<(), HotelError> {
        self.dispatch(ReservationAction::Confirm { reservation })
            .await
            .map(drop)
    }

    /// draft, confirm → cancel, releasing the room
    ///
    /// # Errors
    ///
    /// [`HotelError::InvalidTransition`] from done or cancel.
    pub async fn cancel(&self, reservation: ReservationId) -> Result<(), HotelError> {
        self.dispatch(ReservationAction::Cancel { reservation })
            .await
            .map(drop)
    }

    /// confirm, cancel → draft
    ///
    /// # Errors
    ///
    /// [`HotelError::InvalidTransition`], or [`HotelError::Validation`] when
    /// the room of a cancelled reservation was taken meanwhile.
    pub async fn reset_to_draft(&self, reservation: ReservationId) -> Result<(), HotelError> {
        self.dispatch(ReservationAction::ResetToDraft { reservation })
            .await
            .map(drop)
    }

    /// confirm → done with its invoice; returns the NPS prompt
    ///
    /// # Errors
    ///
    /// [`HotelError::InvalidTransition`] unless confirmed,
    /// [`HotelError::Configuration`] when the invoice cannot be built. On
    /// failure nothing changes.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, reservation: ReservationId) -> Result<NpsPrompt, HotelError> {
        let (_handle, outcome) = self
            .store
            .send_and_inspect(
                ReservationAction::Complete { reservation }.into(),
                |state| match &state.last_error {
                    Some(error) => Err(error.clone()),
                    None => nps_prompt(state, reservation),
                },
            )
            .await?;
        let prompt = outcome?;
        tracing::info!(number = %prompt.number, "Reservation completed");
        Ok(prompt)
    }

    /// Issue the invoice of a reservation on its own
    ///
    /// # Errors
    ///
    /// [`HotelError::Configuration`] when it already has one or master data
    /// is incomplete.
    pub async fn create_invoice(&self, reservation: ReservationId) -> Result<Invoice, HotelError> {
        let (_handle, outcome) = self
            .store
            .send_and_inspect(
                ReservationAction::CreateInvoice { reservation }.into(),
                |state| match &state.last_error {
                    Some(error) => Err(error.clone()),
                    None => state
                        .reservations
                        .get(&reservation)
                        .and_then(|r| r.invoice)
                        .and_then(|id| state.invoices.get(&id))
                        .cloned()
                        .ok_or(HotelError::NotFound(Entity::Reservation(reservation))),
                },
            )
            .await?;
        outcome
    }

    /// Capture the guest's feedback on a done reservation
    ///
    /// # Errors
    ///
    /// [`HotelError::Validation`] for a score above 10.
    pub async fn record_nps(
        &self,
        reservation: ReservationId,
        score: u8,
        feedback: Option<String>,
    ) -> Result<(), HotelError> {
        self.dispatch(ReservationAction::RecordNps {
            reservation,
            score,
            feedback,
        })
        .await
        .map(drop)
    }

    // ------------------------------------------------------------------
    // Batch jobs
    // ------------------------------------------------------------------

    /// Create the missing daily snapshots; returns how many were created
    ///
    /// # Errors
    ///
    /// [`HotelError::Store`] when the Store is shutting down.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_analytics(&self) -> Result<usize, HotelError> {
        let created = match self.dispatch_job(AnalyticsAction::Rebuild).await? {
            Some(JobReport::Analytics { created }) => created,
            _ => 0,
        };
        tracing::info!(created, "Analytics rebuild finished");
        Ok(created)
    }

    /// Reconcile room states with the calendar
    ///
    /// # Errors
    ///
    /// [`HotelError::Store`] when the Store is shutting down.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_rooms(&self) -> Result<JobReport, HotelError> {
        let report = self
            .dispatch_job(RoomAction::Sweep)
            .await?
            .unwrap_or(JobReport::Sweep {
                reserved: 0,
                released: 0,
            });
        tracing::info!(?report, "Room sweep finished");
        Ok(report)
    }

    /// Score every guest with the model at `model_path`
    ///
    /// Never fails: model errors abort the batch and are reported in the
    /// outcome, write-back errors skip the guest.
    #[tracing::instrument(skip(self, model_path), fields(model = %model_path.as_ref().display()))]
    pub async fn score_loyalty(&self, model_path: impl AsRef<Path>) -> ScoringOutcome {
        let started = std::time::Instant::now();
        let guests: Vec<Guest> = self
            .store
            .state(|state| state.all_guests().into_iter().cloned().collect())
            .await;

        let predicted = LoyaltyClassifier::load(model_path).and_then(|classifier| {
            let batch: Vec<&Guest> = guests.iter().collect();
            let labels = classifier.predict(&batch)?;
            Ok((classifier.version().to_string(), labels))
        });
        let (model_version, labels) = match predicted {
            Ok(predicted) => predicted,
            Err(error) => {
                tracing::error!(error = %error, guests = guests.len(), "Loyalty scoring aborted");
                return ScoringOutcome::aborted(guests.len(), &error);
            },
        };

        let mut outcome = ScoringOutcome {
            guests: guests.len(),
            model_version: Some(model_version),
            ..ScoringOutcome::default()
        };
        for (guest, loyal) in labels {
            match self.set_loyalty(guest, loyal).await {
                Ok(()) => outcome.scored += 1,
                Err(error) => {
                    tracing::warn!(guest = %guest, error = %error, "Loyalty write-back failed");
                    outcome.failed += 1;
                },
            }
        }

        crate::metrics::record_loyalty_batch(
            outcome.scored,
            outcome.failed,
            started.elapsed().as_secs_f64(),
        );
        tracing::info!(scored = outcome.scored, failed = outcome.failed, "Loyalty scoring finished");
        outcome
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Run `f` against the current state
    pub async fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&HotelState) -> T,
    {
        self.store.state(f).await
    }

    /// Room by ID
    pub async fn room(&self, id: RoomId) -> Option<Room> {
        self.read(|state| state.rooms.get(&id).cloned()).await
    }

    /// Guest by ID
    pub async fn guest(&self, id: GuestId) -> Option<Guest> {
        self.read(|state| state.guests.get(&id).cloned()).await
    }

    /// Catalog service by ID
    pub async fn service(&self, id: ServiceId) -> Option<Service> {
        self.read(|state| state.services.get(&id).cloned()).await
    }

    /// Reservation by ID
    pub async fn reservation(&self, id: ReservationId) -> Option<Reservation> {
        self.read(|state| state.reservations.get(&id).cloned()).await
    }

    /// Invoice of a reservation
    pub async fn invoice_for(&self, reservation: ReservationId) -> Option<Invoice> {
        self.read(|state| {
            state
                .reservations
                .get(&reservation)
                .and_then(|r| r.invoice)
                .and_then(|id| state.invoices.get(&id))
                .cloned()
        })
        .await
    }

    /// Every snapshot, oldest first
    pub async fn snapshots(&self) -> Vec<DailyAnalysis> {
        self.read(|state| state.snapshots.values().cloned().collect())
            .await
    }
}

fn nps_prompt(state: &HotelState, reservation: ReservationId) -> Result<NpsPrompt, HotelError> {
    let record = state
        .reservations
        .get(&reservation)
        .ok_or(HotelError::NotFound(Entity::Reservation(reservation)))?;
    let guest_name = state
        .guests
        .get(&record.guest)
        .map(|guest| guest.name.clone())
        .unwrap_or_default();
    Ok(NpsPrompt {
        reservation,
        number: record.number.clone(),
        guest_name,
        question: NPS_QUESTION.to_string(),
    })
}
