//! Read side of the hotel.
//!
//! Projections consume the [`HotelEvent`]s published on the event bus and
//! keep denormalized views that can be queried without taking the Store
//! lock.

pub mod dashboard;

pub use dashboard::{DashboardProjection, DashboardSummary, NpsBreakdown, RoomCounts};

use crate::events::HotelEvent;
use futures::StreamExt;
use hotel_core::event_bus::{EventBus, EventBusError};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A view built from domain events
pub trait Projection: Send + Sync {
    /// Fold one event into the view
    fn handle_event(&mut self, event: &HotelEvent);

    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Drop everything, for rebuilding from scratch
    fn reset(&mut self);
}

/// Feed a projection from the bus until `shutdown` flips to `true` or the
/// bus closes.
///
/// A lagging subscription is logged and keeps going; the view may then miss
/// events until it is rebuilt.
pub fn spawn_projection<P>(
    projection: Arc<RwLock<P>>,
    bus: &Arc<dyn EventBus<HotelEvent>>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    P: Projection + 'static,
{
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                },
                next = events.next() => match next {
                    Some(Ok(envelope)) => match projection.write() {
                        Ok(mut view) => view.handle_event(&envelope.event),
                        Err(_) => {
                            tracing::error!("Projection lock poisoned, stopping");
                            break;
                        },
                    },
                    Some(Err(EventBusError::Lagged(skipped))) => {
                        tracing::warn!(skipped, "Projection lagged behind the event bus");
                    },
                    Some(Err(EventBusError::Closed)) | None => break,
                },
            }
        }
        if let Ok(view) = projection.read() {
            tracing::info!(projection = view.name(), "Projection stopped");
        }
    })
}
