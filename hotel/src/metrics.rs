//! Business metrics for the hotel manager.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `hotel_reservations_total{status}` - Reservations entering each workflow state
//! - `hotel_invoices_total` - Invoices issued
//! - `hotel_invoiced_cents_total` - Invoiced amount in cents
//! - `hotel_guests_registered_total` - Guests registered
//! - `hotel_snapshots_created_total` - Daily analysis snapshots materialized
//! - `hotel_snapshots_invalidated_total` - Snapshots dropped after reservation changes
//! - `hotel_loyalty_scored_total{outcome}` - Guests scored by the loyalty classifier
//! - `hotel_nps_responses_total{category}` - Feedback by promoter/passive/detractor
//!
//! ## Gauges
//! - `hotel_rooms{state}` - Rooms per occupancy state, refreshed by the dashboard
//!
//! ## Histograms
//! - `hotel_loyalty_batch_duration_seconds` - Loyalty scoring run time

use crate::events::HotelEvent;
use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register the descriptions of every business metric.
///
/// Call once at startup, before anything is recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "hotel_reservations_total",
        "Total number of reservations entering each state (draft, confirm, done, cancel)"
    );
    describe_counter!("hotel_invoices_total", "Total number of invoices issued");
    describe_counter!(
        "hotel_invoiced_cents_total",
        "Total invoiced amount in cents"
    );
    describe_counter!(
        "hotel_guests_registered_total",
        "Total number of guests registered"
    );
    describe_counter!(
        "hotel_snapshots_created_total",
        "Total number of daily analysis snapshots created"
    );
    describe_counter!(
        "hotel_snapshots_invalidated_total",
        "Total number of snapshots dropped after reservation changes"
    );
    describe_counter!(
        "hotel_loyalty_scored_total",
        "Total number of guests scored by the loyalty classifier, by outcome"
    );
    describe_counter!(
        "hotel_nps_responses_total",
        "Total number of NPS responses by category"
    );
    describe_gauge!("hotel_rooms", "Current number of rooms per state");
    describe_histogram!(
        "hotel_loyalty_batch_duration_seconds",
        "Time taken to score every guest"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record the counters an applied event contributes to
pub fn record_event(event: &HotelEvent) {
    match event {
        HotelEvent::ReservationCreated { .. } => record_reservation_status("draft"),
        HotelEvent::ReservationStatusChanged { to, .. } => record_reservation_status(to.as_str()),
        HotelEvent::InvoiceCreated { invoice } => record_invoice(invoice.total.cents()),
        HotelEvent::GuestRegistered { .. } => {
            metrics::counter!("hotel_guests_registered_total").increment(1);
        },
        HotelEvent::SnapshotCreated { .. } => {
            metrics::counter!("hotel_snapshots_created_total").increment(1);
        },
        HotelEvent::SnapshotsInvalidated { dates } => {
            metrics::counter!("hotel_snapshots_invalidated_total").increment(dates.len() as u64);
        },
        HotelEvent::NpsRecorded { score, .. } => record_nps(*score),
        _ => {},
    }
}

/// Record a reservation entering `status`
pub fn record_reservation_status(status: &'static str) {
    metrics::counter!("hotel_reservations_total", "status" => status).increment(1);
    tracing::debug!(status, "Recorded reservation status metric");
}

/// Record an issued invoice
pub fn record_invoice(total_cents: u64) {
    metrics::counter!("hotel_invoices_total").increment(1);
    metrics::counter!("hotel_invoiced_cents_total").increment(total_cents);
}

/// Record a feedback score by NPS category
pub fn record_nps(score: u8) {
    let category = match score {
        9.. => "promoter",
        7..=8 => "passive",
        _ => "detractor",
    };
    metrics::counter!("hotel_nps_responses_total", "category" => category).increment(1);
}

/// Record one loyalty classifier run
pub fn record_loyalty_batch(scored: usize, failed: usize, duration_secs: f64) {
    metrics::counter!("hotel_loyalty_scored_total", "outcome" => "scored").increment(scored as u64);
    metrics::counter!("hotel_loyalty_scored_total", "outcome" => "failed").increment(failed as u64);
    metrics::histogram!("hotel_loyalty_batch_duration_seconds").record(duration_secs);
    tracing::debug!(scored, failed, duration_secs, "Recorded loyalty batch metric");
}

/// Update the room gauge of one state
#[allow(clippy::cast_precision_loss)]
pub fn record_room_count(state: &'static str, count: usize) {
    metrics::gauge!("hotel_rooms", "state" => state).set(count as f64);
}
