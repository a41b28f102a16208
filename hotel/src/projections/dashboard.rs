//! Front-desk dashboard projection.
//!
//! Keeps the figures the dashboard shows: reservation count, today's
//! movements, NPS breakdown, room states, service popularity and the
//! latest analysis snapshot. Every reservation counts, whatever its state.

use super::Projection;
use crate::events::HotelEvent;
use crate::state::HotelState;
use crate::types::{
    DailyAnalysis, ReservationId, ReservationStatus, RoomId, RoomState, ServiceId,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
struct StayView {
    check_in: NaiveDate,
    check_out: NaiveDate,
    status: ReservationStatus,
    services: Vec<ServiceId>,
    nps: Option<u8>,
}

/// NPS figures over every reservation with feedback
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NpsBreakdown {
    /// Scores 9 and 10
    pub promoters: u32,
    /// Scores 7 and 8
    pub passives: u32,
    /// Scores 0 to 6
    pub detractors: u32,
    /// %promoters − %detractors, rounded; 0 without feedback
    pub score: i32,
}

impl NpsBreakdown {
    /// Classify `scores`
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_scores(scores: impl IntoIterator<Item = u8>) -> Self {
        let mut breakdown = Self::default();
        for score in scores {
            match score {
                9.. => breakdown.promoters += 1,
                7..=8 => breakdown.passives += 1,
                _ => breakdown.detractors += 1,
            }
        }
        let total = breakdown.promoters + breakdown.passives + breakdown.detractors;
        if total > 0 {
            let net = f64::from(breakdown.promoters) - f64::from(breakdown.detractors);
            breakdown.score = (net / f64::from(total) * 100.0).round() as i32;
        }
        breakdown
    }
}

/// Rooms per occupancy state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RoomCounts {
    /// Available rooms
    pub available: usize,
    /// Reserved rooms
    pub reserved: usize,
    /// Rooms under maintenance
    pub under_maintenance: usize,
}

/// Number of reservations using a service
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServicePopularity {
    /// Service
    pub service: ServiceId,
    /// Service name
    pub name: String,
    /// Reservations with the service attached
    pub reservations: usize,
}

/// Everything the dashboard shows for one day
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Date the movements are counted for
    pub today: NaiveDate,
    /// All reservations
    pub reservations: usize,
    /// Reservations checking in today
    pub check_ins: usize,
    /// Reservations checking out today
    pub check_outs: usize,
    /// Reservations in house today, check-out day included
    pub in_house: usize,
    /// Feedback breakdown
    pub nps: NpsBreakdown,
    /// Room states
    pub rooms: RoomCounts,
    /// Services, most used first
    pub services: Vec<ServicePopularity>,
    /// Most recent daily analysis
    pub latest_snapshot: Option<DailyAnalysis>,
}

/// Dashboard read model
#[derive(Clone, Debug, Default)]
pub struct DashboardProjection {
    stays: BTreeMap<ReservationId, StayView>,
    rooms: BTreeMap<RoomId, RoomState>,
    services: BTreeMap<ServiceId, String>,
    snapshots: BTreeMap<NaiveDate, DailyAnalysis>,
}

impl DashboardProjection {
    /// Creates an empty `DashboardProjection`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the view from the current entity store
    #[must_use]
    pub fn from_state(state: &HotelState) -> Self {
        Self {
            stays: state
                .reservations
                .values()
                .map(|r| {
                    (
                        r.id,
                        StayView {
                            check_in: r.check_in,
                            check_out: r.check_out,
                            status: r.status,
                            services: r.services.clone(),
                            nps: r.nps,
                        },
                    )
                })
                .collect(),
            rooms: state.rooms.values().map(|room| (room.id, room.state)).collect(),
            services: state
                .services
                .values()
                .map(|service| (service.id, service.name.clone()))
                .collect(),
            snapshots: state.snapshots.clone(),
        }
    }

    /// Room counts per state
    #[must_use]
    pub fn room_counts(&self) -> RoomCounts {
        let mut counts = RoomCounts::default();
        for state in self.rooms.values() {
            match state {
                RoomState::Available => counts.available += 1,
                RoomState::Reserved => counts.reserved += 1,
                RoomState::UnderMaintenance => counts.under_maintenance += 1,
            }
        }
        counts
    }

    /// Refresh the `hotel_rooms` gauges
    pub fn publish_room_gauges(&self) {
        let counts = self.room_counts();
        crate::metrics::record_room_count(RoomState::Available.as_str(), counts.available);
        crate::metrics::record_room_count(RoomState::Reserved.as_str(), counts.reserved);
        crate::metrics::record_room_count(
            RoomState::UnderMaintenance.as_str(),
            counts.under_maintenance,
        );
    }

    /// Reservations per workflow state
    #[must_use]
    pub fn status_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for stay in self.stays.values() {
            *counts.entry(stay.status.as_str()).or_default() += 1;
        }
        counts
    }

    /// Summary for `today`
    #[must_use]
    pub fn summary(&self, today: NaiveDate) -> DashboardSummary {
        let stays = self.stays.values();
        let mut services: Vec<ServicePopularity> = self
            .services
            .iter()
            .map(|(id, name)| ServicePopularity {
                service: *id,
                name: name.clone(),
                reservations: self
                    .stays
                    .values()
                    .filter(|stay| stay.services.contains(id))
                    .count(),
            })
            .collect();
        services.sort_by(|a, b| {
            b.reservations
                .cmp(&a.reservations)
                .then_with(|| a.name.cmp(&b.name))
        });

        DashboardSummary {
            today,
            reservations: self.stays.len(),
            check_ins: stays.clone().filter(|s| s.check_in == today).count(),
            check_outs: stays.clone().filter(|s| s.check_out == today).count(),
            in_house: stays
                .clone()
                .filter(|s| s.check_in <= today && today <= s.check_out)
                .count(),
            nps: NpsBreakdown::from_scores(stays.filter_map(|s| s.nps)),
            rooms: self.room_counts(),
            services,
            latest_snapshot: self.snapshots.values().next_back().cloned(),
        }
    }
}

impl Projection for DashboardProjection {
    fn handle_event(&mut self, event: &HotelEvent) {
        match event {
            HotelEvent::RoomCreated { room } => {
                self.rooms.insert(room.id, room.state);
                self.publish_room_gauges();
            },
            HotelEvent::RoomStateChanged { room, to, .. } => {
                self.rooms.insert(*room, *to);
                self.publish_room_gauges();
            },
            HotelEvent::ServiceCreated { service } => {
                self.services.insert(service.id, service.name.clone());
            },
            HotelEvent::ReservationCreated { reservation } => {
                self.stays.insert(
                    reservation.id,
                    StayView {
                        check_in: reservation.check_in,
                        check_out: reservation.check_out,
                        status: reservation.status,
                        services: reservation.services.clone(),
                        nps: reservation.nps,
                    },
                );
            },
            HotelEvent::ReservationServicesUpdated {
                reservation,
                services,
                ..
            } => {
                if let Some(stay) = self.stays.get_mut(reservation) {
                    stay.services.clone_from(services);
                }
            },
            HotelEvent::ReservationRescheduled {
                reservation,
                check_in,
                check_out,
            } => {
                if let Some(stay) = self.stays.get_mut(reservation) {
                    stay.check_in = *check_in;
                    stay.check_out = *check_out;
                }
            },
            HotelEvent::ReservationStatusChanged {
                reservation, to, ..
            } => {
                if let Some(stay) = self.stays.get_mut(reservation) {
                    stay.status = *to;
                }
            },
            HotelEvent::NpsRecorded {
                reservation, score, ..
            } => {
                if let Some(stay) = self.stays.get_mut(reservation) {
                    stay.nps = Some(*score);
                }
            },
            HotelEvent::SnapshotCreated { snapshot } => {
                self.snapshots
                    .entry(snapshot.date)
                    .or_insert_with(|| snapshot.clone());
            },
            HotelEvent::SnapshotsInvalidated { dates } => {
                for date in dates {
                    self.snapshots.remove(date);
                }
            },
            _ => {},
        }
    }

    fn name(&self) -> &'static str {
        "dashboard"
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
