//! Hotel Manager - rooms, guests, reservations, daily analytics and
//! loyalty scoring on the reducer architecture.
//!
//! # Architecture
//!
//! ```text
//! Write side:
//!   HotelService ──action──> Store<HotelState, HotelAction, HotelEnvironment, HotelReducer>
//!                                 │
//!                 ┌───────┬───────┼──────────┬────────────┐
//!                 ▼       ▼       ▼          ▼            ▼
//!               Room    Guest  Service  Reservation   Analytics
//!                 └───────┴───────┴──────────┴────────────┘
//!                                 │  HotelEvent (applied, then published)
//!                                 ▼
//!                           EventBus<HotelEvent>
//!                                 │
//! Read side:                      ▼
//!                        DashboardProjection
//! ```
//!
//! Every command is validated by its reducer, turned into [`HotelEvent`]s,
//! applied to [`HotelState`] (which recomputes derived fields through the
//! [`DependencyGraph`](recompute::DependencyGraph)), and the events are
//! published for subscribers. Rejected commands leave the state untouched
//! and record a [`HotelError`] the service facade returns.
//!
//! # Periodic jobs
//!
//! - `rebuild_analytics`: materializes one [`DailyAnalysis`](types::DailyAnalysis)
//!   per calendar day of the reservation history
//! - `sweep_rooms`: reconciles room states with the reservation calendar
//! - `score_loyalty`: flags loyal guests with a pre-trained classifier

pub mod aggregates;
pub mod analytics;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod jobs;
pub mod loyalty;
pub mod metrics;
pub mod projections;
pub mod recompute;
pub mod repository;
pub mod seed;
pub mod state;
pub mod types;
pub mod validation;

pub use aggregates::{DomainSettings, HotelAction, HotelEnvironment, HotelReducer};
pub use app::HotelService;
pub use config::Config;
pub use error::HotelError;
pub use events::HotelEvent;
pub use state::HotelState;
