//! Application layer.
//!
//! [`HotelService`] is the entry point the binaries, the scheduled jobs and
//! the integration tests use. It owns the Store and turns rejected commands
//! into `Result`s.

pub mod service;

pub use service::{
    HotelService, HotelStore, NPS_QUESTION, NewGuest, NewReservation, NewRoom, NewService,
};
