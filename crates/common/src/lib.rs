//! Identifiers shared across the flight booking workspace.

pub mod types;

pub use types::{FlightNumber, ReservationCode, UserId};
