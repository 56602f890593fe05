//! Seat inventory for the flight booking system.
//!
//! Two pieces of mutable shared state live here:
//! - the **seat ledger**, authoritative per-seat occupancy for one flight and
//!   travel date, locked per seat row;
//! - the **capacity counter**, the cached count of free seats per flight,
//!   locked per flight.
//!
//! [`SeatInventory`] is the transactional boundary over both: every
//! reservation debits the counter and every release credits it inside the
//! same local transaction as the seat mutation.

pub mod capacity;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod postgres;
pub mod seat;
pub mod store;

pub use capacity::{CapacityCounter, FlightCapacity};
pub use common::{FlightNumber, ReservationCode};
pub use error::{InventoryError, Result};
pub use ledger::SeatLedger;
pub use memory::InMemorySeatInventory;
pub use postgres::PostgresSeatInventory;
pub use seat::{Seat, SeatMapInit, SeatMapKey, SeatStatus, generate_seat_numbers};
pub use store::{ReleaseResult, SeatInventory, SeatReservation};
