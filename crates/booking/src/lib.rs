//! Booking records and their durable store.
//!
//! The store holds no business rules: ownership, cancellation rules and seat
//! bookkeeping belong to the booking orchestrator.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod status;
pub mod store;
pub mod value_objects;

pub use common::{FlightNumber, ReservationCode, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryBookingStore;
pub use model::{Booking, Passenger, ReturnLeg};
pub use postgres::PostgresBookingStore;
pub use status::BookingStatus;
pub use store::BookingStore;
pub use value_objects::{Gender, MealPreference, Money, TripKind};
