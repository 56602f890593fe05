use chrono::NaiveDate;
use thiserror::Error;

use crate::{FlightNumber, ReservationCode, UserId};

/// Errors raised by booking store back ends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No booking exists for the reservation code.
    #[error("Booking not found: {0}")]
    NotFound(ReservationCode),

    /// A booking with the same reservation code already exists.
    #[error("Duplicate reservation code: {0}")]
    DuplicateCode(ReservationCode),

    /// The user already holds a non-cancelled booking for the flight and date.
    #[error("Duplicate active booking found for this flight/date")]
    DuplicateActiveBooking {
        user_id: UserId,
        flight_number: FlightNumber,
        travel_date: NaiveDate,
    },

    /// The booking was cancelled before.
    #[error("Booking already cancelled: {0}")]
    AlreadyCancelled(ReservationCode),

    /// The store could not be reached.
    #[error("Booking store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for booking store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
