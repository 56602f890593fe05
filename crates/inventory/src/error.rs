use chrono::NaiveDate;
use thiserror::Error;

use crate::FlightNumber;

/// Errors raised by the seat ledger and capacity counter.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// One or more requested seats are already booked.
    #[error(
        "Seats already booked on flight {flight_number} for {travel_date}: {}",
        .seats.join(", ")
    )]
    SeatUnavailable {
        flight_number: FlightNumber,
        travel_date: NaiveDate,
        seats: Vec<String>,
    },

    /// One or more requested seats do not exist in the seat map.
    #[error(
        "Seats {} not found for flight {flight_number} on {travel_date}. Available seats: {}",
        .seats.join(", "),
        .available.join(", ")
    )]
    UnknownSeats {
        flight_number: FlightNumber,
        travel_date: NaiveDate,
        seats: Vec<String>,
        available: Vec<String>,
    },

    /// The flight's capacity counter cannot cover the request.
    #[error(
        "Insufficient capacity on flight {flight_number}: requested {requested}, available {available}"
    )]
    InsufficientCapacity {
        flight_number: FlightNumber,
        requested: u32,
        available: u32,
    },

    /// A seat map exists with a cardinality different from the flight's seat count.
    #[error(
        "Seat count mismatch for flight {flight_number} on {travel_date}: expected {expected}, found {found}"
    )]
    StateMismatch {
        flight_number: FlightNumber,
        travel_date: NaiveDate,
        expected: u32,
        found: u32,
    },

    /// No capacity counter is registered for the flight.
    #[error("Flight not found: {0}")]
    FlightNotFound(FlightNumber),

    /// The request itself is malformed (empty seat list, zero seats, ...).
    #[error("Invalid inventory request: {0}")]
    InvalidRequest(String),

    /// The inventory back end could not be reached.
    #[error("Inventory unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
