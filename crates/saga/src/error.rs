//! Booking error types.

use booking::StoreError;
use common::{FlightNumber, ReservationCode};
use inventory::InventoryError;
use serde::Serialize;
use thiserror::Error;

use crate::state::BookingSagaState;

/// Stable classification of every booking failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidRequest,
    SeatUnavailable,
    InsufficientCapacity,
    StateMismatch,
    NotFound,
    AccessDenied,
    AlreadyCancelled,
    DownstreamUnavailable,
    /// A storage back end failed in a way callers cannot act on.
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::SeatUnavailable => "SEAT_UNAVAILABLE",
            ErrorKind::InsufficientCapacity => "INSUFFICIENT_CAPACITY",
            ErrorKind::StateMismatch => "STATE_MISMATCH",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AccessDenied => "ACCESS_DENIED",
            ErrorKind::AlreadyCancelled => "ALREADY_CANCELLED",
            ErrorKind::DownstreamUnavailable => "DOWNSTREAM_UNAVAILABLE",
            ErrorKind::Storage => "STORAGE",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while booking or cancelling.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The request failed validation.
    #[error("{0}")]
    InvalidRequest(String),

    /// Seat inventory error.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Booking store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No booking exists for the reservation code.
    #[error("Booking not found: {0}")]
    BookingNotFound(ReservationCode),

    /// The flight catalog has no such flight.
    #[error("Flight not found: {0}")]
    FlightNotFound(FlightNumber),

    /// The caller does not own the booking.
    #[error("Access denied to booking {0}")]
    AccessDenied(ReservationCode),

    /// The booking was cancelled before.
    #[error("Booking already cancelled: {0}")]
    AlreadyCancelled(ReservationCode),

    /// A collaborator (flight catalog, notifier) could not be reached.
    #[error("{service} unavailable: {reason}")]
    DownstreamUnavailable {
        service: &'static str,
        reason: String,
    },

    /// The saga attempted a transition its state machine forbids.
    #[error("Invalid saga transition from {from} to {to}")]
    InvalidTransition {
        from: BookingSagaState,
        to: BookingSagaState,
    },
}

impl BookingError {
    pub fn downstream(service: &'static str, reason: impl Into<String>) -> Self {
        BookingError::DownstreamUnavailable {
            service,
            reason: reason.into(),
        }
    }

    /// Returns the stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            BookingError::Inventory(err) => match err {
                InventoryError::SeatUnavailable { .. } | InventoryError::UnknownSeats { .. } => {
                    ErrorKind::SeatUnavailable
                }
                InventoryError::InsufficientCapacity { .. } => ErrorKind::InsufficientCapacity,
                InventoryError::StateMismatch { .. } => ErrorKind::StateMismatch,
                InventoryError::FlightNotFound(_) => ErrorKind::NotFound,
                InventoryError::InvalidRequest(_) => ErrorKind::InvalidRequest,
                InventoryError::Unavailable(_) => ErrorKind::DownstreamUnavailable,
                InventoryError::Database(_) | InventoryError::Migration(_) => ErrorKind::Storage,
            },
            BookingError::Store(err) => match err {
                StoreError::NotFound(_) => ErrorKind::NotFound,
                StoreError::DuplicateActiveBooking { .. } => ErrorKind::InvalidRequest,
                StoreError::AlreadyCancelled(_) => ErrorKind::AlreadyCancelled,
                StoreError::Unavailable(_) => ErrorKind::DownstreamUnavailable,
                StoreError::DuplicateCode(_)
                | StoreError::Database(_)
                | StoreError::Migration(_) => ErrorKind::Storage,
            },
            BookingError::BookingNotFound(_) | BookingError::FlightNotFound(_) => {
                ErrorKind::NotFound
            }
            BookingError::AccessDenied(_) => ErrorKind::AccessDenied,
            BookingError::AlreadyCancelled(_) => ErrorKind::AlreadyCancelled,
            BookingError::DownstreamUnavailable { .. } => ErrorKind::DownstreamUnavailable,
            BookingError::InvalidTransition { .. } => ErrorKind::StateMismatch,
        }
    }
}

/// Convenience type alias for booking results.
pub type Result<T> = std::result::Result<T, BookingError>;
