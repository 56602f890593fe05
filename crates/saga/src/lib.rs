//! Booking saga for the flight seat inventory.
//!
//! The orchestrator drives a booking through these steps:
//! 1. Validate the request and resolve every flight leg in the catalog
//! 2. Ensure the seat map exists and verify the requested seats are free
//! 3. Reserve the seats and debit the flight's counter (one local transaction per leg)
//! 4. Persist the confirmed booking
//! 5. Notify the contact address (best effort)
//!
//! A failure after seats are reserved releases them before the error surfaces.

pub mod error;
pub mod orchestrator;
pub mod request;
pub mod services;
pub mod state;
pub mod summary;

pub use error::{BookingError, ErrorKind, Result};
pub use orchestrator::BookingOrchestrator;
pub use request::{CreateBookingRequest, Identity, PassengerRequest, ReturnLegRequest};
pub use services::{
    BookingNotification, FlightCatalog, FlightDetails, InMemoryFlightCatalog, InMemoryNotifier,
    LogNotifier, NotificationKind, Notifier, PostgresFlightCatalog,
};
pub use state::BookingSagaState;
pub use summary::{BookingConfirmation, BookingSummary, CancellationResult, PassengerSummary};
