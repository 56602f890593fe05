//! Collaborators the booking saga calls out to.

pub mod catalog;
pub mod notification;

pub use catalog::{FlightCatalog, FlightDetails, InMemoryFlightCatalog, PostgresFlightCatalog};
pub use notification::{
    BookingNotification, InMemoryNotifier, LogNotifier, NotificationKind, Notifier,
};
