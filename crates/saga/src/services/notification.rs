//! Booking notifications.
//!
//! Delivery is fire-and-forget from the saga's point of view: a failed
//! notification is logged and counted, never rolled back.

use std::sync::Arc;

use async_trait::async_trait;
use booking::{Booking, BookingStatus, MealPreference, TripKind};
use chrono::{DateTime, NaiveDate, Utc};
use common::{FlightNumber, ReservationCode};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{BookingError, Result};
use crate::services::catalog::FlightDetails;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    BookingConfirmed,
    BookingCancelled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingConfirmed => "BOOKING_CONFIRMED",
            NotificationKind::BookingCancelled => "BOOKING_CANCELLED",
        }
    }
}

/// Payload sent to the contact address of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingNotification {
    pub kind: NotificationKind,
    pub reservation_code: ReservationCode,
    pub contact_email: String,
    pub passenger_name: String,
    pub meal_preference: Option<MealPreference>,
    pub trip_kind: TripKind,
    pub flight_number: FlightNumber,
    pub travel_date: NaiveDate,
    /// Route and schedule; absent when the catalog could not be reached.
    pub airline: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub seats: Vec<String>,
    pub return_seats: Vec<String>,
    pub status: BookingStatus,
}

impl BookingNotification {
    /// Builds the payload for a booking, enriched with the outbound flight when known.
    pub fn for_booking(
        kind: NotificationKind,
        booking: &Booking,
        flight: Option<&FlightDetails>,
    ) -> Self {
        let primary = booking.primary_passenger();
        Self {
            kind,
            reservation_code: booking.reservation_code.clone(),
            contact_email: booking.contact_email.clone(),
            passenger_name: primary.map(|p| p.name.clone()).unwrap_or_default(),
            meal_preference: primary.map(|p| p.meal_preference),
            trip_kind: booking.trip_kind,
            flight_number: booking.flight_number.clone(),
            travel_date: booking.travel_date,
            airline: flight.map(|f| f.airline.clone()),
            source: flight.map(|f| f.source.clone()),
            destination: flight.map(|f| f.destination.clone()),
            departure_time: flight.map(|f| f.departure_time),
            arrival_time: flight.map(|f| f.arrival_time),
            seats: booking.seat_numbers(),
            return_seats: booking.return_seat_numbers(),
            status: booking.status,
        }
    }
}

/// Sends booking notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &BookingNotification) -> Result<()>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn notify(&self, notification: &BookingNotification) -> Result<()> {
        (**self).notify(notification).await
    }
}

/// Notifier that writes every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<()> {
        tracing::info!(
            kind = notification.kind.as_str(),
            reservation_code = %notification.reservation_code,
            contact_email = %notification.contact_email,
            flight_number = %notification.flight_number,
            seats = ?notification.seats,
            "booking notification"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<BookingNotification>,
    fail_on_notify: bool,
}

/// Notifier that records what it was asked to send.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail every call.
    pub async fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().await.fail_on_notify = fail;
    }

    /// Notifications accepted so far, oldest first.
    pub async fn sent(&self) -> Vec<BookingNotification> {
        self.state.read().await.sent.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_notify {
            return Err(BookingError::downstream("notifier", "simulated outage"));
        }
        state.sent.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use booking::{Gender, Passenger};
    use common::UserId;

    use super::*;

    fn booking() -> Booking {
        Booking::new(
            ReservationCode::new("ABCD1234"),
            FlightNumber::new("AB100"),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            UserId::new("u1"),
            "asha@example.com",
            vec![
                Passenger::new("Asha", Gender::Female, MealPreference::Veg, "1A"),
                Passenger::new("Ravi", Gender::Male, MealPreference::NonVeg, "1B"),
            ],
        )
        .with_status(BookingStatus::Confirmed)
    }

    #[test]
    fn test_payload_without_flight_details() {
        let notification =
            BookingNotification::for_booking(NotificationKind::BookingCancelled, &booking(), None);
        assert_eq!(notification.passenger_name, "Asha");
        assert_eq!(notification.meal_preference, Some(MealPreference::Veg));
        assert_eq!(notification.seats, ["1A", "1B"]);
        assert!(notification.airline.is_none());
        assert!(notification.return_seats.is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_notifier_records() {
        let notifier = InMemoryNotifier::new();
        let notification =
            BookingNotification::for_booking(NotificationKind::BookingConfirmed, &booking(), None);
        notifier.notify(&notification).await.unwrap();

        notifier.set_fail_on_notify(true).await;
        assert!(notifier.notify(&notification).await.is_err());

        assert_eq!(notifier.sent().await.len(), 1);
    }
}
