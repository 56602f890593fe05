use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{Booking, BookingStatus, FlightNumber, ReservationCode, Result, UserId};

/// Durable storage for bookings and their passengers.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persists a new booking together with its passengers.
    ///
    /// Fails with `DuplicateCode` if the reservation code is taken, and with
    /// `DuplicateActiveBooking` if the owner already holds a non-cancelled
    /// booking for the same flight and date. Both checks are atomic with the write.
    async fn create(&self, booking: &Booking) -> Result<()>;

    async fn find_by_code(&self, code: &ReservationCode) -> Result<Option<Booking>>;

    /// Returns every booking owned by the user, newest first.
    async fn find_by_owner(&self, user_id: &UserId) -> Result<Vec<Booking>>;

    /// Sets the booking's status and bumps `updated_at`.
    async fn update_status(&self, code: &ReservationCode, status: BookingStatus)
    -> Result<Booking>;

    /// Marks the booking CANCELLED unless it already is.
    ///
    /// Fails with `AlreadyCancelled` when the booking was cancelled before,
    /// including by a concurrent caller. Exactly one caller wins.
    async fn cancel(&self, code: &ReservationCode) -> Result<Booking>;

    /// Returns true if the user holds a non-cancelled booking for the flight and date.
    async fn has_active_booking(
        &self,
        user_id: &UserId,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<bool>;

    /// Deletes a booking and its passengers. Returns false if nothing was deleted.
    async fn delete(&self, code: &ReservationCode) -> Result<bool>;
}

#[async_trait]
impl<T: BookingStore + ?Sized> BookingStore for Arc<T> {
    async fn create(&self, booking: &Booking) -> Result<()> {
        (**self).create(booking).await
    }

    async fn find_by_code(&self, code: &ReservationCode) -> Result<Option<Booking>> {
        (**self).find_by_code(code).await
    }

    async fn find_by_owner(&self, user_id: &UserId) -> Result<Vec<Booking>> {
        (**self).find_by_owner(user_id).await
    }

    async fn update_status(
        &self,
        code: &ReservationCode,
        status: BookingStatus,
    ) -> Result<Booking> {
        (**self).update_status(code, status).await
    }

    async fn cancel(&self, code: &ReservationCode) -> Result<Booking> {
        (**self).cancel(code).await
    }

    async fn has_active_booking(
        &self,
        user_id: &UserId,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<bool> {
        (**self)
            .has_active_booking(user_id, flight_number, travel_date)
            .await
    }

    async fn delete(&self, code: &ReservationCode) -> Result<bool> {
        (**self).delete(code).await
    }
}
