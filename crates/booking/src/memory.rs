use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::{
    Booking, BookingStatus, BookingStore, FlightNumber, ReservationCode, Result, StoreError,
    UserId,
};

#[derive(Debug, Default)]
struct InMemoryBookingState {
    bookings: HashMap<ReservationCode, Booking>,
    fail_on_create: bool,
    fail_on_update: bool,
}

impl InMemoryBookingState {
    fn holds_active(&self, booking: &Booking) -> bool {
        self.bookings.values().any(|b| {
            b.is_owned_by(&booking.user_id)
                && b.flight_number == booking.flight_number
                && b.travel_date == booking.travel_date
                && b.is_active()
        })
    }
}

/// In-memory booking store for tests and the database-less server mode.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    state: Arc<RwLock<InMemoryBookingState>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail every create call.
    pub async fn set_fail_on_create(&self, fail: bool) {
        self.state.write().await.fail_on_create = fail;
    }

    /// Configures the store to fail every status update.
    pub async fn set_fail_on_update(&self, fail: bool) {
        self.state.write().await.fail_on_update = fail;
    }

    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create(&self, booking: &Booking) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_create {
            return Err(StoreError::Unavailable(
                "booking store is not accepting writes".to_string(),
            ));
        }
        if state.bookings.contains_key(&booking.reservation_code) {
            return Err(StoreError::DuplicateCode(booking.reservation_code.clone()));
        }
        if booking.is_active() && state.holds_active(booking) {
            return Err(StoreError::DuplicateActiveBooking {
                user_id: booking.user_id.clone(),
                flight_number: booking.flight_number.clone(),
                travel_date: booking.travel_date,
            });
        }
        state
            .bookings
            .insert(booking.reservation_code.clone(), booking.clone());
        Ok(())
    }

    async fn find_by_code(&self, code: &ReservationCode) -> Result<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(code).cloned())
    }

    async fn find_by_owner(&self, user_id: &UserId) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        let mut owned: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.is_owned_by(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn update_status(
        &self,
        code: &ReservationCode,
        status: BookingStatus,
    ) -> Result<Booking> {
        let mut state = self.state.write().await;
        if state.fail_on_update {
            return Err(StoreError::Unavailable(
                "booking store is not accepting writes".to_string(),
            ));
        }
        let booking = state
            .bookings
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn cancel(&self, code: &ReservationCode) -> Result<Booking> {
        let mut state = self.state.write().await;
        if state.fail_on_update {
            return Err(StoreError::Unavailable(
                "booking store is not accepting writes".to_string(),
            ));
        }
        let booking = state
            .bookings
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        if !booking.status.can_cancel() {
            return Err(StoreError::AlreadyCancelled(code.clone()));
        }
        booking.status = BookingStatus::Cancelled;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn has_active_booking(
        &self,
        user_id: &UserId,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<bool> {
        Ok(self.state.read().await.bookings.values().any(|b| {
            b.is_owned_by(user_id)
                && &b.flight_number == flight_number
                && b.travel_date == travel_date
                && b.is_active()
        }))
    }

    async fn delete(&self, code: &ReservationCode) -> Result<bool> {
        Ok(self.state.write().await.bookings.remove(code).is_some())
    }
}
