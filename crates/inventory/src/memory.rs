use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    CapacityCounter, FlightCapacity, FlightNumber, InventoryError, ReservationCode, Result, Seat,
    SeatLedger, SeatMapInit, SeatMapKey,
    store::{ReleaseResult, SeatInventory, SeatReservation},
};

/// In-memory seat inventory.
///
/// Seat rows and counter rows each carry their own async mutex, so this
/// implementation has the same locking behavior as the PostgreSQL one:
/// seat rows first in lexical order, then the flight's counter row.
#[derive(Clone, Default)]
pub struct InMemorySeatInventory {
    ledger: Arc<SeatLedger>,
    capacity: Arc<CapacityCounter>,
    fail_on_release: Arc<AtomicBool>,
}

impl InMemorySeatInventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the inventory to fail every release call.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.fail_on_release.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of booked seats in a seat map.
    pub async fn booked_count(&self, flight_number: &FlightNumber, travel_date: NaiveDate) -> usize {
        let key = SeatMapKey::new(flight_number.clone(), travel_date);
        self.ledger
            .seats(&key)
            .await
            .iter()
            .filter(|seat| !seat.is_available())
            .count()
    }
}

#[async_trait]
impl SeatInventory for InMemorySeatInventory {
    async fn register_flight(
        &self,
        flight_number: &FlightNumber,
        total_seats: u32,
    ) -> Result<FlightCapacity> {
        Ok(self.capacity.register(flight_number, total_seats).await)
    }

    async fn capacity(&self, flight_number: &FlightNumber) -> Result<FlightCapacity> {
        self.capacity.get(flight_number).await
    }

    #[tracing::instrument(skip(self))]
    async fn initialize(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
        total_seats: u32,
    ) -> Result<SeatMapInit> {
        let key = SeatMapKey::new(flight_number.clone(), travel_date);
        self.ledger.initialize(&key, total_seats).await
    }

    async fn list_available(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<Vec<String>> {
        let key = SeatMapKey::new(flight_number.clone(), travel_date);
        Ok(self.ledger.list_available(&key).await)
    }

    #[tracing::instrument(skip(self, reservation), fields(
        flight_number = %reservation.flight_number,
        travel_date = %reservation.travel_date,
        reservation_code = %reservation.reservation_code,
    ))]
    async fn reserve(&self, reservation: &SeatReservation) -> Result<Vec<Seat>> {
        let key = SeatMapKey::new(reservation.flight_number.clone(), reservation.travel_date);
        let locked = self
            .ledger
            .lock_available(&key, &reservation.seat_numbers)
            .await?;

        let mut counter = self.capacity.lock(&reservation.flight_number).await?;
        counter.debit(&reservation.flight_number, locked.len() as u32)?;

        let booked = self
            .ledger
            .book(locked, &reservation.reservation_code)
            .await;
        drop(counter);
        tracing::debug!(seats = booked.len(), "seats booked");
        Ok(booked)
    }

    #[tracing::instrument(skip(self))]
    async fn release(&self, reservation_code: &ReservationCode) -> Result<ReleaseResult> {
        if self.fail_on_release.load(Ordering::SeqCst) {
            return Err(InventoryError::Unavailable(
                "seat inventory is not accepting releases".to_string(),
            ));
        }

        let locked = self.ledger.lock_reserved(reservation_code).await;
        if locked.is_empty() {
            return Ok(ReleaseResult::default());
        }

        // Take every counter lock before mutating anything.
        let mut counters = Vec::new();
        for (flight_number, released) in locked.seats_per_flight() {
            counters.push((released, self.capacity.lock(&flight_number).await?));
        }
        for (released, counter) in counters.iter_mut() {
            counter.credit(*released);
        }

        let seats = self.ledger.free(locked, reservation_code).await;
        drop(counters);
        tracing::debug!(released = seats.len(), "seats returned to the pool");
        Ok(ReleaseResult { seats })
    }

    async fn seats_for_reservation(&self, reservation_code: &ReservationCode) -> Result<Vec<Seat>> {
        Ok(self.ledger.seats_for_reservation(reservation_code).await)
    }

    async fn seat_map(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<Vec<Seat>> {
        let key = SeatMapKey::new(flight_number.clone(), travel_date);
        Ok(self.ledger.seats(&key).await)
    }
}
