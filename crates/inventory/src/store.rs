use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{FlightCapacity, FlightNumber, ReservationCode, Result, Seat, SeatMapInit};

/// A request to book specific seats on one flight leg under a reservation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatReservation {
    pub flight_number: FlightNumber,
    pub travel_date: NaiveDate,
    pub seat_numbers: Vec<String>,
    pub reservation_code: ReservationCode,
}

impl SeatReservation {
    pub fn new(
        flight_number: FlightNumber,
        travel_date: NaiveDate,
        seat_numbers: Vec<String>,
        reservation_code: ReservationCode,
    ) -> Self {
        Self {
            flight_number,
            travel_date,
            seat_numbers,
            reservation_code,
        }
    }

    /// Number of seats the reservation debits from the flight's counter.
    pub fn seat_count(&self) -> u32 {
        self.seat_numbers.len() as u32
    }
}

/// Result of releasing a reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseResult {
    /// The seats returned to the pool, across every leg of the reservation.
    pub seats: Vec<Seat>,
}

impl ReleaseResult {
    pub fn seats_released(&self) -> usize {
        self.seats.len()
    }
}

/// Transactional boundary over the seat ledger and the capacity counter.
///
/// Implementations must mutate seats and the counter together: a reservation
/// either books every requested seat *and* debits the counter, or changes
/// nothing. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SeatInventory: Send + Sync {
    /// Creates the capacity counter row for a flight if it does not exist yet.
    async fn register_flight(
        &self,
        flight_number: &FlightNumber,
        total_seats: u32,
    ) -> Result<FlightCapacity>;

    /// Reads the flight's counter.
    async fn capacity(&self, flight_number: &FlightNumber) -> Result<FlightCapacity>;

    /// Materializes the seat map for a flight and date.
    ///
    /// Idempotent when the existing map has `total_seats` seats; fails with
    /// `StateMismatch` when it has a different count.
    async fn initialize(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
        total_seats: u32,
    ) -> Result<SeatMapInit>;

    /// Lists available seat identifiers in lexical order.
    async fn list_available(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<Vec<String>>;

    /// Books every requested seat and debits the counter, all or nothing.
    ///
    /// Seat rows are locked in lexical seat order, then the counter row.
    async fn reserve(&self, reservation: &SeatReservation) -> Result<Vec<Seat>>;

    /// Frees every seat tagged with the code and credits the counter.
    ///
    /// Releasing an unknown or already released code is a no-op.
    async fn release(&self, reservation_code: &ReservationCode) -> Result<ReleaseResult>;

    /// Returns the seats currently held by a reservation code.
    async fn seats_for_reservation(&self, reservation_code: &ReservationCode) -> Result<Vec<Seat>>;

    /// Returns every seat of a seat map, sorted by seat identifier.
    async fn seat_map(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<Vec<Seat>>;
}

#[async_trait]
impl<T: SeatInventory + ?Sized> SeatInventory for Arc<T> {
    async fn register_flight(
        &self,
        flight_number: &FlightNumber,
        total_seats: u32,
    ) -> Result<FlightCapacity> {
        (**self).register_flight(flight_number, total_seats).await
    }

    async fn capacity(&self, flight_number: &FlightNumber) -> Result<FlightCapacity> {
        (**self).capacity(flight_number).await
    }

    async fn initialize(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
        total_seats: u32,
    ) -> Result<SeatMapInit> {
        (**self)
            .initialize(flight_number, travel_date, total_seats)
            .await
    }

    async fn list_available(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<Vec<String>> {
        (**self).list_available(flight_number, travel_date).await
    }

    async fn reserve(&self, reservation: &SeatReservation) -> Result<Vec<Seat>> {
        (**self).reserve(reservation).await
    }

    async fn release(&self, reservation_code: &ReservationCode) -> Result<ReleaseResult> {
        (**self).release(reservation_code).await
    }

    async fn seats_for_reservation(&self, reservation_code: &ReservationCode) -> Result<Vec<Seat>> {
        (**self).seats_for_reservation(reservation_code).await
    }

    async fn seat_map(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<Vec<Seat>> {
        (**self).seat_map(flight_number, travel_date).await
    }
}
