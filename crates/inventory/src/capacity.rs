//! Aggregate available-seat counter per flight.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::error::{InventoryError, Result};
use crate::FlightNumber;

/// Snapshot of one flight's counter row.
///
/// Invariant: `available_seats <= total_seats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightCapacity {
    pub total_seats: u32,
    pub available_seats: u32,
}

impl FlightCapacity {
    /// A counter row with every seat free.
    pub fn full(total_seats: u32) -> Self {
        Self {
            total_seats,
            available_seats: total_seats,
        }
    }

    /// Number of seats currently debited.
    pub fn booked_seats(&self) -> u32 {
        self.total_seats - self.available_seats
    }

    /// Decrements the counter by `n`, refusing to go below zero.
    pub fn debit(&mut self, flight_number: &FlightNumber, n: u32) -> Result<()> {
        if self.available_seats < n {
            return Err(InventoryError::InsufficientCapacity {
                flight_number: flight_number.clone(),
                requested: n,
                available: self.available_seats,
            });
        }
        self.available_seats -= n;
        Ok(())
    }

    /// Increments the counter by `n`, clamped to `total_seats`.
    pub fn credit(&mut self, n: u32) {
        self.available_seats = self
            .available_seats
            .saturating_add(n)
            .min(self.total_seats);
    }
}

type CounterRow = Arc<Mutex<FlightCapacity>>;

/// In-memory capacity counter with one exclusive lock per flight row.
#[derive(Debug, Default)]
pub struct CapacityCounter {
    rows: RwLock<HashMap<FlightNumber, CounterRow>>,
}

impl CapacityCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the counter row for a flight with every seat available.
    ///
    /// Registering an existing flight leaves its row untouched.
    pub async fn register(&self, flight_number: &FlightNumber, total_seats: u32) -> FlightCapacity {
        let row = {
            let mut rows = self.rows.write().await;
            rows.entry(flight_number.clone())
                .or_insert_with(|| Arc::new(Mutex::new(FlightCapacity::full(total_seats))))
                .clone()
        };
        *row.lock().await
    }

    /// Returns the current counter values.
    pub async fn get(&self, flight_number: &FlightNumber) -> Result<FlightCapacity> {
        let row = self.row(flight_number).await?;
        let capacity = *row.lock().await;
        Ok(capacity)
    }

    /// Acquires the flight's counter lock.
    ///
    /// The guard is the transaction: mutate through it and drop it to commit.
    pub async fn lock(&self, flight_number: &FlightNumber) -> Result<OwnedMutexGuard<FlightCapacity>> {
        let row = self.row(flight_number).await?;
        Ok(row.lock_owned().await)
    }

    /// Debits `n` seats from the flight's counter.
    pub async fn debit(&self, flight_number: &FlightNumber, n: u32) -> Result<FlightCapacity> {
        let mut row = self.lock(flight_number).await?;
        row.debit(flight_number, n)?;
        Ok(*row)
    }

    /// Credits `n` seats back to the flight's counter.
    pub async fn credit(&self, flight_number: &FlightNumber, n: u32) -> Result<FlightCapacity> {
        let mut row = self.lock(flight_number).await?;
        row.credit(n);
        Ok(*row)
    }

    async fn row(&self, flight_number: &FlightNumber) -> Result<CounterRow> {
        self.rows
            .read()
            .await
            .get(flight_number)
            .cloned()
            .ok_or_else(|| InventoryError::FlightNotFound(flight_number.clone()))
    }
}
