//! In-memory seat ledger with one exclusive lock per seat row.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::error::{InventoryError, Result};
use crate::seat::{Seat, SeatMapInit, SeatMapKey, SeatStatus, generate_seat_numbers, lock_order};
use crate::{FlightNumber, ReservationCode};

#[derive(Debug, Clone, Default)]
struct SeatRow {
    status: SeatStatus,
    reservation_code: Option<ReservationCode>,
}

type SeatCell = Arc<Mutex<SeatRow>>;

/// Seat rows locked by one operation.
///
/// Dropping the value without calling [`LockedSeats::book`] or
/// [`LockedSeats::free`] releases the locks and leaves every row untouched.
#[derive(Debug)]
pub struct LockedSeats {
    rows: Vec<(SeatMapKey, String, OwnedMutexGuard<SeatRow>)>,
}

impl LockedSeats {
    /// Number of locked rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of locked rows per flight, in flight order.
    pub fn seats_per_flight(&self) -> BTreeMap<FlightNumber, u32> {
        let mut counts = BTreeMap::new();
        for (key, _, _) in &self.rows {
            *counts.entry(key.flight_number.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn snapshot(key: &SeatMapKey, seat_number: &str, row: &SeatRow) -> Seat {
        Seat {
            flight_number: key.flight_number.clone(),
            travel_date: key.travel_date,
            seat_number: seat_number.to_string(),
            status: row.status,
            reservation_code: row.reservation_code.clone(),
        }
    }
}

/// Authoritative per-seat occupancy for every (flight, travel date) pair.
///
/// Seat maps are materialized once and never shrink. Every multi-seat
/// operation locks its rows in lexical seat order, and rows spanning several
/// maps in `(flight, date, seat)` order.
#[derive(Debug, Default)]
pub struct SeatLedger {
    maps: RwLock<HashMap<SeatMapKey, BTreeMap<String, SeatCell>>>,
    tags: Mutex<HashMap<ReservationCode, BTreeSet<(SeatMapKey, String)>>>,
}

impl SeatLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes the seat map for `key` unless it already exists.
    pub async fn initialize(&self, key: &SeatMapKey, total_seats: u32) -> Result<SeatMapInit> {
        if total_seats == 0 {
            return Err(InventoryError::InvalidRequest(format!(
                "flight {} has no seats to initialize",
                key.flight_number
            )));
        }

        let mut maps = self.maps.write().await;
        if let Some(existing) = maps.get(key) {
            let found = existing.len() as u32;
            if found != total_seats {
                return Err(InventoryError::StateMismatch {
                    flight_number: key.flight_number.clone(),
                    travel_date: key.travel_date,
                    expected: total_seats,
                    found,
                });
            }
            return Ok(SeatMapInit::AlreadyInitialized);
        }

        let seats = generate_seat_numbers(total_seats)
            .into_iter()
            .map(|seat| (seat, Arc::new(Mutex::new(SeatRow::default()))))
            .collect();
        maps.insert(key.clone(), seats);
        tracing::debug!(seat_map = %key, total_seats, "seat map initialized");
        Ok(SeatMapInit::Created)
    }

    /// Returns the sorted identifiers of every available seat in the map.
    ///
    /// An uninitialized map has no available seats.
    pub async fn list_available(&self, key: &SeatMapKey) -> Vec<String> {
        let mut available = Vec::new();
        for (seat_number, cell) in self.cells(key).await {
            if cell.lock().await.status == SeatStatus::Available {
                available.push(seat_number);
            }
        }
        available
    }

    /// Returns a snapshot of every seat in the map, sorted by seat identifier.
    pub async fn seats(&self, key: &SeatMapKey) -> Vec<Seat> {
        let mut seats = Vec::new();
        for (seat_number, cell) in self.cells(key).await {
            let row = cell.lock().await;
            seats.push(LockedSeats::snapshot(key, &seat_number, &row));
        }
        seats
    }

    /// Locks the requested seats and verifies every one is available.
    ///
    /// Fails without mutating anything if a seat is unknown or already booked.
    pub async fn lock_available(&self, key: &SeatMapKey, seat_numbers: &[String]) -> Result<LockedSeats> {
        if seat_numbers.is_empty() {
            return Err(InventoryError::InvalidRequest(
                "no seats requested".to_string(),
            ));
        }

        let ordered = lock_order(seat_numbers);
        let (cells, missing) = {
            let maps = self.maps.read().await;
            let map = maps.get(key);
            let mut cells = Vec::with_capacity(ordered.len());
            let mut missing = Vec::new();
            for seat_number in ordered {
                match map.and_then(|m| m.get(&seat_number)) {
                    Some(cell) => cells.push((seat_number, cell.clone())),
                    None => missing.push(seat_number),
                }
            }
            (cells, missing)
        };

        if !missing.is_empty() {
            return Err(InventoryError::UnknownSeats {
                flight_number: key.flight_number.clone(),
                travel_date: key.travel_date,
                seats: missing,
                available: self.list_available(key).await,
            });
        }

        let mut rows = Vec::with_capacity(cells.len());
        for (seat_number, cell) in cells {
            rows.push((key.clone(), seat_number, cell.lock_owned().await));
        }

        let taken: Vec<String> = rows
            .iter()
            .filter(|(_, _, row)| row.status != SeatStatus::Available)
            .map(|(_, seat_number, _)| seat_number.clone())
            .collect();
        if !taken.is_empty() {
            return Err(InventoryError::SeatUnavailable {
                flight_number: key.flight_number.clone(),
                travel_date: key.travel_date,
                seats: taken,
            });
        }

        Ok(LockedSeats { rows })
    }

    /// Locks every seat currently tagged with `code`.
    pub async fn lock_reserved(&self, code: &ReservationCode) -> LockedSeats {
        let tagged = self
            .tags
            .lock()
            .await
            .get(code)
            .cloned()
            .unwrap_or_default();

        let cells: Vec<(SeatMapKey, String, SeatCell)> = {
            let maps = self.maps.read().await;
            tagged
                .into_iter()
                .filter_map(|(key, seat_number)| {
                    let cell = maps.get(&key)?.get(&seat_number)?.clone();
                    Some((key, seat_number, cell))
                })
                .collect()
        };

        let mut rows = Vec::with_capacity(cells.len());
        for (key, seat_number, cell) in cells {
            let row = cell.lock_owned().await;
            if row.reservation_code.as_ref() == Some(code) {
                rows.push((key, seat_number, row));
            }
        }
        LockedSeats { rows }
    }

    /// Books every locked seat under `code` and releases the locks.
    pub async fn book(&self, mut locked: LockedSeats, code: &ReservationCode) -> Vec<Seat> {
        let mut tags = self.tags.lock().await;
        let tagged = tags.entry(code.clone()).or_default();
        let mut booked = Vec::with_capacity(locked.len());
        for (key, seat_number, row) in locked.rows.iter_mut() {
            row.status = SeatStatus::Booked;
            row.reservation_code = Some(code.clone());
            tagged.insert((key.clone(), seat_number.clone()));
            booked.push(LockedSeats::snapshot(key, seat_number, row));
        }
        booked
    }

    /// Frees every locked seat, clears its tag and releases the locks.
    pub async fn free(&self, mut locked: LockedSeats, code: &ReservationCode) -> Vec<Seat> {
        let mut tags = self.tags.lock().await;
        let mut freed = Vec::with_capacity(locked.len());
        for (key, seat_number, row) in locked.rows.iter_mut() {
            row.status = SeatStatus::Available;
            row.reservation_code = None;
            freed.push(LockedSeats::snapshot(key, seat_number, row));
        }
        tags.remove(code);
        freed
    }

    /// Returns the seats currently held by `code`.
    pub async fn seats_for_reservation(&self, code: &ReservationCode) -> Vec<Seat> {
        let tagged = self
            .tags
            .lock()
            .await
            .get(code)
            .cloned()
            .unwrap_or_default();

        let mut seats = Vec::new();
        for (key, seat_number) in tagged {
            let cell = {
                let maps = self.maps.read().await;
                maps.get(&key).and_then(|m| m.get(&seat_number)).cloned()
            };
            if let Some(cell) = cell {
                let row = cell.lock().await;
                if row.reservation_code.as_ref() == Some(code) {
                    seats.push(LockedSeats::snapshot(&key, &seat_number, &row));
                }
            }
        }
        seats
    }

    async fn cells(&self, key: &SeatMapKey) -> Vec<(String, SeatCell)> {
        self.maps
            .read()
            .await
            .get(key)
            .map(|map| {
                map.iter()
                    .map(|(seat_number, cell)| (seat_number.clone(), cell.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn key() -> SeatMapKey {
        SeatMapKey::new(
            FlightNumber::new("AB100"),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
    }

    fn seats(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let ledger = SeatLedger::new();
        assert_eq!(ledger.initialize(&key(), 6).await.unwrap(), SeatMapInit::Created);
        assert_eq!(
            ledger.initialize(&key(), 6).await.unwrap(),
            SeatMapInit::AlreadyInitialized
        );
        assert_eq!(ledger.list_available(&key()).await.len(), 6);
    }

    #[tokio::test]
    async fn test_initialize_with_wrong_cardinality() {
        let ledger = SeatLedger::new();
        ledger.initialize(&key(), 6).await.unwrap();

        let err = ledger.initialize(&key(), 12).await.unwrap_err();
        assert!(matches!(
            err,
            InventoryError::StateMismatch {
                expected: 12,
                found: 6,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_book_and_free() {
        let ledger = SeatLedger::new();
        let code = ReservationCode::new("X1");
        ledger.initialize(&key(), 6).await.unwrap();

        let locked = ledger.lock_available(&key(), &seats(&["1B", "1A"])).await.unwrap();
        let booked = ledger.book(locked, &code).await;
        assert_eq!(booked.len(), 2);
        assert_eq!(ledger.list_available(&key()).await, ["1C", "1D", "1E", "1F"]);
        assert_eq!(ledger.seats_for_reservation(&code).await.len(), 2);

        let locked = ledger.lock_reserved(&code).await;
        let freed = ledger.free(locked, &code).await;
        assert_eq!(freed.len(), 2);
        assert_eq!(ledger.list_available(&key()).await.len(), 6);
        assert!(ledger.seats_for_reservation(&code).await.is_empty());
    }

    #[tokio::test]
    async fn test_taken_seat_blocks_whole_request() {
        let ledger = SeatLedger::new();
        ledger.initialize(&key(), 6).await.unwrap();
        let locked = ledger.lock_available(&key(), &seats(&["1A"])).await.unwrap();
        ledger.book(locked, &ReservationCode::new("X1")).await;

        let err = ledger
            .lock_available(&key(), &seats(&["1A", "1C"]))
            .await
            .unwrap_err();
        match err {
            InventoryError::SeatUnavailable { seats, .. } => assert_eq!(seats, ["1A"]),
            other => panic!("unexpected error: {other}"),
        }
        // 1C was not touched
        assert!(ledger.list_available(&key()).await.contains(&"1C".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_seat_lists_available() {
        let ledger = SeatLedger::new();
        ledger.initialize(&key(), 2).await.unwrap();

        let err = ledger.lock_available(&key(), &seats(&["9Z"])).await.unwrap_err();
        match err {
            InventoryError::UnknownSeats { seats, available, .. } => {
                assert_eq!(seats, ["9Z"]);
                assert_eq!(available, ["1A", "1B"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_lock_leaves_seats_untouched() {
        let ledger = SeatLedger::new();
        ledger.initialize(&key(), 6).await.unwrap();

        let locked = ledger.lock_available(&key(), &seats(&["1A"])).await.unwrap();
        drop(locked);

        assert_eq!(ledger.list_available(&key()).await.len(), 6);
    }

    #[tokio::test]
    async fn test_lock_reserved_for_unknown_code_is_empty() {
        let ledger = SeatLedger::new();
        ledger.initialize(&key(), 6).await.unwrap();

        let locked = ledger.lock_reserved(&ReservationCode::new("NOPE")).await;
        assert!(locked.is_empty());
    }
}
