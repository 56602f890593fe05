//! Seat records and seat-map generation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{FlightNumber, ReservationCode};

/// Seat letters per row.
pub const SEAT_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Occupancy status of a single seat.
///
/// State transitions:
/// ```text
/// Available ──reserve──► Booked ──release──► Available
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    #[default]
    Available,
    Booked,
}

impl SeatStatus {
    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Booked => "BOOKED",
        }
    }

    /// Parses a stored status name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AVAILABLE" => Some(SeatStatus::Available),
            "BOOKED" => Some(SeatStatus::Booked),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key of one seat map: seats are scoped to a flight on a specific date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatMapKey {
    pub flight_number: FlightNumber,
    pub travel_date: NaiveDate,
}

impl SeatMapKey {
    pub fn new(flight_number: FlightNumber, travel_date: NaiveDate) -> Self {
        Self {
            flight_number,
            travel_date,
        }
    }
}

impl std::fmt::Display for SeatMapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.flight_number, self.travel_date)
    }
}

/// A seat row as observed outside any transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub flight_number: FlightNumber,
    pub travel_date: NaiveDate,
    pub seat_number: String,
    pub status: SeatStatus,
    /// Set only while the seat is booked.
    pub reservation_code: Option<ReservationCode>,
}

impl Seat {
    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }
}

/// Outcome of initializing a seat map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatMapInit {
    /// The map did not exist and was materialized by this call.
    Created,
    /// The map already existed with the expected cardinality.
    AlreadyInitialized,
}

/// Generates `total_seats` seat identifiers, six per row (`1A`..`1F`, `2A`, ...).
pub fn generate_seat_numbers(total_seats: u32) -> Vec<String> {
    let total = total_seats as usize;
    let rows = total.div_ceil(SEAT_LETTERS.len());
    (1..=rows)
        .flat_map(|row| SEAT_LETTERS.iter().map(move |letter| format!("{row}{letter}")))
        .take(total)
        .collect()
}

/// Sorts seat identifiers lexically and removes duplicates.
///
/// This is the lock acquisition order for every multi-seat operation.
pub(crate) fn lock_order(seats: &[String]) -> Vec<String> {
    let mut ordered = seats.to_vec();
    ordered.sort();
    ordered.dedup();
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_exact_count() {
        assert_eq!(generate_seat_numbers(6).len(), 6);
        assert_eq!(generate_seat_numbers(7).len(), 7);
        assert_eq!(generate_seat_numbers(180).len(), 180);
        assert!(generate_seat_numbers(0).is_empty());
    }

    #[test]
    fn test_row_letter_scheme() {
        let seats = generate_seat_numbers(8);
        assert_eq!(seats, ["1A", "1B", "1C", "1D", "1E", "1F", "2A", "2B"]);
    }

    #[test]
    fn test_generated_seats_are_unique() {
        let seats = generate_seat_numbers(120);
        let mut deduped = seats.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), seats.len());
    }

    #[test]
    fn test_lock_order_is_lexical_and_deduplicated() {
        let requested = vec!["2A".to_string(), "10A".to_string(), "1B".to_string(), "2A".to_string()];
        assert_eq!(lock_order(&requested), ["10A", "1B", "2A"]);
    }

    #[test]
    fn test_status_round_trip_through_storage_name() {
        for status in [SeatStatus::Available, SeatStatus::Booked] {
            assert_eq!(SeatStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SeatStatus::parse("HELD"), None);
    }
}
