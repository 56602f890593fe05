//! Booking and passenger records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    BookingStatus, FlightNumber, Gender, MealPreference, Money, ReservationCode, TripKind, UserId,
};

/// A passenger travelling on a booking.
///
/// Passengers have no identity of their own and are deleted with their booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub name: String,
    pub gender: Gender,
    pub meal_preference: MealPreference,
    /// Seat on the outbound leg.
    pub seat_number: String,
    /// Seat on the return leg of a round trip.
    pub return_seat_number: Option<String>,
}

impl Passenger {
    pub fn new(
        name: impl Into<String>,
        gender: Gender,
        meal_preference: MealPreference,
        seat_number: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            gender,
            meal_preference,
            seat_number: seat_number.into(),
            return_seat_number: None,
        }
    }

    pub fn with_return_seat(mut self, seat_number: impl Into<String>) -> Self {
        self.return_seat_number = Some(seat_number.into());
        self
    }
}

/// Second leg of a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLeg {
    pub flight_number: FlightNumber,
    pub travel_date: NaiveDate,
}

/// A booking record, keyed by its reservation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub reservation_code: ReservationCode,
    pub flight_number: FlightNumber,
    pub travel_date: NaiveDate,
    pub trip_kind: TripKind,
    pub return_leg: Option<ReturnLeg>,
    pub user_id: UserId,
    pub contact_email: String,
    pub status: BookingStatus,
    /// Seats held per leg; equals the passenger count.
    pub seat_count: u32,
    /// Fixed at booking time, summed across legs.
    pub amount: Money,
    pub passengers: Vec<Passenger>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a pending one-way booking.
    pub fn new(
        reservation_code: ReservationCode,
        flight_number: FlightNumber,
        travel_date: NaiveDate,
        user_id: UserId,
        contact_email: impl Into<String>,
        passengers: Vec<Passenger>,
    ) -> Self {
        let now = Utc::now();
        Self {
            reservation_code,
            flight_number,
            travel_date,
            trip_kind: TripKind::OneWay,
            return_leg: None,
            user_id,
            contact_email: contact_email.into(),
            status: BookingStatus::Pending,
            seat_count: passengers.len() as u32,
            amount: Money::zero(),
            passengers,
            created_at: now,
            updated_at: now,
        }
    }

    /// Turns the booking into a round trip.
    pub fn with_return_leg(mut self, leg: ReturnLeg) -> Self {
        self.trip_kind = TripKind::RoundTrip;
        self.return_leg = Some(leg);
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// Returns true if the booking still holds seats.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Outbound seats, in passenger order.
    pub fn seat_numbers(&self) -> Vec<String> {
        self.passengers.iter().map(|p| p.seat_number.clone()).collect()
    }

    /// Return-leg seats, in passenger order.
    pub fn return_seat_numbers(&self) -> Vec<String> {
        self.passengers
            .iter()
            .filter_map(|p| p.return_seat_number.clone())
            .collect()
    }

    /// The first passenger, who receives the notifications.
    pub fn primary_passenger(&self) -> Option<&Passenger> {
        self.passengers.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passengers() -> Vec<Passenger> {
        vec![
            Passenger::new("Asha", Gender::Female, MealPreference::Veg, "1A").with_return_seat("3C"),
            Passenger::new("Ravi", Gender::Male, MealPreference::NonVeg, "1B").with_return_seat("3D"),
        ]
    }

    fn booking() -> Booking {
        Booking::new(
            ReservationCode::new("ABCD1234"),
            FlightNumber::new("AB100"),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            UserId::new("user-1"),
            "asha@example.com",
            passengers(),
        )
    }

    #[test]
    fn test_new_booking_is_pending_one_way() {
        let booking = booking();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.trip_kind, TripKind::OneWay);
        assert_eq!(booking.seat_count, 2);
        assert!(booking.return_leg.is_none());
        assert_eq!(booking.created_at, booking.updated_at);
    }

    #[test]
    fn test_round_trip_seats() {
        let booking = booking().with_return_leg(ReturnLeg {
            flight_number: FlightNumber::new("BA200"),
            travel_date: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
        });
        assert_eq!(booking.trip_kind, TripKind::RoundTrip);
        assert_eq!(booking.seat_numbers(), ["1A", "1B"]);
        assert_eq!(booking.return_seat_numbers(), ["3C", "3D"]);
    }

    #[test]
    fn test_ownership_and_primary_passenger() {
        let booking = booking();
        assert!(booking.is_owned_by(&UserId::new("user-1")));
        assert!(!booking.is_owned_by(&UserId::new("user-2")));
        assert_eq!(booking.primary_passenger().map(|p| p.name.as_str()), Some("Asha"));
    }
}
