//! Results returned to booking callers.

use booking::{Booking, BookingStatus, Gender, MealPreference, Money, ReturnLeg, TripKind};
use chrono::NaiveDate;
use common::{FlightNumber, ReservationCode};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfirmation {
    pub reservation_code: ReservationCode,
    pub status: BookingStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationResult {
    pub reservation_code: ReservationCode,
    pub status: BookingStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassengerSummary {
    pub name: String,
    pub gender: Gender,
    pub meal_preference: MealPreference,
    pub seat_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_seat_number: Option<String>,
}

/// Owner-facing view of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingSummary {
    pub reservation_code: ReservationCode,
    pub status: BookingStatus,
    pub flight_number: FlightNumber,
    pub travel_date: NaiveDate,
    pub trip_kind: TripKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_leg: Option<ReturnLeg>,
    pub seats_booked: u32,
    pub passengers: Vec<PassengerSummary>,
    pub amount: Money,
}

impl From<Booking> for BookingSummary {
    fn from(booking: Booking) -> Self {
        Self {
            reservation_code: booking.reservation_code,
            status: booking.status,
            flight_number: booking.flight_number,
            travel_date: booking.travel_date,
            trip_kind: booking.trip_kind,
            return_leg: booking.return_leg,
            seats_booked: booking.seat_count,
            passengers: booking
                .passengers
                .into_iter()
                .map(|p| PassengerSummary {
                    name: p.name,
                    gender: p.gender,
                    meal_preference: p.meal_preference,
                    seat_number: p.seat_number,
                    return_seat_number: p.return_seat_number,
                })
                .collect(),
            amount: booking.amount,
        }
    }
}
