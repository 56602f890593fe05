//! Booking requests and their validation.

use std::collections::HashSet;

use booking::{Gender, MealPreference, TripKind};
use chrono::NaiveDate;
use common::{FlightNumber, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// The authenticated caller, as asserted by the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub role: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerRequest {
    pub name: String,
    pub gender: Gender,
    pub meal_preference: MealPreference,
    pub seat_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_seat_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLegRequest {
    pub flight_number: FlightNumber,
    pub travel_date: NaiveDate,
}

/// A request to book seats for one or two flight legs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub flight_number: FlightNumber,
    pub travel_date: NaiveDate,
    #[serde(default)]
    pub trip_kind: TripKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_leg: Option<ReturnLegRequest>,
    pub seats_booked: u32,
    /// Falls back to the caller's email when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub passengers: Vec<PassengerRequest>,
}

/// One flight leg with the seats requested on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Leg {
    pub flight_number: FlightNumber,
    pub travel_date: NaiveDate,
    pub seats: Vec<String>,
}

fn invalid(message: impl Into<String>) -> BookingError {
    BookingError::InvalidRequest(message.into())
}

fn ensure_distinct<'a>(seats: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for seat in seats {
        if seat.trim().is_empty() {
            return Err(invalid("Seat number cannot be empty"));
        }
        if !seen.insert(seat) {
            return Err(invalid(format!("Seat {seat} is requested more than once")));
        }
    }
    Ok(())
}

impl CreateBookingRequest {
    /// Checks the request's shape. Nothing here touches shared state.
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        if self.flight_number.is_blank() {
            return Err(invalid("Flight number cannot be empty"));
        }
        if self.travel_date < today {
            return Err(invalid("Travel date cannot be in the past"));
        }
        if self.seats_booked == 0 {
            return Err(invalid("Seats booked must be greater than 0"));
        }
        if self.passengers.is_empty() {
            return Err(invalid("At least one passenger is required"));
        }
        if self.passengers.len() != self.seats_booked as usize {
            return Err(invalid(format!(
                "Passenger count {} does not match seats booked {}",
                self.passengers.len(),
                self.seats_booked
            )));
        }
        if self.passengers.iter().any(|p| p.name.trim().is_empty()) {
            return Err(invalid("Passenger name cannot be empty"));
        }
        if let Some(email) = &self.contact_email
            && !email.contains('@')
        {
            return Err(invalid("Invalid email format"));
        }

        ensure_distinct(self.passengers.iter().map(|p| p.seat_number.as_str()))?;

        match self.trip_kind {
            TripKind::OneWay => {
                if self.return_leg.is_some()
                    || self.passengers.iter().any(|p| p.return_seat_number.is_some())
                {
                    return Err(invalid("One-way booking cannot carry a return leg"));
                }
            }
            TripKind::RoundTrip => {
                let leg = self
                    .return_leg
                    .as_ref()
                    .ok_or_else(|| invalid("Round trip requires a return leg"))?;
                if leg.flight_number.is_blank() {
                    return Err(invalid("Return flight number cannot be empty"));
                }
                if leg.travel_date < self.travel_date {
                    return Err(invalid("Return date cannot be before travel date"));
                }
                let return_seats: Vec<&str> = self
                    .passengers
                    .iter()
                    .filter_map(|p| p.return_seat_number.as_deref())
                    .collect();
                if return_seats.len() != self.passengers.len() {
                    return Err(invalid("Every passenger needs a return seat"));
                }
                ensure_distinct(return_seats.into_iter())?;
            }
        }

        Ok(())
    }

    /// Outbound seats, in passenger order.
    pub fn seat_numbers(&self) -> Vec<String> {
        self.passengers.iter().map(|p| p.seat_number.clone()).collect()
    }

    /// The legs to reserve, outbound first. Call after [`Self::validate`].
    pub(crate) fn legs(&self) -> Vec<Leg> {
        let mut legs = vec![Leg {
            flight_number: self.flight_number.clone(),
            travel_date: self.travel_date,
            seats: self.seat_numbers(),
        }];
        if let Some(leg) = &self.return_leg {
            legs.push(Leg {
                flight_number: leg.flight_number.clone(),
                travel_date: leg.travel_date,
                seats: self
                    .passengers
                    .iter()
                    .filter_map(|p| p.return_seat_number.clone())
                    .collect(),
            });
        }
        legs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    fn passenger(name: &str, seat: &str) -> PassengerRequest {
        PassengerRequest {
            name: name.to_string(),
            gender: Gender::Female,
            meal_preference: MealPreference::Veg,
            seat_number: seat.to_string(),
            return_seat_number: None,
        }
    }

    fn one_way() -> CreateBookingRequest {
        CreateBookingRequest {
            flight_number: FlightNumber::new("AB100"),
            travel_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            trip_kind: TripKind::OneWay,
            return_leg: None,
            seats_booked: 2,
            contact_email: None,
            passengers: vec![passenger("Asha", "1A"), passenger("Ravi", "1B")],
        }
    }

    fn round_trip() -> CreateBookingRequest {
        let mut request = one_way();
        request.trip_kind = TripKind::RoundTrip;
        request.return_leg = Some(ReturnLegRequest {
            flight_number: FlightNumber::new("BA200"),
            travel_date: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
        });
        request.passengers[0].return_seat_number = Some("3A".into());
        request.passengers[1].return_seat_number = Some("3B".into());
        request
    }

    fn message(result: Result<()>) -> String {
        match result {
            Err(BookingError::InvalidRequest(message)) => message,
            other => panic!("expected invalid request, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_requests() {
        assert!(one_way().validate(today()).is_ok());
        assert!(round_trip().validate(today()).is_ok());
    }

    #[test]
    fn test_travel_today_is_allowed() {
        let request = one_way();
        assert!(request.validate(request.travel_date).is_ok());
    }

    #[test]
    fn test_past_date_rejected() {
        let request = one_way();
        let tomorrow = request.travel_date.succ_opt().unwrap();
        assert_eq!(
            message(request.validate(tomorrow)),
            "Travel date cannot be in the past"
        );
    }

    #[test]
    fn test_passenger_count_must_match_seats() {
        let mut request = one_way();
        request.seats_booked = 3;
        assert!(message(request.validate(today())).contains("does not match"));

        request.passengers.clear();
        request.seats_booked = 0;
        assert!(request.validate(today()).is_err());
    }

    #[test]
    fn test_duplicate_seats_rejected() {
        let mut request = one_way();
        request.passengers[1].seat_number = "1A".into();
        assert!(message(request.validate(today())).contains("1A"));
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut request = one_way();
        request.passengers[0].name = "  ".into();
        assert_eq!(message(request.validate(today())), "Passenger name cannot be empty");

        let mut request = one_way();
        request.flight_number = FlightNumber::new(" ");
        assert_eq!(message(request.validate(today())), "Flight number cannot be empty");

        let mut request = one_way();
        request.contact_email = Some("not-an-email".into());
        assert_eq!(message(request.validate(today())), "Invalid email format");
    }

    #[test]
    fn test_round_trip_needs_symmetric_leg() {
        let mut request = round_trip();
        request.return_leg = None;
        assert_eq!(message(request.validate(today())), "Round trip requires a return leg");

        let mut request = round_trip();
        request.passengers[1].return_seat_number = None;
        assert_eq!(
            message(request.validate(today())),
            "Every passenger needs a return seat"
        );

        let mut request = round_trip();
        request.passengers[1].return_seat_number = Some("3A".into());
        assert!(request.validate(today()).is_err());

        let mut request = round_trip();
        if let Some(leg) = request.return_leg.as_mut() {
            leg.travel_date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        }
        assert_eq!(
            message(request.validate(today())),
            "Return date cannot be before travel date"
        );
    }

    #[test]
    fn test_one_way_cannot_carry_return_seats() {
        let mut request = one_way();
        request.passengers[0].return_seat_number = Some("3A".into());
        assert!(request.validate(today()).is_err());
    }

    #[test]
    fn test_legs() {
        let legs = round_trip().legs();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].seats, ["1A", "1B"]);
        assert_eq!(legs[1].flight_number, FlightNumber::new("BA200"));
        assert_eq!(legs[1].seats, ["3A", "3B"]);
    }

    #[test]
    fn test_deserialize_defaults_to_one_way() {
        let request: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "flight_number": "AB100",
            "travel_date": "2025-06-01",
            "seats_booked": 1,
            "passengers": [{
                "name": "Asha",
                "gender": "FEMALE",
                "meal_preference": "NON_VEG",
                "seat_number": "1A"
            }]
        }))
        .unwrap();
        assert_eq!(request.trip_kind, TripKind::OneWay);
        assert!(request.validate(today()).is_ok());
    }
}
