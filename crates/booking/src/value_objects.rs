//! Value objects for bookings and passengers.

use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
///
/// The flight catalog supplies prices; no currency conversion happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit portion.
    pub fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after whole units).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a seat count.
    pub fn multiply(&self, seats: u32) -> Money {
        Money {
            cents: self.cents * seats as i64,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Passenger gender as recorded on the booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MALE" => Some(Gender::Male),
            "FEMALE" => Some(Gender::Female),
            "OTHER" => Some(Gender::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// In-flight meal choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MealPreference {
    Veg,
    NonVeg,
}

impl MealPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealPreference::Veg => "VEG",
            MealPreference::NonVeg => "NON_VEG",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "VEG" => Some(MealPreference::Veg),
            "NON_VEG" => Some(MealPreference::NonVeg),
            _ => None,
        }
    }
}

impl std::fmt::Display for MealPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a booking covers one flight leg or an outbound and a return leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripKind {
    #[default]
    OneWay,
    RoundTrip,
}

impl TripKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripKind::OneWay => "ONE_WAY",
            TripKind::RoundTrip => "ROUND_TRIP",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ONE_WAY" => Some(TripKind::OneWay),
            "ROUND_TRIP" => Some(TripKind::RoundTrip),
            _ => None,
        }
    }

    /// Number of flight legs the trip covers.
    pub fn legs(&self) -> usize {
        match self {
            TripKind::OneWay => 1,
            TripKind::RoundTrip => 2,
        }
    }
}

impl std::fmt::Display for TripKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(125_050).to_string(), "1250.50");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
        assert_eq!(Money::from_cents(-250).to_string(), "-2.50");
    }

    #[test]
    fn test_money_multiply_and_sum() {
        let price = Money::from_cents(4_500);
        let legs = [price.multiply(2), Money::from_cents(3_000).multiply(2)];
        let total: Money = legs.into_iter().sum();
        assert_eq!(total.cents(), 15_000);
    }

    #[test]
    fn test_money_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(999)).unwrap();
        assert_eq!(json, "999");
    }

    #[test]
    fn test_enum_storage_names() {
        for gender in [Gender::Male, Gender::Female, Gender::Other] {
            assert_eq!(Gender::parse(gender.as_str()), Some(gender));
        }
        for meal in [MealPreference::Veg, MealPreference::NonVeg] {
            assert_eq!(MealPreference::parse(meal.as_str()), Some(meal));
        }
        for kind in [TripKind::OneWay, TripKind::RoundTrip] {
            assert_eq!(TripKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MealPreference::parse("VEGAN"), None);
    }

    #[test]
    fn test_serde_names_match_storage_names() {
        let json = serde_json::to_string(&MealPreference::NonVeg).unwrap();
        assert_eq!(json, "\"NON_VEG\"");
        let kind: TripKind = serde_json::from_str("\"ROUND_TRIP\"").unwrap();
        assert_eq!(kind, TripKind::RoundTrip);
        assert_eq!(kind.legs(), 2);
    }
}
