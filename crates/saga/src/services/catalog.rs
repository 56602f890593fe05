//! Flight catalog lookup and its in-memory and PostgreSQL implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use booking::Money;
use chrono::{DateTime, Utc};
use common::FlightNumber;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row, postgres::PgRow};
use tokio::sync::RwLock;

use crate::error::{BookingError, Result};

const SERVICE: &str = "flight catalog";

/// Reference data the saga needs about one flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightDetails {
    pub flight_number: FlightNumber,
    pub airline: String,
    pub source: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub total_seats: u32,
    /// Price of one seat.
    pub price: Money,
}

/// Read access to the flight catalog.
#[async_trait]
pub trait FlightCatalog: Send + Sync {
    /// Looks up a flight. `Ok(None)` means the catalog answered and has no such flight.
    async fn get_flight(&self, flight_number: &FlightNumber) -> Result<Option<FlightDetails>>;
}

#[async_trait]
impl<T: FlightCatalog + ?Sized> FlightCatalog for Arc<T> {
    async fn get_flight(&self, flight_number: &FlightNumber) -> Result<Option<FlightDetails>> {
        (**self).get_flight(flight_number).await
    }
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    flights: HashMap<FlightNumber, FlightDetails>,
    fail_on_lookup: bool,
}

/// In-memory flight catalog for tests and seeded local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFlightCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryFlightCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a flight.
    pub async fn add_flight(&self, flight: FlightDetails) {
        self.state
            .write()
            .await
            .flights
            .insert(flight.flight_number.clone(), flight);
    }

    /// Configures the catalog to fail every lookup.
    pub async fn set_fail_on_lookup(&self, fail: bool) {
        self.state.write().await.fail_on_lookup = fail;
    }
}

#[async_trait]
impl FlightCatalog for InMemoryFlightCatalog {
    async fn get_flight(&self, flight_number: &FlightNumber) -> Result<Option<FlightDetails>> {
        let state = self.state.read().await;
        if state.fail_on_lookup {
            return Err(BookingError::downstream(SERVICE, "simulated outage"));
        }
        Ok(state.flights.get(flight_number).cloned())
    }
}

/// Flight catalog backed by the `flights` table.
#[derive(Clone)]
pub struct PostgresFlightCatalog {
    pool: PgPool,
}

impl PostgresFlightCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or updates a flight's reference data.
    pub async fn upsert(&self, flight: &FlightDetails) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO flights (flight_number, airline, source, destination,
                departure_time, arrival_time, total_seats, price_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (flight_number) DO UPDATE SET
                airline = EXCLUDED.airline,
                source = EXCLUDED.source,
                destination = EXCLUDED.destination,
                departure_time = EXCLUDED.departure_time,
                arrival_time = EXCLUDED.arrival_time,
                price_cents = EXCLUDED.price_cents
            "#,
        )
        .bind(flight.flight_number.as_str())
        .bind(&flight.airline)
        .bind(&flight.source)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.total_seats as i32)
        .bind(flight.price.cents())
        .execute(&self.pool)
        .await
        .map_err(|e| BookingError::downstream(SERVICE, e.to_string()))?;

        Ok(())
    }

    fn row_to_flight(row: PgRow) -> std::result::Result<FlightDetails, sqlx::Error> {
        Ok(FlightDetails {
            flight_number: FlightNumber::new(row.try_get::<String, _>("flight_number")?),
            airline: row.try_get("airline")?,
            source: row.try_get("source")?,
            destination: row.try_get("destination")?,
            departure_time: row.try_get("departure_time")?,
            arrival_time: row.try_get("arrival_time")?,
            total_seats: row.try_get::<i32, _>("total_seats")? as u32,
            price: Money::from_cents(row.try_get("price_cents")?),
        })
    }
}

#[async_trait]
impl FlightCatalog for PostgresFlightCatalog {
    async fn get_flight(&self, flight_number: &FlightNumber) -> Result<Option<FlightDetails>> {
        let row = sqlx::query(
            r#"
            SELECT flight_number, airline, source, destination, departure_time, arrival_time,
                total_seats, price_cents
            FROM flights
            WHERE flight_number = $1
            "#,
        )
        .bind(flight_number.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BookingError::downstream(SERVICE, e.to_string()))?;

        row.map(Self::row_to_flight)
            .transpose()
            .map_err(|e| BookingError::downstream(SERVICE, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::error::ErrorKind;

    fn flight() -> FlightDetails {
        FlightDetails {
            flight_number: FlightNumber::new("AB100"),
            airline: "Air Bharat".to_string(),
            source: "DEL".to_string(),
            destination: "BOM".to_string(),
            departure_time: Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap(),
            arrival_time: Utc.with_ymd_and_hms(2025, 6, 1, 8, 10, 0).unwrap(),
            total_seats: 6,
            price: Money::from_cents(450_000),
        }
    }

    #[tokio::test]
    async fn test_lookup() {
        let catalog = InMemoryFlightCatalog::new();
        catalog.add_flight(flight()).await;

        let found = catalog.get_flight(&FlightNumber::new("AB100")).await.unwrap();
        assert_eq!(found.map(|f| f.total_seats), Some(6));
        assert!(
            catalog
                .get_flight(&FlightNumber::new("ZZ999"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_outage() {
        let catalog = InMemoryFlightCatalog::new();
        catalog.add_flight(flight()).await;
        catalog.set_fail_on_lookup(true).await;

        let err = catalog
            .get_flight(&FlightNumber::new("AB100"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DownstreamUnavailable);
    }
}
