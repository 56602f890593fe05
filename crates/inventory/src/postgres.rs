use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    FlightCapacity, FlightNumber, InventoryError, ReservationCode, Result, Seat, SeatMapInit,
    SeatStatus, generate_seat_numbers,
    seat::lock_order,
    store::{ReleaseResult, SeatInventory, SeatReservation},
};

/// PostgreSQL-backed seat inventory.
///
/// Row locks come from `SELECT ... FOR UPDATE` inside one transaction per
/// operation, taken in the same order as the in-memory implementation.
#[derive(Clone)]
pub struct PostgresSeatInventory {
    pool: PgPool,
}

impl PostgresSeatInventory {
    /// Creates a new PostgreSQL seat inventory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_seat(row: PgRow) -> Result<Seat> {
        let status: String = row.try_get("status")?;
        let status = SeatStatus::parse(&status).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown seat status: {status}").into())
        })?;
        let reservation_code: Option<String> = row.try_get("reservation_code")?;

        Ok(Seat {
            flight_number: FlightNumber::new(row.try_get::<String, _>("flight_number")?),
            travel_date: row.try_get("travel_date")?,
            seat_number: row.try_get("seat_number")?,
            status,
            reservation_code: reservation_code.map(ReservationCode::new),
        })
    }

    fn row_to_capacity(row: PgRow) -> Result<FlightCapacity> {
        Ok(FlightCapacity {
            total_seats: row.try_get::<i32, _>("total_seats")? as u32,
            available_seats: row.try_get::<i32, _>("available_seats")? as u32,
        })
    }

    async fn count_seats(
        tx: &mut Transaction<'_, Postgres>,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM seats WHERE flight_number = $1 AND travel_date = $2",
        )
        .bind(flight_number.as_str())
        .bind(travel_date)
        .fetch_one(&mut **tx)
        .await?;
        Ok(count as u32)
    }
}

#[async_trait]
impl SeatInventory for PostgresSeatInventory {
    async fn register_flight(
        &self,
        flight_number: &FlightNumber,
        total_seats: u32,
    ) -> Result<FlightCapacity> {
        sqlx::query(
            r#"
            INSERT INTO flight_capacity (flight_number, total_seats, available_seats)
            VALUES ($1, $2, $2)
            ON CONFLICT (flight_number) DO NOTHING
            "#,
        )
        .bind(flight_number.as_str())
        .bind(total_seats as i32)
        .execute(&self.pool)
        .await?;

        self.capacity(flight_number).await
    }

    async fn capacity(&self, flight_number: &FlightNumber) -> Result<FlightCapacity> {
        let row = sqlx::query(
            "SELECT total_seats, available_seats FROM flight_capacity WHERE flight_number = $1",
        )
        .bind(flight_number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_capacity(row),
            None => Err(InventoryError::FlightNotFound(flight_number.clone())),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn initialize(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
        total_seats: u32,
    ) -> Result<SeatMapInit> {
        if total_seats == 0 {
            return Err(InventoryError::InvalidRequest(format!(
                "flight {flight_number} has no seats to initialize"
            )));
        }

        let mut tx = self.pool.begin().await?;

        let existing = Self::count_seats(&mut tx, flight_number, travel_date).await?;
        if existing > 0 {
            tx.rollback().await?;
            if existing != total_seats {
                return Err(InventoryError::StateMismatch {
                    flight_number: flight_number.clone(),
                    travel_date,
                    expected: total_seats,
                    found: existing,
                });
            }
            return Ok(SeatMapInit::AlreadyInitialized);
        }

        // Concurrent initializers race on the unique constraint; losers insert nothing.
        let inserted = sqlx::query(
            r#"
            INSERT INTO seats (flight_number, travel_date, seat_number, status)
            SELECT $1, $2, seat_number, 'AVAILABLE'
            FROM UNNEST($3::text[]) AS seat_number
            ON CONFLICT ON CONSTRAINT uk_flight_date_seat DO NOTHING
            "#,
        )
        .bind(flight_number.as_str())
        .bind(travel_date)
        .bind(generate_seat_numbers(total_seats))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let found = Self::count_seats(&mut tx, flight_number, travel_date).await?;
        if found != total_seats {
            tx.rollback().await?;
            return Err(InventoryError::StateMismatch {
                flight_number: flight_number.clone(),
                travel_date,
                expected: total_seats,
                found,
            });
        }

        tx.commit().await?;
        if inserted == 0 {
            Ok(SeatMapInit::AlreadyInitialized)
        } else {
            tracing::debug!(%flight_number, %travel_date, total_seats, "seat map initialized");
            Ok(SeatMapInit::Created)
        }
    }

    async fn list_available(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<Vec<String>> {
        let seats = sqlx::query_scalar(
            r#"
            SELECT seat_number FROM seats
            WHERE flight_number = $1 AND travel_date = $2 AND status = 'AVAILABLE'
            ORDER BY seat_number COLLATE "C"
            "#,
        )
        .bind(flight_number.as_str())
        .bind(travel_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(seats)
    }

    #[tracing::instrument(skip(self, reservation), fields(
        flight_number = %reservation.flight_number,
        travel_date = %reservation.travel_date,
        reservation_code = %reservation.reservation_code,
    ))]
    async fn reserve(&self, reservation: &SeatReservation) -> Result<Vec<Seat>> {
        if reservation.seat_numbers.is_empty() {
            return Err(InventoryError::InvalidRequest(
                "no seats requested".to_string(),
            ));
        }

        let requested = lock_order(&reservation.seat_numbers);
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query(
            r#"
            SELECT seat_number, status FROM seats
            WHERE flight_number = $1 AND travel_date = $2 AND seat_number = ANY($3)
            ORDER BY seat_number COLLATE "C"
            FOR UPDATE
            "#,
        )
        .bind(reservation.flight_number.as_str())
        .bind(reservation.travel_date)
        .bind(requested.clone())
        .fetch_all(&mut *tx)
        .await?;

        let mut found = BTreeSet::new();
        let mut taken = Vec::new();
        for row in &locked {
            let seat_number: String = row.try_get("seat_number")?;
            let status: String = row.try_get("status")?;
            if SeatStatus::parse(&status) != Some(SeatStatus::Available) {
                taken.push(seat_number.clone());
            }
            found.insert(seat_number);
        }

        let missing: Vec<String> = requested
            .iter()
            .filter(|seat| !found.contains(*seat))
            .cloned()
            .collect();
        if !missing.is_empty() {
            tx.rollback().await?;
            return Err(InventoryError::UnknownSeats {
                flight_number: reservation.flight_number.clone(),
                travel_date: reservation.travel_date,
                seats: missing,
                available: self
                    .list_available(&reservation.flight_number, reservation.travel_date)
                    .await?,
            });
        }
        if !taken.is_empty() {
            tx.rollback().await?;
            return Err(InventoryError::SeatUnavailable {
                flight_number: reservation.flight_number.clone(),
                travel_date: reservation.travel_date,
                seats: taken,
            });
        }

        let counter = sqlx::query(
            r#"
            SELECT total_seats, available_seats FROM flight_capacity
            WHERE flight_number = $1
            FOR UPDATE
            "#,
        )
        .bind(reservation.flight_number.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(counter) = counter else {
            tx.rollback().await?;
            return Err(InventoryError::FlightNotFound(
                reservation.flight_number.clone(),
            ));
        };

        let mut capacity = Self::row_to_capacity(counter)?;
        if let Err(e) = capacity.debit(&reservation.flight_number, requested.len() as u32) {
            tx.rollback().await?;
            return Err(e);
        }

        sqlx::query("UPDATE flight_capacity SET available_seats = $2 WHERE flight_number = $1")
            .bind(reservation.flight_number.as_str())
            .bind(capacity.available_seats as i32)
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query(
            r#"
            UPDATE seats SET status = 'BOOKED', reservation_code = $4
            WHERE flight_number = $1 AND travel_date = $2 AND seat_number = ANY($3)
            RETURNING flight_number, travel_date, seat_number, status, reservation_code
            "#,
        )
        .bind(reservation.flight_number.as_str())
        .bind(reservation.travel_date)
        .bind(requested)
        .bind(reservation.reservation_code.as_str())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut booked = rows
            .into_iter()
            .map(Self::row_to_seat)
            .collect::<Result<Vec<_>>>()?;
        booked.sort_by(|a, b| a.seat_number.cmp(&b.seat_number));
        Ok(booked)
    }

    #[tracing::instrument(skip(self))]
    async fn release(&self, reservation_code: &ReservationCode) -> Result<ReleaseResult> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query(
            r#"
            SELECT flight_number, travel_date, seat_number, status, reservation_code FROM seats
            WHERE reservation_code = $1
            ORDER BY flight_number COLLATE "C", travel_date, seat_number COLLATE "C"
            FOR UPDATE
            "#,
        )
        .bind(reservation_code.as_str())
        .fetch_all(&mut *tx)
        .await?;

        if locked.is_empty() {
            tx.rollback().await?;
            return Ok(ReleaseResult::default());
        }

        let mut seats = locked
            .into_iter()
            .map(Self::row_to_seat)
            .collect::<Result<Vec<_>>>()?;

        let mut per_flight: BTreeMap<FlightNumber, u32> = BTreeMap::new();
        for seat in &seats {
            *per_flight.entry(seat.flight_number.clone()).or_insert(0) += 1;
        }

        for (flight_number, released) in &per_flight {
            let updated = sqlx::query(
                r#"
                UPDATE flight_capacity
                SET available_seats = LEAST(total_seats, available_seats + $2)
                WHERE flight_number = $1
                "#,
            )
            .bind(flight_number.as_str())
            .bind(*released as i32)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                tx.rollback().await?;
                return Err(InventoryError::FlightNotFound(flight_number.clone()));
            }
        }

        sqlx::query(
            r#"
            UPDATE seats SET status = 'AVAILABLE', reservation_code = NULL
            WHERE reservation_code = $1
            "#,
        )
        .bind(reservation_code.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        for seat in seats.iter_mut() {
            seat.status = SeatStatus::Available;
            seat.reservation_code = None;
        }
        Ok(ReleaseResult { seats })
    }

    async fn seats_for_reservation(&self, reservation_code: &ReservationCode) -> Result<Vec<Seat>> {
        let rows = sqlx::query(
            r#"
            SELECT flight_number, travel_date, seat_number, status, reservation_code FROM seats
            WHERE reservation_code = $1
            ORDER BY flight_number COLLATE "C", travel_date, seat_number COLLATE "C"
            "#,
        )
        .bind(reservation_code.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_seat).collect()
    }

    async fn seat_map(
        &self,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<Vec<Seat>> {
        let rows = sqlx::query(
            r#"
            SELECT flight_number, travel_date, seat_number, status, reservation_code FROM seats
            WHERE flight_number = $1 AND travel_date = $2
            ORDER BY seat_number COLLATE "C"
            "#,
        )
        .bind(flight_number.as_str())
        .bind(travel_date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_seat).collect()
    }
}
