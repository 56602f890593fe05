use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Booking, BookingStatus, BookingStore, FlightNumber, Gender, MealPreference, Money, Passenger,
    ReservationCode, Result, ReturnLeg, StoreError, TripKind, UserId,
};

const BOOKING_COLUMNS: &str = "reservation_code, flight_number, travel_date, trip_kind, \
     return_flight_number, return_travel_date, user_id, contact_email, status, seat_count, \
     amount_cents, created_at, updated_at";

/// PostgreSQL-backed booking store.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

fn decode_error(column: &str, value: &str) -> StoreError {
    StoreError::Database(sqlx::Error::Decode(
        format!("unknown {column} value: {value}").into(),
    ))
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_booking(row: &PgRow, passengers: Vec<Passenger>) -> Result<Booking> {
        let status: String = row.try_get("status")?;
        let trip_kind: String = row.try_get("trip_kind")?;
        let return_flight: Option<String> = row.try_get("return_flight_number")?;
        let return_date: Option<NaiveDate> = row.try_get("return_travel_date")?;

        let return_leg = match (return_flight, return_date) {
            (Some(flight_number), Some(travel_date)) => Some(ReturnLeg {
                flight_number: FlightNumber::new(flight_number),
                travel_date,
            }),
            _ => None,
        };

        Ok(Booking {
            reservation_code: ReservationCode::new(row.try_get::<String, _>("reservation_code")?),
            flight_number: FlightNumber::new(row.try_get::<String, _>("flight_number")?),
            travel_date: row.try_get("travel_date")?,
            trip_kind: TripKind::parse(&trip_kind)
                .ok_or_else(|| decode_error("trip_kind", &trip_kind))?,
            return_leg,
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            contact_email: row.try_get("contact_email")?,
            status: BookingStatus::parse(&status).ok_or_else(|| decode_error("status", &status))?,
            seat_count: row.try_get::<i32, _>("seat_count")? as u32,
            amount: Money::from_cents(row.try_get("amount_cents")?),
            passengers,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_passenger(row: &PgRow) -> Result<Passenger> {
        let gender: String = row.try_get("gender")?;
        let meal: String = row.try_get("meal_preference")?;

        Ok(Passenger {
            name: row.try_get("name")?,
            gender: Gender::parse(&gender).ok_or_else(|| decode_error("gender", &gender))?,
            meal_preference: MealPreference::parse(&meal)
                .ok_or_else(|| decode_error("meal_preference", &meal))?,
            seat_number: row.try_get("seat_number")?,
            return_seat_number: row.try_get("return_seat_number")?,
        })
    }

    /// Loads passengers for a set of bookings, grouped by reservation code.
    async fn load_passengers(&self, codes: Vec<String>) -> Result<HashMap<String, Vec<Passenger>>> {
        let rows = sqlx::query(
            r#"
            SELECT reservation_code, name, gender, meal_preference, seat_number, return_seat_number
            FROM booking_passengers
            WHERE reservation_code = ANY($1)
            ORDER BY reservation_code, position ASC
            "#,
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<Passenger>> = HashMap::new();
        for row in &rows {
            let code: String = row.try_get("reservation_code")?;
            grouped
                .entry(code)
                .or_default()
                .push(Self::row_to_passenger(row)?);
        }
        Ok(grouped)
    }

    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Booking>> {
        let codes = rows
            .iter()
            .map(|row| row.try_get::<String, _>("reservation_code"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut passengers = self.load_passengers(codes).await?;

        rows.iter()
            .map(|row| {
                let code: String = row.try_get("reservation_code")?;
                Self::row_to_booking(row, passengers.remove(&code).unwrap_or_default())
            })
            .collect()
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    #[tracing::instrument(skip(self, booking), fields(reservation_code = %booking.reservation_code))]
    async fn create(&self, booking: &Booking) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bookings (reservation_code, flight_number, travel_date, trip_kind,
                return_flight_number, return_travel_date, user_id, contact_email, status,
                seat_count, amount_cents, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(booking.reservation_code.as_str())
        .bind(booking.flight_number.as_str())
        .bind(booking.travel_date)
        .bind(booking.trip_kind.as_str())
        .bind(booking.return_leg.as_ref().map(|l| l.flight_number.as_str().to_string()))
        .bind(booking.return_leg.as_ref().map(|l| l.travel_date))
        .bind(booking.user_id.as_str())
        .bind(&booking.contact_email)
        .bind(booking.status.as_str())
        .bind(booking.seat_count as i32)
        .bind(booking.amount.cents())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                match db_err.constraint() {
                    Some("bookings_pkey") => {
                        return StoreError::DuplicateCode(booking.reservation_code.clone());
                    }
                    Some("uk_bookings_active_trip") => {
                        return StoreError::DuplicateActiveBooking {
                            user_id: booking.user_id.clone(),
                            flight_number: booking.flight_number.clone(),
                            travel_date: booking.travel_date,
                        };
                    }
                    _ => {}
                }
            }
            StoreError::Database(e)
        })?;

        for (position, passenger) in booking.passengers.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO booking_passengers (reservation_code, position, name, gender,
                    meal_preference, seat_number, return_seat_number)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(booking.reservation_code.as_str())
            .bind(position as i32)
            .bind(&passenger.name)
            .bind(passenger.gender.as_str())
            .bind(passenger.meal_preference.as_str())
            .bind(&passenger.seat_number)
            .bind(&passenger.return_seat_number)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_code(&self, code: &ReservationCode) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE reservation_code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_owner(&self, user_id: &UserId) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 \
             ORDER BY created_at DESC, reservation_code"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(
        &self,
        code: &ReservationCode,
        status: BookingStatus,
    ) -> Result<Booking> {
        let updated = sqlx::query(
            "UPDATE bookings SET status = $2, updated_at = $3 WHERE reservation_code = $1",
        )
        .bind(code.as_str())
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound(code.clone()));
        }

        self.find_by_code(code)
            .await?
            .ok_or_else(|| StoreError::NotFound(code.clone()))
    }

    #[tracing::instrument(skip(self))]
    async fn cancel(&self, code: &ReservationCode) -> Result<Booking> {
        let updated = sqlx::query(
            r#"
            UPDATE bookings SET status = 'CANCELLED', updated_at = $2
            WHERE reservation_code = $1 AND status <> 'CANCELLED'
            "#,
        )
        .bind(code.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        let booking = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        if updated == 0 {
            return Err(StoreError::AlreadyCancelled(code.clone()));
        }
        Ok(booking)
    }

    async fn has_active_booking(
        &self,
        user_id: &UserId,
        flight_number: &FlightNumber,
        travel_date: NaiveDate,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM bookings
                WHERE user_id = $1 AND flight_number = $2 AND travel_date = $3
                  AND status <> 'CANCELLED'
            )
            "#,
        )
        .bind(user_id.as_str())
        .bind(flight_number.as_str())
        .bind(travel_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn delete(&self, code: &ReservationCode) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM bookings WHERE reservation_code = $1")
            .bind(code.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}
