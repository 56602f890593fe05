//! Booking orchestrator for the seat reservation saga.

use std::collections::HashSet;
use std::time::Instant;

use booking::{Booking, BookingStatus, BookingStore, Money, Passenger, ReturnLeg, StoreError};
use chrono::Utc;
use common::ReservationCode;
use inventory::{InventoryError, SeatInventory, SeatReservation, generate_seat_numbers};

use crate::error::{BookingError, Result};
use crate::request::{CreateBookingRequest, Identity, Leg};
use crate::services::catalog::{FlightCatalog, FlightDetails};
use crate::services::notification::{BookingNotification, NotificationKind, Notifier};
use crate::state::BookingSagaState;
use crate::summary::{BookingConfirmation, BookingSummary, CancellationResult};

const MAX_CODE_ATTEMPTS: usize = 5;

/// Progress of one booking saga.
struct SagaRun {
    code: ReservationCode,
    state: BookingSagaState,
    reserved_legs: usize,
}

impl SagaRun {
    fn new(code: ReservationCode) -> Self {
        Self {
            code,
            state: BookingSagaState::Validating,
            reserved_legs: 0,
        }
    }

    fn advance(&mut self, next: BookingSagaState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(BookingError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::info!(
            reservation_code = %self.code,
            from = %self.state,
            to = %next,
            "saga step completed"
        );
        self.state = next;
        Ok(())
    }

    /// Records a step taken after the booking is committed. An out-of-order
    /// step is logged and never returned to the caller.
    fn settle(&mut self, next: BookingSagaState) {
        if let Err(e) = self.advance(next) {
            tracing::warn!(reservation_code = %self.code, error = %e, "saga state out of step");
            self.state = next;
        }
    }
}

/// Orchestrates booking creation and cancellation.
///
/// Creation reserves seats leg by leg, persists the confirmed booking and
/// then notifies. Any failure after the first reservation releases every
/// seat tagged with the booking's reservation code before the error is
/// returned. No lock is held across collaborator calls.
pub struct BookingOrchestrator<I, B, C, N>
where
    I: SeatInventory,
    B: BookingStore,
    C: FlightCatalog,
    N: Notifier,
{
    inventory: I,
    bookings: B,
    catalog: C,
    notifier: N,
}

impl<I, B, C, N> BookingOrchestrator<I, B, C, N>
where
    I: SeatInventory,
    B: BookingStore,
    C: FlightCatalog,
    N: Notifier,
{
    pub fn new(inventory: I, bookings: B, catalog: C, notifier: N) -> Self {
        Self {
            inventory,
            bookings,
            catalog,
            notifier,
        }
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn bookings(&self) -> &B {
        &self.bookings
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Books the requested seats for the caller.
    #[tracing::instrument(
        skip(self, identity, request),
        fields(user_id = %identity.user_id, flight_number = %request.flight_number)
    )]
    pub async fn create_booking(
        &self,
        identity: &Identity,
        request: CreateBookingRequest,
    ) -> Result<BookingConfirmation> {
        metrics::counter!("booking_saga_executions_total").increment(1);
        let saga_start = Instant::now();

        let result = self.run_create(identity, &request).await;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("booking_saga_duration_seconds").record(duration);
        match &result {
            Ok(confirmation) => {
                metrics::counter!("booking_saga_completed").increment(1);
                tracing::info!(
                    reservation_code = %confirmation.reservation_code,
                    duration,
                    "booking saga completed"
                );
            }
            Err(e) => {
                metrics::counter!("booking_saga_failed").increment(1);
                tracing::warn!(kind = %e.kind(), error = %e, "booking saga failed");
            }
        }
        result
    }

    async fn run_create(
        &self,
        identity: &Identity,
        request: &CreateBookingRequest,
    ) -> Result<BookingConfirmation> {
        // 1. Validate and resolve every leg before any side effect
        request.validate(Utc::now().date_naive())?;

        let contact_email = request
            .contact_email
            .clone()
            .unwrap_or_else(|| identity.email.clone());
        if contact_email.trim().is_empty() {
            return Err(BookingError::InvalidRequest(
                "Contact email is required".to_string(),
            ));
        }

        if self
            .bookings
            .has_active_booking(&identity.user_id, &request.flight_number, request.travel_date)
            .await?
        {
            return Err(BookingError::InvalidRequest(
                "Duplicate active booking found for this flight/date".to_string(),
            ));
        }

        let legs = request.legs();
        let mut flights = Vec::with_capacity(legs.len());
        for leg in &legs {
            let flight = self
                .catalog
                .get_flight(&leg.flight_number)
                .await?
                .ok_or_else(|| BookingError::FlightNotFound(leg.flight_number.clone()))?;
            flights.push(flight);
        }

        let code = self.fresh_code().await?;
        let mut run = SagaRun::new(code.clone());

        // 2-4. Ensure, verify and reserve each leg in turn
        for (leg, flight) in legs.iter().zip(&flights) {
            if let Err(e) = self.reserve_leg(&mut run, leg, flight).await {
                self.fail(&mut run, &e).await;
                return Err(e);
            }
        }

        // 5. Persist the confirmed booking
        let amount: Money = legs
            .iter()
            .zip(&flights)
            .map(|(leg, flight)| flight.price.multiply(leg.seats.len() as u32))
            .sum();
        let booking = Self::build_booking(&code, identity, request, contact_email, amount);

        if let Err(e) = self.bookings.create(&booking).await {
            let e = BookingError::from(e);
            self.fail(&mut run, &e).await;
            return Err(e);
        }
        run.settle(BookingSagaState::Persisted);

        // 6. Notify, best effort
        let notification = BookingNotification::for_booking(
            NotificationKind::BookingConfirmed,
            &booking,
            flights.first(),
        );
        if self.send(&notification).await {
            run.settle(BookingSagaState::Notified);
        }

        Ok(BookingConfirmation {
            reservation_code: code,
            status: booking.status,
            message: "Booking created successfully".to_string(),
        })
    }

    async fn reserve_leg(&self, run: &mut SagaRun, leg: &Leg, flight: &FlightDetails) -> Result<()> {
        self.inventory
            .register_flight(&leg.flight_number, flight.total_seats)
            .await?;
        self.inventory
            .initialize(&leg.flight_number, leg.travel_date, flight.total_seats)
            .await?;

        let available = self
            .inventory
            .list_available(&leg.flight_number, leg.travel_date)
            .await?;
        let free: HashSet<&str> = available.iter().map(String::as_str).collect();
        let missing: Vec<String> = leg
            .seats
            .iter()
            .filter(|seat| !free.contains(seat.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            metrics::counter!("seat_reservation_conflicts_total").increment(1);
            let known: HashSet<String> = generate_seat_numbers(flight.total_seats)
                .into_iter()
                .collect();
            let (unknown, taken): (Vec<String>, Vec<String>) =
                missing.into_iter().partition(|seat| !known.contains(seat));

            let err = if unknown.is_empty() {
                InventoryError::SeatUnavailable {
                    flight_number: leg.flight_number.clone(),
                    travel_date: leg.travel_date,
                    seats: taken,
                }
            } else {
                InventoryError::UnknownSeats {
                    flight_number: leg.flight_number.clone(),
                    travel_date: leg.travel_date,
                    seats: unknown,
                    available,
                }
            };
            return Err(err.into());
        }
        run.advance(BookingSagaState::SeatsVerified)?;

        let reservation = SeatReservation::new(
            leg.flight_number.clone(),
            leg.travel_date,
            leg.seats.clone(),
            run.code.clone(),
        );
        match self.inventory.reserve(&reservation).await {
            Ok(seats) => {
                metrics::counter!("seat_reservations_total").increment(seats.len() as u64);
                run.reserved_legs += 1;
                run.advance(BookingSagaState::SeatsReserved)
            }
            Err(e) => {
                if matches!(
                    e,
                    InventoryError::SeatUnavailable { .. } | InventoryError::UnknownSeats { .. }
                ) {
                    metrics::counter!("seat_reservation_conflicts_total").increment(1);
                }
                Err(e.into())
            }
        }
    }

    /// Marks the saga failed, releasing seats if any leg was reserved.
    async fn fail(&self, run: &mut SagaRun, reason: &BookingError) {
        if run.reserved_legs > 0 {
            self.compensate(&run.code, reason).await;
        }
        run.state = BookingSagaState::Failed;
    }

    /// Releases every seat tagged with the code. Failures are logged, not returned.
    #[tracing::instrument(skip(self, reason))]
    async fn compensate(&self, code: &ReservationCode, reason: &BookingError) {
        metrics::counter!("booking_compensations_total").increment(1);
        tracing::warn!(%code, reason = %reason, "releasing reserved seats");

        match self.inventory.release(code).await {
            Ok(released) => {
                metrics::counter!("seats_released_total")
                    .increment(released.seats_released() as u64);
                tracing::info!(%code, seats = released.seats_released(), "compensation completed");
            }
            Err(e) => {
                metrics::counter!("booking_compensation_failures_total").increment(1);
                tracing::error!(
                    %code,
                    error = %e,
                    "compensation failed, seats remain tagged with the reservation code"
                );
            }
        }
    }

    /// Sends a notification, logging instead of failing. Returns true if delivered.
    async fn send(&self, notification: &BookingNotification) -> bool {
        match self.notifier.notify(notification).await {
            Ok(()) => true,
            Err(e) => {
                metrics::counter!("booking_notifications_failed_total").increment(1);
                tracing::error!(
                    reservation_code = %notification.reservation_code,
                    kind = notification.kind.as_str(),
                    error = %e,
                    "notification failed"
                );
                false
            }
        }
    }

    async fn fresh_code(&self) -> Result<ReservationCode> {
        let mut code = ReservationCode::generate();
        for _ in 1..MAX_CODE_ATTEMPTS {
            let in_store = self.bookings.find_by_code(&code).await?.is_some();
            let holds_seats = !self.inventory.seats_for_reservation(&code).await?.is_empty();
            if !in_store && !holds_seats {
                return Ok(code);
            }
            tracing::debug!(%code, "reservation code collision, regenerating");
            code = ReservationCode::generate();
        }
        Err(StoreError::DuplicateCode(code).into())
    }

    fn build_booking(
        code: &ReservationCode,
        identity: &Identity,
        request: &CreateBookingRequest,
        contact_email: String,
        amount: Money,
    ) -> Booking {
        let passengers = request
            .passengers
            .iter()
            .map(|p| Passenger {
                name: p.name.trim().to_string(),
                gender: p.gender,
                meal_preference: p.meal_preference,
                seat_number: p.seat_number.clone(),
                return_seat_number: p.return_seat_number.clone(),
            })
            .collect();

        let booking = Booking::new(
            code.clone(),
            request.flight_number.clone(),
            request.travel_date,
            identity.user_id.clone(),
            contact_email,
            passengers,
        )
        .with_amount(amount)
        .with_status(BookingStatus::Confirmed);

        match &request.return_leg {
            Some(leg) => booking.with_return_leg(ReturnLeg {
                flight_number: leg.flight_number.clone(),
                travel_date: leg.travel_date,
            }),
            None => booking,
        }
    }

    /// Returns the caller's booking.
    #[tracing::instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn get_booking(
        &self,
        identity: &Identity,
        code: &ReservationCode,
    ) -> Result<BookingSummary> {
        Ok(self.load_owned(identity, code).await?.into())
    }

    /// Lists every booking the caller owns, newest first.
    #[tracing::instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn list_bookings(&self, identity: &Identity) -> Result<Vec<BookingSummary>> {
        let bookings = self.bookings.find_by_owner(&identity.user_id).await?;
        Ok(bookings.into_iter().map(BookingSummary::from).collect())
    }

    /// Cancels the caller's booking and returns its seats to the pool.
    #[tracing::instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn cancel_booking(
        &self,
        identity: &Identity,
        code: &ReservationCode,
    ) -> Result<CancellationResult> {
        let booking = self.load_owned(identity, code).await?;
        if !booking.status.can_cancel() {
            return Err(BookingError::AlreadyCancelled(code.clone()));
        }

        // Only the caller whose conditional update lands goes on to release.
        let cancelled = self.bookings.cancel(code).await.map_err(|e| match e {
            StoreError::AlreadyCancelled(code) => BookingError::AlreadyCancelled(code),
            other => other.into(),
        })?;

        match self.inventory.release(code).await {
            Ok(released) => {
                metrics::counter!("seats_released_total")
                    .increment(released.seats_released() as u64);
                tracing::info!(%code, seats = released.seats_released(), "seats released");
            }
            Err(e) => {
                metrics::counter!("booking_compensation_failures_total").increment(1);
                tracing::error!(
                    %code,
                    error = %e,
                    "booking cancelled but seat release failed"
                );
                return Err(e.into());
            }
        }
        metrics::counter!("booking_cancellations_total").increment(1);

        let flight = match self.catalog.get_flight(&cancelled.flight_number).await {
            Ok(flight) => flight,
            Err(e) => {
                tracing::warn!(%code, error = %e, "flight details unavailable for notification");
                None
            }
        };
        let notification = BookingNotification::for_booking(
            NotificationKind::BookingCancelled,
            &cancelled,
            flight.as_ref(),
        );
        self.send(&notification).await;

        Ok(CancellationResult {
            reservation_code: code.clone(),
            status: cancelled.status,
            message: "Booking cancelled successfully".to_string(),
        })
    }

    async fn load_owned(&self, identity: &Identity, code: &ReservationCode) -> Result<Booking> {
        let booking = self
            .bookings
            .find_by_code(code)
            .await?
            .ok_or_else(|| BookingError::BookingNotFound(code.clone()))?;

        if !booking.is_owned_by(&identity.user_id) {
            return Err(BookingError::AccessDenied(code.clone()));
        }
        Ok(booking)
    }
}
