//! HTTP API server with observability for the flight booking system.
//!
//! Provides REST endpoints for booking and cancelling seats, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use booking::{BookingStore, InMemoryBookingStore};
use inventory::{InMemorySeatInventory, SeatInventory};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    BookingOrchestrator, FlightCatalog, FlightDetails, InMemoryFlightCatalog, LogNotifier,
    Notifier,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Orchestrator over type-erased back ends.
pub type Orchestrator = BookingOrchestrator<
    Arc<dyn SeatInventory>,
    Arc<dyn BookingStore>,
    Arc<dyn FlightCatalog>,
    Arc<dyn Notifier>,
>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub storage: StorageBackend,
}

impl AppState {
    pub fn new(
        inventory: Arc<dyn SeatInventory>,
        bookings: Arc<dyn BookingStore>,
        catalog: Arc<dyn FlightCatalog>,
        notifier: Arc<dyn Notifier>,
        storage: StorageBackend,
    ) -> Self {
        Self {
            orchestrator: BookingOrchestrator::new(inventory, bookings, catalog, notifier),
            storage,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/bookings", post(routes::bookings::create))
        .route("/bookings/my", get(routes::bookings::list_mine))
        .route("/bookings/{code}", get(routes::bookings::get))
        .route("/bookings/cancel/{code}", delete(routes::bookings::cancel))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates in-memory application state with a logging notifier.
///
/// The catalog is returned so callers can add flights.
pub fn create_default_state() -> (Arc<AppState>, InMemoryFlightCatalog) {
    let catalog = InMemoryFlightCatalog::new();
    let state = Arc::new(AppState::new(
        Arc::new(InMemorySeatInventory::new()),
        Arc::new(InMemoryBookingStore::new()),
        Arc::new(catalog.clone()),
        Arc::new(LogNotifier),
        StorageBackend::Memory,
    ));
    (state, catalog)
}

/// Registers seeded flights in the in-memory catalog and the capacity counter.
pub async fn seed_in_memory(
    state: &AppState,
    catalog: &InMemoryFlightCatalog,
    flights: Vec<FlightDetails>,
) -> inventory::Result<()> {
    for flight in flights {
        state
            .orchestrator
            .inventory()
            .register_flight(&flight.flight_number, flight.total_seats)
            .await?;
        tracing::info!(flight_number = %flight.flight_number, "flight registered");
        catalog.add_flight(flight).await;
    }
    Ok(())
}
