//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::{AppState, StorageBackend};
use booking::PostgresBookingStore;
use inventory::{PostgresSeatInventory, SeatInventory};
use saga::{FlightDetails, LogNotifier, PostgresFlightCatalog};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn seed_flights(config: &Config) -> Vec<FlightDetails> {
    match &config.flight_seed_file {
        Some(path) => {
            let flights = api::seed::load_flights(path)
                .await
                .expect("failed to load flight seed file");
            tracing::info!(count = flights.len(), path = %path.display(), "loaded flight seed");
            flights
        }
        None => Vec::new(),
    }
}

async fn postgres_state(database_url: &str, config: &Config, flights: Vec<FlightDetails>) -> Arc<AppState> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await
        .expect("failed to connect to PostgreSQL");

    let inventory = PostgresSeatInventory::new(pool.clone());
    inventory
        .run_migrations()
        .await
        .expect("failed to run migrations");
    let bookings = PostgresBookingStore::new(pool.clone());
    let catalog = PostgresFlightCatalog::new(pool);

    for flight in &flights {
        catalog
            .upsert(flight)
            .await
            .expect("failed to seed flight catalog");
        inventory
            .register_flight(&flight.flight_number, flight.total_seats)
            .await
            .expect("failed to register flight capacity");
    }

    Arc::new(AppState::new(
        Arc::new(inventory),
        Arc::new(bookings),
        Arc::new(catalog),
        Arc::new(LogNotifier),
        StorageBackend::Postgres,
    ))
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the back ends and seed the flight catalog
    let flights = seed_flights(&config).await;
    let state = match &config.database_url {
        Some(url) => postgres_state(url, &config, flights).await,
        None => {
            let (state, catalog) = api::create_default_state();
            api::seed_in_memory(&state, &catalog, flights)
                .await
                .expect("failed to register seeded flights");
            state
        }
    };
    tracing::info!(storage = ?state.storage, "booking state ready");

    // 4. Build the application
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
