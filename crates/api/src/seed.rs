//! Flight seed file loading.

use std::path::Path;

use saga::FlightDetails;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parses a JSON array of flights.
pub fn parse_flights(json: &str) -> Result<Vec<FlightDetails>, SeedError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads and parses a flight seed file.
pub async fn load_flights(path: &Path) -> Result<Vec<FlightDetails>, SeedError> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_flights(&contents)
}
