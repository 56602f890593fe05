//! Booking saga state machine.

use serde::{Deserialize, Serialize};

/// The step a booking saga has reached.
///
/// State transitions:
/// ```text
/// Validating ──► SeatsVerified ──► SeatsReserved ──► Persisted ──► Notified
///     │               │   ▲              │
///     │               │   └──next leg────┤
///     └───────────────┴──────────────────┴──► Failed
/// ```
///
/// A round trip verifies and reserves each leg in turn, so `SeatsReserved`
/// may step back to `SeatsVerified` once per extra leg. `Persisted` is a
/// successful outcome on its own: notification is best effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingSagaState {
    #[default]
    Validating,

    /// The requested seats of the current leg were free when checked.
    SeatsVerified,

    /// Seats are booked and the counter debited for every leg so far.
    SeatsReserved,

    /// The confirmed booking record is stored.
    Persisted,

    /// The confirmation was delivered (terminal state).
    Notified,

    /// The saga aborted; any reserved seats were released (terminal state).
    Failed,
}

impl BookingSagaState {
    /// Returns true if the saga may move from this state to `next`.
    pub fn can_transition_to(&self, next: BookingSagaState) -> bool {
        use BookingSagaState::*;
        match (self, next) {
            (Validating, SeatsVerified) => true,
            (SeatsVerified, SeatsReserved) => true,
            (SeatsReserved, SeatsVerified) => true,
            (SeatsReserved, Persisted) => true,
            (Persisted, Notified) => true,
            (Validating | SeatsVerified | SeatsReserved, Failed) => true,
            _ => false,
        }
    }

    /// Returns true if the booking exists, whether or not it was notified.
    pub fn is_success(&self) -> bool {
        matches!(self, BookingSagaState::Persisted | BookingSagaState::Notified)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingSagaState::Notified | BookingSagaState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingSagaState::Validating => "VALIDATING",
            BookingSagaState::SeatsVerified => "SEATS_VERIFIED",
            BookingSagaState::SeatsReserved => "SEATS_RESERVED",
            BookingSagaState::Persisted => "PERSISTED",
            BookingSagaState::Notified => "NOTIFIED",
            BookingSagaState::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for BookingSagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
