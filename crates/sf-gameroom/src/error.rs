use thiserror::Error;

/// Every fault the gameroom surfaces. The controller is the only
/// boundary translating these outward; inner layers return them typed.
///
/// Client faults reject the request without touching state. Concurrency
/// faults are retried once by the controller and surfaced if they
/// persist. Integrity faults abort the spin and roll back everything
/// after the debit. Infrastructure faults wrap the store's own error.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("bet outside allowed bounds")]
    InvalidBet,
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error("account is not active")]
    InactiveAccount,
    #[error("unknown player")]
    UnknownPlayer,
    #[error("player is already in free spins")]
    AlreadyInFreeSpins,
    #[error("game state version conflict")]
    StateConflict,
    #[error("player lock timed out")]
    LockTimeout,
    #[error("spin deadline exceeded")]
    DeadlineExceeded,
    #[error("result failed validation: {0}")]
    ValidationFailed(String),
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Store(String),
}

impl Fault {
    /// Client faults carry no side effects and are safe to retry with
    /// corrected input.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidBet
                | Self::InsufficientCredits
                | Self::InactiveAccount
                | Self::UnknownPlayer
                | Self::AlreadyInFreeSpins
        )
    }
}

#[cfg(feature = "database")]
impl From<sf_pg::PgErr> for Fault {
    fn from(err: sf_pg::PgErr) -> Self {
        Self::Store(err.to_string())
    }
}
