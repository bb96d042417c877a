//! Core type aliases, traits, and constants for starfall.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the starfall workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Money amounts in integer cents. All bets, wins, and balances.
pub type Credits = i64;
/// Grid column index (0 = leftmost). Columns are the gravity axis.
pub type Col = usize;
/// Grid row index (0 = top).
pub type Row = usize;
/// Multiplier values and the accumulated free-spins multiplier.
pub type Multiplier = u64;
/// Optimistic-concurrency version counter on per-player game state.
pub type Version = u64;

// ============================================================================
// TRAITS
// ============================================================================
/// Random instance generation for testing and simulation.
pub trait Arbitrary {
    /// Generate a uniformly random instance.
    fn random() -> Self;
}

/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Marker for player identities resolved by the outer service layer.
pub struct Player;
/// Marker for spin identities shared by results, records, and the ledger.
pub struct Spin;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast ID<T> to ID<U> while preserving the underlying UUID.
    /// Useful for converting between marker types.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// GRID PARAMETERS
// ============================================================================
/// Number of grid columns (reels). Columns are the gravity axis.
pub const COLS: usize = 6;
/// Number of grid rows. Row 0 is the top of each column.
pub const ROWS: usize = 5;
/// Total cell count.
pub const CELLS: usize = COLS * ROWS;
/// Minimum connected-cluster size that pays.
pub const MIN_MATCH: usize = 8;
/// Hard cap on cascade steps per spin. The loop always terminates here
/// even if refills keep producing clusters.
pub const MAX_CASCADE_STEPS: usize = 20;

// ============================================================================
// PAYOUT PARAMETERS
// Paytable values are credits per bet-unit; one bet buys BET_UNITS units.
// ============================================================================
/// Bet units per bet: payout = bet * paytable_value / BET_UNITS.
pub const BET_UNITS: Credits = 20;
/// Max-win cap as a multiple of the bet. Exceeding wins are truncated.
pub const MAX_WIN_MULTIPLIER: Credits = 5000;
/// Long-run return-to-player target (informational + monitoring).
pub const RTP_TARGET: f64 = 0.965;
/// Allowed deviation from RTP_TARGET before a result is rejected.
pub const RTP_ALLOWED_DEVIATION: f64 = 0.35;
/// Turnover (cents) below which the RTP monitor never rejects.
pub const RTP_MIN_VOLUME: Credits = 100_000_00;
/// Smallest accepted bet (cents).
pub const MIN_BET: Credits = 10;
/// Largest accepted bet (cents).
pub const MAX_BET: Credits = 100_000;

// ============================================================================
// FREE SPINS
// ============================================================================
/// Scatter count that triggers or retriggers free spins.
pub const SCATTER_TRIGGER: usize = 4;
/// Free spins awarded on a 4+ scatter trigger from base mode.
pub const SCATTER_4_PLUS: u32 = 15;
/// Additional spins awarded on a retrigger during free spins.
pub const RETRIGGER_SPINS: u32 = 5;
/// Buy-feature cost as a multiple of the bet.
pub const BUY_FEATURE_COST: Credits = 100;
/// Free spins granted by the buy feature.
pub const BUY_FEATURE_SPINS: u32 = 15;

// ============================================================================
// CONTROLLER TIMING
// ============================================================================
/// Retention window for the client-request-id idempotency cache.
pub const RETENTION_WINDOW: std::time::Duration = std::time::Duration::from_secs(5 * 60);
/// Timeout for acquiring the per-player exclusive lock.
pub const LOCK_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
/// Deadline for the pre-debit phase of a spin.
pub const SPIN_DEADLINE: std::time::Duration = std::time::Duration::from_secs(10);
/// Bounded size of the in-memory game-state cache tier.
pub const STATE_CACHE_CAPACITY: usize = 4096;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn id_cast_preserves_uuid() {
        let id: ID<Player> = ID::default();
        let cast: ID<Spin> = id.cast();
        assert_eq!(id.inner(), cast.inner());
    }
    #[test]
    fn id_roundtrips_through_serde() {
        let id: ID<Spin> = ID::default();
        let json = serde_json::to_string(&id).unwrap();
        let back: ID<Spin> = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
    #[test]
    fn grid_dimensions_are_consistent() {
        assert_eq!(CELLS, COLS * ROWS);
        assert!(MIN_MATCH <= CELLS);
    }
}
