//! Deterministic cascading cluster-pays spin pipeline.
//!
//! Functional core of the starfall engine: everything in this crate is
//! pure given `(state, seed)`. The gameroom crate is the imperative
//! shell that owns locking, money movement, and persistence.

pub mod cascade;
pub mod cluster;
pub mod config;
pub mod freespins;
pub mod generator;
pub mod grid;
pub mod multiplier;
pub mod paytable;
pub mod pipeline;
pub mod result;
pub mod rng;
pub mod state;
pub mod symbol;

pub use cascade::CascadeStep;
pub use cascade::Refill;
pub use cascade::WeightedRefill;
pub use cluster::Cluster;
pub use config::ConfigProfile;
pub use config::EngineConfig;
pub use config::SpinProfile;
pub use freespins::FreeSpinInfo;
pub use freespins::TriggerSource;
pub use grid::Cell;
pub use grid::GapGrid;
pub use grid::Grid;
pub use multiplier::MultiplierEvent;
pub use multiplier::MultiplierKind;
pub use paytable::Paytable;
pub use result::Features;
pub use result::SpinResult;
pub use rng::AuditEvent;
pub use rng::Seed;
pub use rng::SpinRng;
pub use rng::WeightedTable;
pub use state::GameMode;
pub use state::PlayerState;
pub use symbol::Symbol;
