//! Async runtime for live slot sessions.
//!
//! Imperative shell around the sf-engine functional core: per-player
//! locking, wallet movements, state CAS, result persistence, the
//! idempotency cache, and the RTP watermark, all bound together by the
//! [`Controller`]. Backends are swappable per seam; the `database`
//! feature adds the PostgreSQL tier.

mod controller;
mod error;
mod lock;
mod pending;
mod results;
mod rtp;
mod store;
mod wallet;

#[cfg(feature = "database")]
mod repository;

pub use controller::BuyReceipt;
pub use controller::Controller;
pub use controller::Services;
pub use error::Fault;
pub use lock::PlayerLocks;
pub use pending::PendingResults;
pub use results::MemoryResults;
pub use results::ResultStore;
pub use rtp::RtpMonitor;
pub use store::CachedStore;
pub use store::GameStateStore;
pub use store::MemoryStore;
pub use wallet::MemoryWallet;
pub use wallet::Receipt;
pub use wallet::WalletLedger;

#[cfg(feature = "database")]
pub use repository::PgResults;
#[cfg(feature = "database")]
pub use repository::PgStateStore;
#[cfg(feature = "database")]
pub use repository::PgWallet;
#[cfg(feature = "database")]
pub use repository::bootstrap;
