//! starfall: server-authoritative cascading cluster-pays slot engine.
//!
//! Umbrella crate re-exporting the workspace surface. The engine crate
//! is the pure spin pipeline; the gameroom crate is the imperative
//! shell with stores, wallet, and the controller.

pub use sf_core::Credits;
pub use sf_core::ID;
pub use sf_core::Player;
pub use sf_core::Spin;
pub use sf_core::Unique;

pub use sf_engine::CascadeStep;
pub use sf_engine::EngineConfig;
pub use sf_engine::FreeSpinInfo;
pub use sf_engine::GameMode;
pub use sf_engine::Grid;
pub use sf_engine::MultiplierEvent;
pub use sf_engine::Paytable;
pub use sf_engine::PlayerState;
pub use sf_engine::Seed;
pub use sf_engine::SpinResult;
pub use sf_engine::Symbol;
pub use sf_engine::pipeline;

pub use sf_records::Account;
pub use sf_records::AccountStatus;
pub use sf_records::EntryKind;
pub use sf_records::LedgerEntry;
pub use sf_records::SpinRecord;

pub use sf_gameroom::BuyReceipt;
pub use sf_gameroom::CachedStore;
pub use sf_gameroom::Controller;
pub use sf_gameroom::Fault;
pub use sf_gameroom::GameStateStore;
pub use sf_gameroom::MemoryResults;
pub use sf_gameroom::MemoryStore;
pub use sf_gameroom::MemoryWallet;
pub use sf_gameroom::ResultStore;
pub use sf_gameroom::Services;
pub use sf_gameroom::WalletLedger;

#[cfg(feature = "database")]
pub use sf_gameroom::PgResults;
#[cfg(feature = "database")]
pub use sf_gameroom::PgStateStore;
#[cfg(feature = "database")]
pub use sf_gameroom::PgWallet;
#[cfg(feature = "database")]
pub use sf_gameroom::bootstrap;

/// Controller over the in-memory backends: the dev composition used by
/// tests and the simulator, and the `SKIP_PERSISTENCE` story in one
/// constructor.
pub fn memory_controller(
    config: EngineConfig,
) -> Result<Controller<CachedStore<MemoryStore>, MemoryWallet, MemoryResults>, Fault> {
    Controller::new(Services {
        config,
        store: CachedStore::new(MemoryStore::new()),
        wallet: MemoryWallet::new(),
        results: MemoryResults::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_composition_spins_end_to_end() {
        let controller = memory_controller(EngineConfig::standard()).unwrap();
        let player = ID::default();
        controller.wallet().open(Account::new(player, 1_000_00));
        let result = controller.spin(player, 100, Some("boot-1")).await.unwrap();
        assert!(result.verify_hashes());
        assert_eq!(
            controller.get_replay(result.id).await.unwrap(),
            result,
        );
    }
}
