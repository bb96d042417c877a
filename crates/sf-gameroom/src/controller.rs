//! The spin controller: imperative shell binding pipeline, stores, and
//! wallet into one serialized, idempotent, rollback-safe operation per
//! player action.

use crate::error::Fault;
use crate::lock::PlayerLocks;
use crate::pending::PendingResults;
use crate::results::ResultStore;
use crate::rtp::RtpMonitor;
use crate::store::GameStateStore;
use crate::wallet::Receipt;
use crate::wallet::WalletLedger;
use sf_core::Credits;
use sf_core::ID;
use sf_core::MAX_BET;
use sf_core::MIN_BET;
use sf_core::Player;
use sf_core::SPIN_DEADLINE;
use sf_core::Spin;
use sf_engine::EngineConfig;
use sf_engine::PlayerState;
use sf_engine::Seed;
use sf_engine::SpinResult;
use sf_engine::pipeline;
use sf_records::Account;

/// Collaborators handed to the controller at construction. No ambient
/// singletons: the composition layer decides what backs each seam.
pub struct Services<S, W, R> {
    pub config: EngineConfig,
    pub store: S,
    pub wallet: W,
    pub results: R,
}

/// Acknowledgement of a buy-free-spins purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyReceipt {
    pub balance_after: Credits,
    pub state: PlayerState,
}

/// Coordinates one transactional spin: lock, validate, debit, resolve,
/// credit, state write, persist, cache. Any failure after the debit
/// rolls the whole operation back; no partial state is ever visible.
pub struct Controller<S, W, R> {
    config: EngineConfig,
    store: S,
    wallet: W,
    results: R,
    locks: PlayerLocks,
    pending: PendingResults,
    rtp: RtpMonitor,
}

impl<S, W, R> Controller<S, W, R>
where
    S: GameStateStore,
    W: WalletLedger,
    R: ResultStore,
{
    pub fn new(services: Services<S, W, R>) -> Result<Self, Fault> {
        services.config.validate().map_err(Fault::ValidationFailed)?;
        Ok(Self {
            config: services.config,
            store: services.store,
            wallet: services.wallet,
            results: services.results,
            locks: PlayerLocks::new(),
            pending: PendingResults::new(),
            rtp: RtpMonitor::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
    pub fn store(&self) -> &S {
        &self.store
    }
    pub fn wallet(&self) -> &W {
        &self.wallet
    }
    pub fn results(&self) -> &R {
        &self.results
    }
    /// Running RTP across everything this controller settled.
    pub fn rtp(&self) -> f64 {
        self.rtp.rtp()
    }

    /// Execute one spin for `player` at `bet` cents. A repeated
    /// `client_ref` inside the retention window returns the original
    /// result with zero side effects.
    pub async fn spin(
        &self,
        player: ID<Player>,
        bet: Credits,
        client_ref: Option<&str>,
    ) -> Result<SpinResult, Fault> {
        if let Some(key) = client_ref {
            if let Some(cached) = self.pending.get(key) {
                log::info!("[controller] request {} served from idempotency cache", key);
                return Ok(cached);
            }
            if let Some(stored) = self.results.find_by_ref(key).await? {
                log::info!("[controller] request {} recovered from persisted result", key);
                self.pending.put(key, stored.clone());
                return Ok(stored);
            }
        }
        let _guard = self.locks.acquire(player).await?;
        if let Some(key) = client_ref {
            // A concurrent retry may have finished while we waited.
            if let Some(cached) = self.pending.get(key) {
                return Ok(cached);
            }
        }
        let (account, state) = tokio::time::timeout(SPIN_DEADLINE, self.load(player))
            .await
            .map_err(|_| Fault::DeadlineExceeded)??;
        if !account.active() {
            return Err(Fault::InactiveAccount);
        }
        if !(MIN_BET..=MAX_BET).contains(&bet) {
            return Err(Fault::InvalidBet);
        }

        let spin_id: ID<Spin> = ID::default();
        let debit = match state.in_free_spins() {
            true => None,
            false => Some(self.wallet.debit_bet(player, bet, spin_id).await?),
        };

        let seed = Seed::generate();
        let mut result = pipeline::spin(&self.config, &state, spin_id, bet, seed);
        result.client_ref = client_ref.map(str::to_string);

        let staked = if debit.is_some() { bet } else { 0 };
        if let Err(fault) = self.rtp.admit(staked, result.total_win) {
            self.rollback(player, debit, None).await;
            return Err(fault);
        }

        let credit = if result.total_win > 0 {
            match self
                .wallet
                .credit_win(player, result.total_win, spin_id)
                .await
            {
                Ok(receipt) => Some(receipt),
                Err(fault) => {
                    self.rollback(player, debit, None).await;
                    return Err(fault);
                }
            }
        } else {
            None
        };

        result.balance_after = match self.wallet.balance(player).await {
            Ok(balance) => balance,
            Err(fault) => {
                self.rollback(player, debit, credit).await;
                return Err(fault);
            }
        };

        if let Err(fault) = self.commit_state(&mut result, &state).await {
            self.rollback(player, debit, credit).await;
            return Err(fault);
        }

        if let Err(fault) = self.results.record(&result).await {
            self.restore_state(&state, &result.next_state).await;
            self.rollback(player, debit, credit).await;
            return Err(fault);
        }

        if let Some(key) = client_ref {
            self.pending.put(key, result.clone());
        }
        log::info!(
            "[controller] spin {} for {}: bet {} won {} ({} mode)",
            spin_id,
            player,
            bet,
            result.total_win,
            result.mode,
        );
        Ok(result)
    }

    /// Current game state, for the service layer.
    pub async fn get_state(&self, player: ID<Player>) -> Result<PlayerState, Fault> {
        self.store.get(player).await?.ok_or(Fault::NotFound)
    }

    /// Enter free spins directly for `BUY_FEATURE_COST * bet`, without
    /// running the pipeline.
    pub async fn buy_free_spins(
        &self,
        player: ID<Player>,
        bet: Credits,
    ) -> Result<BuyReceipt, Fault> {
        let _guard = self.locks.acquire(player).await?;
        let (account, state) = self.load(player).await?;
        if !account.active() {
            return Err(Fault::InactiveAccount);
        }
        if !(MIN_BET..=MAX_BET).contains(&bet) {
            return Err(Fault::InvalidBet);
        }
        if state.in_free_spins() {
            return Err(Fault::AlreadyInFreeSpins);
        }
        let cost = bet * self.config.free_spins.buy_feature_cost;
        let purchase: ID<Spin> = ID::default();
        let receipt = self.wallet.debit_bet(player, cost, purchase).await?;
        let next = state.bought(self.config.free_spins.buy_feature_spins);
        if let Err(fault) = self.store.put(&next, state.version).await {
            self.rollback(player, Some(receipt), None).await;
            return Err(fault);
        }
        log::info!(
            "[controller] {} bought {} free spins for {}",
            player,
            next.free_spins_remaining,
            cost,
        );
        Ok(BuyReceipt {
            balance_after: receipt.balance_after,
            state: next,
        })
    }

    /// The stored result for a finished spin, re-verified against its
    /// grid hashes before leaving the store.
    pub async fn get_replay(&self, spin: ID<Spin>) -> Result<SpinResult, Fault> {
        let result = self.results.replay(spin).await?.ok_or(Fault::NotFound)?;
        if !result.verify_hashes() {
            log::error!("[controller] grid hash mismatch replaying spin {}", spin);
            return Err(Fault::ValidationFailed(format!(
                "grid hash mismatch for spin {}",
                spin
            )));
        }
        Ok(result)
    }

    /// The result answering `client_ref`, from the idempotency cache or
    /// from persisted records after the window expired.
    pub async fn get_pending_result(&self, client_ref: &str) -> Result<SpinResult, Fault> {
        if let Some(cached) = self.pending.get(client_ref) {
            return Ok(cached);
        }
        self.results
            .find_by_ref(client_ref)
            .await?
            .ok_or(Fault::NotFound)
    }

    /// Manual balance correction, serialized like any other operation.
    pub async fn adjust_credits(
        &self,
        player: ID<Player>,
        delta: Credits,
    ) -> Result<Receipt, Fault> {
        let _guard = self.locks.acquire(player).await?;
        self.wallet.adjust(player, delta, ID::default()).await
    }

    /// Admin reset: drop the player back to base mode explicitly.
    pub async fn reset_state(&self, player: ID<Player>) -> Result<PlayerState, Fault> {
        let _guard = self.locks.acquire(player).await?;
        let state = self.store.get(player).await?.ok_or(Fault::NotFound)?;
        let next = state.reset();
        self.store.put(&next, state.version).await?;
        Ok(next)
    }

    async fn load(&self, player: ID<Player>) -> Result<(Account, PlayerState), Fault> {
        let account = self.wallet.account(player).await?;
        let state = self
            .store
            .get(player)
            .await?
            .unwrap_or_else(|| PlayerState::fresh(player));
        Ok((account, state))
    }

    /// CAS the next state in, retrying once on a version conflict.
    /// The second failure is fatal and surfaced to the caller.
    async fn commit_state(
        &self,
        result: &mut SpinResult,
        prior: &PlayerState,
    ) -> Result<(), Fault> {
        match self.store.put(&result.next_state, prior.version).await {
            Ok(()) => Ok(()),
            Err(Fault::StateConflict) => {
                log::warn!(
                    "[controller] state conflict for {}, retrying once",
                    prior.player,
                );
                let fresh = self
                    .store
                    .get(prior.player)
                    .await?
                    .ok_or(Fault::StateConflict)?;
                let mut retry = result.next_state.clone();
                retry.version = fresh.version + 1;
                self.store.put(&retry, fresh.version).await?;
                result.next_state = retry;
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    /// Undo ledger movements of a failed spin, newest first.
    async fn rollback(&self, player: ID<Player>, debit: Option<Receipt>, credit: Option<Receipt>) {
        for receipt in [credit, debit].into_iter().flatten() {
            if let Err(fault) = self.wallet.revert(player, receipt.entry).await {
                log::error!(
                    "[controller] rollback of entry {} for {} failed: {}",
                    receipt.entry,
                    player,
                    fault,
                );
            }
        }
    }

    /// Re-point the stored state at the pre-spin values after a failure
    /// past the CAS write. The version keeps increasing.
    async fn restore_state(&self, prior: &PlayerState, written: &PlayerState) {
        let mut restored = prior.clone();
        restored.version = written.version + 1;
        if let Err(fault) = self.store.put(&restored, written.version).await {
            log::error!(
                "[controller] state restore for {} failed: {}",
                prior.player,
                fault,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::MemoryResults;
    use crate::store::CachedStore;
    use crate::store::MemoryStore;
    use crate::wallet::MemoryWallet;
    use sf_engine::GameMode;
    use sf_engine::Symbol;
    use sf_engine::WeightedTable;
    use sf_records::AccountStatus;
    use sf_records::EntryKind;

    type MemoryController = Controller<CachedStore<MemoryStore>, MemoryWallet, MemoryResults>;

    /// Every cell draws mind_gem: cascades run to the cap, the spin
    /// pays 80.00 at bet 1.00, and nothing depends on the seed.
    fn gem_flood() -> EngineConfig {
        let mut config = EngineConfig::standard();
        let gems = WeightedTable::weighted(vec![(Symbol::MindGem, 1)]);
        config.base.symbol_weights = gems.clone();
        config.base.scatter_chance = 0.0;
        config.free_spins_profile.symbol_weights = gems;
        config.free_spins_profile.scatter_chance = 0.0;
        config.random_multiplier.trigger_chance = 0.0;
        config.cascade_multiplier.trigger_chance = 0.0;
        config
    }

    /// Every cell is a scatter: no clusters, guaranteed trigger.
    fn scatter_flood() -> EngineConfig {
        let mut config = gem_flood();
        config.base.scatter_chance = 1.0;
        config.free_spins_profile.scatter_chance = 1.0;
        config
    }

    /// Deterministic win of a full gem flood at bet 1.00.
    const GEM_FLOOD_WIN: Credits = (100 * 80 / 20) * sf_core::MAX_CASCADE_STEPS as Credits;

    fn controller_with(config: EngineConfig, credits: Credits) -> (MemoryController, ID<Player>) {
        let wallet = MemoryWallet::new();
        let player = ID::default();
        wallet.open(Account::new(player, credits));
        let controller = Controller::new(Services {
            config,
            store: CachedStore::new(MemoryStore::new()),
            wallet,
            results: MemoryResults::new(),
        })
        .unwrap();
        (controller, player)
    }

    async fn seed_state(controller: &MemoryController, state: &PlayerState) {
        controller.store().put(state, 0).await.unwrap();
    }

    fn free_spins_state(player: ID<Player>, remaining: u32, accumulated: u64) -> PlayerState {
        let mut state = PlayerState::fresh(player);
        state.mode = GameMode::FreeSpins;
        state.free_spins_remaining = remaining;
        state.accumulated_multiplier = accumulated;
        state.version = 1;
        state
    }

    #[tokio::test]
    async fn base_spin_debits_credits_and_advances_state() {
        let (controller, player) = controller_with(gem_flood(), 100_000);
        let result = controller.spin(player, 100, None).await.unwrap();
        assert_eq!(result.total_win, GEM_FLOOD_WIN);
        assert_eq!(result.balance_after, 100_000 - 100 + GEM_FLOOD_WIN);
        assert_eq!(
            controller.wallet().balance(player).await.unwrap(),
            result.balance_after,
        );
        let entries = controller.wallet().entries(player).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind(), EntryKind::Bet);
        assert_eq!(entries[1].kind(), EntryKind::Win);
        assert!(entries.iter().all(|e| e.reference() == result.id));
        let state = controller.get_state(player).await.unwrap();
        assert_eq!(state.version, 1);
        assert_eq!(state.last_spin, Some(result.id));
    }

    #[tokio::test]
    async fn insufficient_credits_reject_without_side_effects() {
        let (controller, player) = controller_with(gem_flood(), 50);
        let result = controller.spin(player, 100, None).await;
        assert!(matches!(result, Err(Fault::InsufficientCredits)));
        assert_eq!(controller.wallet().balance(player).await.unwrap(), 50);
        assert!(controller.wallet().entries(player).await.unwrap().is_empty());
        assert!(matches!(
            controller.get_state(player).await,
            Err(Fault::NotFound)
        ));
    }

    #[tokio::test]
    async fn inactive_accounts_cannot_spin() {
        let wallet = MemoryWallet::new();
        let player = ID::default();
        wallet.open(Account::new(player, 10_000).with_status(AccountStatus::Suspended));
        let controller: MemoryController = Controller::new(Services {
            config: gem_flood(),
            store: CachedStore::new(MemoryStore::new()),
            wallet,
            results: MemoryResults::new(),
        })
        .unwrap();
        assert!(matches!(
            controller.spin(player, 100, None).await,
            Err(Fault::InactiveAccount)
        ));
    }

    #[tokio::test]
    async fn bets_outside_bounds_are_invalid() {
        let (controller, player) = controller_with(gem_flood(), 100_000_000);
        assert!(matches!(
            controller.spin(player, MIN_BET - 1, None).await,
            Err(Fault::InvalidBet)
        ));
        assert!(matches!(
            controller.spin(player, MAX_BET + 1, None).await,
            Err(Fault::InvalidBet)
        ));
    }

    #[tokio::test]
    async fn unknown_players_are_rejected() {
        let (controller, _) = controller_with(gem_flood(), 0);
        assert!(matches!(
            controller.spin(ID::default(), 100, None).await,
            Err(Fault::UnknownPlayer)
        ));
    }

    #[tokio::test]
    async fn duplicate_request_id_settles_exactly_once() {
        let (controller, player) = controller_with(gem_flood(), 100_000);
        let first = controller.spin(player, 100, Some("req-42")).await.unwrap();
        let second = controller.spin(player, 100, Some("req-42")).await.unwrap();
        assert_eq!(first, second);
        let entries = controller.wallet().entries(player).await.unwrap();
        assert_eq!(entries.len(), 2, "one debit and one credit, not four");
        assert_eq!(controller.get_state(player).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn scatter_trigger_enters_free_spins_and_pays_scatters() {
        let (controller, player) = controller_with(scatter_flood(), 100_000);
        let result = controller.spin(player, 100, None).await.unwrap();
        // 6+ scatter tier pays 10x bet; no cluster win exists.
        assert_eq!(result.total_win, 1_000);
        assert!(result.features.free_spins_triggered);
        let state = controller.get_state(player).await.unwrap();
        assert_eq!(state.mode, GameMode::FreeSpins);
        assert_eq!(state.free_spins_remaining, sf_core::SCATTER_4_PLUS);
        assert_eq!(state.accumulated_multiplier, 1);
    }

    #[tokio::test]
    async fn free_spins_do_not_debit_and_can_retrigger() {
        let (controller, player) = controller_with(scatter_flood(), 100_000);
        seed_state(&controller, &free_spins_state(player, 3, 2)).await;
        let result = controller.spin(player, 100, None).await.unwrap();
        let entries = controller.wallet().entries(player).await.unwrap();
        assert_eq!(entries.len(), 1, "free spins never debit the bet");
        assert_eq!(entries[0].kind(), EntryKind::Win);
        assert_eq!(result.balance_after, 100_000 + result.total_win);
        let state = controller.get_state(player).await.unwrap();
        assert_eq!(
            state.free_spins_remaining,
            3 - 1 + sf_core::RETRIGGER_SPINS,
        );
        assert_eq!(state.accumulated_multiplier, 2);
    }

    #[tokio::test]
    async fn final_free_spin_returns_to_base_with_multiplied_win() {
        let (controller, player) = controller_with(gem_flood(), 100_000);
        seed_state(&controller, &free_spins_state(player, 1, 3)).await;
        let result = controller.spin(player, 100, None).await.unwrap();
        // Cascade wins ride the accumulated multiplier inside the loop.
        assert_eq!(result.total_win, GEM_FLOOD_WIN * 3);
        let state = controller.get_state(player).await.unwrap();
        assert_eq!(state.mode, GameMode::Base);
        assert_eq!(state.free_spins_remaining, 0);
        assert_eq!(state.accumulated_multiplier, 1);
    }

    #[tokio::test]
    async fn buy_free_spins_charges_and_flips_state() {
        let (controller, player) = controller_with(gem_flood(), 100_000);
        let receipt = controller.buy_free_spins(player, 100).await.unwrap();
        // Cost is 100x the bet.
        assert_eq!(receipt.balance_after, 100_000 - 100 * 100);
        assert_eq!(receipt.state.mode, GameMode::FreeSpins);
        assert_eq!(
            receipt.state.free_spins_remaining,
            sf_core::BUY_FEATURE_SPINS,
        );
        assert!(matches!(
            controller.buy_free_spins(player, 100).await,
            Err(Fault::AlreadyInFreeSpins)
        ));
    }

    #[tokio::test]
    async fn buy_free_spins_requires_funds() {
        let (controller, player) = controller_with(gem_flood(), 5_000);
        assert!(matches!(
            controller.buy_free_spins(player, 100).await,
            Err(Fault::InsufficientCredits)
        ));
        assert_eq!(controller.wallet().balance(player).await.unwrap(), 5_000);
    }

    #[tokio::test]
    async fn replay_returns_the_exact_original_result() {
        let (controller, player) = controller_with(gem_flood(), 100_000);
        let result = controller.spin(player, 100, None).await.unwrap();
        let replay = controller.get_replay(result.id).await.unwrap();
        assert_eq!(replay, result);
        assert!(matches!(
            controller.get_replay(ID::default()).await,
            Err(Fault::NotFound)
        ));
    }

    #[tokio::test]
    async fn pending_result_is_served_by_request_id() {
        let (controller, player) = controller_with(gem_flood(), 100_000);
        let result = controller.spin(player, 100, Some("req-9")).await.unwrap();
        let pending = controller.get_pending_result("req-9").await.unwrap();
        assert_eq!(pending, result);
        assert!(matches!(
            controller.get_pending_result("req-10").await,
            Err(Fault::NotFound)
        ));
    }

    #[tokio::test]
    async fn zero_win_spins_leave_only_the_debit() {
        // Gem flood over an all-zero paytable: clusters cascade to the
        // cap but nothing pays, so no credit entry is written.
        let mut config = gem_flood();
        config.paytable = sf_engine::Paytable::new(
            Symbol::PAYING.iter().map(|s| (*s, [0, 0, 0])).collect(),
            [0, 0, 0],
        );
        let (controller, player) = controller_with(config, 100_000);
        let result = controller.spin(player, 100, None).await.unwrap();
        assert_eq!(result.total_win, 0);
        assert_eq!(result.balance_after, 100_000 - 100);
        let entries = controller.wallet().entries(player).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind(), EntryKind::Bet);
        assert_eq!(controller.get_state(player).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn ledger_reconciles_across_a_session() {
        let (controller, player) = controller_with(gem_flood(), 100_000);
        for _ in 0..5 {
            controller.spin(player, 100, None).await.unwrap();
        }
        let entries = controller.wallet().entries(player).await.unwrap();
        let total: Credits = entries.iter().map(|e| e.delta()).sum();
        assert_eq!(
            100_000 + total,
            controller.wallet().balance(player).await.unwrap(),
        );
        assert_eq!(controller.get_state(player).await.unwrap().version, 5);
    }

    #[tokio::test]
    async fn adjust_and_reset_are_exposed_for_admin_flows() {
        let (controller, player) = controller_with(gem_flood(), 1_000);
        let receipt = controller.adjust_credits(player, 500).await.unwrap();
        assert_eq!(receipt.balance_after, 1_500);
        seed_state(&controller, &free_spins_state(player, 5, 4)).await;
        let state = controller.reset_state(player).await.unwrap();
        assert_eq!(state.mode, GameMode::Base);
        assert_eq!(state.accumulated_multiplier, 1);
        assert_eq!(state.version, 2);
    }

    #[tokio::test]
    async fn rtp_monitor_tracks_settled_spins() {
        let (controller, player) = controller_with(gem_flood(), 1_000_000);
        assert_eq!(controller.rtp(), 0.0);
        controller.spin(player, 100, None).await.unwrap();
        assert!(controller.rtp() > 0.0);
    }
}
