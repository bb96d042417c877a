//! The wallet ledger: atomic debit-bet / credit-win with balance
//! invariants and store-level idempotency on `(kind, reference)`.

use crate::error::Fault;
use sf_core::Credits;
use sf_core::ID;
use sf_core::Player;
use sf_core::Spin;
use sf_core::Unique;
use sf_records::Account;
use sf_records::EntryKind;
use sf_records::LedgerEntry;
use std::collections::HashMap;

/// Acknowledgement of one ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub entry: ID<LedgerEntry>,
    pub balance_after: Credits,
}

/// Wallet contract. Entries are append-only; a movement that already
/// exists for the same `(kind, reference)` pair is acknowledged again
/// without moving money, which is what makes request retries safe.
#[allow(async_fn_in_trait)]
pub trait WalletLedger {
    async fn account(&self, player: ID<Player>) -> Result<Account, Fault>;
    async fn debit_bet(
        &self,
        player: ID<Player>,
        amount: Credits,
        reference: ID<Spin>,
    ) -> Result<Receipt, Fault>;
    async fn credit_win(
        &self,
        player: ID<Player>,
        amount: Credits,
        reference: ID<Spin>,
    ) -> Result<Receipt, Fault>;
    /// Manual correction in either direction; positive deltas credit.
    async fn adjust(
        &self,
        player: ID<Player>,
        delta: Credits,
        reference: ID<Spin>,
    ) -> Result<Receipt, Fault>;
    async fn balance(&self, player: ID<Player>) -> Result<Credits, Fault>;
    async fn entries(&self, player: ID<Player>) -> Result<Vec<LedgerEntry>, Fault>;
    /// Remove a movement as part of transaction rollback. The entry
    /// disappears and its balance effect is reversed.
    async fn revert(&self, player: ID<Player>, entry: ID<LedgerEntry>) -> Result<(), Fault>;
}

struct Slot {
    account: Account,
    entries: Vec<LedgerEntry>,
}

/// In-memory wallet: the dev composition and the durable tier of tests.
pub struct MemoryWallet {
    inner: parking_lot::Mutex<HashMap<ID<Player>, Slot>>,
}

impl MemoryWallet {
    pub fn new() -> Self {
        Self {
            inner: parking_lot::Mutex::new(HashMap::new()),
        }
    }
    /// Register an account. Spins for unregistered players fail with
    /// [`Fault::UnknownPlayer`].
    pub fn open(&self, account: Account) {
        self.inner.lock().insert(
            account.id(),
            Slot {
                account,
                entries: Vec::new(),
            },
        );
    }

    fn movement(
        &self,
        player: ID<Player>,
        kind: EntryKind,
        amount: Credits,
        reference: ID<Spin>,
    ) -> Result<Receipt, Fault> {
        if amount <= 0 {
            return Err(Fault::InvalidBet);
        }
        let mut wallets = self.inner.lock();
        let slot = wallets.get_mut(&player).ok_or(Fault::UnknownPlayer)?;
        if kind == EntryKind::Bet && !slot.account.active() {
            return Err(Fault::InactiveAccount);
        }
        if let Some(existing) = slot
            .entries
            .iter()
            .find(|e| e.kind() == kind && e.reference() == reference)
        {
            log::warn!(
                "[wallet] duplicate {} for spin {} acknowledged without movement",
                kind.as_str(),
                reference,
            );
            return Ok(Receipt {
                entry: existing.id(),
                balance_after: slot.account.credits(),
            });
        }
        let before = slot.account.credits();
        match kind {
            EntryKind::Bet => {
                if !slot.account.debit(amount) {
                    return Err(Fault::InsufficientCredits);
                }
            }
            EntryKind::Win | EntryKind::Adjust => slot.account.credit(amount),
        }
        let entry = LedgerEntry::new(
            player,
            kind,
            amount,
            before,
            slot.account.credits(),
            reference,
        );
        let receipt = Receipt {
            entry: entry.id(),
            balance_after: entry.balance_after(),
        };
        slot.entries.push(entry);
        Ok(receipt)
    }
}

impl Default for MemoryWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletLedger for MemoryWallet {
    async fn account(&self, player: ID<Player>) -> Result<Account, Fault> {
        self.inner
            .lock()
            .get(&player)
            .map(|slot| slot.account.clone())
            .ok_or(Fault::UnknownPlayer)
    }
    async fn debit_bet(
        &self,
        player: ID<Player>,
        amount: Credits,
        reference: ID<Spin>,
    ) -> Result<Receipt, Fault> {
        self.movement(player, EntryKind::Bet, amount, reference)
    }
    async fn credit_win(
        &self,
        player: ID<Player>,
        amount: Credits,
        reference: ID<Spin>,
    ) -> Result<Receipt, Fault> {
        self.movement(player, EntryKind::Win, amount, reference)
    }
    async fn adjust(
        &self,
        player: ID<Player>,
        delta: Credits,
        reference: ID<Spin>,
    ) -> Result<Receipt, Fault> {
        if delta == 0 {
            return Err(Fault::InvalidBet);
        }
        let mut wallets = self.inner.lock();
        let slot = wallets.get_mut(&player).ok_or(Fault::UnknownPlayer)?;
        let before = slot.account.credits();
        if delta > 0 {
            slot.account.credit(delta);
        } else if !slot.account.debit(-delta) {
            return Err(Fault::InsufficientCredits);
        }
        let entry = LedgerEntry::new(
            player,
            EntryKind::Adjust,
            delta.abs(),
            before,
            slot.account.credits(),
            reference,
        );
        let receipt = Receipt {
            entry: entry.id(),
            balance_after: entry.balance_after(),
        };
        slot.entries.push(entry);
        Ok(receipt)
    }
    async fn balance(&self, player: ID<Player>) -> Result<Credits, Fault> {
        self.inner
            .lock()
            .get(&player)
            .map(|slot| slot.account.credits())
            .ok_or(Fault::UnknownPlayer)
    }
    async fn entries(&self, player: ID<Player>) -> Result<Vec<LedgerEntry>, Fault> {
        self.inner
            .lock()
            .get(&player)
            .map(|slot| slot.entries.clone())
            .ok_or(Fault::UnknownPlayer)
    }
    async fn revert(&self, player: ID<Player>, entry: ID<LedgerEntry>) -> Result<(), Fault> {
        let mut wallets = self.inner.lock();
        let slot = wallets.get_mut(&player).ok_or(Fault::UnknownPlayer)?;
        let index = slot
            .entries
            .iter()
            .position(|e| e.id() == entry)
            .ok_or(Fault::NotFound)?;
        let removed = slot.entries.remove(index);
        let delta = removed.delta();
        if delta >= 0 {
            if !slot.account.debit(delta) {
                // Reinstate; reverting this credit would overdraw.
                slot.entries.insert(index, removed);
                return Err(Fault::ValidationFailed(
                    "revert would overdraw balance".to_string(),
                ));
            }
        } else {
            slot.account.credit(-delta);
        }
        log::info!("[wallet] reverted {} for {}", entry, player);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet_with(credits: Credits) -> (MemoryWallet, ID<Player>) {
        let wallet = MemoryWallet::new();
        let player = ID::default();
        wallet.open(Account::new(player, credits));
        (wallet, player)
    }

    #[tokio::test]
    async fn debit_then_credit_tracks_balances() {
        let (wallet, player) = wallet_with(1_000);
        let spin = ID::default();
        let debit = wallet.debit_bet(player, 100, spin).await.unwrap();
        assert_eq!(debit.balance_after, 900);
        let credit = wallet.credit_win(player, 250, spin).await.unwrap();
        assert_eq!(credit.balance_after, 1_150);
        let entries = wallet.entries(player).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.consistent()));
    }

    #[tokio::test]
    async fn overdraft_is_rejected_without_a_ledger_entry() {
        let (wallet, player) = wallet_with(50);
        let result = wallet.debit_bet(player, 100, ID::default()).await;
        assert!(matches!(result, Err(Fault::InsufficientCredits)));
        assert!(wallet.entries(player).await.unwrap().is_empty());
        assert_eq!(wallet.balance(player).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn duplicate_reference_is_acknowledged_once() {
        let (wallet, player) = wallet_with(1_000);
        let spin = ID::default();
        let first = wallet.debit_bet(player, 100, spin).await.unwrap();
        let second = wallet.debit_bet(player, 100, spin).await.unwrap();
        assert_eq!(first.entry, second.entry);
        assert_eq!(wallet.balance(player).await.unwrap(), 900);
        assert_eq!(wallet.entries(player).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_player_is_a_client_fault() {
        let wallet = MemoryWallet::new();
        let result = wallet.debit_bet(ID::default(), 100, ID::default()).await;
        assert!(matches!(result, Err(Fault::UnknownPlayer)));
    }

    #[tokio::test]
    async fn suspended_accounts_cannot_bet() {
        let wallet = MemoryWallet::new();
        let player = ID::default();
        wallet.open(
            Account::new(player, 1_000).with_status(sf_records::AccountStatus::Suspended),
        );
        let result = wallet.debit_bet(player, 100, ID::default()).await;
        assert!(matches!(result, Err(Fault::InactiveAccount)));
    }

    #[tokio::test]
    async fn revert_undoes_a_movement_completely() {
        let (wallet, player) = wallet_with(1_000);
        let spin = ID::default();
        let debit = wallet.debit_bet(player, 100, spin).await.unwrap();
        wallet.revert(player, debit.entry).await.unwrap();
        assert_eq!(wallet.balance(player).await.unwrap(), 1_000);
        assert!(wallet.entries(player).await.unwrap().is_empty());
        // The same spin may be re-debited after a rollback.
        assert!(wallet.debit_bet(player, 100, spin).await.is_ok());
    }

    #[tokio::test]
    async fn adjust_moves_both_directions() {
        let (wallet, player) = wallet_with(100);
        wallet.adjust(player, 50, ID::default()).await.unwrap();
        assert_eq!(wallet.balance(player).await.unwrap(), 150);
        wallet.adjust(player, -150, ID::default()).await.unwrap();
        assert_eq!(wallet.balance(player).await.unwrap(), 0);
        let result = wallet.adjust(player, -1, ID::default()).await;
        assert!(matches!(result, Err(Fault::InsufficientCredits)));
    }

    #[test]
    fn balance_never_negative_and_ledger_reconciles() {
        // Random op sequences: the ledger must reconcile to the balance
        // and the balance must never go negative.
        use proptest::prelude::*;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        proptest!(|(ops in proptest::collection::vec((0u8..3, 1i64..500), 1..64))| {
            runtime.block_on(async {
                let initial = 1_000;
                let (wallet, player) = wallet_with(initial);
                for (kind, amount) in ops {
                    let reference = ID::default();
                    let _ = match kind {
                        0 => wallet.debit_bet(player, amount, reference).await,
                        1 => wallet.credit_win(player, amount, reference).await,
                        _ => wallet.adjust(player, -amount, reference).await,
                    };
                    prop_assert!(wallet.balance(player).await.unwrap() >= 0);
                }
                let entries = wallet.entries(player).await.unwrap();
                let total: Credits = entries.iter().map(|e| e.delta()).sum();
                prop_assert_eq!(initial + total, wallet.balance(player).await.unwrap());
                prop_assert!(entries.iter().all(|e| e.consistent()));
                Ok(())
            })?;
        });
    }
}
