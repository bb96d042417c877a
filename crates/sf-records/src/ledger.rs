use serde::Deserialize;
use serde::Serialize;
use sf_core::Credits;
use sf_core::ID;
use sf_core::Player;
use sf_core::Spin;
use sf_core::Unique;
use std::time::SystemTime;

/// Ledger entry kind. `Adjust` covers manual corrections in either
/// direction; the balances record which way it went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Bet,
    Win,
    Adjust,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bet => "bet",
            Self::Win => "win",
            Self::Adjust => "adjust",
        }
    }
}

/// One append-only wallet movement. `amount` is always positive; the
/// kind and balances carry the direction. `reference` is the spin the
/// movement settles, which makes duplicates detectable at the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: ID<Self>,
    player: ID<Player>,
    kind: EntryKind,
    amount: Credits,
    balance_before: Credits,
    balance_after: Credits,
    reference: ID<Spin>,
    created_at: SystemTime,
}

impl LedgerEntry {
    pub fn new(
        player: ID<Player>,
        kind: EntryKind,
        amount: Credits,
        balance_before: Credits,
        balance_after: Credits,
        reference: ID<Spin>,
    ) -> Self {
        Self {
            id: ID::default(),
            player,
            kind,
            amount,
            balance_before,
            balance_after,
            reference,
            created_at: SystemTime::now(),
        }
    }
    /// Rebuild a stored row.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ID<Self>,
        player: ID<Player>,
        kind: EntryKind,
        amount: Credits,
        balance_before: Credits,
        balance_after: Credits,
        reference: ID<Spin>,
        created_at: SystemTime,
    ) -> Self {
        Self {
            id,
            player,
            kind,
            amount,
            balance_before,
            balance_after,
            reference,
            created_at,
        }
    }
    pub fn player(&self) -> ID<Player> {
        self.player
    }
    pub fn kind(&self) -> EntryKind {
        self.kind
    }
    pub fn amount(&self) -> Credits {
        self.amount
    }
    pub fn balance_before(&self) -> Credits {
        self.balance_before
    }
    pub fn balance_after(&self) -> Credits {
        self.balance_after
    }
    pub fn reference(&self) -> ID<Spin> {
        self.reference
    }
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }
    /// Signed effect on the balance.
    pub fn delta(&self) -> Credits {
        self.balance_after - self.balance_before
    }
    /// Entry-level invariant: positive amount, non-negative balances,
    /// and the balances move by exactly `amount` in the kind's direction.
    pub fn consistent(&self) -> bool {
        if self.amount <= 0 || self.balance_after < 0 || self.balance_before < 0 {
            return false;
        }
        match self.kind {
            EntryKind::Bet => self.balance_before - self.amount == self.balance_after,
            EntryKind::Win => self.balance_before + self.amount == self.balance_after,
            EntryKind::Adjust => {
                (self.balance_before - self.balance_after).abs() == self.amount
            }
        }
    }
}

impl Unique for LedgerEntry {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sf_pg::*;

    impl Table for LedgerEntry {
        fn name() -> &'static str {
            TRANSACTIONS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                TRANSACTIONS,
                " (
                    id              UUID PRIMARY KEY,
                    player_id       UUID NOT NULL REFERENCES ",
                PLAYERS,
                "(id),
                    kind            VARCHAR(8) NOT NULL,
                    amount          BIGINT NOT NULL CHECK (amount > 0),
                    balance_before  BIGINT NOT NULL CHECK (balance_before >= 0),
                    balance_after   BIGINT NOT NULL CHECK (balance_after >= 0),
                    reference_id    UUID NOT NULL,
                    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
                    UNIQUE (player_id, kind, reference_id)
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_transactions_player ON ",
                TRANSACTIONS,
                " (player_id, created_at);
                 CREATE INDEX IF NOT EXISTS idx_transactions_reference ON ",
                TRANSACTIONS,
                " (reference_id);"
            )
        }
    }
}
