//! PostgreSQL backends for the gameroom seams.
//!
//! Each wrapper owns a shared client and implements the corresponding
//! trait with compile-time SQL over the table-name constants. Wallet
//! movements ride single CTE statements so balance update and ledger
//! append land atomically; the `(player_id, kind, reference_id)`
//! unique constraint turns replays into acknowledgements.

use crate::error::Fault;
use crate::results::ResultStore;
use crate::store::GameStateStore;
use crate::wallet::Receipt;
use crate::wallet::WalletLedger;
use sf_core::Credits;
use sf_core::ID;
use sf_core::Player;
use sf_core::Spin;
use sf_core::Unique;
use sf_core::Version;
use sf_engine::GameMode;
use sf_engine::PlayerState;
use sf_engine::SpinResult;
use sf_pg::GAME_STATES;
use sf_pg::PLAYERS;
use sf_pg::SPIN_RESULTS;
use sf_pg::TRANSACTIONS;
use sf_pg::Table;
use sf_records::Account;
use sf_records::AccountStatus;
use sf_records::EntryKind;
use sf_records::LedgerEntry;
use sf_records::SpinRecord;
use sf_records::StateRecord;
use std::sync::Arc;
use std::time::SystemTime;
use tokio_postgres::Client;
use tokio_postgres::error::SqlState;

/// Create all tables and indices. Idempotent; call once at startup.
pub async fn bootstrap(client: &Client) -> Result<(), Fault> {
    for ddl in [
        Account::creates(),
        Account::indices(),
        StateRecord::creates(),
        StateRecord::indices(),
        SpinRecord::creates(),
        SpinRecord::indices(),
        LedgerEntry::creates(),
        LedgerEntry::indices(),
    ] {
        if !ddl.is_empty() {
            client.batch_execute(ddl).await?;
        }
    }
    log::info!("[repository] schema bootstrapped");
    Ok(())
}

fn mode_str(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Base => "base",
        GameMode::FreeSpins => "free_spins",
    }
}

fn parse_mode(raw: &str) -> Result<GameMode, Fault> {
    match raw {
        "base" => Ok(GameMode::Base),
        "free_spins" => Ok(GameMode::FreeSpins),
        other => Err(Fault::Store(format!("unknown game mode {:?}", other))),
    }
}

fn parse_status(raw: &str) -> Result<AccountStatus, Fault> {
    match raw {
        "active" => Ok(AccountStatus::Active),
        "suspended" => Ok(AccountStatus::Suspended),
        "closed" => Ok(AccountStatus::Closed),
        other => Err(Fault::Store(format!("unknown account status {:?}", other))),
    }
}

fn parse_kind(raw: &str) -> Result<EntryKind, Fault> {
    match raw {
        "bet" => Ok(EntryKind::Bet),
        "win" => Ok(EntryKind::Win),
        "adjust" => Ok(EntryKind::Adjust),
        other => Err(Fault::Store(format!("unknown entry kind {:?}", other))),
    }
}

/// Durable game-state tier with CAS on `version`.
pub struct PgStateStore {
    client: Arc<Client>,
}

impl PgStateStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

impl GameStateStore for PgStateStore {
    async fn get(&self, player: ID<Player>) -> Result<Option<PlayerState>, Fault> {
        let row = self
            .client
            .query_opt(
                const_format::concatcp!(
                    "SELECT mode, free_spins_remaining, accumulated_multiplier, version, state_data FROM ",
                    GAME_STATES,
                    " WHERE player_id = $1"
                ),
                &[&player.inner()],
            )
            .await?;
        row.map(|row| {
            let data: serde_json::Value = row.get(4);
            let last_spin = data
                .get("last_spin_id")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<uuid::Uuid>().ok())
                .map(ID::from);
            Ok(PlayerState {
                player,
                mode: parse_mode(row.get::<_, &str>(0))?,
                free_spins_remaining: row.get::<_, i32>(1) as u32,
                accumulated_multiplier: row.get::<_, i64>(2) as u64,
                last_spin,
                version: row.get::<_, i64>(3) as Version,
            })
        })
        .transpose()
    }

    async fn put(&self, state: &PlayerState, expected: Version) -> Result<(), Fault> {
        if !state.coherent() {
            return Err(Fault::ValidationFailed(format!(
                "incoherent state for {}",
                state.player
            )));
        }
        let data = serde_json::json!({
            "last_spin_id": state.last_spin.map(|id| id.to_string()),
        });
        let rows = if expected == 0 {
            self.client
                .execute(
                    const_format::concatcp!(
                        "INSERT INTO ",
                        GAME_STATES,
                        " (player_id, mode, free_spins_remaining, accumulated_multiplier, version, state_data)
                         VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (player_id) DO NOTHING"
                    ),
                    &[
                        &state.player.inner(),
                        &mode_str(state.mode),
                        &(state.free_spins_remaining as i32),
                        &(state.accumulated_multiplier as i64),
                        &(state.version as i64),
                        &data,
                    ],
                )
                .await?
        } else {
            self.client
                .execute(
                    const_format::concatcp!(
                        "UPDATE ",
                        GAME_STATES,
                        " SET mode = $2, free_spins_remaining = $3, accumulated_multiplier = $4,
                              version = $5, state_data = $6
                          WHERE player_id = $1 AND version = $7"
                    ),
                    &[
                        &state.player.inner(),
                        &mode_str(state.mode),
                        &(state.free_spins_remaining as i32),
                        &(state.accumulated_multiplier as i64),
                        &(state.version as i64),
                        &data,
                        &(expected as i64),
                    ],
                )
                .await?
        };
        if rows == 1 {
            Ok(())
        } else {
            Err(Fault::StateConflict)
        }
    }

    async fn snapshot(&self, player: ID<Player>) -> Result<Option<PlayerState>, Fault> {
        self.get(player).await
    }
}

/// Durable wallet. Movements are single statements: the balance guard,
/// the balance update, and the ledger append succeed or fail together.
pub struct PgWallet {
    client: Arc<Client>,
}

impl PgWallet {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    async fn existing(
        &self,
        player: ID<Player>,
        kind: EntryKind,
        reference: ID<Spin>,
    ) -> Result<Option<Receipt>, Fault> {
        let row = self
            .client
            .query_opt(
                const_format::concatcp!(
                    "SELECT id, balance_after FROM ",
                    TRANSACTIONS,
                    " WHERE player_id = $1 AND kind = $2 AND reference_id = $3"
                ),
                &[&player.inner(), &kind.as_str(), &reference.inner()],
            )
            .await?;
        Ok(row.map(|row| Receipt {
            entry: ID::from(row.get::<_, uuid::Uuid>(0)),
            balance_after: row.get::<_, i64>(1),
        }))
    }
}

impl WalletLedger for PgWallet {
    async fn account(&self, player: ID<Player>) -> Result<Account, Fault> {
        let row = self
            .client
            .query_opt(
                const_format::concatcp!(
                    "SELECT status, credits, flags FROM ",
                    PLAYERS,
                    " WHERE id = $1"
                ),
                &[&player.inner()],
            )
            .await?
            .ok_or(Fault::UnknownPlayer)?;
        let flags: serde_json::Value = row.get(2);
        Ok(Account::restore(
            player,
            parse_status(row.get::<_, &str>(0))?,
            row.get::<_, i64>(1),
            serde_json::from_value(flags).unwrap_or_default(),
        ))
    }

    async fn debit_bet(
        &self,
        player: ID<Player>,
        amount: Credits,
        reference: ID<Spin>,
    ) -> Result<Receipt, Fault> {
        if amount <= 0 {
            return Err(Fault::InvalidBet);
        }
        let entry: ID<LedgerEntry> = ID::default();
        let attempt = self
            .client
            .query_opt(
                const_format::concatcp!(
                    "WITH moved AS (
                        UPDATE ",
                    PLAYERS,
                    " SET credits = credits - $2
                          WHERE id = $1 AND status = 'active' AND credits >= $2
                          RETURNING credits)
                     INSERT INTO ",
                    TRANSACTIONS,
                    " (id, player_id, kind, amount, balance_before, balance_after, reference_id)
                       SELECT $3, $1, 'bet', $2, credits + $2, credits, $4 FROM moved
                       RETURNING balance_after"
                ),
                &[&player.inner(), &amount, &entry.inner(), &reference.inner()],
            )
            .await;
        match attempt {
            Ok(Some(row)) => Ok(Receipt {
                entry,
                balance_after: row.get::<_, i64>(0),
            }),
            Ok(None) => {
                // Guard failed: work out which precondition broke.
                let account = self.account(player).await?;
                if !account.active() {
                    Err(Fault::InactiveAccount)
                } else {
                    Err(Fault::InsufficientCredits)
                }
            }
            Err(err) if err.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                log::warn!(
                    "[wallet] duplicate bet for spin {} acknowledged without movement",
                    reference,
                );
                self.existing(player, EntryKind::Bet, reference)
                    .await?
                    .ok_or_else(|| Fault::Store("duplicate bet vanished".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn credit_win(
        &self,
        player: ID<Player>,
        amount: Credits,
        reference: ID<Spin>,
    ) -> Result<Receipt, Fault> {
        if amount <= 0 {
            return Err(Fault::InvalidBet);
        }
        let entry: ID<LedgerEntry> = ID::default();
        let attempt = self
            .client
            .query_opt(
                const_format::concatcp!(
                    "WITH moved AS (
                        UPDATE ",
                    PLAYERS,
                    " SET credits = credits + $2 WHERE id = $1 RETURNING credits)
                     INSERT INTO ",
                    TRANSACTIONS,
                    " (id, player_id, kind, amount, balance_before, balance_after, reference_id)
                       SELECT $3, $1, 'win', $2, credits - $2, credits, $4 FROM moved
                       RETURNING balance_after"
                ),
                &[&player.inner(), &amount, &entry.inner(), &reference.inner()],
            )
            .await;
        match attempt {
            Ok(Some(row)) => Ok(Receipt {
                entry,
                balance_after: row.get::<_, i64>(0),
            }),
            Ok(None) => Err(Fault::UnknownPlayer),
            Err(err) if err.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                log::warn!(
                    "[wallet] duplicate win for spin {} acknowledged without movement",
                    reference,
                );
                self.existing(player, EntryKind::Win, reference)
                    .await?
                    .ok_or_else(|| Fault::Store("duplicate win vanished".to_string()))
            }
            Err(err) => Err(err.into()),
        }
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
        let entry: ID<LedgerEntry> = ID::default();
        let row = self
            .client
            .query_opt(
                const_format::concatcp!(
                    "WITH moved AS (
                        UPDATE ",
                    PLAYERS,
                    " SET credits = credits + $2
                          WHERE id = $1 AND credits + $2 >= 0
                          RETURNING credits)
                     INSERT INTO ",
                    TRANSACTIONS,
                    " (id, player_id, kind, amount, balance_before, balance_after, reference_id)
                       SELECT $3, $1, 'adjust', ABS($2), credits - $2, credits, $4 FROM moved
                       RETURNING balance_after"
                ),
                &[&player.inner(), &delta, &entry.inner(), &reference.inner()],
            )
            .await?;
        match row {
            Some(row) => Ok(Receipt {
                entry,
                balance_after: row.get::<_, i64>(0),
            }),
            None => {
                // Distinguishes a missing row from a blocked overdraft.
                self.account(player).await?;
                Err(Fault::InsufficientCredits)
            }
        }
    }

    async fn balance(&self, player: ID<Player>) -> Result<Credits, Fault> {
        self.account(player).await.map(|account| account.credits())
    }

    async fn entries(&self, player: ID<Player>) -> Result<Vec<LedgerEntry>, Fault> {
        let rows = self
            .client
            .query(
                const_format::concatcp!(
                    "SELECT id, kind, amount, balance_before, balance_after, reference_id, created_at FROM ",
                    TRANSACTIONS,
                    " WHERE player_id = $1 ORDER BY created_at, id"
                ),
                &[&player.inner()],
            )
            .await?;
        rows.iter()
            .map(|row| {
                Ok(LedgerEntry::restore(
                    ID::from(row.get::<_, uuid::Uuid>(0)),
                    player,
                    parse_kind(row.get::<_, &str>(1))?,
                    row.get::<_, i64>(2),
                    row.get::<_, i64>(3),
                    row.get::<_, i64>(4),
                    ID::from(row.get::<_, uuid::Uuid>(5)),
                    row.get::<_, SystemTime>(6),
                ))
            })
            .collect()
    }

    async fn revert(&self, player: ID<Player>, entry: ID<LedgerEntry>) -> Result<(), Fault> {
        let rows = self
            .client
            .execute(
                const_format::concatcp!(
                    "WITH removed AS (
                        DELETE FROM ",
                    TRANSACTIONS,
                    " WHERE id = $1 AND player_id = $2
                          RETURNING balance_after - balance_before AS delta)
                     UPDATE ",
                    PLAYERS,
                    " SET credits = credits - removed.delta FROM removed WHERE id = $2"
                ),
                &[&entry.inner(), &player.inner()],
            )
            .await?;
        if rows == 1 {
            log::info!("[wallet] reverted {} for {}", entry, player);
            Ok(())
        } else {
            Err(Fault::NotFound)
        }
    }
}

/// Durable spin results keyed by spin id and client request id.
pub struct PgResults {
    client: Arc<Client>,
}

impl PgResults {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn hydrate(payload: serde_json::Value) -> Result<SpinResult, Fault> {
        serde_json::from_value(payload).map_err(|e| Fault::Store(e.to_string()))
    }
}

impl ResultStore for PgResults {
    async fn record(&self, result: &SpinResult) -> Result<(), Fault> {
        let record = SpinRecord::of(result);
        self.client
            .execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    SPIN_RESULTS,
                    " (id, player_id, bet, total_win, game_mode, rng_seed, client_ref, payload)
                      VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT (id) DO NOTHING"
                ),
                &[
                    &record.id().inner(),
                    &record.player().inner(),
                    &record.bet(),
                    &record.total_win(),
                    &mode_str(record.mode()),
                    &record.seed().as_str(),
                    &record.client_ref(),
                    &record.payload(),
                ],
            )
            .await?;
        Ok(())
    }

    async fn replay(&self, spin: ID<Spin>) -> Result<Option<SpinResult>, Fault> {
        self.client
            .query_opt(
                const_format::concatcp!(
                    "SELECT payload FROM ",
                    SPIN_RESULTS,
                    " WHERE id = $1"
                ),
                &[&spin.inner()],
            )
            .await?
            .map(|row| Self::hydrate(row.get(0)))
            .transpose()
    }

    async fn find_by_ref(&self, client_ref: &str) -> Result<Option<SpinResult>, Fault> {
        self.client
            .query_opt(
                const_format::concatcp!(
                    "SELECT payload FROM ",
                    SPIN_RESULTS,
                    " WHERE client_ref = $1 ORDER BY created_at DESC LIMIT 1"
                ),
                &[&client_ref],
            )
            .await?
            .map(|row| Self::hydrate(row.get(0)))
            .transpose()
    }
}
