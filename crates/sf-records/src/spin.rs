use serde::Deserialize;
use serde::Serialize;
use sf_core::Credits;
use sf_core::ID;
use sf_core::Player;
use sf_core::Spin;
use sf_core::Unique;
use sf_engine::GameMode;
use sf_engine::Seed;
use sf_engine::SpinResult;
use std::time::SystemTime;

/// Persistent row for one completed spin: the queryable columns plus the
/// full result payload for byte-exact replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRecord {
    id: ID<Spin>,
    player: ID<Player>,
    bet: Credits,
    total_win: Credits,
    mode: GameMode,
    seed: Seed,
    client_ref: Option<String>,
    payload: serde_json::Value,
    created_at: SystemTime,
}

impl SpinRecord {
    /// Capture a finalized result. Serialization cannot fail for a
    /// result the pipeline produced.
    pub fn of(result: &SpinResult) -> Self {
        Self {
            id: result.id,
            player: result.player,
            bet: result.bet,
            total_win: result.total_win,
            mode: result.mode,
            seed: result.seed.clone(),
            client_ref: result.client_ref.clone(),
            payload: serde_json::to_value(result).expect("spin result serializes"),
            created_at: SystemTime::now(),
        }
    }
    pub fn player(&self) -> ID<Player> {
        self.player
    }
    pub fn bet(&self) -> Credits {
        self.bet
    }
    pub fn total_win(&self) -> Credits {
        self.total_win
    }
    pub fn mode(&self) -> GameMode {
        self.mode
    }
    pub fn seed(&self) -> &Seed {
        &self.seed
    }
    pub fn client_ref(&self) -> Option<&str> {
        self.client_ref.as_deref()
    }
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }
    /// Reconstruct the full result from the stored payload.
    pub fn result(&self) -> Result<SpinResult, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

impl Unique<Spin> for SpinRecord {
    fn id(&self) -> ID<Spin> {
        self.id
    }
}

/// Snapshot row for the `game_states` table: the live state plus the
/// replay anchors of the spin that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    state: sf_engine::PlayerState,
    last_grid_hash: Option<String>,
    last_seed: Option<Seed>,
}

impl StateRecord {
    pub fn new(
        state: sf_engine::PlayerState,
        last_grid_hash: Option<String>,
        last_seed: Option<Seed>,
    ) -> Self {
        Self {
            state,
            last_grid_hash,
            last_seed,
        }
    }
    pub fn state(&self) -> &sf_engine::PlayerState {
        &self.state
    }
    pub fn last_grid_hash(&self) -> Option<&str> {
        self.last_grid_hash.as_deref()
    }
    pub fn last_seed(&self) -> Option<&Seed> {
        self.last_seed.as_ref()
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sf_pg::*;

    impl Table for SpinRecord {
        fn name() -> &'static str {
            SPIN_RESULTS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                SPIN_RESULTS,
                " (
                    id          UUID PRIMARY KEY,
                    player_id   UUID NOT NULL REFERENCES ",
                PLAYERS,
                "(id),
                    bet         BIGINT NOT NULL,
                    total_win   BIGINT NOT NULL,
                    game_mode   VARCHAR(16) NOT NULL,
                    rng_seed    TEXT NOT NULL,
                    client_ref  TEXT,
                    payload     JSONB NOT NULL,
                    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_spin_results_player ON ",
                SPIN_RESULTS,
                " (player_id, created_at);
                 CREATE INDEX IF NOT EXISTS idx_spin_results_client_ref ON ",
                SPIN_RESULTS,
                " (client_ref) WHERE client_ref IS NOT NULL;"
            )
        }
    }

    impl Table for StateRecord {
        fn name() -> &'static str {
            GAME_STATES
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                GAME_STATES,
                " (
                    player_id                UUID PRIMARY KEY REFERENCES ",
                PLAYERS,
                "(id),
                    mode                     VARCHAR(16) NOT NULL,
                    free_spins_remaining     INTEGER NOT NULL,
                    accumulated_multiplier   BIGINT NOT NULL,
                    version                  BIGINT NOT NULL,
                    state_data               JSONB NOT NULL
                );"
            )
        }
        fn indices() -> &'static str {
            ""
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_engine::EngineConfig;
    use sf_engine::PlayerState;
    use sf_engine::pipeline;

    #[test]
    fn record_roundtrips_to_the_original_result() {
        let config = EngineConfig::standard();
        let state = PlayerState::fresh(ID::default());
        let result = pipeline::spin(&config, &state, ID::default(), 100, Seed::from("record"));
        let record = SpinRecord::of(&result);
        assert_eq!(record.id(), result.id);
        assert_eq!(record.total_win(), result.total_win);
        let back = record.result().unwrap();
        assert_eq!(back, result);
        assert!(back.verify_hashes());
    }

    #[test]
    fn state_record_carries_replay_anchors() {
        let state = PlayerState::fresh(ID::default());
        let record = StateRecord::new(state.clone(), Some("ab".repeat(32)), Some(Seed::from("s")));
        assert_eq!(record.state(), &state);
        assert_eq!(record.last_grid_hash().unwrap().len(), 64);
    }
}
