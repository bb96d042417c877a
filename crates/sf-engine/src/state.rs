use serde::Deserialize;
use serde::Serialize;
use sf_core::ID;
use sf_core::Multiplier;
use sf_core::Player;
use sf_core::Spin;
use sf_core::Version;

/// Which engine the next spin runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Base,
    FreeSpins,
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::FreeSpins => write!(f, "free_spins"),
        }
    }
}

/// Per-player game state. Mutated only through the spin pipeline's
/// next-state computation or an explicit admin reset, never in place;
/// every successful write bumps `version`.
///
/// Invariants:
/// - `mode == FreeSpins` implies `free_spins_remaining >= 1`
/// - `mode == Base` implies `free_spins_remaining == 0` and
///   `accumulated_multiplier == 1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub player: ID<Player>,
    pub mode: GameMode,
    pub free_spins_remaining: u32,
    pub accumulated_multiplier: Multiplier,
    pub last_spin: Option<ID<Spin>>,
    pub version: Version,
}

impl PlayerState {
    /// State created on a player's first spin.
    pub fn fresh(player: ID<Player>) -> Self {
        Self {
            player,
            mode: GameMode::Base,
            free_spins_remaining: 0,
            accumulated_multiplier: 1,
            last_spin: None,
            version: 0,
        }
    }

    pub fn in_free_spins(&self) -> bool {
        self.mode == GameMode::FreeSpins
    }

    /// Mode/counter coherence check enforced before every store write.
    pub fn coherent(&self) -> bool {
        match self.mode {
            GameMode::Base => self.free_spins_remaining == 0 && self.accumulated_multiplier == 1,
            GameMode::FreeSpins => {
                self.free_spins_remaining >= 1 && self.accumulated_multiplier >= 1
            }
        }
    }

    /// Explicit reset back to base mode, used by admin tooling.
    pub fn reset(&self) -> Self {
        Self {
            player: self.player,
            mode: GameMode::Base,
            free_spins_remaining: 0,
            accumulated_multiplier: 1,
            last_spin: self.last_spin,
            version: self.version + 1,
        }
    }

    /// State granted by the buy-free-spins feature.
    pub fn bought(&self, spins: u32) -> Self {
        Self {
            player: self.player,
            mode: GameMode::FreeSpins,
            free_spins_remaining: spins,
            accumulated_multiplier: 1,
            last_spin: self.last_spin,
            version: self.version + 1,
        }
    }
}
