use crate::cascade::CascadeStep;
use crate::freespins::FreeSpinInfo;
use crate::grid::Grid;
use crate::multiplier::MultiplierEvent;
use crate::rng::AuditEvent;
use crate::rng::Seed;
use crate::state::GameMode;
use crate::state::PlayerState;
use serde::Deserialize;
use serde::Serialize;
use sf_core::Credits;
use sf_core::ID;
use sf_core::Player;
use sf_core::Spin;
use sf_core::Unique;

/// Feature flags summarizing a spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Features {
    /// Win truncated at the max-win cap.
    pub capped: bool,
    pub free_spins_triggered: bool,
    pub free_spins_retriggered: bool,
}

/// The canonical spin record. There is exactly one shape: external
/// adapters may rename on the wire, the core never aliases fields.
/// Immutable once the controller finalizes the balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    pub id: ID<Spin>,
    pub player: ID<Player>,
    /// Client request id this result answers, when one was supplied.
    pub client_ref: Option<String>,
    pub bet: Credits,
    /// Mode the spin was played in.
    pub mode: GameMode,
    pub seed: Seed,
    pub initial_grid: Grid,
    pub initial_hash: String,
    pub final_grid: Grid,
    pub final_hash: String,
    pub cascades: Vec<CascadeStep>,
    pub multiplier_events: Vec<MultiplierEvent>,
    /// Cascade win before any multiplier.
    pub base_win: Credits,
    pub scatter_win: Credits,
    pub total_win: Credits,
    pub free_spins: FreeSpinInfo,
    pub features: Features,
    /// State the player carries into the next spin.
    pub next_state: PlayerState,
    /// Balance after settlement; stamped by the controller.
    pub balance_after: Credits,
    pub audit: Vec<AuditEvent>,
}

impl SpinResult {
    /// Recompute every stored grid hash. A mismatch means the record
    /// was corrupted after production.
    pub fn verify_hashes(&self) -> bool {
        self.initial_hash == self.initial_grid.digest()
            && self.final_hash == self.final_grid.digest()
            && self.cascades.iter().all(|step| {
                step.hash_before == step.grid_before.digest()
                    && step.hash_after == step.grid_after.digest()
            })
    }

    /// Sum of all multiplier values drawn this spin.
    pub fn m_total(&self) -> sf_core::Multiplier {
        self.multiplier_events
            .iter()
            .flat_map(|e| e.values.iter())
            .sum()
    }
}

impl Unique<Spin> for SpinResult {
    fn id(&self) -> ID<Spin> {
        self.id
    }
}
