//! Free-spins triggering and state transitions.

use crate::config::FreeSpinsConfig;
use crate::state::GameMode;
use crate::state::PlayerState;
use serde::Deserialize;
use serde::Serialize;
use sf_core::ID;
use sf_core::Multiplier;
use sf_core::SCATTER_TRIGGER;
use sf_core::Spin;

/// Which grid fired the trigger. The initial grid takes precedence:
/// the post-cascade check only fires when the initial one did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Initial,
    Final,
}

/// Outcome of scatter evaluation for one spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Trigger {
    pub triggered: bool,
    pub source: Option<TriggerSource>,
    pub retriggered: bool,
    pub spins_awarded: u32,
}

/// Free-spins summary carried on every spin result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinInfo {
    /// True when this spin itself ran in free-spins mode.
    pub active: bool,
    pub triggered: bool,
    pub source: Option<TriggerSource>,
    pub retriggered: bool,
    pub spins_awarded: u32,
    /// Scatters on the final grid.
    pub scatter_count: usize,
    /// Free spins left after this spin resolves.
    pub remaining_after: u32,
    /// Accumulated multiplier carried into the next spin.
    pub accumulated_multiplier: Multiplier,
}

/// Evaluate scatter counts from the initial and final grids against the
/// trigger rules for the current mode.
pub fn evaluate(
    config: &FreeSpinsConfig,
    mode: GameMode,
    initial_scatters: usize,
    final_scatters: usize,
) -> Trigger {
    match mode {
        GameMode::Base => {
            if initial_scatters >= SCATTER_TRIGGER {
                Trigger {
                    triggered: true,
                    source: Some(TriggerSource::Initial),
                    retriggered: false,
                    spins_awarded: config.scatter_4_plus,
                }
            } else if final_scatters >= SCATTER_TRIGGER {
                Trigger {
                    triggered: true,
                    source: Some(TriggerSource::Final),
                    retriggered: false,
                    spins_awarded: config.scatter_4_plus,
                }
            } else {
                Trigger::default()
            }
        }
        GameMode::FreeSpins => {
            if final_scatters >= SCATTER_TRIGGER {
                Trigger {
                    triggered: false,
                    source: Some(TriggerSource::Final),
                    retriggered: true,
                    spins_awarded: config.retrigger_spins,
                }
            } else {
                Trigger::default()
            }
        }
    }
}

/// Compute the state the player carries into the next spin.
///
/// From base: a trigger enters free spins at the awarded count with a
/// fresh accumulated multiplier. Within free spins: one spin is
/// consumed, a retrigger adds spins without touching the multiplier,
/// fresh multiplier values accrue additively, and running out of spins
/// drops back to base with the multiplier reset to 1.
pub fn next_state(
    state: &PlayerState,
    trigger: &Trigger,
    m_total: Multiplier,
    spin: ID<Spin>,
) -> PlayerState {
    let mut next = state.clone();
    next.last_spin = Some(spin);
    next.version = state.version + 1;
    match state.mode {
        GameMode::Base => {
            if trigger.triggered {
                next.mode = GameMode::FreeSpins;
                next.free_spins_remaining = trigger.spins_awarded;
                next.accumulated_multiplier = 1;
            }
        }
        GameMode::FreeSpins => {
            let consumed = state.free_spins_remaining.saturating_sub(1);
            let awarded = if trigger.retriggered {
                trigger.spins_awarded
            } else {
                0
            };
            next.free_spins_remaining = consumed + awarded;
            next.accumulated_multiplier = state.accumulated_multiplier + m_total;
            if next.free_spins_remaining == 0 {
                next.mode = GameMode::Base;
                next.accumulated_multiplier = 1;
            }
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::RETRIGGER_SPINS;
    use sf_core::SCATTER_4_PLUS;

    fn config() -> FreeSpinsConfig {
        crate::config::EngineConfig::standard().free_spins
    }

    fn free_spins_state(remaining: u32, accumulated: Multiplier) -> PlayerState {
        let mut state = PlayerState::fresh(ID::default());
        state.mode = GameMode::FreeSpins;
        state.free_spins_remaining = remaining;
        state.accumulated_multiplier = accumulated;
        state.version = 3;
        state
    }

    #[test]
    fn three_scatters_never_trigger() {
        let trigger = evaluate(&config(), GameMode::Base, 3, 3);
        assert!(!trigger.triggered);
        assert_eq!(trigger.spins_awarded, 0);
    }

    #[test]
    fn initial_grid_takes_precedence() {
        let trigger = evaluate(&config(), GameMode::Base, 4, 6);
        assert!(trigger.triggered);
        assert_eq!(trigger.source, Some(TriggerSource::Initial));
        assert_eq!(trigger.spins_awarded, SCATTER_4_PLUS);
    }

    #[test]
    fn post_cascade_trigger_fires_when_initial_did_not() {
        let trigger = evaluate(&config(), GameMode::Base, 2, 4);
        assert!(trigger.triggered);
        assert_eq!(trigger.source, Some(TriggerSource::Final));
    }

    #[test]
    fn free_spins_mode_retriggers_on_final_grid() {
        let trigger = evaluate(&config(), GameMode::FreeSpins, 1, 5);
        assert!(!trigger.triggered);
        assert!(trigger.retriggered);
        assert_eq!(trigger.spins_awarded, RETRIGGER_SPINS);
    }

    #[test]
    fn base_trigger_enters_free_spins() {
        let state = PlayerState::fresh(ID::default());
        let trigger = evaluate(&config(), GameMode::Base, 4, 4);
        let next = next_state(&state, &trigger, 3, ID::default());
        assert_eq!(next.mode, GameMode::FreeSpins);
        assert_eq!(next.free_spins_remaining, SCATTER_4_PLUS);
        // Multipliers drawn on the triggering spin pay that spin only.
        assert_eq!(next.accumulated_multiplier, 1);
        assert_eq!(next.version, 1);
        assert!(next.coherent());
    }

    #[test]
    fn retrigger_preserves_and_extends() {
        // remaining 3, accumulated 2, retrigger plus M_total 5:
        // remaining = (3 - 1) + 5 = 7, accumulated = 2 + 5 = 7.
        let state = free_spins_state(3, 2);
        let trigger = evaluate(&config(), GameMode::FreeSpins, 0, 4);
        let next = next_state(&state, &trigger, 5, ID::default());
        assert_eq!(next.free_spins_remaining, 7);
        assert_eq!(next.accumulated_multiplier, 7);
        assert_eq!(next.mode, GameMode::FreeSpins);
    }

    #[test]
    fn last_spin_without_retrigger_returns_to_base() {
        let state = free_spins_state(1, 9);
        let trigger = evaluate(&config(), GameMode::FreeSpins, 0, 2);
        let next = next_state(&state, &trigger, 4, ID::default());
        assert_eq!(next.mode, GameMode::Base);
        assert_eq!(next.free_spins_remaining, 0);
        assert_eq!(next.accumulated_multiplier, 1);
        assert!(next.coherent());
    }

    #[test]
    fn last_spin_with_retrigger_stays_in_free_spins() {
        let state = free_spins_state(1, 9);
        let trigger = evaluate(&config(), GameMode::FreeSpins, 0, 4);
        let next = next_state(&state, &trigger, 0, ID::default());
        assert_eq!(next.mode, GameMode::FreeSpins);
        assert_eq!(next.free_spins_remaining, RETRIGGER_SPINS);
        assert_eq!(next.accumulated_multiplier, 9);
    }

    #[test]
    fn version_strictly_increases() {
        let state = free_spins_state(5, 2);
        let next = next_state(&state, &Trigger::default(), 0, ID::default());
        assert_eq!(next.version, state.version + 1);
    }
}
