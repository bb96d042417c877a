//! Random multiplier phases.
//!
//! Both phases run after the cascade loop on the completed sequence.
//! Values drawn in one spin are additive: the spin's `M_total` is their
//! sum, never a product.

use crate::config::EngineConfig;
use crate::grid::Cell;
use crate::rng::SpinRng;
use serde::Deserialize;
use serde::Serialize;
use sf_core::CELLS;
use sf_core::Credits;
use sf_core::Multiplier;
use sf_core::ROWS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierKind {
    BaseRandom,
    CascadeRandom,
}

/// One multiplier presentation event: the values drawn, the cells they
/// land on, and the cosmetic presenter tag (no payout effect).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierEvent {
    pub kind: MultiplierKind,
    pub values: Vec<Multiplier>,
    pub positions: Vec<Cell>,
    pub character_tag: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiplierOutcome {
    pub events: Vec<MultiplierEvent>,
    /// Sum of every value drawn this spin; zero when nothing fired.
    pub total: Multiplier,
}

/// Evaluate both phases. The cascade-random phase is checked first,
/// then the base-random phase independently; draw order is part of the
/// replay contract.
pub fn evaluate(
    config: &EngineConfig,
    rng: &mut SpinRng,
    bet: Credits,
    cascade_count: usize,
    win_so_far: Credits,
) -> MultiplierOutcome {
    let mut outcome = MultiplierOutcome::default();
    if win_so_far < config.multiplier_threshold(bet) {
        return outcome;
    }
    let cascade = &config.cascade_multiplier;
    if cascade_count >= 1 && rng.chance(cascade.trigger_chance) {
        let count = rng.random_int(cascade.min_multipliers as i64, cascade.max_multipliers as i64)
            as usize;
        outcome.events.push(draw_event(
            config,
            rng,
            MultiplierKind::CascadeRandom,
            count,
        ));
    }
    if rng.chance(config.random_multiplier.trigger_chance) {
        outcome
            .events
            .push(draw_event(config, rng, MultiplierKind::BaseRandom, 1));
    }
    outcome.total = outcome
        .events
        .iter()
        .flat_map(|e| e.values.iter())
        .sum();
    outcome
}

fn draw_event(
    config: &EngineConfig,
    rng: &mut SpinRng,
    kind: MultiplierKind,
    count: usize,
) -> MultiplierEvent {
    let values: Vec<Multiplier> = (0..count)
        .map(|_| rng.pick(&config.random_multiplier.table))
        .collect();
    MultiplierEvent {
        kind,
        values,
        positions: sample_cells(rng, count),
        character_tag: rng.pick(&config.character_tags),
    }
}

/// `count` distinct cells chosen by partial Fisher-Yates over the grid.
fn sample_cells(rng: &mut SpinRng, count: usize) -> Vec<Cell> {
    let mut indices: Vec<usize> = (0..CELLS).collect();
    let count = count.min(CELLS);
    for slot in 0..count {
        let pick = rng.random_int(slot as i64, CELLS as i64 - 1) as usize;
        indices.swap(slot, pick);
    }
    indices
        .into_iter()
        .take(count)
        .map(|index| Cell::new(index / ROWS, index % ROWS))
        .collect()
}

/// Apply the spin's multipliers to the raw (unmultiplied) cascade win.
///
/// Base mode: `raw * M_total` when anything fired, else `raw`.
/// Free spins: cascades already paid `raw * accumulated`; the spin
/// settles at `raw * (accumulated + M_total)`, exact in integer cents
/// because the raw total is carried alongside the multiplied one.
pub fn settle_win(
    raw_win: Credits,
    accumulated: Multiplier,
    m_total: Multiplier,
    in_free_spins: bool,
) -> Credits {
    if in_free_spins {
        raw_win * (accumulated + m_total) as Credits
    } else if m_total > 0 {
        raw_win * m_total as Credits
    } else {
        raw_win
    }
}
