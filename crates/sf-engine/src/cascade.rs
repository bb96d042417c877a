//! The cascade loop: remove winning clusters, drop survivors, refill
//! from the top, repeat until the grid settles.
//!
//! The processor is pure game mechanics. It applies the free-spins
//! accumulated multiplier to each step's win but never triggers free
//! spins or random multipliers; the pipeline orchestrates those.

use crate::cluster;
use crate::cluster::Cluster;
use crate::config::SpinProfile;
use crate::generator;
use crate::grid::Cell;
use crate::grid::GapGrid;
use crate::grid::Grid;
use crate::paytable::Paytable;
use crate::rng::AuditEvent;
use crate::rng::Seed;
use crate::rng::SpinRng;
use crate::symbol::Symbol;
use serde::Deserialize;
use serde::Serialize;
use sf_core::COLS;
use sf_core::Col;
use sf_core::Credits;
use sf_core::MAX_CASCADE_STEPS;
use sf_core::Multiplier;
use sf_core::ROWS;
use sf_core::Row;

/// One surviving symbol moving down its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fall {
    pub col: Col,
    pub from: Row,
    pub to: Row,
}

/// One freshly generated symbol entering at the top of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSymbol {
    pub col: Col,
    pub row: Row,
    pub symbol: Symbol,
}

/// Immutable record of one cascade step, sufficient to replay and
/// audit the step in isolation. Grid hashes are SHA-256 over the
/// canonical serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    pub index: u32,
    pub seed: Seed,
    pub grid_before: Grid,
    pub clusters: Vec<Cluster>,
    pub grid_after_removal: GapGrid,
    pub drop_plan: Vec<Fall>,
    pub new_symbols: Vec<NewSymbol>,
    pub grid_after: Grid,
    pub cascade_win: Credits,
    pub running_total: Credits,
    pub hash_before: String,
    pub hash_after: String,
}

/// Result of running the cascade loop to quiescence.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeOutcome {
    pub steps: Vec<CascadeStep>,
    pub final_grid: Grid,
    /// Win total before any multiplier.
    pub raw_win: Credits,
    /// Win total with the accumulated multiplier applied per step.
    pub win: Credits,
    pub audit: Vec<AuditEvent>,
}

impl CascadeOutcome {
    pub fn count(&self) -> usize {
        self.steps.len()
    }
}

/// Source of replacement symbols for emptied cells. The production
/// implementation draws from the step's sub-seeded generator; tests
/// script exact symbols through the same seam.
pub trait Refill {
    /// Called once per cascade step before any draw.
    fn begin(&mut self, step: u32);
    /// Draw the next replacement symbol for `col`. Cells refill in
    /// column-major order, top row first.
    fn draw(&mut self, col: Col) -> Symbol;
    /// Seed identifying the current step's draws.
    fn seed(&self) -> Seed;
    /// Drain audit events recorded since the last call.
    fn drain_audit(&mut self) -> Vec<AuditEvent> {
        Vec::new()
    }
}

/// Refill drawing from the per-step sub-seed `root || %04d(step)` with
/// the mode's symbol distribution.
pub struct WeightedRefill<'c> {
    root: Seed,
    profile: &'c SpinProfile,
    rng: Option<SpinRng>,
}

impl<'c> WeightedRefill<'c> {
    pub fn new(root: Seed, profile: &'c SpinProfile) -> Self {
        Self {
            root,
            profile,
            rng: None,
        }
    }
}

impl Refill for WeightedRefill<'_> {
    fn begin(&mut self, step: u32) {
        self.rng = Some(SpinRng::new(self.root.subseed(step), "cascade_refill"));
    }
    fn draw(&mut self, _col: Col) -> Symbol {
        let rng = self.rng.as_mut().expect("begin precedes draw");
        generator::draw_symbol(rng, self.profile)
    }
    fn seed(&self) -> Seed {
        match &self.rng {
            Some(rng) => rng.seed().clone(),
            None => self.root.clone(),
        }
    }
    fn drain_audit(&mut self) -> Vec<AuditEvent> {
        match &mut self.rng {
            Some(rng) => rng.drain_audit(),
            None => Vec::new(),
        }
    }
}

/// Run the cascade loop. Terminates when no cluster pays or after
/// [`MAX_CASCADE_STEPS`] steps, whichever comes first.
pub fn run(
    paytable: &Paytable,
    initial: Grid,
    bet: Credits,
    accumulated: Multiplier,
    refill: &mut dyn Refill,
) -> CascadeOutcome {
    let mut steps: Vec<CascadeStep> = Vec::new();
    let mut audit = Vec::new();
    let mut current = initial;
    let mut raw_total: Credits = 0;
    let mut total: Credits = 0;
    while steps.len() < MAX_CASCADE_STEPS {
        let found = cluster::clusters(&current);
        if found.is_empty() {
            break;
        }
        let index = steps.len() as u32 + 1;
        refill.begin(index);
        let raw_step: Credits = found
            .iter()
            .map(|c| paytable.cluster_pay(c.symbol, c.size(), bet))
            .sum();
        let step_win = raw_step * accumulated as Credits;
        let mut gaps = GapGrid::from(current);
        for cluster in &found {
            for cell in &cluster.cells {
                gaps.clear(*cell);
            }
        }
        let (after, drop_plan, new_symbols) = settle(&gaps, refill);
        raw_total += raw_step;
        total += step_win;
        log::debug!(
            "[cascade] step {} cleared {} cells for {} ({} running)",
            index,
            gaps.holes(),
            step_win,
            total,
        );
        steps.push(CascadeStep {
            index,
            seed: refill.seed(),
            grid_before: current,
            clusters: found,
            grid_after_removal: gaps,
            drop_plan,
            new_symbols,
            grid_after: after,
            cascade_win: step_win,
            running_total: total,
            hash_before: current.digest(),
            hash_after: after.digest(),
        });
        audit.extend(refill.drain_audit());
        current = after;
    }
    CascadeOutcome {
        steps,
        final_grid: current,
        raw_win: raw_total,
        win: total,
        audit,
    }
}

/// Compact survivors downward preserving order, then refill the opened
/// top rows. Refill draws run per column, top row first.
fn settle(gaps: &GapGrid, refill: &mut dyn Refill) -> (Grid, Vec<Fall>, Vec<NewSymbol>) {
    let mut columns = [[Symbol::AmberShard; ROWS]; COLS];
    let mut falls = Vec::new();
    let mut fresh = Vec::new();
    for (col, column) in columns.iter_mut().enumerate() {
        let survivors: Vec<(Row, Symbol)> = (0..ROWS)
            .filter_map(|row| gaps.get(Cell::new(col, row)).map(|s| (row, s)))
            .collect();
        let missing = ROWS - survivors.len();
        for (row, slot) in column.iter_mut().enumerate().take(missing) {
            let symbol = refill.draw(col);
            *slot = symbol;
            fresh.push(NewSymbol { col, row, symbol });
        }
        for (offset, (from, symbol)) in survivors.into_iter().enumerate() {
            let to = missing + offset;
            column[to] = symbol;
            if to != from {
                falls.push(Fall { col, from, to });
            }
        }
    }
    (Grid::new(columns), falls, fresh)
}
