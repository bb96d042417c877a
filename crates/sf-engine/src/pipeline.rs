//! The spin pipeline orchestrator.
//!
//! Functional core of the engine: sequences grid generation, the
//! cascade loop, scatter resolution, the multiplier phases, the max-win
//! cap, and the next-state computation into one replayable result.
//! Performs no I/O and is pure given `(state, seed)`; real play and
//! replay verification both call through here.

use crate::cascade;
use crate::cascade::WeightedRefill;
use crate::cluster;
use crate::config::EngineConfig;
use crate::freespins;
use crate::freespins::FreeSpinInfo;
use crate::generator;
use crate::multiplier;
use crate::result::Features;
use crate::result::SpinResult;
use crate::rng::Seed;
use crate::rng::SpinRng;
use crate::state::PlayerState;
use sf_core::Credits;
use sf_core::ID;
use sf_core::Spin;

/// Resolve one spin. The caller owns identity, seeding, and money
/// movement; everything between the seed and the settled result is
/// decided here.
pub fn spin(
    config: &EngineConfig,
    state: &PlayerState,
    spin: ID<Spin>,
    bet: Credits,
    seed: Seed,
) -> SpinResult {
    let mode = state.mode;
    let profile = config.profile_for(mode);

    let mut rng = SpinRng::new(seed.clone(), "grid_generator");
    let initial = generator::generate(&mut rng, profile);
    let grid_audit = rng.drain_audit();

    let mut refill = WeightedRefill::new(seed.clone(), profile);
    let cascade = cascade::run(
        &config.paytable,
        initial,
        bet,
        state.accumulated_multiplier,
        &mut refill,
    );

    let initial_scatters = cluster::scatters(&initial).len();
    let final_scatters = cluster::scatters(&cascade.final_grid).len();
    let trigger = freespins::evaluate(&config.free_spins, mode, initial_scatters, final_scatters);
    let scatter_win = config.paytable.scatter_pay(final_scatters, bet);

    rng.set_component("multiplier_engine");
    let win_so_far = cascade.win + scatter_win;
    let multipliers = multiplier::evaluate(config, &mut rng, bet, cascade.count(), win_so_far);
    let multiplier_audit = rng.drain_audit();

    // Multipliers settle against the raw cascade total; the scatter pay
    // rides on top unmultiplied. Cap before anything leaves the pipeline.
    let line_win = multiplier::settle_win(
        cascade.raw_win,
        state.accumulated_multiplier,
        multipliers.total,
        state.in_free_spins(),
    );
    let uncapped = line_win + scatter_win;
    let cap = bet * config.max_win_multiplier;
    let capped = uncapped > cap;
    let total_win = uncapped.min(cap);

    let next_state = freespins::next_state(state, &trigger, multipliers.total, spin);

    let mut audit = grid_audit;
    audit.extend(cascade.audit);
    audit.extend(multiplier_audit);
    for (t, event) in audit.iter_mut().enumerate() {
        event.t = t as u64;
    }

    log::debug!(
        "[pipeline] spin {} mode {} bet {} -> win {} over {} cascades",
        spin,
        mode,
        bet,
        total_win,
        cascade.steps.len(),
    );

    let free_spins = FreeSpinInfo {
        active: state.in_free_spins(),
        triggered: trigger.triggered,
        source: trigger.source,
        retriggered: trigger.retriggered,
        spins_awarded: trigger.spins_awarded,
        scatter_count: final_scatters,
        remaining_after: next_state.free_spins_remaining,
        accumulated_multiplier: next_state.accumulated_multiplier,
    };

    SpinResult {
        id: spin,
        player: state.player,
        client_ref: None,
        bet,
        mode,
        seed,
        initial_hash: initial.digest(),
        initial_grid: initial,
        final_hash: cascade.final_grid.digest(),
        final_grid: cascade.final_grid,
        cascades: cascade.steps,
        multiplier_events: multipliers.events,
        base_win: cascade.raw_win,
        scatter_win,
        total_win,
        free_spins,
        features: Features {
            capped,
            free_spins_triggered: trigger.triggered,
            free_spins_retriggered: trigger.retriggered,
        },
        next_state,
        balance_after: 0,
        audit,
    }
}
