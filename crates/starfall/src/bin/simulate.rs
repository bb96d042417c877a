//! Offline RTP and hit-rate simulation over the in-memory composition.
//!
//! Usage: `simulate [spins] [bet_cents] [standard|boosted]`

use starfall::Account;
use starfall::Credits;
use starfall::EngineConfig;
use starfall::ID;
use starfall::memory_controller;

#[tokio::main]
async fn main() {
    sf_core::log();

    let mut args = std::env::args().skip(1);
    let spins: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10_000);
    let bet: Credits = args.next().and_then(|s| s.parse().ok()).unwrap_or(100);
    let config = match args.next().as_deref() {
        Some("boosted") => EngineConfig::boosted(),
        _ => EngineConfig::standard(),
    };

    let controller = memory_controller(config).expect("valid config");
    let player = ID::default();
    // Bankroll large enough that the simulation never busts.
    controller
        .wallet()
        .open(Account::new(player, bet * spins as Credits * 100));

    let mut wins = 0u64;
    let mut best: Credits = 0;
    let mut triggers = 0u64;
    let mut cascades = 0u64;
    for i in 0..spins {
        let result = controller
            .spin(player, bet, None)
            .await
            .expect("simulation spin");
        if result.total_win > 0 {
            wins += 1;
        }
        best = best.max(result.total_win);
        cascades += result.cascades.len() as u64;
        if result.features.free_spins_triggered {
            triggers += 1;
        }
        if (i + 1) % 1_000 == 0 {
            log::info!(
                "[simulate] {} spins, rtp {:.4}, hit rate {:.3}",
                i + 1,
                controller.rtp(),
                wins as f64 / (i + 1) as f64,
            );
        }
    }

    log::info!("[simulate] finished {} spins at bet {}", spins, bet);
    log::info!("[simulate] rtp          {:.4}", controller.rtp());
    log::info!(
        "[simulate] hit rate     {:.4}",
        wins as f64 / spins.max(1) as f64,
    );
    log::info!(
        "[simulate] cascades     {:.3} per spin",
        cascades as f64 / spins.max(1) as f64,
    );
    log::info!("[simulate] fs triggers  {}", triggers);
    log::info!(
        "[simulate] best win     {}.{:02}",
        best / 100,
        best % 100,
    );
}
