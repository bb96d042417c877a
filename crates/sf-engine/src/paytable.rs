//! Cluster and scatter pay tables.
//!
//! Values are credits per bet-unit; one bet buys [`BET_UNITS`] units, so
//! `payout = bet * value / BET_UNITS` in integer cents. Tier lookup
//! saturates: a 9-cluster pays the 8 tier, a 30-cluster the 12 tier.

use crate::symbol::Symbol;
use serde::Deserialize;
use serde::Serialize;
use sf_core::BET_UNITS;
use sf_core::Credits;
use sf_core::MIN_MATCH;

/// Cluster size thresholds for the three pay tiers.
pub const CLUSTER_TIERS: [usize; 3] = [8, 10, 12];
/// Scatter count thresholds for the three scatter tiers.
pub const SCATTER_TIERS: [usize; 3] = [4, 5, 6];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paytable {
    /// Per-symbol values for cluster sizes 8 / 10 / 12+.
    cluster: Vec<(Symbol, [Credits; 3])>,
    /// Values for 4 / 5 / 6+ scatters on a grid.
    scatter: [Credits; 3],
}

impl Paytable {
    pub fn new(cluster: Vec<(Symbol, [Credits; 3])>, scatter: [Credits; 3]) -> Self {
        Self { cluster, scatter }
    }

    /// The production paytable tuned toward the configured RTP target.
    pub fn standard() -> Self {
        Self::new(
            vec![
                (Symbol::AmberShard, [4, 10, 30]),
                (Symbol::AzureShard, [5, 12, 40]),
                (Symbol::EmeraldShard, [6, 15, 50]),
                (Symbol::CrimsonShard, [8, 20, 60]),
                (Symbol::MindGem, [10, 25, 80]),
                (Symbol::PowerGem, [12, 30, 100]),
                (Symbol::SpaceGem, [15, 40, 150]),
                (Symbol::RealityGem, [20, 50, 200]),
                (Symbol::SoulGem, [30, 80, 300]),
                (Symbol::TimeGem, [50, 120, 500]),
            ],
            [60, 100, 200],
        )
    }

    /// Credits won by a cluster of `size` cells of `symbol` at `bet`.
    /// Zero below [`MIN_MATCH`] and for scatters.
    pub fn cluster_pay(&self, symbol: Symbol, size: usize, bet: Credits) -> Credits {
        let Some(tier) = Self::cluster_tier(size) else {
            return 0;
        };
        self.cluster
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, values)| bet * values[tier] / BET_UNITS)
            .unwrap_or(0)
    }

    /// Credits won by `count` scatters on a grid at `bet`.
    /// Zero below the lowest scatter tier.
    pub fn scatter_pay(&self, count: usize, bet: Credits) -> Credits {
        match Self::scatter_tier(count) {
            Some(tier) => bet * self.scatter[tier] / BET_UNITS,
            None => 0,
        }
    }

    /// Saturating tier index for a cluster size, `None` below MIN_MATCH.
    pub fn cluster_tier(size: usize) -> Option<usize> {
        if size < MIN_MATCH {
            None
        } else if size >= CLUSTER_TIERS[2] {
            Some(2)
        } else if size >= CLUSTER_TIERS[1] {
            Some(1)
        } else {
            Some(0)
        }
    }

    /// Saturating tier index for a scatter count.
    pub fn scatter_tier(count: usize) -> Option<usize> {
        if count < SCATTER_TIERS[0] {
            None
        } else if count >= SCATTER_TIERS[2] {
            Some(2)
        } else if count >= SCATTER_TIERS[1] {
            Some(1)
        } else {
            Some(0)
        }
    }

    /// True when every paying symbol has a row in the table.
    pub fn covers_all_symbols(&self) -> bool {
        Symbol::PAYING
            .iter()
            .all(|symbol| self.cluster.iter().any(|(s, _)| s == symbol))
    }
}

impl Default for Paytable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_pick_8_10_12() {
        assert_eq!(Paytable::cluster_tier(7), None);
        assert_eq!(Paytable::cluster_tier(8), Some(0));
        assert_eq!(Paytable::cluster_tier(9), Some(0));
        assert_eq!(Paytable::cluster_tier(10), Some(1));
        assert_eq!(Paytable::cluster_tier(11), Some(1));
        assert_eq!(Paytable::cluster_tier(12), Some(2));
        assert_eq!(Paytable::cluster_tier(30), Some(2));
    }

    #[test]
    fn mind_gem_eight_cluster_pays_half_bet() {
        let paytable = Paytable::standard();
        assert_eq!(paytable.cluster_pay(Symbol::MindGem, 8, 100), 50);
    }

    #[test]
    fn scatter_boundaries() {
        let paytable = Paytable::standard();
        assert_eq!(paytable.scatter_pay(3, 100), 0);
        assert_eq!(paytable.scatter_pay(4, 100), 100 * 60 / 20);
        assert_eq!(paytable.scatter_pay(5, 100), 100 * 100 / 20);
        assert_eq!(paytable.scatter_pay(6, 100), 100 * 200 / 20);
        assert_eq!(paytable.scatter_pay(9, 100), 100 * 200 / 20);
    }

    #[test]
    fn scatter_symbol_never_cluster_pays() {
        let paytable = Paytable::standard();
        assert_eq!(paytable.cluster_pay(Symbol::Scatter, 12, 100), 0);
    }

    #[test]
    fn payout_scales_with_bet() {
        let paytable = Paytable::standard();
        let at_one = paytable.cluster_pay(Symbol::TimeGem, 12, 100);
        let at_five = paytable.cluster_pay(Symbol::TimeGem, 12, 500);
        assert_eq!(at_five, at_one * 5);
    }

    #[test]
    fn standard_covers_every_paying_symbol() {
        assert!(Paytable::standard().covers_all_symbols());
    }
}
