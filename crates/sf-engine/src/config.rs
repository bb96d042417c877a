//! Engine configuration.
//!
//! One [`EngineConfig`] owns every tunable of the pipeline: generation
//! profiles, paytable, free-spins rules, and multiplier tables. Configs
//! are read-only once the controller is built; a reload is a new
//! construction swapped in atomically by the composition layer.

use crate::paytable::Paytable;
use crate::rng::WeightedTable;
use crate::state::GameMode;
use crate::symbol::Symbol;
use serde::Deserialize;
use serde::Serialize;
use sf_core::BUY_FEATURE_COST;
use sf_core::BUY_FEATURE_SPINS;
use sf_core::Credits;
use sf_core::MAX_WIN_MULTIPLIER;
use sf_core::RETRIGGER_SPINS;
use sf_core::RTP_TARGET;
use sf_core::SCATTER_4_PLUS;

/// Named configuration variants. `Boosted` is the demo/stream profile
/// with livelier scatters and multipliers; the pipeline code is
/// identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigProfile {
    Standard,
    Boosted,
}

/// Symbol distribution for one game mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinProfile {
    /// Weighted draw over non-scatter symbols.
    pub symbol_weights: WeightedTable<Symbol>,
    /// Independent per-cell probability of replacing the drawn symbol
    /// with a scatter.
    pub scatter_chance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinsConfig {
    /// Spins awarded on a 4+ scatter trigger from base mode.
    pub scatter_4_plus: u32,
    /// Additional spins on a retrigger during free spins.
    pub retrigger_spins: u32,
    /// Buy-feature cost as a multiple of the bet.
    pub buy_feature_cost: Credits,
    /// Spins granted by the buy feature.
    pub buy_feature_spins: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomMultiplierConfig {
    /// Probability of the base-random phase firing.
    pub trigger_chance: f64,
    /// Win threshold in credits per bet-unit below which no phase fires.
    pub min_win_required: Credits,
    /// Weighted multiplier values.
    pub table: WeightedTable<sf_core::Multiplier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeMultiplierConfig {
    /// Probability of the cascade-random phase firing.
    pub trigger_chance: f64,
    /// Minimum multipliers drawn on a trigger.
    pub min_multipliers: usize,
    /// Maximum multipliers drawn on a trigger.
    pub max_multipliers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub profile: ConfigProfile,
    pub base: SpinProfile,
    pub free_spins_profile: SpinProfile,
    pub paytable: Paytable,
    pub free_spins: FreeSpinsConfig,
    pub random_multiplier: RandomMultiplierConfig,
    pub cascade_multiplier: CascadeMultiplierConfig,
    /// Cosmetic presenter tag attached to multiplier events.
    pub character_tags: WeightedTable<String>,
    /// Max-win cap as a multiple of the bet.
    pub max_win_multiplier: Credits,
    /// Long-run RTP target, informational and monitored.
    pub rtp_target: f64,
}

impl EngineConfig {
    pub fn standard() -> Self {
        let weights = WeightedTable::weighted(vec![
            (Symbol::AmberShard, 18),
            (Symbol::AzureShard, 16),
            (Symbol::EmeraldShard, 14),
            (Symbol::CrimsonShard, 12),
            (Symbol::MindGem, 9),
            (Symbol::PowerGem, 8),
            (Symbol::SpaceGem, 7),
            (Symbol::RealityGem, 6),
            (Symbol::SoulGem, 5),
            (Symbol::TimeGem, 4),
        ]);
        Self {
            profile: ConfigProfile::Standard,
            base: SpinProfile {
                symbol_weights: weights.clone(),
                scatter_chance: 0.035,
            },
            free_spins_profile: SpinProfile {
                symbol_weights: weights,
                scatter_chance: 0.05,
            },
            paytable: Paytable::standard(),
            free_spins: FreeSpinsConfig {
                scatter_4_plus: SCATTER_4_PLUS,
                retrigger_spins: RETRIGGER_SPINS,
                buy_feature_cost: BUY_FEATURE_COST,
                buy_feature_spins: BUY_FEATURE_SPINS,
            },
            random_multiplier: RandomMultiplierConfig {
                trigger_chance: 0.10,
                min_win_required: 10,
                table: Self::multiplier_table(),
            },
            cascade_multiplier: CascadeMultiplierConfig {
                trigger_chance: 0.25,
                min_multipliers: 2,
                max_multipliers: 6,
            },
            character_tags: WeightedTable::weighted(vec![
                ("A".to_string(), 4),
                ("B".to_string(), 1),
            ]),
            max_win_multiplier: MAX_WIN_MULTIPLIER,
            rtp_target: RTP_TARGET,
        }
    }

    /// Livelier variant used for demos and streams: more scatters and
    /// more frequent multiplier phases, same pipeline.
    pub fn boosted() -> Self {
        let mut config = Self::standard();
        config.profile = ConfigProfile::Boosted;
        config.base.scatter_chance = 0.06;
        config.free_spins_profile.scatter_chance = 0.08;
        config.random_multiplier.trigger_chance = 0.20;
        config.cascade_multiplier.trigger_chance = 0.40;
        config
    }

    fn multiplier_table() -> WeightedTable<sf_core::Multiplier> {
        WeightedTable::weighted(vec![
            (2, 400),
            (3, 300),
            (5, 200),
            (8, 120),
            (10, 80),
            (15, 50),
            (20, 30),
            (25, 20),
            (50, 8),
            (100, 4),
            (250, 2),
            (500, 1),
        ])
    }

    /// Generation profile for the given mode.
    pub fn profile_for(&self, mode: GameMode) -> &SpinProfile {
        match mode {
            GameMode::Base => &self.base,
            GameMode::FreeSpins => &self.free_spins_profile,
        }
    }

    /// Win threshold gating the multiplier phases at a given bet.
    pub fn multiplier_threshold(&self, bet: Credits) -> Credits {
        bet * self.random_multiplier.min_win_required / sf_core::BET_UNITS
    }

    /// Structural checks run once at composition time.
    pub fn validate(&self) -> Result<(), String> {
        if self.base.symbol_weights.is_empty() || self.free_spins_profile.symbol_weights.is_empty()
        {
            return Err("symbol weights must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.base.scatter_chance)
            || !(0.0..=1.0).contains(&self.free_spins_profile.scatter_chance)
        {
            return Err("scatter chance must be in [0, 1]".to_string());
        }
        if self.random_multiplier.table.is_empty() {
            return Err("multiplier table must not be empty".to_string());
        }
        if self.cascade_multiplier.min_multipliers > self.cascade_multiplier.max_multipliers {
            return Err("cascade multiplier bounds are inverted".to_string());
        }
        if self.character_tags.is_empty() {
            return Err("character tags must not be empty".to_string());
        }
        if !self.paytable.covers_all_symbols() {
            return Err("paytable must cover every paying symbol".to_string());
        }
        if self.max_win_multiplier <= 0 {
            return Err("max win multiplier must be positive".to_string());
        }
        Ok(())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("config serialization is infallible")
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid config: {}", e))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_validates() {
        assert!(EngineConfig::standard().validate().is_ok());
        assert!(EngineConfig::boosted().validate().is_ok());
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = EngineConfig::standard();
        let back = EngineConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn boosted_swaps_chances_not_structure() {
        let standard = EngineConfig::standard();
        let boosted = EngineConfig::boosted();
        assert_eq!(standard.paytable, boosted.paytable);
        assert_eq!(standard.base.symbol_weights, boosted.base.symbol_weights);
        assert!(boosted.base.scatter_chance > standard.base.scatter_chance);
    }

    #[test]
    fn multiplier_threshold_scales_with_bet() {
        let config = EngineConfig::standard();
        assert_eq!(config.multiplier_threshold(100), 50);
        assert_eq!(config.multiplier_threshold(200), 100);
    }

    #[test]
    fn inverted_multiplier_bounds_fail_validation() {
        let mut config = EngineConfig::standard();
        config.cascade_multiplier.min_multipliers = 9;
        assert!(config.validate().is_err());
    }
}
