use serde::Deserialize;
use serde::Serialize;

/// A grid symbol. Four low-paying shards, six high-paying gems, and the
/// scatter. Scatters never participate in clusters; they are counted
/// separately for free-spin triggers and scatter pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    AmberShard,
    AzureShard,
    EmeraldShard,
    CrimsonShard,
    MindGem,
    PowerGem,
    SpaceGem,
    RealityGem,
    SoulGem,
    TimeGem,
    Scatter,
}

impl Symbol {
    /// Low-paying symbols.
    pub const LOW: [Symbol; 4] = [
        Symbol::AmberShard,
        Symbol::AzureShard,
        Symbol::EmeraldShard,
        Symbol::CrimsonShard,
    ];
    /// High-paying symbols.
    pub const HIGH: [Symbol; 6] = [
        Symbol::MindGem,
        Symbol::PowerGem,
        Symbol::SpaceGem,
        Symbol::RealityGem,
        Symbol::SoulGem,
        Symbol::TimeGem,
    ];
    /// All cluster-paying symbols (everything but the scatter).
    pub const PAYING: [Symbol; 10] = [
        Symbol::AmberShard,
        Symbol::AzureShard,
        Symbol::EmeraldShard,
        Symbol::CrimsonShard,
        Symbol::MindGem,
        Symbol::PowerGem,
        Symbol::SpaceGem,
        Symbol::RealityGem,
        Symbol::SoulGem,
        Symbol::TimeGem,
    ];

    pub fn is_scatter(self) -> bool {
        self == Symbol::Scatter
    }

    /// Canonical wire name, identical to the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            Symbol::AmberShard => "amber_shard",
            Symbol::AzureShard => "azure_shard",
            Symbol::EmeraldShard => "emerald_shard",
            Symbol::CrimsonShard => "crimson_shard",
            Symbol::MindGem => "mind_gem",
            Symbol::PowerGem => "power_gem",
            Symbol::SpaceGem => "space_gem",
            Symbol::RealityGem => "reality_gem",
            Symbol::SoulGem => "soul_gem",
            Symbol::TimeGem => "time_gem",
            Symbol::Scatter => "scatter",
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
