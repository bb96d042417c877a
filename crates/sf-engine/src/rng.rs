//! Seeded randomness with a replayable audit trail.
//!
//! Every draw is recorded as an [`AuditEvent`] so a spin can be verified
//! offline: replaying the same seed reproduces the exact draw sequence.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;

/// Hex root seed for one spin. Cascade steps derive sub-seeds by
/// appending the zero-padded step number, so any single step can be
/// re-verified without replaying the whole spin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(String);

impl Seed {
    /// Fresh 256-bit seed from OS entropy, hex encoded.
    pub fn generate() -> Self {
        Self(hex::encode(rand::rng().random::<[u8; 32]>()))
    }
    /// Derived seed for one cascade step: `root || %04d(step)`.
    pub fn subseed(&self, step: u32) -> Self {
        Self(format!("{}{:04}", self.0, step))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    /// 32-byte cipher key for the seeded generator.
    fn key(&self) -> [u8; 32] {
        sha2::Sha256::digest(self.0.as_bytes()).into()
    }
}

impl From<&str> for Seed {
    fn from(seed: &str) -> Self {
        Self(seed.to_string())
    }
}

impl std::fmt::Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded rng draw. `t` is a per-spin monotonic sequence number;
/// wall time would break replay equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub t: u64,
    pub component: String,
    pub kind: String,
    pub data: serde_json::Value,
}

/// A weighted selection table. Deserializes from explicit
/// `{value, weight}` entries or from a legacy flat list where frequency
/// equals repetition count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightedTable<T> {
    Weighted(Vec<WeightedEntry<T>>),
    Flat(Vec<T>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEntry<T> {
    pub value: T,
    pub weight: u64,
}

impl<T> WeightedTable<T> {
    pub fn weighted(entries: Vec<(T, u64)>) -> Self {
        Self::Weighted(
            entries
                .into_iter()
                .map(|(value, weight)| WeightedEntry { value, weight })
                .collect(),
        )
    }
    pub fn flat(values: Vec<T>) -> Self {
        Self::Flat(values)
    }
    /// Sum of all weights. Legacy flat entries weigh 1 each.
    pub fn total(&self) -> u64 {
        match self {
            Self::Weighted(entries) => entries.iter().map(|e| e.weight).sum(),
            Self::Flat(values) => values.len() as u64,
        }
    }
    /// The value owning the given ticket in cumulative-weight order.
    /// Tickets must be drawn in `0..total()`.
    pub fn at(&self, ticket: u64) -> &T {
        match self {
            Self::Weighted(entries) => {
                let mut remaining = ticket;
                for entry in entries {
                    if remaining < entry.weight {
                        return &entry.value;
                    }
                    remaining -= entry.weight;
                }
                &entries.last().expect("non-empty weighted table").value
            }
            Self::Flat(values) => &values[ticket as usize % values.len().max(1)],
        }
    }
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Deterministic per-spin generator: ChaCha20 keyed by the SHA-256 of
/// the seed string. Pure with respect to its seed.
pub struct SpinRng {
    seed: Seed,
    component: &'static str,
    rng: ChaCha20Rng,
    t: u64,
    audit: Vec<AuditEvent>,
}

impl SpinRng {
    pub fn new(seed: Seed, component: &'static str) -> Self {
        let rng = ChaCha20Rng::from_seed(seed.key());
        Self {
            seed,
            component,
            rng,
            t: 0,
            audit: Vec::new(),
        }
    }
    pub fn seed(&self) -> &Seed {
        &self.seed
    }
    /// Relabel subsequent draws; one root rng serves several pipeline phases.
    pub fn set_component(&mut self, component: &'static str) {
        self.component = component;
    }
    /// Uniform draw in [0, 1).
    pub fn random(&mut self) -> f64 {
        let value = self.rng.random::<f64>();
        self.emit("random", serde_json::json!({ "value": value }));
        value
    }
    /// Uniform integer in [lo, hi] inclusive.
    pub fn random_int(&mut self, lo: i64, hi: i64) -> i64 {
        let value = self.rng.random_range(lo..=hi);
        self.emit(
            "random_int",
            serde_json::json!({ "lo": lo, "hi": hi, "value": value }),
        );
        value
    }
    /// Bernoulli trial with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        let roll = self.rng.random::<f64>();
        let hit = roll < p;
        self.emit(
            "chance",
            serde_json::json!({ "p": p, "roll": roll, "hit": hit }),
        );
        hit
    }
    /// Weighted draw from a non-empty table.
    pub fn pick<T>(&mut self, table: &WeightedTable<T>) -> T
    where
        T: Clone + Serialize,
    {
        let total = table.total();
        debug_assert!(total > 0, "weighted table must not be empty");
        let ticket = self.rng.random_range(0..total.max(1));
        let value = table.at(ticket).clone();
        self.emit(
            "weighted",
            serde_json::json!({ "total": total, "ticket": ticket, "value": value }),
        );
        value
    }
    /// Drain recorded draws, preserving order.
    pub fn drain_audit(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.audit)
    }
    fn emit(&mut self, kind: &str, data: serde_json::Value) {
        self.audit.push(AuditEvent {
            t: self.t,
            component: self.component.to_string(),
            kind: kind.to_string(),
            data,
        });
        self.t += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_draws() {
        let mut a = SpinRng::new(Seed::from("cafebabe"), "test");
        let mut b = SpinRng::new(Seed::from("cafebabe"), "test");
        for _ in 0..32 {
            assert_eq!(a.random().to_bits(), b.random().to_bits());
            assert_eq!(a.random_int(0, 100), b.random_int(0, 100));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SpinRng::new(Seed::from("cafebabe"), "test");
        let mut b = SpinRng::new(Seed::from("deadbeef"), "test");
        let draws_a: Vec<i64> = (0..16).map(|_| a.random_int(0, 1 << 30)).collect();
        let draws_b: Vec<i64> = (0..16).map(|_| b.random_int(0, 1 << 30)).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn subseed_appends_padded_step() {
        let root = Seed::from("ab");
        assert_eq!(root.subseed(3).as_str(), "ab0003");
        assert_eq!(root.subseed(12).as_str(), "ab0012");
    }

    #[test]
    fn audit_records_every_draw_in_order() {
        let mut rng = SpinRng::new(Seed::generate(), "test");
        rng.random();
        rng.chance(0.5);
        rng.random_int(1, 6);
        let audit = rng.drain_audit();
        assert_eq!(audit.len(), 3);
        assert_eq!(audit[0].kind, "random");
        assert_eq!(audit[1].kind, "chance");
        assert_eq!(audit[2].kind, "random_int");
        assert_eq!(audit.iter().map(|e| e.t).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn weighted_table_respects_cumulative_order() {
        let table = WeightedTable::weighted(vec![("a", 2), ("b", 3)]);
        assert_eq!(table.total(), 5);
        assert_eq!(*table.at(0), "a");
        assert_eq!(*table.at(1), "a");
        assert_eq!(*table.at(2), "b");
        assert_eq!(*table.at(4), "b");
    }

    #[test]
    fn flat_table_is_uniform_by_repetition() {
        let table = WeightedTable::flat(vec![2u64, 2, 3]);
        assert_eq!(table.total(), 3);
        assert_eq!(*table.at(0), 2);
        assert_eq!(*table.at(2), 3);
    }

    #[test]
    fn weighted_table_deserializes_both_shapes() {
        let explicit: WeightedTable<u64> =
            serde_json::from_str(r#"[{"value": 2, "weight": 10}, {"value": 5, "weight": 1}]"#)
                .unwrap();
        assert_eq!(explicit.total(), 11);
        let legacy: WeightedTable<u64> = serde_json::from_str("[2, 2, 2, 5]").unwrap();
        assert_eq!(legacy.total(), 4);
        assert_eq!(*legacy.at(3), 5);
    }

    #[test]
    fn random_int_stays_in_bounds() {
        let mut rng = SpinRng::new(Seed::generate(), "test");
        for _ in 0..256 {
            let v = rng.random_int(3, 7);
            assert!((3..=7).contains(&v));
        }
    }
}
