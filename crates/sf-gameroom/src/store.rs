//! Per-player game-state storage with optimistic consistency.

use crate::error::Fault;
use sf_core::ID;
use sf_core::Player;
use sf_core::STATE_CACHE_CAPACITY;
use sf_core::Version;
use sf_engine::PlayerState;
use std::collections::HashMap;

/// State storage contract. `put` is a compare-and-swap on `version`:
/// the stored version must equal `expected` (zero for a first write) or
/// the write fails with [`Fault::StateConflict`] and the caller must
/// re-read. Successful writes strictly increase the version.
#[allow(async_fn_in_trait)]
pub trait GameStateStore {
    async fn get(&self, player: ID<Player>) -> Result<Option<PlayerState>, Fault>;
    async fn put(&self, state: &PlayerState, expected: Version) -> Result<(), Fault>;
    /// Read through to the durable tier, bypassing any cache.
    async fn snapshot(&self, player: ID<Player>) -> Result<Option<PlayerState>, Fault>;
}

/// In-memory store: the dev composition and the durable tier of tests.
pub struct MemoryStore {
    inner: parking_lot::Mutex<HashMap<ID<Player>, PlayerState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: parking_lot::Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStateStore for MemoryStore {
    async fn get(&self, player: ID<Player>) -> Result<Option<PlayerState>, Fault> {
        Ok(self.inner.lock().get(&player).cloned())
    }
    async fn put(&self, state: &PlayerState, expected: Version) -> Result<(), Fault> {
        if !state.coherent() {
            return Err(Fault::ValidationFailed(format!(
                "incoherent state for {}",
                state.player
            )));
        }
        if state.version <= expected {
            return Err(Fault::ValidationFailed(
                "state version must increase".to_string(),
            ));
        }
        let mut states = self.inner.lock();
        let current = states.get(&state.player).map(|s| s.version).unwrap_or(0);
        if current != expected {
            log::debug!(
                "[store] version conflict for {}: have {} expected {}",
                state.player,
                current,
                expected,
            );
            return Err(Fault::StateConflict);
        }
        states.insert(state.player, state.clone());
        Ok(())
    }
    async fn snapshot(&self, player: ID<Player>) -> Result<Option<PlayerState>, Fault> {
        self.get(player).await
    }
}

/// Bounded in-memory tier in front of any store. Reads hit the cache
/// first; every successful write invalidates the cached entry so the
/// next read refills from the inner store.
pub struct CachedStore<S> {
    inner: S,
    cache: parking_lot::Mutex<Lru>,
}

struct Lru {
    capacity: usize,
    clock: u64,
    entries: HashMap<ID<Player>, (PlayerState, u64)>,
}

impl Lru {
    fn touch(&mut self, player: ID<Player>, state: PlayerState) {
        self.clock += 1;
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&player) {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, (_, stamp))| *stamp)
                .map(|(id, _)| *id)
            {
                self.entries.remove(&oldest);
            }
        }
        let clock = self.clock;
        self.entries.insert(player, (state, clock));
    }
}

impl<S> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, STATE_CACHE_CAPACITY)
    }
    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            cache: parking_lot::Mutex::new(Lru {
                capacity: capacity.max(1),
                clock: 0,
                entries: HashMap::new(),
            }),
        }
    }
    /// Cached entry count, for observability.
    pub fn cached(&self) -> usize {
        self.cache.lock().entries.len()
    }
}

impl<S: GameStateStore> GameStateStore for CachedStore<S> {
    async fn get(&self, player: ID<Player>) -> Result<Option<PlayerState>, Fault> {
        if let Some((state, _)) = self.cache.lock().entries.get(&player) {
            return Ok(Some(state.clone()));
        }
        let state = self.inner.get(player).await?;
        if let Some(ref found) = state {
            self.cache.lock().touch(player, found.clone());
        }
        Ok(state)
    }
    async fn put(&self, state: &PlayerState, expected: Version) -> Result<(), Fault> {
        self.inner.put(state, expected).await?;
        self.cache.lock().entries.remove(&state.player);
        Ok(())
    }
    async fn snapshot(&self, player: ID<Player>) -> Result<Option<PlayerState>, Fault> {
        self.inner.snapshot(player).await
    }
}
