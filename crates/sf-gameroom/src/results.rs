//! Spin result persistence and replay lookup.

use crate::error::Fault;
use sf_core::ID;
use sf_core::Spin;
use sf_core::Unique;
use sf_engine::SpinResult;
use sf_records::SpinRecord;
use std::collections::HashMap;

/// Result storage contract. Records are immutable once written; replay
/// reconstructs the exact result originally returned to the client.
#[allow(async_fn_in_trait)]
pub trait ResultStore {
    async fn record(&self, result: &SpinResult) -> Result<(), Fault>;
    async fn replay(&self, spin: ID<Spin>) -> Result<Option<SpinResult>, Fault>;
    /// Find the result answering a client request id, for retries that
    /// arrive after the idempotency cache expired.
    async fn find_by_ref(&self, client_ref: &str) -> Result<Option<SpinResult>, Fault>;
}

/// In-memory result store holding full [`SpinRecord`] rows.
pub struct MemoryResults {
    inner: parking_lot::Mutex<Rows>,
}

struct Rows {
    records: HashMap<ID<Spin>, SpinRecord>,
    by_ref: HashMap<String, ID<Spin>>,
}

impl MemoryResults {
    pub fn new() -> Self {
        Self {
            inner: parking_lot::Mutex::new(Rows {
                records: HashMap::new(),
                by_ref: HashMap::new(),
            }),
        }
    }
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryResults {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore for MemoryResults {
    async fn record(&self, result: &SpinResult) -> Result<(), Fault> {
        let record = SpinRecord::of(result);
        let mut rows = self.inner.lock();
        if let Some(client_ref) = record.client_ref() {
            rows.by_ref.insert(client_ref.to_string(), record.id());
        }
        rows.records.insert(record.id(), record);
        Ok(())
    }
    async fn replay(&self, spin: ID<Spin>) -> Result<Option<SpinResult>, Fault> {
        match self.inner.lock().records.get(&spin) {
            Some(record) => record
                .result()
                .map(Some)
                .map_err(|e| Fault::Store(e.to_string())),
            None => Ok(None),
        }
    }
    async fn find_by_ref(&self, client_ref: &str) -> Result<Option<SpinResult>, Fault> {
        let rows = self.inner.lock();
        match rows.by_ref.get(client_ref).and_then(|id| rows.records.get(id)) {
            Some(record) => record
                .result()
                .map(Some)
                .map_err(|e| Fault::Store(e.to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_engine::EngineConfig;
    use sf_engine::PlayerState;
    use sf_engine::Seed;
    use sf_engine::pipeline;

    fn result(client_ref: Option<&str>) -> SpinResult {
        let config = EngineConfig::standard();
        let state = PlayerState::fresh(ID::default());
        let mut result =
            pipeline::spin(&config, &state, ID::default(), 100, Seed::from("results"));
        result.client_ref = client_ref.map(str::to_string);
        result
    }

    #[tokio::test]
    async fn replay_returns_the_recorded_result() {
        let store = MemoryResults::new();
        let result = result(None);
        store.record(&result).await.unwrap();
        let replayed = store.replay(result.id).await.unwrap().unwrap();
        assert_eq!(replayed, result);
        assert!(replayed.verify_hashes());
    }

    #[tokio::test]
    async fn missing_spins_come_back_empty() {
        let store = MemoryResults::new();
        assert!(store.replay(ID::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn client_ref_lookup_finds_the_spin() {
        let store = MemoryResults::new();
        let result = result(Some("req-7"));
        store.record(&result).await.unwrap();
        let found = store.find_by_ref("req-7").await.unwrap().unwrap();
        assert_eq!(found.id, result.id);
        assert!(store.find_by_ref("req-8").await.unwrap().is_none());
    }
}
