use sf_core::RETENTION_WINDOW;
use sf_engine::SpinResult;
use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

/// Idempotency cache: `client_request_id` to finished result. A retry
/// inside the retention window returns the original result and performs
/// no ledger or state changes. Expired entries are swept lazily.
pub struct PendingResults {
    ttl: Duration,
    inner: parking_lot::Mutex<HashMap<String, (Instant, SpinResult)>>,
}

impl PendingResults {
    pub fn new() -> Self {
        Self::with_ttl(RETENTION_WINDOW)
    }
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: parking_lot::Mutex::new(HashMap::new()),
        }
    }
    pub fn get(&self, key: &str) -> Option<SpinResult> {
        let mut cache = self.inner.lock();
        cache.retain(|_, (stamp, _)| stamp.elapsed() < self.ttl);
        cache.get(key).map(|(_, result)| result.clone())
    }
    pub fn put(&self, key: &str, result: SpinResult) {
        self.inner
            .lock()
            .insert(key.to_string(), (Instant::now(), result));
    }
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PendingResults {
    fn default() -> Self {
        Self::new()
    }
}
