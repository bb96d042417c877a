use crate::error::Fault;
use sf_core::ID;
use sf_core::LOCK_TIMEOUT;
use sf_core::Player;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

/// Per-player exclusive locks. Spins for one player serialize behind
/// one mutex for the full operation; independent players never contend.
/// The registry itself is only held long enough to clone the arc.
pub struct PlayerLocks {
    inner: parking_lot::Mutex<HashMap<ID<Player>, Arc<Mutex<()>>>>,
}

impl PlayerLocks {
    pub fn new() -> Self {
        Self {
            inner: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the player's lock, waiting at most [`LOCK_TIMEOUT`].
    pub async fn acquire(&self, player: ID<Player>) -> Result<OwnedMutexGuard<()>, Fault> {
        let lock = {
            let mut registry = self.inner.lock();
            Arc::clone(registry.entry(player).or_default())
        };
        match tokio::time::timeout(LOCK_TIMEOUT, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                log::warn!("[locks] timeout acquiring lock for {}", player);
                Err(Fault::LockTimeout)
            }
        }
    }
}

impl Default for PlayerLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_player_spins_serialize() {
        let locks = PlayerLocks::new();
        let player = ID::default();
        let first = locks.acquire(player).await.unwrap();
        let second = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            locks.acquire(player),
        )
        .await;
        assert!(second.is_err(), "second acquire must wait on the first");
        drop(first);
        assert!(locks.acquire(player).await.is_ok());
    }

    #[tokio::test]
    async fn different_players_do_not_contend() {
        let locks = PlayerLocks::new();
        let _a = locks.acquire(ID::default()).await.unwrap();
        let b = locks.acquire(ID::default()).await;
        assert!(b.is_ok());
    }
}
