use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, RwLockReadGuard};

/// Two-state dispatch gate guarding the outbound channel
///
/// Workers take shared access around each outbound receive; the manager
/// takes exclusive access to disable dispatch during PAUSE and FINISH. The
/// gate provides exactly two guarantees: no worker takes from outbound while
/// dispatch is disabled, and `disable` resolves only once no worker is
/// mid-take. Worker receives use a short timeout so a pending `disable`
/// (tokio's RwLock is write-preferring) is never starved by idle workers
/// parked on an empty channel.
#[derive(Debug, Clone)]
pub struct DispatchGate {
    lock: Arc<RwLock<()>>,
}

impl DispatchGate {
    pub fn new() -> Self {
        Self {
            lock: Arc::new(RwLock::new(())),
        }
    }

    /// Shared access for one outbound take; held only across the receive
    pub async fn enter(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().await
    }

    /// Disables dispatch until the returned guard is dropped
    pub async fn disable(&self) -> OwnedRwLockWriteGuard<()> {
        self.lock.clone().write_owned().await
    }
}

impl Default for DispatchGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shared_access_is_concurrent() {
        let gate = DispatchGate::new();
        let _a = gate.enter().await;
        let _b = gate.enter().await;
    }

    #[tokio::test]
    async fn test_disable_excludes_workers() {
        let gate = DispatchGate::new();
        let guard = gate.disable().await;

        let gate2 = gate.clone();
        let blocked = tokio::spawn(async move {
            let _g = gate2.enter().await;
        });

        // Worker cannot enter while disabled
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!blocked.is_finished());

        drop(guard);
        blocked.await.unwrap();
    }

    #[tokio::test]
    async fn test_disable_waits_for_workers() {
        let gate = DispatchGate::new();
        let reader = gate.enter().await;

        let gate2 = gate.clone();
        let disabling = tokio::spawn(async move {
            let _g = gate2.disable().await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!disabling.is_finished());

        drop(reader);
        disabling.await.unwrap();
    }
}
