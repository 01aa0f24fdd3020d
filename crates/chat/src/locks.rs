use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per channel, so events of the same channel are processed
/// one at a time while other channels proceed concurrently.
#[derive(Default)]
pub struct ChannelLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ChannelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `channel_id`. Waiters are served in
    /// arrival order.
    pub async fn lock(&self, channel_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(channel_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
