//! Cosmetic upload-progress simulation
//!
//! No network is involved: each accepted file gets a counter that climbs by a
//! random 5-15% step per tick until it reaches 100.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const DEFAULT_UPLOAD_TICK: Duration = Duration::from_millis(200);

const MIN_STEP: u8 = 5;
const MAX_STEP: u8 = 15;

pub struct UploadProgressTracker {
    tick: Duration,
    channels: Mutex<HashMap<Uuid, watch::Receiver<u8>>>,
    cancel: CancellationToken,
}

impl UploadProgressTracker {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick: tick.max(Duration::from_millis(1)),
            channels: Mutex::new(HashMap::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn the simulation for `file_id`. Must be called inside a Tokio runtime.
    ///
    /// Uploads that already reached 100 are dropped from the registry here;
    /// their receivers stay valid for whoever still holds them.
    pub fn start(&self, file_id: Uuid) -> watch::Receiver<u8> {
        let (tx, rx) = watch::channel(0u8);
        {
            let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
            channels.retain(|_, existing| *existing.borrow() < 100);
            channels.insert(file_id, rx.clone());
        }

        let cancel = self.cancel.clone();
        let mut interval = tokio::time::interval(self.tick);

        tokio::spawn(async move {
            // The first tick completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(%file_id, "Upload simulation cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        let step = rand::rng().random_range(MIN_STEP..=MAX_STEP);
                        let next = tx.borrow().saturating_add(step).min(100);
                        tx.send_replace(next);
                        if next >= 100 {
                            break;
                        }
                    }
                }
            }
        });

        rx
    }

    pub fn subscribe(&self, file_id: Uuid) -> Option<watch::Receiver<u8>> {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&file_id)
            .cloned()
    }

    /// Stop tracking `file_id`, e.g. once its attachment is removed from the
    /// draft. Returns whether it was tracked.
    pub fn forget(&self, file_id: Uuid) -> bool {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&file_id)
            .is_some()
    }

    /// Current percentage of every simulated upload
    pub fn snapshot(&self) -> HashMap<Uuid, u8> {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, rx)| (*id, *rx.borrow()))
            .collect()
    }

    /// Stop every running simulation
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for UploadProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_TICK)
    }
}

impl Drop for UploadProgressTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
