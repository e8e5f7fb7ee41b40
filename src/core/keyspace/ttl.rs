// src/core/keyspace/ttl.rs

//! Active, sampling-based TTL expiration, run as a background task alongside
//! the connection-driven lazy expiration every read already performs.

use super::lock::{Keyspace, LockContext};
use super::value::now_millis;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

const TTL_CHECK_INTERVAL: Duration = Duration::from_millis(100);
const TTL_SAMPLE_SIZE: usize = 20;
const TTL_EXPIRED_THRESHOLD_PERCENT: u32 = 25;

pub struct TtlManager {
    keyspace: Arc<Keyspace>,
}

impl TtlManager {
    pub fn new(keyspace: Arc<Keyspace>) -> Self {
        Self { keyspace }
    }

    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("TTL expiration manager started (active, sampling-based).");
        let mut interval = tokio::time::interval(TTL_CHECK_INTERVAL);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.purge_expired_with_sampling().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("TTL expiration manager shutting down.");
                    return;
                }
            }
        }
    }

    async fn purge_expired_with_sampling(&self) {
        let lock_ctx = LockContext::with_deadline(Duration::from_millis(50));
        loop {
            let sample = self.keyspace.sample_keys(TTL_SAMPLE_SIZE);
            if sample.is_empty() {
                break;
            }

            let mut expired_count = 0usize;
            let now = now_millis();
            for key in &sample {
                let Ok(Some(guard)) = self.keyspace.lock(&lock_ctx, key).await else {
                    continue;
                };
                if guard.get().is_expired_at(now) {
                    drop(guard);
                    self.keyspace.remove(key);
                    expired_count += 1;
                }
            }

            if expired_count > 0 {
                debug!("purged {} expired keys from a sample", expired_count);
            }

            if sample.len() < TTL_SAMPLE_SIZE {
                break;
            }

            let expired_percentage = (expired_count * 100 / TTL_SAMPLE_SIZE) as u32;
            if expired_percentage < TTL_EXPIRED_THRESHOLD_PERCENT {
                break;
            }
        }
    }
}
