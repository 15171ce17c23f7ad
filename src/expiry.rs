//! # Eviction Facility
//!
//! Background task that actively removes expired keys, independent of
//! client access.

use crate::constants::{REAPER_SAMPLE_SIZE, REAPER_TICK_MS};
use crate::types::SharedStore;
use log::debug;
use std::time::{Duration, Instant};
use tokio::time::interval;

/// Removes expired keys from the storage.
///
/// Meant to be spawned as a background task as it loops forever, waking
/// every [`REAPER_TICK_MS`] milliseconds. Each tick samples up to
/// [`REAPER_SAMPLE_SIZE`] keys from the expiry table and deletes the ones
/// whose deadline has passed, so a tick costs O(sample size) no matter how
/// large the keyspace grows. The keyspace lock is held only for the
/// duration of one sample-and-delete pass.
pub async fn eviction_loop(storage: SharedStore) {
    debug!("Starting the eviction loop...");
    let mut ticker = interval(Duration::from_millis(REAPER_TICK_MS));
    loop {
        ticker.tick().await;

        let mut store = storage.lock().expect("keyspace mutex");
        if store.expiry_len() == 0 {
            continue;
        }
        let now = Instant::now();
        for key in store.sample_expired(REAPER_SAMPLE_SIZE, now) {
            store.del(&key);
            debug!("active eviction: removed expired key `{key}`");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Store;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_eviction_loop_removes_only_expired_keys() {
        let storage: SharedStore = Arc::new(Mutex::new(Store::new()));
        {
            let mut store = storage.lock().unwrap();
            let base = Instant::now();
            store.set_string("dead", "v");
            store.set_expiry("dead", base);
            store.set_string("live", "v");
            store.set_expiry("live", base + Duration::from_secs(3600));
            store.set_string("immortal", "v");
        }

        tokio::spawn(eviction_loop(Arc::clone(&storage)));
        tokio::time::sleep(Duration::from_millis(300)).await;

        let store = storage.lock().unwrap();
        assert_eq!(None, store.get_string("dead"));
        assert_eq!(Some("v"), store.get_string("live"));
        assert_eq!(Some("v"), store.get_string("immortal"));
        assert_eq!(1, store.expiry_len());
        assert_eq!(2, store.len());
    }
}
