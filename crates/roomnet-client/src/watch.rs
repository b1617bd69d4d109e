//! Polling-based change detection for display code.
//!
//! The display side of the host application (out of scope here beyond this
//! contract) re-renders the room mesh whenever a new one lands in the store.
//! There is no callback or channel for that on purpose: the store's
//! timestamp is compared once per frame against the last value the display
//! acted on.  [`BlobWatcher`] packages that comparison so the caller's loop
//! is just `if let Some(mesh) = watcher.poll() { render(mesh) }`.
//!
//! The watcher itself is single-threaded state; only the underlying store
//! reads are shared with the transfer workers, and those are lock-guarded.

use std::sync::Arc;
use std::time::SystemTime;

use roomnet_core::store::BlobStore;

/// Detects "a new blob arrived" across repeated polls of one store.
#[derive(Debug)]
pub struct BlobWatcher {
    store: Arc<BlobStore>,
    seen: Option<SystemTime>,
}

impl BlobWatcher {
    /// Creates a watcher that has seen nothing yet: the first poll after any
    /// blob exists reports it.
    pub fn new(store: Arc<BlobStore>) -> Self {
        Self { store, seen: None }
    }

    /// Returns the current blob exactly once per update, `None` otherwise.
    pub fn poll(&mut self) -> Option<Arc<[u8]>> {
        let updated_at = self.store.last_updated()?;
        if self.seen.is_some_and(|seen| seen >= updated_at) {
            return None;
        }
        // Read the timestamp before the payload: if a newer set lands in
        // between we re-report next poll rather than skip an update.
        self.seen = Some(updated_at);
        self.store.get()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_polls_as_no_change() {
        let mut watcher = BlobWatcher::new(Arc::new(BlobStore::new()));
        assert!(watcher.poll().is_none());
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_each_update_is_reported_exactly_once() {
        let store = Arc::new(BlobStore::new());
        let mut watcher = BlobWatcher::new(Arc::clone(&store));

        store.set(vec![1]);
        assert_eq!(watcher.poll().as_deref(), Some(&[1u8][..]));
        assert!(watcher.poll().is_none(), "same blob must not re-report");

        store.set(vec![2]);
        assert_eq!(watcher.poll().as_deref(), Some(&[2u8][..]));
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_missed_updates_collapse_to_the_newest() {
        let store = Arc::new(BlobStore::new());
        let mut watcher = BlobWatcher::new(Arc::clone(&store));

        store.set(vec![1]);
        store.set(vec![2]);
        store.set(vec![3]);
        assert_eq!(watcher.poll().as_deref(), Some(&[3u8][..]));
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_two_watchers_track_independently() {
        let store = Arc::new(BlobStore::new());
        let mut first = BlobWatcher::new(Arc::clone(&store));
        let mut second = BlobWatcher::new(Arc::clone(&store));

        store.set(vec![5]);
        assert!(first.poll().is_some());
        assert!(second.poll().is_some(), "each consumer has its own cursor");
    }
}
