//! The process-wide holder of the most recent room mesh blob.
//!
//! # Why a "latch" and not a queue? (for beginners)
//!
//! Only the *newest* mesh matters: a display that missed three updates should
//! render the fourth, not replay the first.  So the store holds exactly zero
//! or one blob, and every [`BlobStore::set`] atomically replaces the previous
//! one — never merges, never appends.
//!
//! Change notification is deliberately primitive: consumers poll
//! [`BlobStore::last_updated`] each frame/tick and compare against a locally
//! cached value (see `BlobWatcher` in the client crate).  That makes the
//! store the only shared mutable state in the whole system, guarded by a
//! single `RwLock` so a transfer worker storing a just-received mesh can
//! never race a render thread reading the old one into a torn state.
//!
//! The blob itself is handed out as `Arc<[u8]>`: a cheap reference-counted
//! view that callers can hold across frames but never mutate in place.

use std::sync::RwLock;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// A stored blob plus the time it arrived.
#[derive(Debug, Clone)]
struct Entry {
    data: Arc<[u8]>,
    updated_at: SystemTime,
}

/// Thread-safe latch for the single most recent binary payload.
///
/// Holds exactly zero or one blob.  `set` replaces; `get` hands out a
/// read-only view; `last_updated` drives the polling-based change detection.
#[derive(Debug, Default)]
pub struct BlobStore {
    inner: RwLock<Option<Entry>>,
}

impl BlobStore {
    /// Creates an empty store ("never updated" state).
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replaces the stored blob and stamps it with the current time.
    ///
    /// The timestamp is guaranteed to *strictly* increase across calls even if
    /// the system clock does not advance between two rapid sets (it is bumped
    /// past the previous value by a nanosecond in that case), so pollers that
    /// compare timestamps never miss an update.
    pub fn set(&self, data: Vec<u8>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let now = SystemTime::now();
        let updated_at = match guard.as_ref() {
            Some(prev) if now <= prev.updated_at => prev.updated_at + Duration::from_nanos(1),
            _ => now,
        };
        *guard = Some(Entry {
            data: Arc::from(data),
            updated_at,
        });
    }

    /// Returns a read-only view of the current blob, or `None` if nothing has
    /// ever been stored.
    pub fn get(&self) -> Option<Arc<[u8]>> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|entry| Arc::clone(&entry.data))
    }

    /// Returns the last-updated time, or `None` as the "never" sentinel.
    pub fn last_updated(&self) -> Option<SystemTime> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|entry| entry.updated_at)
    }

    /// Returns `true` if a blob has been stored at least once.
    pub fn has_blob(&self) -> bool {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.is_some()
    }

    /// Returns the size of the current blob in bytes, or 0 if empty.
    pub fn len(&self) -> usize {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map_or(0, |entry| entry.data.len())
    }

    /// Returns `true` if no blob has ever been stored.
    pub fn is_empty(&self) -> bool {
        !self.has_blob()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
