//! Detection cache keyed by file fingerprint, with LRU eviction.
//!
//! Reconciliation is deterministic, so for a given file and recognition
//! engine a cached [`DetectionResult`] is indistinguishable from a fresh one.
//! Only successful detections are stored; failures always reach the engine
//! again on the next call.

use crate::output::DetectionResult;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Bounded, thread-safe map from file fingerprint to detection result.
pub struct DetectionCache {
    entries: Option<Mutex<LruCache<String, DetectionResult>>>,
}

impl DetectionCache {
    /// A cache holding at most `capacity` results. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn get(&self, fingerprint: &str) -> Option<DetectionResult> {
        self.entries.as_ref()?.lock().get(fingerprint).cloned()
    }

    pub fn insert(&self, fingerprint: String, result: DetectionResult) {
        if let Some(entries) = &self.entries {
            entries.lock().put(fingerprint, result);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
