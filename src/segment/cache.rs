//! Entry content cache
//!
//! Decoded entries of one segment keyed by `TermIndex`, with a running total
//! of their on-disk sizes. Independently evictable from the segment index.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::entry::{entry_size, CacheOp, EntryRef, TermIndex};

/// One retained entry plus the size it was accounted at
struct CacheItem {
    entry: EntryRef,
    serialized_size: u64,
}

/// Closed is terminal; an evicted cache is `Active` with an empty map
enum CacheState {
    Active(HashMap<TermIndex, CacheItem>),
    Closed,
}

/// Cache of decoded entries for one segment
///
/// ## Concurrency:
/// - `state`: Mutex, serializes get/put/remove/evict/close
/// - `size`: Atomic, readable without the lock; only written under it
pub struct EntryContentCache {
    state: Mutex<CacheState>,
    size: AtomicU64,
}

impl EntryContentCache {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::Active(HashMap::new())),
            size: AtomicU64::new(0),
        }
    }

    /// Retained reference to the cached entry, or `None` on a miss.
    ///
    /// A closed cache always misses, as does an entry released before it
    /// could be retained.
    pub fn get(&self, key: &TermIndex) -> Option<EntryRef> {
        match &*self.state.lock() {
            CacheState::Active(map) => map.get(key)?.entry.retain(),
            CacheState::Closed => None,
        }
    }

    /// Cache a new retained reference to `entry` under `key`, replacing and
    /// releasing any previous item.
    ///
    /// # Panics
    ///
    /// Panics if `op` forbids state machine data and `entry` carries some.
    pub fn put(&self, key: TermIndex, entry: &EntryRef, op: CacheOp) {
        let serialized_size = entry_size(entry, op);
        let mut state = self.state.lock();
        let map = match &mut *state {
            CacheState::Active(map) => map,
            CacheState::Closed => return,
        };
        let Some(entry) = entry.retain() else {
            return;
        };
        if let Some(previous) = map.insert(key, CacheItem { entry, serialized_size }) {
            self.release(previous);
        }
        self.size.fetch_add(serialized_size, Ordering::AcqRel);
    }

    /// Release the item at `key`, if any
    pub fn remove(&self, key: &TermIndex) {
        if let CacheState::Active(map) = &mut *self.state.lock() {
            if let Some(item) = map.remove(key) {
                self.release(item);
            }
        }
    }

    /// Release every item. The cache stays usable.
    pub fn evict(&self) {
        if let CacheState::Active(map) = &mut *self.state.lock() {
            for (_, item) in map.drain() {
                self.release(item);
            }
        }
    }

    /// Release every item and refuse all further use
    pub fn close(&self) {
        let mut state = self.state.lock();
        if let CacheState::Active(map) = &mut *state {
            for (_, item) in map.drain() {
                self.release(item);
            }
            *state = CacheState::Closed;
            tracing::info!("Closed entry content cache");
        }
    }

    /// Running total of cached entry sizes (in bytes)
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        match &*self.state.lock() {
            CacheState::Active(map) => map.len(),
            CacheState::Closed => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        matches!(&*self.state.lock(), CacheState::Closed)
    }

    /// Called with the state lock held
    fn release(&self, item: CacheItem) {
        self.size.fetch_sub(item.serialized_size, Ordering::AcqRel);
        item.entry.release();
    }
}

impl Default for EntryContentCache {
    fn default() -> Self {
        Self::new()
    }
}
