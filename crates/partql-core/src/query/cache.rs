//! Signature-keyed cache of parsed trees.
//!
//! Each signature owns a slot with its own lock, so concurrent first
//! lookups of one signature parse it exactly once while other signatures
//! proceed independently. A failed parse removes its slot once no other
//! lookup is waiting on it.

use crate::query::tree::{ParseError, PartTree};
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

type Slot = Arc<Mutex<Option<Arc<PartTree>>>>;

///
/// CacheOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

///
/// TreeCacheStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TreeCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

///
/// TreeCache
///

#[derive(Debug, Default)]
pub struct TreeCache {
    slots: Mutex<BTreeMap<String, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TreeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached tree for `signature`, parsing it on first use.
    pub fn get_or_parse<F>(
        &self,
        signature: &str,
        parse: F,
    ) -> Result<(Arc<PartTree>, CacheOutcome), ParseError>
    where
        F: FnOnce() -> Result<PartTree, ParseError>,
    {
        let slot = self.slot(signature);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(tree) = guard.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((Arc::clone(tree), CacheOutcome::Hit));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        match parse() {
            Ok(tree) => {
                let tree = Arc::new(tree);
                *guard = Some(Arc::clone(&tree));

                Ok((tree, CacheOutcome::Miss))
            }
            Err(err) => {
                drop(guard);
                self.release(signature, &slot);

                Err(err)
            }
        }
    }

    /// Cached tree for `signature`, if one was parsed successfully.
    #[must_use]
    pub fn get(&self, signature: &str) -> Option<Arc<PartTree>> {
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(signature)
            .cloned()?;

        slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn stats(&self) -> TreeCacheStats {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let size = slots
            .values()
            .filter(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count();

        TreeCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size,
        }
    }

    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    // The map lock is held only long enough to find or insert the slot.
    fn slot(&self, signature: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);

        Arc::clone(slots.entry(signature.to_string()).or_default())
    }

    // Clones are only taken under the map lock, so a count of two (map and
    // caller) means no other lookup holds this slot.
    fn release(&self, signature: &str, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = slots
            .get(signature)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && Arc::strong_count(slot) == 2);

        if unused {
            slots.remove(signature);
        }
    }
}
