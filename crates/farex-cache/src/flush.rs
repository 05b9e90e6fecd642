use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tracing::debug;

use crate::key::{CacheKey, FlushKey};

/// Inverted invalidation index: which cached keys must be revisited
/// when the data behind a FlushKey changes. One mutex guards all reads
/// and writes; buckets left empty are removed eagerly.
#[derive(Debug, Default)]
pub struct FlushIndex {
    buckets: Mutex<HashMap<FlushKey, HashSet<CacheKey>>>,
}

impl FlushIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `cache_key` depends on every key in `flush_keys`.
    pub fn insert(&self, cache_key: &CacheKey, flush_keys: &[FlushKey]) {
        let mut buckets = self.buckets.lock();
        for fk in flush_keys {
            buckets
                .entry(fk.clone())
                .or_default()
                .insert(cache_key.clone());
        }
    }

    /// The cached keys currently registered under one flush key.
    pub fn bucket(&self, flush_key: &FlushKey) -> Vec<CacheKey> {
        self.buckets
            .lock()
            .get(flush_key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove every occurrence of `cache_key` from every bucket that
    /// shares its (vendor, carrier).
    pub fn remove_cache_key(&self, cache_key: &CacheKey) {
        let mut buckets = self.buckets.lock();
        let mut emptied = 0usize;
        buckets.retain(|fk, set| {
            if fk.vendor == cache_key.vendor && fk.carrier == cache_key.carrier {
                set.remove(cache_key);
            }
            let keep = !set.is_empty();
            if !keep {
                emptied += 1;
            }
            keep
        });
        if emptied > 0 {
            debug!(emptied, "empty flush buckets removed");
        }
    }

    /// Does any bucket still reference this cache key?
    pub fn references(&self, cache_key: &CacheKey) -> bool {
        self.buckets
            .lock()
            .values()
            .any(|set| set.contains(cache_key))
    }

    pub fn len(&self) -> usize {
        self.buckets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::FlushKind;

    fn cache_key(origin: &str) -> CacheKey {
        CacheKey {
            vendor: "ATP".into(),
            carrier: "AA".into(),
            origin: origin.into(),
            destination: "DFW".into(),
        }
    }

    #[test]
    fn removal_sweeps_matching_vendor_and_carrier_and_drops_empty_buckets() {
        let index = FlushIndex::new();
        let key = cache_key("MAN");
        let other = cache_key("GLA");
        let fk = FlushKey::new("ATP", "AA", "LON", "MAN", FlushKind::AddonFlush);
        let fk2 = FlushKey::new("ATP", "AA", "DFW", "LON", FlushKind::SpecifiedFlush);
        index.insert(&key, &[fk.clone(), fk2.clone()]);
        index.insert(&other, &[fk.clone()]);

        index.remove_cache_key(&key);
        assert!(!index.references(&key));
        // The shared bucket survives for the other key; the exclusive
        // one is gone.
        assert_eq!(index.bucket(&fk), vec![other.clone()]);
        assert!(index.bucket(&fk2).is_empty());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn duplicate_inserts_are_suppressed() {
        let index = FlushIndex::new();
        let key = cache_key("MAN");
        let fk = FlushKey::new("ATP", "AA", "LON", "MAN", FlushKind::AddonFlush);
        index.insert(&key, &[fk.clone()]);
        index.insert(&key, &[fk.clone()]);
        assert_eq!(index.bucket(&fk).len(), 1);
    }
}
