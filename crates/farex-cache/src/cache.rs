use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::flush::FlushIndex;
use crate::key::{flush_keys_for_pair, CacheKey, FlushKey};
use farex_construction::{ConstructedCacheBundle, ConstructionVendor, GatewayPair};
use farex_core::{ConstructionJob, Result};

/// Keyed cache of construction results. Owns one bundle per
/// (vendor, carrier, origin, destination) and the flush index that
/// lets an upstream data change find every bundle it affects.
///
/// `create` and `re_create` assume the surrounding coordination layer
/// grants at most one concurrent build per key; the flush index is the
/// only structure this type guards against concurrent jobs itself.
#[derive(Debug, Default)]
pub struct ConstructionCache {
    entries: DashMap<CacheKey, Arc<RwLock<ConstructedCacheBundle>>>,
    flush_index: FlushIndex,
}

impl ConstructionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<RwLock<ConstructedCacheBundle>>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn flush_index(&self) -> &FlushIndex {
        &self.flush_index
    }

    /// Full construction on miss. Runs the vendor pipeline unlocked,
    /// then registers every flush relation the bundle's gateway pairs
    /// imply. `Ok(None)` when the job's vendor resolves to nothing.
    pub fn create(
        &self,
        job: &ConstructionJob,
    ) -> Result<Option<Arc<RwLock<ConstructedCacheBundle>>>> {
        let Some(mut vendor) = ConstructionVendor::resolve(job)? else {
            return Ok(None);
        };
        let fares = vendor.construction(job)?;
        let bundle = ConstructedCacheBundle::new(job, vendor.take_gateway_pairs(), fares);
        let key = CacheKey::from_job(job);

        let mut flush_keys: Vec<FlushKey> = Vec::new();
        for pair in &bundle.gateway_pairs {
            for fk in flush_keys_for_pair(&bundle, pair) {
                if !flush_keys.contains(&fk) {
                    flush_keys.push(fk);
                }
            }
        }
        self.flush_index.insert(&key, &flush_keys);

        info!(
            origin = %bundle.origin,
            destination = %bundle.destination,
            pairs = bundle.gateway_pairs.len(),
            fares = bundle.fares.len(),
            flush_relations = flush_keys.len(),
            "construction bundle cached"
        );

        let handle = Arc::new(RwLock::new(bundle));
        self.entries.insert(key, Arc::clone(&handle));
        Ok(Some(handle))
    }

    /// Incremental rebuild: pairs not flagged for reconstruction are
    /// carried over together with the fares they produced; flagged
    /// pairs go through the vendor's reconstruction path. Flush
    /// relations are untouched, gateway identities are stable across
    /// reconstruction.
    pub fn re_create(
        &self,
        job: &ConstructionJob,
    ) -> Result<Option<Arc<RwLock<ConstructedCacheBundle>>>> {
        let key = CacheKey::from_job(job);
        let Some(entry) = self.get(&key) else {
            return self.create(job);
        };
        let Some(mut vendor) = ConstructionVendor::resolve(job)? else {
            return Ok(None);
        };

        let old = entry.read().clone();
        let flagged: Vec<GatewayPair> = old
            .gateway_pairs
            .iter()
            .filter(|p| p.needs_reconstruction)
            .cloned()
            .collect();
        debug!(
            flagged = flagged.len(),
            total = old.gateway_pairs.len(),
            "reconstructing invalidated gateway pairs"
        );

        let mut fares: Vec<_> = old
            .fares
            .iter()
            .filter(|f| {
                old.gateway_pairs
                    .iter()
                    .any(|p| !p.needs_reconstruction && f.produced_by(&p.gateway1, &p.gateway2))
            })
            .cloned()
            .collect();

        let new_fares = vendor.reconstruction(job, flagged)?;
        let mut rebuilt = vendor.take_gateway_pairs();

        // Reassemble in the original enumeration order.
        let mut pairs = Vec::with_capacity(old.gateway_pairs.len());
        for pair in old.gateway_pairs {
            if pair.needs_reconstruction {
                let found = rebuilt.iter().position(|r| {
                    r.construction_type == pair.construction_type
                        && r.gateway1 == pair.gateway1
                        && r.gateway2 == pair.gateway2
                });
                match found {
                    Some(pos) => pairs.push(rebuilt.swap_remove(pos)),
                    None => {
                        let mut pair = pair;
                        pair.needs_reconstruction = false;
                        pairs.push(pair);
                    }
                }
            } else {
                pairs.push(pair);
            }
        }
        fares.extend(new_fares);

        *entry.write() = ConstructedCacheBundle::new(job, pairs, fares);
        Ok(Some(entry))
    }

    /// Is the cached bundle still servable as-is?
    pub fn validate(&self, key: &CacheKey) -> bool {
        self.get(key).is_some_and(|entry| entry.read().is_valid())
    }

    /// Drop the bundle and sweep the key out of every flush bucket of
    /// the same (vendor, carrier).
    pub fn destroy(&self, key: &CacheKey) {
        self.entries.remove(key);
        self.flush_index.remove_cache_key(key);
        debug!(origin = %key.origin, destination = %key.destination, "bundle destroyed");
    }

    /// Invalidation entry point: mark for reconstruction, inside every
    /// bundle the flush key's bucket names, the gateway pairs that
    /// established the relation. Bundles stay cached and are rebuilt
    /// lazily through `re_create`. Returns how many pairs were newly
    /// flagged.
    pub fn invalidate(&self, flush_key: &FlushKey) -> usize {
        let mut marked = 0;
        for key in self.flush_index.bucket(flush_key) {
            if let Some(entry) = self.entries.get(&key) {
                let mut bundle = entry.write();
                let ctx = bundle.context_clone();
                marked += bundle
                    .mark_pairs_where(|gp| flush_keys_for_pair(&ctx, gp).contains(flush_key));
            }
        }
        if marked > 0 {
            debug!(
                loc1 = %flush_key.loc1,
                loc2 = %flush_key.loc2,
                marked,
                "gateway pairs flagged for reconstruction"
            );
        }
        marked
    }
}
