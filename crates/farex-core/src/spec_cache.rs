use crate::records::FareInfo;
use crate::types::{CarrierCode, LocCode, VendorCode};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SpecFareKey {
    gateway1: LocCode,
    gateway2: LocCode,
    carrier: CarrierCode,
    vendor: VendorCode,
}

/// Specified-fare result cache shared across gateway pairs, within and
/// across jobs. Populated opportunistically, never invalidated within
/// a job's lifetime; reads vastly outnumber inserts.
#[derive(Debug, Default)]
pub struct SpecifiedFareCache {
    fares: RwLock<HashMap<SpecFareKey, Arc<Vec<FareInfo>>>>,
}

impl SpecifiedFareCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        gateway1: &str,
        gateway2: &str,
        carrier: &str,
        vendor: &str,
    ) -> Option<Arc<Vec<FareInfo>>> {
        let key = SpecFareKey {
            gateway1: gateway1.to_owned(),
            gateway2: gateway2.to_owned(),
            carrier: carrier.to_owned(),
            vendor: vendor.to_owned(),
        };
        let hit = self.fares.read().get(&key).cloned();
        if hit.is_some() {
            debug!(gateway1, gateway2, carrier, "specified-fare cache hit");
        }
        hit
    }

    pub fn add(
        &self,
        gateway1: &str,
        gateway2: &str,
        carrier: &str,
        vendor: &str,
        fares: Arc<Vec<FareInfo>>,
    ) {
        let key = SpecFareKey {
            gateway1: gateway1.to_owned(),
            gateway2: gateway2.to_owned(),
            carrier: carrier.to_owned(),
            vendor: vendor.to_owned(),
        };
        self.fares.write().entry(key).or_insert(fares);
    }

    pub fn len(&self) -> usize {
        self.fares.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fares.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_round_trip_and_first_insert_wins() {
        let cache = SpecifiedFareCache::new();
        assert!(cache.get("LON", "DFW", "AA", "ATP").is_none());

        cache.add("LON", "DFW", "AA", "ATP", Arc::new(Vec::new()));
        let first = cache.get("LON", "DFW", "AA", "ATP").unwrap();
        assert!(first.is_empty());

        // A later insert for the same key must not replace the shared
        // list other pairs may already hold.
        cache.add("LON", "DFW", "AA", "ATP", Arc::new(Vec::new()));
        assert_eq!(cache.len(), 1);
    }
}
