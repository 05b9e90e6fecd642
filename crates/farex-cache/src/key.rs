use serde::{Deserialize, Serialize};

use farex_construction::{ConstructedCacheBundle, GatewayPair};
use farex_core::{CarrierCode, ConstructionJob, ConstructionType, LocCode, VendorCode};

/// Identity of one cached construction result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub vendor: VendorCode,
    pub carrier: CarrierCode,
    pub origin: LocCode,
    pub destination: LocCode,
}

impl CacheKey {
    pub fn from_job(job: &ConstructionJob) -> Self {
        Self {
            vendor: job.vendor_code.clone(),
            carrier: job.carrier.clone(),
            origin: job.origin.clone(),
            destination: job.destination.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlushKind {
    /// Add-on fares between a gateway and an interior market changed.
    AddonFlush,
    /// Specified fares between two gateways changed.
    SpecifiedFlush,
}

/// Coarse invalidation key derived from a bundle's gateway pairs. Many
/// FlushKeys map to one CacheKey. Locations are normalized so the
/// lexicographically smaller one comes first; (A,B) and (B,A) collapse
/// to one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlushKey {
    pub vendor: VendorCode,
    pub carrier: CarrierCode,
    pub loc1: LocCode,
    pub loc2: LocCode,
    pub kind: FlushKind,
}

impl FlushKey {
    pub fn new(
        vendor: impl Into<VendorCode>,
        carrier: impl Into<CarrierCode>,
        a: impl Into<LocCode>,
        b: impl Into<LocCode>,
        kind: FlushKind,
    ) -> Self {
        let (a, b) = (a.into(), b.into());
        let (loc1, loc2) = if a <= b { (a, b) } else { (b, a) };
        Self {
            vendor: vendor.into(),
            carrier: carrier.into(),
            loc1,
            loc2,
            kind,
        }
    }
}

/// Every flush relation one gateway pair establishes, derived from the
/// bundle's market context:
///
/// - one add-on flush key per construction-point gateway, against the
///   point's interior market and its multi-city alias;
/// - one specified flush key per unordered (gateway, alias)
///   combination of the pair.
pub fn flush_keys_for_pair(bundle: &ConstructedCacheBundle, pair: &GatewayPair) -> Vec<FlushKey> {
    let mut keys: Vec<FlushKey> = Vec::new();
    let mut push = |key: FlushKey| {
        if !keys.contains(&key) {
            keys.push(key);
        }
    };

    let origin_side = matches!(
        pair.construction_type,
        ConstructionType::SingleOrigin | ConstructionType::DoubleEnded
    );
    let dest_side = matches!(
        pair.construction_type,
        ConstructionType::SingleDestination | ConstructionType::DoubleEnded
    );

    if origin_side {
        for gateway in [&pair.gateway1, &pair.multi_city1] {
            for interior in [&bundle.origin, &bundle.board_multi_city] {
                push(FlushKey::new(
                    bundle.vendor.clone(),
                    bundle.carrier.clone(),
                    gateway.clone(),
                    interior.clone(),
                    FlushKind::AddonFlush,
                ));
            }
        }
    }
    if dest_side {
        for gateway in [&pair.gateway2, &pair.multi_city2] {
            for interior in [&bundle.destination, &bundle.off_multi_city] {
                push(FlushKey::new(
                    bundle.vendor.clone(),
                    bundle.carrier.clone(),
                    gateway.clone(),
                    interior.clone(),
                    FlushKind::AddonFlush,
                ));
            }
        }
    }

    for g1 in [&pair.gateway1, &pair.multi_city1] {
        for g2 in [&pair.gateway2, &pair.multi_city2] {
            push(FlushKey::new(
                bundle.vendor.clone(),
                bundle.carrier.clone(),
                g1.clone(),
                g2.clone(),
                FlushKind::SpecifiedFlush,
            ));
        }
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_key_orders_locations_lexicographically() {
        let a = FlushKey::new("ATP", "AA", "PAR", "LON", FlushKind::SpecifiedFlush);
        let b = FlushKey::new("ATP", "AA", "LON", "PAR", FlushKind::SpecifiedFlush);
        assert_eq!(a, b);
        assert_eq!(a.loc1, "LON");
        assert_eq!(a.loc2, "PAR");
    }

    #[test]
    fn kinds_keep_otherwise_identical_keys_apart() {
        let a = FlushKey::new("ATP", "AA", "LON", "PAR", FlushKind::SpecifiedFlush);
        let b = FlushKey::new("ATP", "AA", "LON", "PAR", FlushKind::AddonFlush);
        assert_ne!(a, b);
    }

    #[test]
    fn pair_derivation_covers_aliases_without_duplicates() {
        let bundle = ConstructedCacheBundle {
            vendor: "ATP".into(),
            carrier: "AA".into(),
            origin: "MAN".into(),
            destination: "DFW".into(),
            board_multi_city: "MAN".into(),
            off_multi_city: "DFW".into(),
            gateway_pairs: Vec::new(),
            fares: Vec::new(),
        };
        let pair = GatewayPair::new(
            "LON".into(),
            "DFW".into(),
            "LON".into(),
            "DFW".into(),
            ConstructionType::SingleOrigin,
            0,
            2,
            0,
            0,
        );
        let keys = flush_keys_for_pair(&bundle, &pair);
        // One add-on relation (LON, MAN) and one specified relation
        // (DFW, LON); aliases equal the principals so nothing extra.
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&FlushKey::new("ATP", "AA", "LON", "MAN", FlushKind::AddonFlush)));
        assert!(keys.contains(&FlushKey::new(
            "ATP",
            "AA",
            "LON",
            "DFW",
            FlushKind::SpecifiedFlush
        )));
    }

    #[test]
    fn differing_aliases_fan_out() {
        let bundle = ConstructedCacheBundle {
            vendor: "ATP".into(),
            carrier: "AA".into(),
            origin: "EWR".into(),
            destination: "DFW".into(),
            board_multi_city: "NYC".into(),
            off_multi_city: "DFW".into(),
            gateway_pairs: Vec::new(),
            fares: Vec::new(),
        };
        let pair = GatewayPair::new(
            "LHR".into(),
            "DFW".into(),
            "LON".into(),
            "DFW".into(),
            ConstructionType::SingleOrigin,
            0,
            1,
            0,
            0,
        );
        let keys = flush_keys_for_pair(&bundle, &pair);
        // Add-on: {LHR,LON} x {EWR,NYC} = 4; specified: {LHR,LON} x
        // {DFW} = 2.
        assert_eq!(keys.len(), 6);
        assert!(keys.contains(&FlushKey::new("ATP", "AA", "LON", "NYC", FlushKind::AddonFlush)));
        assert!(keys.contains(&FlushKey::new(
            "ATP",
            "AA",
            "DFW",
            "LON",
            FlushKind::SpecifiedFlush
        )));
    }
}
