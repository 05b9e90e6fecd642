use serde::{Deserialize, Serialize};

use crate::gateway_pair::GatewayPair;
use farex_core::{CarrierCode, ConstructedFareInfo, ConstructionJob, LocCode, VendorCode};

/// Everything one construction run persists into the keyed cache: the
/// market context the job ran under, the enumerated gateway pairs in
/// their cleared state, and the surviving constructed fares. The
/// context is kept so flush relations can be recomputed per pair at
/// invalidation time without the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructedCacheBundle {
    pub vendor: VendorCode,
    pub carrier: CarrierCode,
    pub origin: LocCode,
    pub destination: LocCode,
    pub board_multi_city: LocCode,
    pub off_multi_city: LocCode,
    pub gateway_pairs: Vec<GatewayPair>,
    pub fares: Vec<ConstructedFareInfo>,
}

impl ConstructedCacheBundle {
    pub fn new(
        job: &ConstructionJob,
        gateway_pairs: Vec<GatewayPair>,
        fares: Vec<ConstructedFareInfo>,
    ) -> Self {
        Self {
            vendor: job.vendor_code.clone(),
            carrier: job.carrier.clone(),
            origin: job.origin.clone(),
            destination: job.destination.clone(),
            board_multi_city: job.board_multi_city.clone(),
            off_multi_city: job.off_multi_city.clone(),
            gateway_pairs,
            fares,
        }
    }

    /// A bundle is valid while no gateway pair awaits reconstruction.
    pub fn is_valid(&self) -> bool {
        !self.gateway_pairs.iter().any(|gp| gp.needs_reconstruction)
    }

    /// Flag every pair the predicate selects; returns how many were
    /// newly flagged.
    pub fn mark_pairs_where<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&GatewayPair) -> bool,
    {
        let mut marked = 0;
        for gp in &mut self.gateway_pairs {
            if !gp.needs_reconstruction && pred(gp) {
                gp.needs_reconstruction = true;
                marked += 1;
            }
        }
        marked
    }

    /// Copy of the market context alone, with no pairs or fares.
    /// Flush-relation derivation only needs this part.
    pub fn context_clone(&self) -> Self {
        Self {
            vendor: self.vendor.clone(),
            carrier: self.carrier.clone(),
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            board_multi_city: self.board_multi_city.clone(),
            off_multi_city: self.off_multi_city.clone(),
            gateway_pairs: Vec::new(),
            fares: Vec::new(),
        }
    }

    /// Pairs currently flagged for reconstruction.
    pub fn pairs_needing_reconstruction(&self) -> usize {
        self.gateway_pairs
            .iter()
            .filter(|gp| gp.needs_reconstruction)
            .count()
    }
}
