use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::atpco::AtpcoRules;
use crate::cortege::AddonFareCortege;
use crate::dup::DuplicateResponseSet;
use crate::gateway_pair::{AddonMatcher, GatewayPair};
use crate::sita::SitaRules;
use crate::smf::SmfRules;
use crate::zone;
use farex_core::{
    AddonFareInfo, ConstructedFareInfo, ConstructionJob, ConstructionPoint, ConstructionType,
    DateInterval, DiagnosticKind, DirectionalFootnote, FareInfo, FarexError, GlobalDirection,
    LocCode, LocationInfo, Result, TariffNumber, ZoneStatus, ATPCO_VENDOR_CODE, SITA_VENDOR_CODE,
    SMF_VENDOR_CODE,
};

/// Common interval seed of every vendor chain: the add-on cortege's
/// zone-validated window against the specified fare's window.
pub(crate) fn base_interval(
    cortege: &AddonFareCortege,
    specified: &FareInfo,
    historical: bool,
) -> Option<DateInterval> {
    if historical {
        cortege.interval.intersect_historical(&specified.interval)
    } else {
        cortege.interval.intersect(&specified.interval)
    }
}

/// A TO footnote points the add-on at the fare's origin side, FROM at
/// its destination side; a reversed specified fare flips the side.
pub(crate) fn footnote_agrees(
    cortege: &AddonFareCortege,
    is_origin_addon: bool,
    opposite_specified: bool,
) -> bool {
    match cortege.directional_footnote {
        DirectionalFootnote::None => true,
        DirectionalFootnote::To => is_origin_addon != opposite_specified,
        DirectionalFootnote::From => is_origin_addon == opposite_specified,
    }
}

/// Geographic-application indicator for the combination table.
pub(crate) fn geo_appl_for_side(is_origin_addon: bool) -> char {
    if is_origin_addon {
        'O'
    } else {
        'D'
    }
}

/// Vendor-specific rule set. Closed: the three fare-filing vendors are
/// the only ones that publish add-on fares.
#[derive(Debug)]
pub enum VendorRules {
    Atpco(AtpcoRules),
    Sita(SitaRules),
    Smf(SmfRules),
}

impl VendorRules {
    /// Resolve the job's vendor code to its rule set. `Ok(None)` for a
    /// vendor that publishes no add-on fares.
    pub fn resolve(job: &ConstructionJob) -> Result<Option<Self>> {
        match job.vendor_code.as_str() {
            ATPCO_VENDOR_CODE => Ok(Some(VendorRules::Atpco(AtpcoRules::create(job)?))),
            SITA_VENDOR_CODE => Ok(Some(VendorRules::Sita(SitaRules::create(job)?))),
            SMF_VENDOR_CODE => Ok(Some(VendorRules::Smf(SmfRules::create(job)?))),
            other => {
                warn!(vendor = other, "no construction rules for vendor");
                Ok(None)
            }
        }
    }

    pub fn matcher(&self) -> &dyn AddonMatcher {
        match self {
            VendorRules::Atpco(r) => r,
            VendorRules::Sita(r) => r,
            VendorRules::Smf(r) => r,
        }
    }

    /// Is this add-on tariff published for the job's global direction?
    /// Only ATPCO scopes add-on tariffs by direction.
    pub fn is_global_dir_valid(&self, addon_tariff: TariffNumber, gd: GlobalDirection) -> bool {
        match self {
            VendorRules::Atpco(r) => r.trf_xref().is_global_dir_valid(addon_tariff, gd),
            _ => true,
        }
    }

    /// May two add-on tariffs meet across a double-ended fare? Only
    /// ATPCO restricts this through the cross-reference records.
    pub fn match_addon_fares(&self, t1: TariffNumber, t2: TariffNumber) -> bool {
        match self {
            VendorRules::Atpco(r) => r.trf_xref().match_addon_tariffs(t1, t2),
            _ => true,
        }
    }
}

/// One vendor's construction state for a single job: the zone-approved
/// add-on corteges on each side, and the enumerated gateway pairs.
#[derive(Debug)]
pub struct ConstructionVendor {
    rules: VendorRules,
    origin_corteges: Vec<AddonFareCortege>,
    dest_corteges: Vec<AddonFareCortege>,
    gateway_pairs: Vec<GatewayPair>,
}

impl ConstructionVendor {
    pub fn resolve(job: &ConstructionJob) -> Result<Option<Self>> {
        Ok(VendorRules::resolve(job)?.map(|rules| Self {
            rules,
            origin_corteges: Vec::new(),
            dest_corteges: Vec::new(),
            gateway_pairs: Vec::new(),
        }))
    }

    pub fn rules(&self) -> &VendorRules {
        &self.rules
    }

    pub fn gateway_pairs(&self) -> &[GatewayPair] {
        &self.gateway_pairs
    }

    pub fn take_gateway_pairs(&mut self) -> Vec<GatewayPair> {
        std::mem::take(&mut self.gateway_pairs)
    }

    /// Screen one retrieved add-on fare and, when it passes, add one
    /// cortege per valid zone interval to the construction point's
    /// list. A gateway that self-references the market is silently
    /// unacceptable.
    pub fn add_addon_fare(
        &mut self,
        job: &ConstructionJob,
        cp: ConstructionPoint,
        addon: &AddonFareInfo,
    ) -> Result<ZoneStatus> {
        let gateway = &addon.gateway_market;
        if *gateway == addon.interior_market
            || *gateway == job.origin
            || *gateway == job.destination
            || *gateway == job.board_multi_city
            || *gateway == job.off_multi_city
        {
            return Ok(ZoneStatus::Unacceptable);
        }

        if !self
            .rules
            .is_global_dir_valid(addon.addon_tariff, job.global_direction)
        {
            return Ok(ZoneStatus::Fail);
        }

        let (status, intervals) = if job.is_rtw {
            let status = zone::rtw_applicability(addon);
            let intervals = if status == ZoneStatus::Pass {
                vec![addon.interval]
            } else {
                Vec::new()
            };
            (status, intervals)
        } else {
            zone::validate_zones(job, addon, cp.opposite())?
        };

        if status == ZoneStatus::Pass {
            let corteges = match cp {
                ConstructionPoint::Origin => &mut self.origin_corteges,
                ConstructionPoint::Destination => &mut self.dest_corteges,
            };
            for interval in intervals {
                corteges.push(AddonFareCortege::new(addon.clone(), interval));
            }
        }
        Ok(status)
    }

    /// Retrieve and screen the add-on fares for both construction
    /// points, including the multi-city aliases.
    fn ingest_addon_fares(&mut self, job: &ConstructionJob) -> Result<()> {
        self.origin_corteges.clear();
        self.dest_corteges.clear();

        for cp in [ConstructionPoint::Origin, ConstructionPoint::Destination] {
            let primary = job.construction_point(cp).clone();
            let alias = job.multi_city(cp).clone();
            let mut markets = vec![primary];
            if alias != markets[0] {
                markets.push(alias);
            }

            let mut retrieved = 0usize;
            for market in markets {
                let addons = job
                    .data
                    .get_add_on_fare(&market, &job.carrier, job.as_of_date())?;
                retrieved += addons.len();
                for addon in &addons {
                    if addon.vendor != job.vendor_code {
                        continue;
                    }
                    self.add_addon_fare(job, cp, addon)?;
                }
            }
            job.diag(DiagnosticKind::AddonRetrieval, || {
                format!(
                    "{:?} {}: {} add-on fare(s) retrieved",
                    cp,
                    job.construction_point(cp),
                    retrieved
                )
            });
        }

        debug!(
            origin = self.origin_corteges.len(),
            destination = self.dest_corteges.len(),
            "add-on corteges built"
        );
        Ok(())
    }

    /// Sort each side by (gateway, add-on tariff) and back-fill the
    /// run mark-up: every cortege learns its position within the
    /// gateway run and the run's length.
    fn sort_and_mark_up(&mut self) {
        for corteges in [&mut self.origin_corteges, &mut self.dest_corteges] {
            corteges.sort_by(|a, b| {
                (a.gateway(), a.addon_fare.addon_tariff)
                    .cmp(&(b.gateway(), b.addon_fare.addon_tariff))
            });
            let mut i = 0;
            while i < corteges.len() {
                let mut j = i + 1;
                while j < corteges.len() && corteges[j].gateway() == corteges[i].gateway() {
                    j += 1;
                }
                let count = j - i;
                for (seq, cortege) in corteges[i..j].iter_mut().enumerate() {
                    cortege.sequence_number = seq + 1;
                    cortege.gateway_fare_count = count;
                }
                i = j;
            }
        }
    }

    /// Enumerate gateway pairs in their processing order: single-ended
    /// origin runs, single-ended destination runs, then double-ended
    /// combinations. Domestic pairs never construct.
    fn build_gateway_pairs(&mut self, job: &ConstructionJob) -> Result<()> {
        let mut locations: HashMap<LocCode, LocationInfo> = HashMap::new();
        let mut lookup = |loc: &LocCode| -> Result<LocationInfo> {
            if let Some(found) = locations.get(loc) {
                return Ok(found.clone());
            }
            let resolved = job.data.get_location(loc)?;
            locations.insert(loc.clone(), resolved.clone());
            Ok(resolved)
        };

        let origin_runs = gateway_runs(&self.origin_corteges);
        let dest_runs = gateway_runs(&self.dest_corteges);
        let mut pairs: Vec<GatewayPair> = Vec::new();

        for (gateway, first, count) in &origin_runs {
            let loc = lookup(gateway)?;
            if loc.nation == job.destination_nation {
                continue;
            }
            pairs.push(GatewayPair::new(
                gateway.clone(),
                job.destination.clone(),
                loc.multi_city,
                job.off_multi_city.clone(),
                ConstructionType::SingleOrigin,
                *first,
                *count,
                0,
                0,
            ));
        }

        for (gateway, first, count) in &dest_runs {
            let loc = lookup(gateway)?;
            if loc.nation == job.origin_nation {
                continue;
            }
            pairs.push(GatewayPair::new(
                job.origin.clone(),
                gateway.clone(),
                job.board_multi_city.clone(),
                loc.multi_city,
                ConstructionType::SingleDestination,
                0,
                0,
                *first,
                *count,
            ));
        }

        for (g1, f1, c1) in &origin_runs {
            for (g2, f2, c2) in &dest_runs {
                if g1 == g2 {
                    continue;
                }
                let already = pairs.iter().any(|p| {
                    p.construction_type == ConstructionType::DoubleEnded
                        && ((p.gateway1 == *g1 && p.gateway2 == *g2)
                            || (p.gateway1 == *g2 && p.gateway2 == *g1))
                });
                if already {
                    continue;
                }
                let l1 = lookup(g1)?;
                let l2 = lookup(g2)?;
                if l1.nation == l2.nation {
                    continue;
                }
                let combinable = self.origin_corteges[*f1..*f1 + *c1].iter().any(|oc| {
                    self.dest_corteges[*f2..*f2 + *c2].iter().any(|dc| {
                        self.rules.match_addon_fares(
                            oc.addon_fare.addon_tariff,
                            dc.addon_fare.addon_tariff,
                        )
                    })
                });
                if !combinable {
                    continue;
                }
                pairs.push(GatewayPair::new(
                    g1.clone(),
                    g2.clone(),
                    l1.multi_city,
                    l2.multi_city,
                    ConstructionType::DoubleEnded,
                    *f1,
                    *c1,
                    *f2,
                    *c2,
                ));
            }
        }

        debug!(pairs = pairs.len(), "gateway pairs enumerated");
        self.gateway_pairs = pairs;
        Ok(())
    }

    /// Dispatch every pair's data preparation to the worker pool and
    /// join before matching starts.
    fn prepare_all(&mut self, job: &ConstructionJob) -> Result<()> {
        let pairs = &mut self.gateway_pairs;
        match job.config.worker_threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| FarexError::InvalidOperation(e.to_string()))?;
                pool.install(|| pairs.par_iter_mut().try_for_each(|gp| gp.prepare_data(job)))
            }
            None => pairs.par_iter_mut().try_for_each(|gp| gp.prepare_data(job)),
        }
    }

    /// Match the prepared pairs sequentially in enumeration order,
    /// clearing each pair's transient state before it is kept.
    fn match_all(&mut self, job: &ConstructionJob) -> Result<Vec<ConstructedFareInfo>> {
        let mut response = DuplicateResponseSet::new(
            !job.is_sita(),
            job.single_over_double,
            job.is_historical,
            job.ticketing_date,
            job.travel_date,
        );

        let pairs = std::mem::take(&mut self.gateway_pairs);
        let matcher = self.rules.matcher();
        let mut kept = Vec::with_capacity(pairs.len());
        for mut gp in pairs {
            gp.process(
                job,
                matcher,
                &self.origin_corteges,
                &self.dest_corteges,
                &mut response,
            )?;
            gp.clear();
            kept.push(gp);
        }
        self.gateway_pairs = kept;

        let fares = response.into_fares();
        job.diag(DiagnosticKind::ConstructedFares, || {
            format!("{} constructed fare(s) after duplicate removal", fares.len())
        });
        Ok(fares)
    }

    /// Full construction run for one job.
    pub fn construction(&mut self, job: &ConstructionJob) -> Result<Vec<ConstructedFareInfo>> {
        self.ingest_addon_fares(job)?;
        self.sort_and_mark_up();
        self.build_gateway_pairs(job)?;
        self.prepare_all(job)?;
        let fares = self.match_all(job)?;
        info!(
            vendor = %job.vendor_code,
            origin = %job.origin,
            destination = %job.destination,
            pairs = self.gateway_pairs.len(),
            fares = fares.len(),
            "construction complete"
        );
        Ok(fares)
    }

    /// Rebuild fares for a previously enumerated set of gateway pairs
    /// after reference data changed. Add-ons are re-ingested, every
    /// pair's runs are relocated against the fresh corteges, and the
    /// reconstruction flag is cleared on every pair.
    pub fn reconstruction(
        &mut self,
        job: &ConstructionJob,
        mut pairs: Vec<GatewayPair>,
    ) -> Result<Vec<ConstructedFareInfo>> {
        self.ingest_addon_fares(job)?;
        self.sort_and_mark_up();

        let origin_runs = gateway_runs(&self.origin_corteges);
        let dest_runs = gateway_runs(&self.dest_corteges);
        let relocate = |runs: &[(LocCode, usize, usize)], gateway: &LocCode| {
            runs.iter()
                .find(|(g, _, _)| g == gateway)
                .map_or((0, 0), |(_, first, count)| (*first, *count))
        };

        for gp in &mut pairs {
            gp.needs_reconstruction = false;
            match gp.construction_type {
                ConstructionType::SingleOrigin => {
                    (gp.origin_first, gp.origin_count) = relocate(&origin_runs, &gp.gateway1);
                }
                ConstructionType::SingleDestination => {
                    (gp.dest_first, gp.dest_count) = relocate(&dest_runs, &gp.gateway2);
                }
                ConstructionType::DoubleEnded => {
                    (gp.origin_first, gp.origin_count) = relocate(&origin_runs, &gp.gateway1);
                    (gp.dest_first, gp.dest_count) = relocate(&dest_runs, &gp.gateway2);
                }
            }
            job.diag(DiagnosticKind::Reconstruction, || {
                format!(
                    "{}-{}: origin run {}, destination run {}",
                    gp.gateway1, gp.gateway2, gp.origin_count, gp.dest_count
                )
            });
        }
        self.gateway_pairs = pairs;

        self.prepare_all(job)?;
        self.match_all(job)
    }
}

/// Contiguous gateway runs of a sorted cortege list as
/// (gateway, first index, length).
fn gateway_runs(corteges: &[AddonFareCortege]) -> Vec<(LocCode, usize, usize)> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < corteges.len() {
        let mut j = i + 1;
        while j < corteges.len() && corteges[j].gateway() == corteges[i].gateway() {
            j += 1;
        }
        runs.push((corteges[i].addon_fare.gateway_market.clone(), i, j - i));
        i = j;
    }
    runs
}
