use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constructed::ConstructedFare;
use crate::cortege::AddonFareCortege;
use crate::dup::DuplicateResponseSet;
use farex_core::{
    AddonFareInfo, ConstructionJob, ConstructionType, DateInterval, DiagnosticKind, FareInfo,
    FareMatchCode, LocCode, Owrt, Result,
};

/// Vendor-specific comparison contract between one add-on cortege and
/// one specified fare. Implemented per vendor; the gateway pair only
/// drives the combinatorics.
pub trait AddonMatcher {
    /// Returns the match code and, on success, one validity interval
    /// per applicable date-range combination.
    fn match_addon_and_specified(
        &self,
        job: &ConstructionJob,
        cortege: &AddonFareCortege,
        specified: &FareInfo,
        opposite_specified: bool,
        is_origin_addon: bool,
    ) -> Result<(FareMatchCode, Vec<DateInterval>)>;

    /// Cross-side consistency check on an assembled fare; returning
    /// false invalidates only that fare.
    fn final_match(&self, job: &ConstructionJob, fare: &ConstructedFare) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GatewayPairState {
    #[default]
    Uninitialized,
    DataPrepared,
    Matched,
    Cleared,
}

/// One (gateway1, gateway2) combination of a construction job,
/// together with the runs of applicable add-on corteges on each side.
/// Only the identifying fields survive into the cache bundle; the
/// retrieved specified fares are transient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPair {
    pub gateway1: LocCode,
    pub gateway2: LocCode,
    pub multi_city1: LocCode,
    pub multi_city2: LocCode,
    pub construction_type: ConstructionType,
    pub origin_first: usize,
    pub origin_count: usize,
    pub dest_first: usize,
    pub dest_count: usize,
    pub needs_reconstruction: bool,
    #[serde(skip)]
    state: GatewayPairState,
    #[serde(skip)]
    specified: Vec<FareInfo>,
}

impl GatewayPair {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway1: LocCode,
        gateway2: LocCode,
        multi_city1: LocCode,
        multi_city2: LocCode,
        construction_type: ConstructionType,
        origin_first: usize,
        origin_count: usize,
        dest_first: usize,
        dest_count: usize,
    ) -> Self {
        Self {
            gateway1,
            gateway2,
            multi_city1,
            multi_city2,
            construction_type,
            origin_first,
            origin_count,
            dest_first,
            dest_count,
            needs_reconstruction: false,
            state: GatewayPairState::Uninitialized,
            specified: Vec::new(),
        }
    }

    pub fn state(&self) -> GatewayPairState {
        self.state
    }

    /// Market combinations to retrieve: the gateways themselves plus
    /// any multi-city alias combination that differs.
    fn retrieval_markets(&self) -> Vec<(LocCode, LocCode)> {
        let mut combos = vec![(self.gateway1.clone(), self.gateway2.clone())];
        let mut push = |m1: &LocCode, m2: &LocCode| {
            let combo = (m1.clone(), m2.clone());
            if !combos.contains(&combo) {
                combos.push(combo);
            }
        };
        push(&self.multi_city1, &self.gateway2);
        push(&self.gateway1, &self.multi_city2);
        push(&self.multi_city1, &self.multi_city2);
        combos
    }

    /// Retrieve the specified fares for this pair, consulting the
    /// job-shared result cache first. Historical jobs bypass the
    /// cache. SITA and SMF flag individual fares as not valid for
    /// construction; those are dropped here, ATPCO fares never carry
    /// the flag and pass through untouched.
    pub fn prepare_data(&mut self, job: &ConstructionJob) -> Result<()> {
        let as_of = job.as_of_date();
        let vendor_flags_eligibility = job.is_sita() || job.is_smf();
        for (m1, m2) in self.retrieval_markets() {
            let cached = if job.is_historical {
                None
            } else {
                job.specified_cache
                    .get(&m1, &m2, &job.carrier, &job.vendor_code)
            };
            let fares = match cached {
                Some(hit) => hit,
                None => {
                    let fetched = Arc::new(job.data.get_fares_by_market_cxr(
                        &m1,
                        &m2,
                        &job.carrier,
                        &job.vendor_code,
                        as_of,
                    )?);
                    if !job.is_historical {
                        job.specified_cache.add(
                            &m1,
                            &m2,
                            &job.carrier,
                            &job.vendor_code,
                            Arc::clone(&fetched),
                        );
                    }
                    fetched
                }
            };
            self.specified.extend(
                fares
                    .iter()
                    .filter(|f| !vendor_flags_eligibility || f.construction_ind != 'N')
                    .cloned(),
            );
        }

        debug!(
            gateway1 = %self.gateway1,
            gateway2 = %self.gateway2,
            count = self.specified.len(),
            "specified fares retrieved"
        );
        job.diag(DiagnosticKind::SpecifiedFares, || {
            format!(
                "{}-{}: {} specified fare(s)",
                self.gateway1,
                self.gateway2,
                self.specified.len()
            )
        });
        self.state = GatewayPairState::DataPrepared;
        Ok(())
    }

    /// Match every retrieved specified fare against the applicable
    /// add-on runs and emit the surviving constructed fares into the
    /// response accumulator.
    pub fn process(
        &mut self,
        job: &ConstructionJob,
        matcher: &dyn AddonMatcher,
        origin_corteges: &[AddonFareCortege],
        dest_corteges: &[AddonFareCortege],
        response: &mut DuplicateResponseSet,
    ) -> Result<()> {
        let origin_run = self.addon_run(origin_corteges, true);
        let dest_run = self.addon_run(dest_corteges, false);

        let specified = std::mem::take(&mut self.specified);
        for fare in &specified {
            let opposite = !(fare.market1 == self.gateway1 || fare.market1 == self.multi_city1);

            let origin_side =
                self.match_side(job, matcher, fare, opposite, true, origin_run)?;
            let dest_side = self.match_side(job, matcher, fare, opposite, false, dest_run)?;

            match self.construction_type {
                ConstructionType::SingleOrigin => {
                    for (cortege, interval) in &origin_side {
                        self.emit(job, matcher, fare, opposite, Some((cortege, *interval)), None, response);
                    }
                }
                ConstructionType::SingleDestination => {
                    for (cortege, interval) in &dest_side {
                        self.emit(job, matcher, fare, opposite, None, Some((cortege, *interval)), response);
                    }
                }
                ConstructionType::DoubleEnded => {
                    for (oc, oi) in &origin_side {
                        for (dc, di) in &dest_side {
                            self.emit(
                                job,
                                matcher,
                                fare,
                                opposite,
                                Some((oc, *oi)),
                                Some((dc, *di)),
                                response,
                            );
                        }
                    }
                }
            }
        }

        self.state = GatewayPairState::Matched;
        Ok(())
    }

    /// Release transient data; the pair is ready for the bundle.
    pub fn clear(&mut self) {
        self.specified = Vec::new();
        self.state = GatewayPairState::Cleared;
    }

    fn addon_run<'a>(
        &self,
        corteges: &'a [AddonFareCortege],
        is_origin: bool,
    ) -> &'a [AddonFareCortege] {
        let (first, count) = if is_origin {
            (self.origin_first, self.origin_count)
        } else {
            (self.dest_first, self.dest_count)
        };
        if count == 0 {
            &[]
        } else {
            &corteges[first..first + count]
        }
    }

    /// Match one side of the fare against its add-on run, returning
    /// every (cortege, interval) success. Fares whose OWRT forbids
    /// halving only combine with add-ons under the same restriction.
    /// For carriers configured for currency matching, an add-on in a
    /// foreign currency is set aside only when an otherwise-identical
    /// add-on exists in the specified fare's currency; add-ons with no
    /// such twin still participate.
    fn match_side<'a>(
        &self,
        job: &ConstructionJob,
        matcher: &dyn AddonMatcher,
        specified: &FareInfo,
        opposite: bool,
        is_origin: bool,
        run: &'a [AddonFareCortege],
    ) -> Result<Vec<(&'a AddonFareCortege, DateInterval)>> {
        let rt_only = specified.owrt == Owrt::RoundTripMayNotBeHalved;
        let partition: Vec<&AddonFareCortege> = run
            .iter()
            .filter(|c| (c.addon_fare.owrt == Owrt::RoundTripMayNotBeHalved) == rt_only)
            .collect();

        let prefer_currency = job.config.prefers_matching_currency(&job.carrier);

        let mut matched = Vec::new();
        for &cortege in &partition {
            if prefer_currency
                && cortege.addon_fare.currency != specified.currency
                && partition.iter().any(|other| {
                    other.addon_fare.currency == specified.currency
                        && currency_variant(&other.addon_fare, &cortege.addon_fare)
                })
            {
                continue;
            }
            let (code, intervals) =
                matcher.match_addon_and_specified(job, cortege, specified, opposite, is_origin)?;
            job.diag(DiagnosticKind::GatewayMatching, || {
                format!(
                    "{}-{} {} x {}: {:?}",
                    self.gateway1,
                    self.gateway2,
                    cortege.addon_fare.interior_market,
                    specified.fare_class,
                    code
                )
            });
            if code.is_good() {
                matched.extend(intervals.into_iter().map(|i| (cortege, i)));
            }
        }
        Ok(matched)
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        job: &ConstructionJob,
        matcher: &dyn AddonMatcher,
        specified: &FareInfo,
        opposite: bool,
        origin: Option<(&AddonFareCortege, DateInterval)>,
        dest: Option<(&AddonFareCortege, DateInterval)>,
        response: &mut DuplicateResponseSet,
    ) {
        let mut fare = ConstructedFare::new(
            specified.clone(),
            self.gateway1.clone(),
            self.gateway2.clone(),
            opposite,
        );
        if let Some((cortege, interval)) = origin {
            fare.set_addon(cortege.clone(), true, interval);
        }
        if let Some((cortege, interval)) = dest {
            fare.set_addon(cortege.clone(), false, interval);
        }
        if !matcher.final_match(job, &fare) {
            fare.invalidate();
        }
        if let Some(info) = fare.to_info() {
            let resolution = response.add(info);
            job.diag(DiagnosticKind::DuplicateRemoval, || {
                format!(
                    "{}-{} {}: {:?}",
                    self.gateway1, self.gateway2, specified.fare_class, resolution
                )
            });
        }
    }
}

/// Two add-on fares that differ in their published currency but in
/// nothing else that identifies them.
fn currency_variant(a: &AddonFareInfo, b: &AddonFareInfo) -> bool {
    a.interior_market == b.interior_market
        && a.gateway_market == b.gateway_market
        && a.addon_tariff == b.addon_tariff
        && a.fare_class == b.fare_class
        && a.owrt == b.owrt
        && a.routing == b.routing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> GatewayPair {
        GatewayPair::new(
            "LON".into(),
            "NYC".into(),
            "LON".into(),
            "NYC".into(),
            ConstructionType::DoubleEnded,
            0,
            2,
            3,
            1,
        )
    }

    #[test]
    fn runtime_state_never_reaches_the_wire() {
        let mut gp = pair();
        gp.specified = vec![];
        gp.state = GatewayPairState::Matched;

        let json = serde_json::to_string(&gp).unwrap();
        assert!(!json.contains("\"state\""));
        assert!(!json.contains("\"specified\""));

        let back: GatewayPair = serde_json::from_str(&json).unwrap();
        assert_eq!(back.state(), GatewayPairState::Uninitialized);
        assert_eq!(back.gateway1, "LON");
        assert_eq!(back.origin_count, 2);
        assert_eq!(back.dest_first, 3);
        assert!(!back.needs_reconstruction);
    }
}
