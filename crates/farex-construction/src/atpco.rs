use parking_lot::Mutex;

use crate::comb_class::CombFareClassMap;
use crate::constructed::ConstructedFare;
use crate::cortege::AddonFareCortege;
use crate::gateway_pair::AddonMatcher;
use crate::trf_xref::TrfXrefMap;
use crate::vendor::{base_interval, footnote_agrees, geo_appl_for_side};
use farex_core::{
    ConstructionJob, DateInterval, FareInfo, FareMatchCode, RecordScope, Result,
};

/// ATPCO add-on matching: tariff cross-reference, fare-class
/// combination table, directional footnote.
#[derive(Debug)]
pub struct AtpcoRules {
    trf_xref: TrfXrefMap,
    comb: Mutex<CombFareClassMap>,
}

impl AtpcoRules {
    pub fn create(job: &ConstructionJob) -> Result<Self> {
        let trf_xref = TrfXrefMap::load(
            job.data.as_ref(),
            &job.vendor_code,
            &job.carrier,
            RecordScope::International,
        )?;
        let comb = Mutex::new(CombFareClassMap::new(
            &job.vendor_code,
            &job.carrier,
            job.as_of_date(),
        ));
        Ok(Self { trf_xref, comb })
    }

    pub fn trf_xref(&self) -> &TrfXrefMap {
        &self.trf_xref
    }

    fn match_fare_classes(
        &self,
        job: &ConstructionJob,
        cortege: &AddonFareCortege,
        specified: &FareInfo,
        is_origin_addon: bool,
    ) -> Result<(FareMatchCode, Option<DateInterval>)> {
        let mut comb = self.comb.lock();
        comb.set_tariff(job.data.as_ref(), specified.fare_tariff)?;
        Ok(comb.match_fare_classes(
            specified,
            cortege,
            geo_appl_for_side(is_origin_addon),
            job.is_historical,
        ))
    }
}

impl AddonMatcher for AtpcoRules {
    fn match_addon_and_specified(
        &self,
        job: &ConstructionJob,
        cortege: &AddonFareCortege,
        specified: &FareInfo,
        opposite_specified: bool,
        is_origin_addon: bool,
    ) -> Result<(FareMatchCode, Vec<DateInterval>)> {
        let Some(base) = base_interval(cortege, specified, job.is_historical) else {
            return Ok((FareMatchCode::DateIntervalMismatch, Vec::new()));
        };

        let (code, xref_intervals) = self.trf_xref.match_fare_and_addon_tariff(
            specified.fare_tariff,
            cortege.addon_fare.addon_tariff,
            job.is_historical,
        );
        if !code.is_good() {
            return Ok((code, Vec::new()));
        }

        let (code, comb_interval) =
            self.match_fare_classes(job, cortege, specified, is_origin_addon)?;
        if !code.is_good() {
            return Ok((code, Vec::new()));
        }

        if !footnote_agrees(cortege, is_origin_addon, opposite_specified) {
            return Ok((FareMatchCode::DirectionalFootnote, Vec::new()));
        }

        let intervals: Vec<DateInterval> = xref_intervals
            .iter()
            .filter_map(|x| {
                let mut v = if job.is_historical {
                    base.intersect_historical(x)?
                } else {
                    base.intersect(x)?
                };
                if let Some(c) = &comb_interval {
                    v = if job.is_historical {
                        v.intersect_historical(c)?
                    } else {
                        v.intersect(c)?
                    };
                }
                Some(v)
            })
            .collect();

        if intervals.is_empty() {
            Ok((FareMatchCode::DateIntervalMismatch, intervals))
        } else {
            Ok((FareMatchCode::GoodMatch, intervals))
        }
    }

    fn final_match(&self, _job: &ConstructionJob, _fare: &ConstructedFare) -> bool {
        true
    }
}
