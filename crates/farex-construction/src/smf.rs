use parking_lot::Mutex;

use crate::comb_class::CombFareClassMap;
use crate::constructed::ConstructedFare;
use crate::cortege::AddonFareCortege;
use crate::gateway_pair::AddonMatcher;
use crate::vendor::{base_interval, footnote_agrees, geo_appl_for_side};
use farex_core::{ConstructionJob, DateInterval, FareInfo, FareMatchCode, Result};

/// SMF add-on matching. SMF publishes no tariff cross-reference, so
/// any add-on tariff combines with any fare tariff; the rest of the
/// chain mirrors ATPCO.
#[derive(Debug)]
pub struct SmfRules {
    comb: Mutex<CombFareClassMap>,
}

impl SmfRules {
    pub fn create(job: &ConstructionJob) -> Result<Self> {
        Ok(Self {
            comb: Mutex::new(CombFareClassMap::new(
                &job.vendor_code,
                &job.carrier,
                job.as_of_date(),
            )),
        })
    }

    #[cfg(test)]
    pub(crate) fn create_for_tests() -> Self {
        let today = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        Self {
            comb: Mutex::new(CombFareClassMap::new(farex_core::SMF_VENDOR_CODE, "XX", today)),
        }
    }
}

impl AddonMatcher for SmfRules {
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

        let (code, comb_interval) = {
            let mut comb = self.comb.lock();
            comb.set_tariff(job.data.as_ref(), specified.fare_tariff)?;
            comb.match_fare_classes(
                specified,
                cortege,
                geo_appl_for_side(is_origin_addon),
                job.is_historical,
            )
        };
        if !code.is_good() {
            return Ok((code, Vec::new()));
        }

        if !footnote_agrees(cortege, is_origin_addon, opposite_specified) {
            return Ok((FareMatchCode::DirectionalFootnote, Vec::new()));
        }

        let interval = match &comb_interval {
            Some(c) => {
                if job.is_historical {
                    base.intersect_historical(c)
                } else {
                    base.intersect(c)
                }
            }
            None => Some(base),
        };

        match interval {
            Some(v) => Ok((FareMatchCode::GoodMatch, vec![v])),
            None => Ok((FareMatchCode::DateIntervalMismatch, Vec::new())),
        }
    }

    fn final_match(&self, _job: &ConstructionJob, _fare: &ConstructedFare) -> bool {
        true
    }
}
