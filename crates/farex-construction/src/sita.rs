use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::comb_class::CombFareClassMap;
use crate::constructed::ConstructedFare;
use crate::cortege::{AddonFareCortege, GenericAddonClass};
use crate::gateway_pair::AddonMatcher;
use crate::trf_xref::TrfXrefMap;
use crate::vendor::{base_interval, footnote_agrees, geo_appl_for_side};
use farex_core::{
    ConstructionJob, DateInterval, FareInfo, FareMatchCode, Owrt, RecordScope, Result,
    SitaFareFields,
};

/// SITA add-on OWRT code permitting every specified OWRT indicator.
pub const SITA_OWRT_ADDON_5: u8 = 5;

/// Generic tariff families: an add-on published under the group
/// family combines with any member family of that group.
static TARIFF_FAMILY_GROUPS: Lazy<HashMap<char, [char; 3]>> = Lazy::new(|| {
    HashMap::from([
        ('1', ['A', 'B', 'C']),
        ('2', ['D', 'E', 'F']),
        ('3', ['G', 'H', 'I']),
        ('4', ['J', 'K', 'L']),
    ])
});

/// SITA add-on matching extends the common chain with OWRT-code,
/// routing, route-code, tariff-family, fare-quality, rule and
/// fare-basis checks, and enforces through-field agreement across the
/// two sides of a double-ended fare.
#[derive(Debug)]
pub struct SitaRules {
    trf_xref: TrfXrefMap,
    comb: Mutex<CombFareClassMap>,
}

impl SitaRules {
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

    /// Non-generic add-ons match on fare basis: exact fare class, or
    /// indirection through the add-on's DBE class or the specified
    /// fare's global-class flag.
    fn match_fare_basis(
        &self,
        job: &ConstructionJob,
        addon_sita: &SitaFareFields,
        cortege: &AddonFareCortege,
        specified: &FareInfo,
    ) -> Result<FareMatchCode> {
        if cortege.addon_fare.fare_class == specified.fare_class {
            return Ok(FareMatchCode::GoodMatch);
        }
        if let Some(dbe) = &addon_sita.dbe_class {
            let classes = job.data.get_dbe_fare_classes(&job.vendor_code, dbe)?;
            if classes.contains(&specified.fare_class) {
                return Ok(FareMatchCode::GoodMatch);
            }
        }
        if addon_sita.global_class_flag {
            let specified_global = specified.sita.as_ref().and_then(|s| s.tariff_family);
            let addon_global = addon_sita.tariff_family;
            if specified_global.is_some() && specified_global == addon_global {
                return Ok(FareMatchCode::GoodMatch);
            }
            return Ok(FareMatchCode::GlobalClassMismatch);
        }
        Ok(FareMatchCode::FareBasisMismatch)
    }
}

/// Which specified OWRT indicators a SITA add-on OWRT code permits.
fn owrt_code_permits(code: u8, specified: Owrt) -> bool {
    match code {
        1 => specified == Owrt::OneWayMayBeDoubled,
        2 => specified == Owrt::RoundTripMayNotBeHalved,
        3 => specified == Owrt::OneWayMayNotBeDoubled,
        4 => matches!(specified, Owrt::OneWayMayBeDoubled | Owrt::OneWayMayNotBeDoubled),
        SITA_OWRT_ADDON_5 => true,
        _ => false,
    }
}

fn tariff_family_matches(addon_family: char, specified_family: char) -> bool {
    if addon_family == specified_family {
        return true;
    }
    TARIFF_FAMILY_GROUPS
        .get(&addon_family)
        .is_some_and(|members| members.contains(&specified_family))
}

/// Include/exclude set check shared by fare-quality and rule matching.
fn in_scope<T: PartialEq>(value: Option<&T>, set: &[T], exclude: bool) -> bool {
    let Some(value) = value else {
        // Nothing to test against an include set is a failure, against
        // an exclude set a pass.
        return exclude || set.is_empty();
    };
    let listed = set.contains(value);
    if exclude {
        !listed
    } else {
        set.is_empty() || listed
    }
}

impl AddonMatcher for SitaRules {
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

        let addon_sita = cortege.addon_fare.sita.clone().unwrap_or_default();
        let spec_sita = specified.sita.clone().unwrap_or_default();

        if let Some(owrt_code) = addon_sita.addon_owrt_code {
            if !owrt_code_permits(owrt_code, specified.owrt) {
                return Ok((FareMatchCode::OwrtMismatch, Vec::new()));
            }
        }

        // Base-fare routing: an explicit routing must agree with the
        // specified fare; an MPM-only base requires a mileage-routed
        // specified fare.
        if let Some(routing) = &addon_sita.base_fare_routing {
            if *routing != specified.routing {
                return Ok((FareMatchCode::RoutingMismatch, Vec::new()));
            }
        } else if addon_sita.base_mpm.is_some() && specified.routing != "0000" {
            return Ok((FareMatchCode::RoutingMismatch, Vec::new()));
        }

        if let Some(route_code) = &addon_sita.route_code {
            if spec_sita.route_code.as_ref() != Some(route_code) {
                return Ok((FareMatchCode::RouteCodeMismatch, Vec::new()));
            }
        }

        if let (Some(af), Some(sf)) = (addon_sita.tariff_family, spec_sita.tariff_family) {
            if !tariff_family_matches(af, sf) {
                return Ok((FareMatchCode::TariffFamilyMismatch, Vec::new()));
            }
        }

        if !in_scope(
            spec_sita.fare_quality.as_ref(),
            &addon_sita.fare_quality_codes,
            addon_sita.fare_quality_excl,
        ) {
            return Ok((FareMatchCode::FareQualityMismatch, Vec::new()));
        }

        if !in_scope(
            Some(&specified.rule_number),
            &addon_sita.rules,
            addon_sita.rules_excl,
        ) {
            return Ok((FareMatchCode::RuleMismatch, Vec::new()));
        }

        // Generic add-on classes go through the combination table;
        // everything else matches on fare basis.
        let mut comb_interval = None;
        if cortege.generic_class == GenericAddonClass::Regular {
            let code = self.match_fare_basis(job, &addon_sita, cortege, specified)?;
            if !code.is_good() {
                return Ok((code, Vec::new()));
            }
        } else {
            let mut comb = self.comb.lock();
            comb.set_tariff(job.data.as_ref(), specified.fare_tariff)?;
            let (code, interval) = comb.match_fare_classes(
                specified,
                cortege,
                geo_appl_for_side(is_origin_addon),
                job.is_historical,
            );
            if !code.is_good() {
                return Ok((code, Vec::new()));
            }
            comb_interval = interval;
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

    /// Double-ended SITA fares must agree on the through-fare fields
    /// between the origin and destination add-ons.
    fn final_match(&self, _job: &ConstructionJob, fare: &ConstructedFare) -> bool {
        let (Some(origin), Some(dest)) = (&fare.origin_addon, &fare.dest_addon) else {
            return true;
        };
        let os = origin.addon_fare.sita.clone().unwrap_or_default();
        let ds = dest.addon_fare.sita.clone().unwrap_or_default();
        os.through_rule == ds.through_rule
            && os.through_mpm == ds.through_mpm
            && os.through_routing == ds.through_routing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owrt_code_five_permits_every_specified_code() {
        for owrt in [
            Owrt::OneWayMayBeDoubled,
            Owrt::RoundTripMayNotBeHalved,
            Owrt::OneWayMayNotBeDoubled,
        ] {
            assert!(owrt_code_permits(SITA_OWRT_ADDON_5, owrt));
        }
    }

    #[test]
    fn owrt_codes_one_through_three_are_like_for_like() {
        assert!(owrt_code_permits(1, Owrt::OneWayMayBeDoubled));
        assert!(!owrt_code_permits(1, Owrt::RoundTripMayNotBeHalved));
        assert!(owrt_code_permits(2, Owrt::RoundTripMayNotBeHalved));
        assert!(!owrt_code_permits(2, Owrt::OneWayMayNotBeDoubled));
        assert!(owrt_code_permits(3, Owrt::OneWayMayNotBeDoubled));
        assert!(!owrt_code_permits(3, Owrt::OneWayMayBeDoubled));
    }

    #[test]
    fn owrt_code_four_covers_both_one_way_codes() {
        assert!(owrt_code_permits(4, Owrt::OneWayMayBeDoubled));
        assert!(owrt_code_permits(4, Owrt::OneWayMayNotBeDoubled));
        assert!(!owrt_code_permits(4, Owrt::RoundTripMayNotBeHalved));
    }

    #[test]
    fn tariff_family_groups_substitute() {
        assert!(tariff_family_matches('A', 'A'));
        assert!(tariff_family_matches('1', 'B'));
        assert!(!tariff_family_matches('1', 'D'));
        assert!(!tariff_family_matches('B', 'A'));
    }

    #[test]
    fn include_and_exclude_sets() {
        // Include set: value must be listed.
        assert!(in_scope(Some(&'A'), &['A', 'B'], false));
        assert!(!in_scope(Some(&'C'), &['A', 'B'], false));
        // Exclude set: value must not be listed.
        assert!(!in_scope(Some(&'A'), &['A', 'B'], true));
        assert!(in_scope(Some(&'C'), &['A', 'B'], true));
        // Empty set restricts nothing.
        assert!(in_scope(Some(&'A'), &[], false));
        assert!(in_scope(None::<&char>, &[], false));
    }
}
