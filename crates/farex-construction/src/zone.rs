use farex_core::{
    AddonFareInfo, ConstructionJob, ConstructionPoint, DateInterval, DiagnosticKind,
    DirectionalFootnote, Owrt, Result, ZoneLocKind, ZoneStatus,
};
use tracing::debug;

/// Routing wildcard an add-on must publish to participate in
/// round-the-world construction.
const RTW_ROUTING: &str = "4444";

/// Check the add-on's arbitrary zone against the opposite construction
/// point. Pass yields one valid interval per covering inclusive zone
/// record, each already intersected with the fare's own range.
pub fn validate_zones(
    job: &ConstructionJob,
    addon: &AddonFareInfo,
    opposite: ConstructionPoint,
) -> Result<(ZoneStatus, Vec<DateInterval>)> {
    let records = job.data.get_add_on_zone(
        &addon.vendor,
        &addon.carrier,
        addon.arb_zone,
        job.as_of_date(),
    )?;

    let loc = job.construction_point(opposite);
    let multi_city = job.multi_city(opposite);
    let nation = job.nation(opposite);

    let covers = |rec: &farex_core::AddonZoneInfo| match rec.loc_kind {
        ZoneLocKind::City => rec.loc_code == *loc || rec.loc_code == *multi_city,
        ZoneLocKind::Nation => rec.loc_code == *nation,
    };

    if records.iter().any(|r| !r.inclusive && covers(r)) {
        job.diag(DiagnosticKind::ZoneValidation, || {
            format!(
                "ZONE {} EXCLUDES {} FOR {}-{}",
                addon.arb_zone, loc, addon.gateway_market, addon.interior_market
            )
        });
        return Ok((ZoneStatus::Fail, Vec::new()));
    }

    let mut intervals: Vec<DateInterval> = Vec::new();
    for rec in records.iter().filter(|r| r.inclusive && covers(r)) {
        let narrowed = if job.is_historical {
            rec.interval.intersect_historical(&addon.interval)
        } else {
            rec.interval.intersect(&addon.interval)
        };
        if let Some(iv) = narrowed {
            intervals.push(iv);
        }
    }

    if intervals.is_empty() {
        debug!(
            zone = addon.arb_zone,
            gateway = %addon.gateway_market,
            "no zone record covers the opposite construction point"
        );
        Ok((ZoneStatus::Fail, Vec::new()))
    } else {
        Ok((ZoneStatus::Pass, intervals))
    }
}

/// Round-the-world applicability: only zero-zone, round-trip
/// may-not-be-halved add-ons with the RTW routing wildcard and no
/// directional footnote take part.
pub fn rtw_applicability(addon: &AddonFareInfo) -> ZoneStatus {
    if addon.owrt != Owrt::RoundTripMayNotBeHalved {
        return ZoneStatus::Unacceptable;
    }
    if addon.directional_footnote() != DirectionalFootnote::None {
        return ZoneStatus::Unacceptable;
    }
    if addon.routing != RTW_ROUTING {
        return ZoneStatus::Unacceptable;
    }
    if addon.arb_zone != 0 {
        return ZoneStatus::Fail;
    }
    ZoneStatus::Pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use farex_core::DateInterval;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rtw_addon() -> AddonFareInfo {
        AddonFareInfo {
            vendor: "ATP".into(),
            carrier: "AA".into(),
            interior_market: "MAN".into(),
            gateway_market: "LON".into(),
            addon_tariff: 996,
            fare_class: "Y*****".into(),
            owrt: Owrt::RoundTripMayNotBeHalved,
            routing: RTW_ROUTING.into(),
            arb_zone: 0,
            currency: "GBP".into(),
            amount: 40.0,
            footnote1: None,
            footnote2: None,
            interval: DateInterval::effective(d(2024, 1, 1), d(2026, 1, 1)),
            sita: None,
        }
    }

    #[test]
    fn rtw_applicability_matches_the_legacy_rules() {
        let mut addon = rtw_addon();
        assert_eq!(rtw_applicability(&addon), ZoneStatus::Pass);

        addon.owrt = Owrt::OneWayMayBeDoubled;
        assert_eq!(rtw_applicability(&addon), ZoneStatus::Unacceptable);

        addon.owrt = Owrt::RoundTripMayNotBeHalved;
        addon.footnote2 = Some("T".into());
        assert_eq!(rtw_applicability(&addon), ZoneStatus::Unacceptable);

        addon.footnote2 = None;
        addon.routing = "2344".into();
        assert_eq!(rtw_applicability(&addon), ZoneStatus::Unacceptable);

        addon.routing = RTW_ROUTING.into();
        addon.arb_zone = 5;
        assert_eq!(rtw_applicability(&addon), ZoneStatus::Fail);
    }
}
