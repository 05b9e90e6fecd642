use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;

use farex_cache::{CacheKey, ConstructedCacheBundle, ConstructionCache, FlushKey, FlushKind};
use farex_core::{
    AddonCombFareClassInfo, AddonFareInfo, AddonZone, AddonZoneInfo, ConstructionJob,
    ConstructionType, DataSource, DateInterval, Directionality, FareInfo, GlobalDirection,
    LocationInfo, Owrt, RecordScope, Result, SpecifiedFareCache, TariffCrossRefInfo, TariffNumber,
    ZoneLocKind,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn wide() -> DateInterval {
    DateInterval::effective(d(2024, 1, 1), d(2026, 12, 31))
}

/// MAN(GB)-TUL(US) with one origin gateway (LON) and one destination
/// gateway (NYC); three gateway pairs, three constructed fares. Extra
/// add-ons can be injected to simulate an upstream data change.
struct Fixture {
    locations: HashMap<String, LocationInfo>,
    addons: HashMap<String, Vec<AddonFareInfo>>,
    extra_addons: RwLock<Vec<AddonFareInfo>>,
    zones: HashMap<AddonZone, Vec<AddonZoneInfo>>,
    xrefs: Vec<TariffCrossRefInfo>,
    comb: Vec<AddonCombFareClassInfo>,
    fares: HashMap<(String, String), Vec<FareInfo>>,
}

fn addon(interior: &str, gateway: &str, zone: AddonZone, amount: f64) -> AddonFareInfo {
    AddonFareInfo {
        vendor: "ATP".into(),
        carrier: "AA".into(),
        interior_market: interior.into(),
        gateway_market: gateway.into(),
        addon_tariff: 996,
        fare_class: "******".into(),
        owrt: Owrt::OneWayMayBeDoubled,
        routing: "0000".into(),
        arb_zone: zone,
        currency: "GBP".into(),
        amount,
        footnote1: None,
        footnote2: None,
        interval: wide(),
        sita: None,
    }
}

impl Fixture {
    fn new() -> Self {
        let mut locations = HashMap::new();
        for (loc, nation) in [("MAN", "GB"), ("LON", "GB"), ("TUL", "US"), ("NYC", "US")] {
            locations.insert(
                loc.to_owned(),
                LocationInfo {
                    loc: loc.to_owned(),
                    multi_city: loc.to_owned(),
                    nation: nation.to_owned(),
                },
            );
        }

        let mut addons: HashMap<String, Vec<AddonFareInfo>> = HashMap::new();
        addons.insert("MAN".into(), vec![addon("MAN", "LON", 105, 40.0)]);
        addons.insert("TUL".into(), vec![addon("TUL", "NYC", 205, 30.0)]);

        let mut zones: HashMap<AddonZone, Vec<AddonZoneInfo>> = HashMap::new();
        for (zone, nation) in [(105, "US"), (205, "GB")] {
            zones.insert(
                zone,
                vec![AddonZoneInfo {
                    vendor: "ATP".into(),
                    carrier: "AA".into(),
                    zone,
                    inclusive: true,
                    loc_kind: ZoneLocKind::Nation,
                    loc_code: nation.into(),
                    interval: wide(),
                }],
            );
        }

        let xrefs = vec![TariffCrossRefInfo {
            vendor: "ATP".into(),
            carrier: "AA".into(),
            cross_ref_type: RecordScope::International,
            global_direction: GlobalDirection::At,
            fare_tariff: 307,
            fare_tariff_code: "T307".into(),
            tariff_cat: 0,
            rule_tariff: 307,
            governing_tariff: -1,
            routing_tariff: 307,
            addon_tariff1: 996,
            addon_tariff2: -1,
            interval: wide(),
        }];

        let comb = vec![AddonCombFareClassInfo {
            vendor: "ATP".into(),
            fare_tariff: 307,
            carrier: "AA".into(),
            addon_fare_class: '*',
            geo_appl: ' ',
            owrt: Owrt::OneWayMayBeDoubled,
            specified_fare_class: "Y".into(),
            interval: wide(),
        }];

        let mut fares: HashMap<(String, String), Vec<FareInfo>> = HashMap::new();
        for (m1, m2, rule, amount) in [
            ("LON", "TUL", "2000", 500.0),
            ("MAN", "NYC", "2001", 480.0),
            ("LON", "NYC", "2002", 450.0),
        ] {
            fares.insert(
                (m1.to_owned(), m2.to_owned()),
                vec![FareInfo {
                    vendor: "ATP".into(),
                    carrier: "AA".into(),
                    market1: m1.into(),
                    market2: m2.into(),
                    fare_class: "Y".into(),
                    fare_tariff: 307,
                    owrt: Owrt::OneWayMayBeDoubled,
                    routing: "0000".into(),
                    rule_number: rule.into(),
                    currency: "GBP".into(),
                    amount,
                    directionality: Directionality::Both,
                    global_direction: GlobalDirection::At,
                    footnote1: None,
                    footnote2: None,
                    construction_ind: ' ',
                    interval: wide(),
                    sita: None,
                }],
            );
        }

        Self {
            locations,
            addons,
            extra_addons: RwLock::new(Vec::new()),
            zones,
            xrefs,
            comb,
            fares,
        }
    }

    fn inject_addon(&self, fare: AddonFareInfo) {
        self.extra_addons.write().push(fare);
    }
}

impl DataSource for Fixture {
    fn get_add_on_fare(&self, location: &str, _: &str, _: NaiveDate) -> Result<Vec<AddonFareInfo>> {
        let mut found = self.addons.get(location).cloned().unwrap_or_default();
        found.extend(
            self.extra_addons
                .read()
                .iter()
                .filter(|a| a.interior_market == location)
                .cloned(),
        );
        Ok(found)
    }

    fn get_add_on_zone(
        &self,
        _: &str,
        _: &str,
        zone: AddonZone,
        _: NaiveDate,
    ) -> Result<Vec<AddonZoneInfo>> {
        Ok(self.zones.get(&zone).cloned().unwrap_or_default())
    }

    fn get_tariff_x_ref(&self, _: &str, _: &str, _: RecordScope) -> Result<Vec<TariffCrossRefInfo>> {
        Ok(self.xrefs.clone())
    }

    fn get_add_on_comb_fare_class(
        &self,
        _: &str,
        tariff: TariffNumber,
        _: &str,
        _: NaiveDate,
    ) -> Result<Vec<AddonCombFareClassInfo>> {
        Ok(self
            .comb
            .iter()
            .filter(|r| r.fare_tariff == tariff)
            .cloned()
            .collect())
    }

    fn get_fares_by_market_cxr(
        &self,
        market1: &str,
        market2: &str,
        _: &str,
        _: &str,
        _: NaiveDate,
    ) -> Result<Vec<FareInfo>> {
        Ok(self
            .fares
            .get(&(market1.to_owned(), market2.to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    fn get_location(&self, loc: &str) -> Result<LocationInfo> {
        self.locations
            .get(loc)
            .cloned()
            .ok_or_else(|| farex_core::FarexError::UnresolvedLocation(loc.to_owned()))
    }

    fn is_historical(&self) -> bool {
        false
    }
}

fn job_with(data: Arc<Fixture>, vendor: &str) -> ConstructionJob {
    ConstructionJob::resolve(
        vendor,
        "AA",
        "MAN",
        "TUL",
        GlobalDirection::At,
        d(2025, 6, 1),
        d(2025, 5, 1),
        data,
        Arc::new(SpecifiedFareCache::new()),
    )
    .unwrap()
}

fn addon_flush(loc1: &str, loc2: &str) -> FlushKey {
    FlushKey::new("ATP", "AA", loc1, loc2, FlushKind::AddonFlush)
}

#[test]
fn create_builds_bundle_and_registers_flush_relations() {
    let cache = ConstructionCache::new();
    let job = job_with(Arc::new(Fixture::new()), "ATP");
    let handle = cache.create(&job).unwrap().expect("vendor resolves");

    let bundle = handle.read();
    assert_eq!(bundle.gateway_pairs.len(), 3);
    assert_eq!(bundle.fares.len(), 3);

    let key = CacheKey::from_job(&job);
    assert!(cache.validate(&key));
    assert!(cache
        .flush_index()
        .bucket(&addon_flush("LON", "MAN"))
        .contains(&key));
    assert!(cache
        .flush_index()
        .bucket(&FlushKey::new("ATP", "AA", "LON", "TUL", FlushKind::SpecifiedFlush))
        .contains(&key));
}

#[test]
fn create_returns_nothing_for_unknown_vendor() {
    let cache = ConstructionCache::new();
    let job = job_with(Arc::new(Fixture::new()), "XYZ");
    assert!(cache.create(&job).unwrap().is_none());
    assert!(cache.is_empty());
}

#[test]
fn invalidate_flags_only_the_pairs_behind_the_flush_key() {
    let cache = ConstructionCache::new();
    let job = job_with(Arc::new(Fixture::new()), "ATP");
    let handle = cache.create(&job).unwrap().unwrap();
    let key = CacheKey::from_job(&job);

    // Add-on data between LON and MAN touches the single-origin pair
    // and the double-ended pair, not the single-destination one.
    let marked = cache.invalidate(&addon_flush("LON", "MAN"));
    assert_eq!(marked, 2);
    assert!(!cache.validate(&key));

    let bundle = handle.read();
    for gp in &bundle.gateway_pairs {
        let expected = gp.construction_type != ConstructionType::SingleDestination;
        assert_eq!(gp.needs_reconstruction, expected);
    }
}

#[test]
fn invalidate_of_unknown_flush_key_is_a_no_op() {
    let cache = ConstructionCache::new();
    let job = job_with(Arc::new(Fixture::new()), "ATP");
    cache.create(&job).unwrap().unwrap();
    assert_eq!(cache.invalidate(&addon_flush("FRA", "MAN")), 0);
    assert!(cache.validate(&CacheKey::from_job(&job)));
}

#[test]
fn re_create_rebuilds_flagged_pairs_and_carries_the_rest() {
    let cache = ConstructionCache::new();
    let data = Arc::new(Fixture::new());
    let job = job_with(Arc::clone(&data), "ATP");
    cache.create(&job).unwrap().unwrap();
    let key = CacheKey::from_job(&job);

    cache.invalidate(&addon_flush("LON", "MAN"));
    assert!(!cache.validate(&key));

    let handle = cache.re_create(&job).unwrap().unwrap();
    assert!(cache.validate(&key));

    let bundle = handle.read();
    assert_eq!(bundle.gateway_pairs.len(), 3);
    assert!(bundle.is_valid());
    // Same data, same three fares.
    assert_eq!(bundle.fares.len(), 3);
    let mut amounts: Vec<f64> = bundle.fares.iter().map(|f| f.constructed_amount).collect();
    amounts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(amounts, vec![510.0, 520.0, 540.0]);
}

#[test]
fn re_create_picks_up_changed_addon_data() {
    let cache = ConstructionCache::new();
    let data = Arc::new(Fixture::new());
    let job = job_with(Arc::clone(&data), "ATP");
    cache.create(&job).unwrap().unwrap();

    // A cheaper LON add-on appears upstream; the flush trigger fires.
    data.inject_addon(addon("MAN", "LON", 105, 10.0));
    cache.invalidate(&addon_flush("LON", "MAN"));

    let handle = cache.re_create(&job).unwrap().unwrap();
    let bundle = handle.read();

    let single_origin = bundle
        .fares
        .iter()
        .find(|f| f.construction_type == ConstructionType::SingleOrigin)
        .unwrap();
    assert_eq!(single_origin.constructed_amount, 510.0);

    let double = bundle
        .fares
        .iter()
        .find(|f| f.construction_type == ConstructionType::DoubleEnded)
        .unwrap();
    assert_eq!(double.constructed_amount, 490.0);

    // The untouched single-destination fare was carried over as-is.
    let carried = bundle
        .fares
        .iter()
        .find(|f| f.construction_type == ConstructionType::SingleDestination)
        .unwrap();
    assert_eq!(carried.constructed_amount, 510.0);
}

#[test]
fn bundle_round_trips_through_serde() {
    let cache = ConstructionCache::new();
    let job = job_with(Arc::new(Fixture::new()), "ATP");
    let handle = cache.create(&job).unwrap().unwrap();

    let bundle = handle.read();
    let json = serde_json::to_string(&*bundle).unwrap();
    let back: ConstructedCacheBundle = serde_json::from_str(&json).unwrap();

    assert_eq!(back.origin, "MAN");
    assert_eq!(back.destination, "TUL");
    assert_eq!(back.gateway_pairs.len(), 3);
    assert_eq!(back.fares.len(), 3);
    assert!(back.is_valid());
}

#[test]
fn destroy_removes_every_flush_reference() {
    let cache = ConstructionCache::new();
    let job = job_with(Arc::new(Fixture::new()), "ATP");
    cache.create(&job).unwrap().unwrap();
    let key = CacheKey::from_job(&job);

    cache.destroy(&key);
    assert!(cache.is_empty());
    assert!(!cache.flush_index().references(&key));
    // Single-key cache: every bucket pointed only at this key, so none
    // may survive.
    assert!(cache.flush_index().is_empty());
}

#[test]
fn destroy_spares_other_carriers_buckets() {
    let cache = ConstructionCache::new();
    let job = job_with(Arc::new(Fixture::new()), "ATP");
    cache.create(&job).unwrap().unwrap();
    let key = CacheKey::from_job(&job);

    let foreign = CacheKey {
        vendor: "ATP".into(),
        carrier: "BA".into(),
        origin: "MAN".into(),
        destination: "TUL".into(),
    };
    cache
        .flush_index()
        .insert(&foreign, &[FlushKey::new("ATP", "BA", "LON", "MAN", FlushKind::AddonFlush)]);

    cache.destroy(&key);
    assert!(cache.flush_index().references(&foreign));
}
