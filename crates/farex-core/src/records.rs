use crate::interval::DateInterval;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Resolved location: principal code, multi-city alias and nation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub loc: LocCode,
    pub multi_city: LocCode,
    pub nation: NationCode,
}

/// SITA-only fare attributes. Optional on both fare records so the
/// ATPCO/SMF paths carry no dead fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitaFareFields {
    /// Add-on OWRT code (1-5), each permitting a fixed set of
    /// specified OWRT indicators.
    pub addon_owrt_code: Option<u8>,
    pub route_code: Option<String>,
    pub tariff_family: Option<char>,
    pub base_fare_routing: Option<RoutingNumber>,
    pub base_mpm: Option<u32>,
    /// DBE class carried by the add-on for fare-basis indirection.
    pub dbe_class: Option<String>,
    /// When set, the add-on matches through the global-class table
    /// instead of an exact fare basis.
    pub global_class_flag: bool,
    pub fare_quality: Option<char>,
    /// Fare-quality codes an add-on accepts on the specified fare;
    /// `fare_quality_excl` flips the set from include to exclude.
    pub fare_quality_codes: Vec<char>,
    pub fare_quality_excl: bool,
    /// Rule numbers an add-on accepts on the specified fare;
    /// `rules_excl` flips the set.
    pub rules: Vec<RuleNumber>,
    pub rules_excl: bool,
    /// Through-fare fields that double-ended construction must agree
    /// on across both add-ons.
    pub through_rule: Option<RuleNumber>,
    pub through_mpm: Option<u32>,
    pub through_routing: Option<RoutingNumber>,
}

/// One raw add-on fare as retrieved from the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonFareInfo {
    pub vendor: VendorCode,
    pub carrier: CarrierCode,
    pub interior_market: LocCode,
    pub gateway_market: LocCode,
    pub addon_tariff: TariffNumber,
    pub fare_class: FareClassCode,
    pub owrt: Owrt,
    pub routing: RoutingNumber,
    pub arb_zone: AddonZone,
    pub currency: CurrencyCode,
    pub amount: Amount,
    pub footnote1: Option<String>,
    pub footnote2: Option<String>,
    pub interval: DateInterval,
    pub sita: Option<SitaFareFields>,
}

impl AddonFareInfo {
    /// TO/FROM directional footnote, when one is present.
    pub fn directional_footnote(&self) -> DirectionalFootnote {
        for fn_ in [&self.footnote1, &self.footnote2].into_iter().flatten() {
            match fn_.as_str() {
                "T" => return DirectionalFootnote::To,
                "F" => return DirectionalFootnote::From,
                _ => {}
            }
        }
        DirectionalFootnote::None
    }

    /// Non-directional footnotes, paired with the add-on tariff.
    pub fn plain_footnotes(&self) -> impl Iterator<Item = &str> {
        [&self.footnote1, &self.footnote2]
            .into_iter()
            .flatten()
            .map(|s| s.as_str())
            .filter(|s| *s != "T" && *s != "F")
    }
}

/// One published (specified) fare between two gateways.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareInfo {
    pub vendor: VendorCode,
    pub carrier: CarrierCode,
    pub market1: LocCode,
    pub market2: LocCode,
    pub fare_class: FareClassCode,
    pub fare_tariff: TariffNumber,
    pub owrt: Owrt,
    pub routing: RoutingNumber,
    pub rule_number: RuleNumber,
    pub currency: CurrencyCode,
    pub amount: Amount,
    pub directionality: Directionality,
    pub global_direction: GlobalDirection,
    pub footnote1: Option<String>,
    pub footnote2: Option<String>,
    /// 'N' marks SITA/SMF fares not eligible for construction.
    pub construction_ind: char,
    pub interval: DateInterval,
    pub sita: Option<SitaFareFields>,
}

impl FareInfo {
    pub fn plain_footnotes(&self) -> impl Iterator<Item = &str> {
        [&self.footnote1, &self.footnote2]
            .into_iter()
            .flatten()
            .map(|s| s.as_str())
    }
}

/// Zone membership record: one included or excluded location per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonZoneInfo {
    pub vendor: VendorCode,
    pub carrier: CarrierCode,
    pub zone: AddonZone,
    pub inclusive: bool,
    pub loc_kind: ZoneLocKind,
    pub loc_code: String,
    pub interval: DateInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneLocKind {
    City,
    Nation,
}

/// Tariff cross-reference row: which add-on tariffs combine with a
/// fare tariff, in which global direction, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffCrossRefInfo {
    pub vendor: VendorCode,
    pub carrier: CarrierCode,
    pub cross_ref_type: RecordScope,
    pub global_direction: GlobalDirection,
    pub fare_tariff: TariffNumber,
    pub fare_tariff_code: String,
    pub tariff_cat: i32,
    pub rule_tariff: TariffNumber,
    pub governing_tariff: TariffNumber,
    pub routing_tariff: TariffNumber,
    /// -1 means "no add-on tariff in this slot".
    pub addon_tariff1: TariffNumber,
    pub addon_tariff2: TariffNumber,
    pub interval: DateInterval,
}

impl TariffCrossRefInfo {
    pub fn lists_addon_tariff(&self, tariff: TariffNumber) -> bool {
        tariff >= 0 && (self.addon_tariff1 == tariff || self.addon_tariff2 == tariff)
    }
}

/// Fare-class combination row: for one fare tariff, which generic
/// add-on class combines with which specified fare class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonCombFareClassInfo {
    pub vendor: VendorCode,
    pub fare_tariff: TariffNumber,
    pub carrier: CarrierCode,
    /// Generic add-on class character ('*' for six-star, the alpha
    /// letter for alpha-five-star classes).
    pub addon_fare_class: char,
    pub geo_appl: char,
    pub owrt: Owrt,
    pub specified_fare_class: FareClassCode,
    pub interval: DateInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConstructionType {
    SingleOrigin,
    SingleDestination,
    DoubleEnded,
}

/// Finished, response-ready constructed fare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructedFareInfo {
    pub construction_type: ConstructionType,
    pub gateway1: LocCode,
    pub gateway2: LocCode,
    pub market1: LocCode,
    pub market2: LocCode,
    pub specified: FareInfo,
    pub origin_addon: Option<AddonFareInfo>,
    pub dest_addon: Option<AddonFareInfo>,
    pub constructed_amount: Amount,
    pub interval: DateInterval,
    pub fare_display_only: bool,
    pub pricing_only: bool,
}

impl ConstructedFareInfo {
    pub fn is_double_ended(&self) -> bool {
        self.construction_type == ConstructionType::DoubleEnded
    }

    /// Originating gateway identity, used for reconstruction
    /// carry-over. Matches either orientation.
    pub fn produced_by(&self, gateway1: &str, gateway2: &str) -> bool {
        (self.gateway1 == gateway1 && self.gateway2 == gateway2)
            || (self.gateway1 == gateway2 && self.gateway2 == gateway1)
    }
}
