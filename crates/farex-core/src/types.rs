use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type LocCode = String;
pub type CarrierCode = String;
pub type VendorCode = String;
pub type FareClassCode = String;
pub type CurrencyCode = String;
pub type RuleNumber = String;
pub type RoutingNumber = String;
pub type NationCode = String;
pub type TariffNumber = i32;
pub type AddonZone = i32;
pub type Amount = f64;

pub const ATPCO_VENDOR_CODE: &str = "ATP";
pub const SITA_VENDOR_CODE: &str = "SITA";
pub const SMF_VENDOR_CODE: &str = "SMF";

/// The two ends of a construction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstructionPoint {
    Origin,
    Destination,
}

impl ConstructionPoint {
    pub fn opposite(self) -> Self {
        match self {
            ConstructionPoint::Origin => ConstructionPoint::Destination,
            ConstructionPoint::Destination => ConstructionPoint::Origin,
        }
    }
}

/// One-way/round-trip fare-halving indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owrt {
    OneWayMayBeDoubled,
    RoundTripMayNotBeHalved,
    OneWayMayNotBeDoubled,
}

impl Owrt {
    pub fn from_indicator(c: char) -> Option<Self> {
        match c {
            '1' => Some(Owrt::OneWayMayBeDoubled),
            '2' => Some(Owrt::RoundTripMayNotBeHalved),
            '3' => Some(Owrt::OneWayMayNotBeDoubled),
            _ => None,
        }
    }

    pub fn indicator(self) -> char {
        match self {
            Owrt::OneWayMayBeDoubled => '1',
            Owrt::RoundTripMayNotBeHalved => '2',
            Owrt::OneWayMayNotBeDoubled => '3',
        }
    }

    /// Combination-table lookups treat "one-way may not be doubled"
    /// the same as "one-way may be doubled".
    pub fn normalized_for_comb(self) -> Self {
        match self {
            Owrt::OneWayMayNotBeDoubled => Owrt::OneWayMayBeDoubled,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalDirection {
    At,
    Pa,
    Wh,
    Eh,
    Ap,
    Pn,
    Rw,
    Ct,
    Zz,
}

impl Default for GlobalDirection {
    fn default() -> Self {
        GlobalDirection::Zz
    }
}

impl fmt::Display for GlobalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GlobalDirection::At => "AT",
            GlobalDirection::Pa => "PA",
            GlobalDirection::Wh => "WH",
            GlobalDirection::Eh => "EH",
            GlobalDirection::Ap => "AP",
            GlobalDirection::Pn => "PN",
            GlobalDirection::Rw => "RW",
            GlobalDirection::Ct => "CT",
            GlobalDirection::Zz => "ZZ",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for GlobalDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AT" => Ok(GlobalDirection::At),
            "PA" => Ok(GlobalDirection::Pa),
            "WH" => Ok(GlobalDirection::Wh),
            "EH" => Ok(GlobalDirection::Eh),
            "AP" => Ok(GlobalDirection::Ap),
            "PN" => Ok(GlobalDirection::Pn),
            "RW" => Ok(GlobalDirection::Rw),
            "CT" => Ok(GlobalDirection::Ct),
            "ZZ" => Ok(GlobalDirection::Zz),
            other => Err(format!("unknown global direction: {}", other)),
        }
    }
}

/// Published-fare directionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Directionality {
    Both,
    From,
    To,
}

impl Default for Directionality {
    fn default() -> Self {
        Directionality::Both
    }
}

/// Directional footnote carried by an add-on fare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectionalFootnote {
    None,
    To,
    From,
}

impl Default for DirectionalFootnote {
    fn default() -> Self {
        DirectionalFootnote::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordScope {
    Domestic,
    International,
}

/// Outcome of validating an add-on fare's zone against the opposite
/// construction point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneStatus {
    Pass,
    Fail,
    /// Self-referencing add-on (gateway coincides with a construction
    /// point or its own interior market). Always rejected before zone
    /// evaluation.
    Unacceptable,
}

/// Closed set of per-combination match outcomes. Everything except
/// `GoodMatch` excludes one (add-on x specified) combination and is
/// surfaced only through diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FareMatchCode {
    GoodMatch,
    DateIntervalMismatch,
    TariffXrefNotFound,
    CombFareClass,
    DirectionalFootnote,
    OwrtMismatch,
    RoutingMismatch,
    RouteCodeMismatch,
    TariffFamilyMismatch,
    FareQualityMismatch,
    RuleMismatch,
    FareBasisMismatch,
    GlobalClassMismatch,
    GlobalDirectionMismatch,
}

impl FareMatchCode {
    pub fn is_good(self) -> bool {
        self == FareMatchCode::GoodMatch
    }
}
