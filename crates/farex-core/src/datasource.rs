use crate::error::Result;
use crate::records::*;
use crate::types::*;
use chrono::NaiveDate;

/// Read-only reference-data store. Results are treated as immutable
/// for the duration of one construction job.
pub trait DataSource: Send + Sync {
    /// Add-on fares into/out of `location` for the governing carrier.
    fn get_add_on_fare(
        &self,
        location: &str,
        carrier: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<AddonFareInfo>>;

    fn get_add_on_zone(
        &self,
        vendor: &str,
        carrier: &str,
        zone: AddonZone,
        date: NaiveDate,
    ) -> Result<Vec<AddonZoneInfo>>;

    fn get_tariff_x_ref(
        &self,
        vendor: &str,
        carrier: &str,
        scope: RecordScope,
    ) -> Result<Vec<TariffCrossRefInfo>>;

    fn get_add_on_comb_fare_class(
        &self,
        vendor: &str,
        tariff: TariffNumber,
        carrier: &str,
        date: NaiveDate,
    ) -> Result<Vec<AddonCombFareClassInfo>>;

    fn get_fares_by_market_cxr(
        &self,
        market1: &str,
        market2: &str,
        carrier: &str,
        vendor: &str,
        date: NaiveDate,
    ) -> Result<Vec<FareInfo>>;

    /// Resolve a location code to its multi-city alias and nation.
    /// Failure here is a structural error and aborts the job.
    fn get_location(&self, loc: &str) -> Result<LocationInfo>;

    /// Fare classes behind a SITA DBE class.
    fn get_dbe_fare_classes(&self, vendor: &str, dbe_class: &str) -> Result<Vec<FareClassCode>> {
        let _ = (vendor, dbe_class);
        Ok(Vec::new())
    }

    fn is_historical(&self) -> bool;
}

/// Two locations form an international market when their nations
/// differ.
pub fn is_international(a: &LocationInfo, b: &LocationInfo) -> bool {
    a.nation != b.nation
}
