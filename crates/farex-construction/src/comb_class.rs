use crate::cortege::{AddonFareCortege, GenericAddonClass};
use chrono::NaiveDate;
use farex_core::{
    AddonCombFareClassInfo, CarrierCode, DataSource, DateInterval, FareInfo, FareMatchCode, Result,
    TariffNumber, VendorCode,
};
use std::collections::HashMap;
use tracing::debug;

/// Fare-class combination map, scoped to one specified-fare tariff at
/// a time. Regular add-on classes match exactly; generic classes go
/// through the (specified class, generic class) table. Historical jobs
/// see every record; current lookups only records effective at the
/// retrieval date.
#[derive(Debug)]
pub struct CombFareClassMap {
    vendor: VendorCode,
    carrier: CarrierCode,
    as_of: NaiveDate,
    tariff: Option<TariffNumber>,
    current: Vec<AddonCombFareClassInfo>,
    historical: Vec<AddonCombFareClassInfo>,
    loaded: HashMap<TariffNumber, Vec<AddonCombFareClassInfo>>,
}

impl CombFareClassMap {
    pub fn new(vendor: impl Into<VendorCode>, carrier: impl Into<CarrierCode>, as_of: NaiveDate) -> Self {
        Self {
            vendor: vendor.into(),
            carrier: carrier.into(),
            as_of,
            tariff: None,
            current: Vec::new(),
            historical: Vec::new(),
            loaded: HashMap::new(),
        }
    }

    /// Scope the map to one fare tariff, loading its records on first
    /// use.
    pub fn set_tariff(&mut self, data: &dyn DataSource, tariff: TariffNumber) -> Result<()> {
        if self.tariff == Some(tariff) {
            return Ok(());
        }
        if !self.loaded.contains_key(&tariff) {
            let records =
                data.get_add_on_comb_fare_class(&self.vendor, tariff, &self.carrier, self.as_of)?;
            debug!(tariff, count = records.len(), "loaded fare-class combination records");
            self.loaded.insert(tariff, records);
        }
        let records = &self.loaded[&tariff];
        self.historical = records.clone();
        self.current = records
            .iter()
            .filter(|r| r.interval.contains(self.as_of))
            .cloned()
            .collect();
        self.tariff = Some(tariff);
        Ok(())
    }

    /// Match one add-on cortege against the scoped tariff's table for
    /// a specified fare. `geo_appl` is the vendor's geographic
    /// application indicator.
    pub fn match_fare_classes(
        &self,
        specified: &FareInfo,
        cortege: &AddonFareCortege,
        geo_appl: char,
        historical: bool,
    ) -> (FareMatchCode, Option<DateInterval>) {
        if cortege.generic_class == GenericAddonClass::Regular {
            return if cortege.addon_fare.fare_class == specified.fare_class {
                (FareMatchCode::GoodMatch, None)
            } else {
                (FareMatchCode::CombFareClass, None)
            };
        }

        let Some(table_char) = GenericAddonClass::table_char(&cortege.addon_fare.fare_class) else {
            return (FareMatchCode::CombFareClass, None);
        };

        let owrt = specified.owrt.normalized_for_comb();
        let records = if historical { &self.historical } else { &self.current };

        for rec in records {
            if rec.addon_fare_class == table_char
                && rec.specified_fare_class == specified.fare_class
                && rec.owrt == owrt
                && (rec.geo_appl == geo_appl || rec.geo_appl == ' ')
            {
                return (FareMatchCode::GoodMatch, Some(rec.interval));
            }
        }
        (FareMatchCode::CombFareClass, None)
    }
}
