use farex_core::{
    DataSource, DateInterval, FareMatchCode, GlobalDirection, RecordScope, Result, TariffCrossRefInfo,
    TariffNumber,
};
use std::collections::HashMap;
use tracing::debug;

/// Tariff cross-reference map for one (vendor, carrier, scope):
/// which add-on tariffs combine with which fare tariffs, and when.
#[derive(Debug, Default)]
pub struct TrfXrefMap {
    by_fare_tariff: HashMap<TariffNumber, Vec<TariffCrossRefInfo>>,
    records: Vec<TariffCrossRefInfo>,
}

impl TrfXrefMap {
    pub fn load(
        data: &dyn DataSource,
        vendor: &str,
        carrier: &str,
        scope: RecordScope,
    ) -> Result<Self> {
        let records = data.get_tariff_x_ref(vendor, carrier, scope)?;
        debug!(vendor, carrier, count = records.len(), "loaded tariff cross-reference");
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<TariffCrossRefInfo>) -> Self {
        let mut by_fare_tariff: HashMap<TariffNumber, Vec<TariffCrossRefInfo>> = HashMap::new();
        for rec in &records {
            by_fare_tariff
                .entry(rec.fare_tariff)
                .or_default()
                .push(rec.clone());
        }
        Self {
            by_fare_tariff,
            records,
        }
    }

    /// Can `addon_tariff` combine with `fare_tariff`? On success
    /// returns the validity windows of every allowing record.
    pub fn match_fare_and_addon_tariff(
        &self,
        fare_tariff: TariffNumber,
        addon_tariff: TariffNumber,
        historical: bool,
    ) -> (FareMatchCode, Vec<DateInterval>) {
        let _ = historical;
        let intervals: Vec<DateInterval> = self
            .by_fare_tariff
            .get(&fare_tariff)
            .map(|recs| {
                recs.iter()
                    .filter(|r| r.lists_addon_tariff(addon_tariff))
                    .map(|r| r.interval)
                    .collect()
            })
            .unwrap_or_default();

        if intervals.is_empty() {
            (FareMatchCode::TariffXrefNotFound, intervals)
        } else {
            (FareMatchCode::GoodMatch, intervals)
        }
    }

    /// Are two add-on tariffs combinable for double-ended
    /// construction? Equal tariffs always combine; otherwise both
    /// must be listed by one cross-reference record.
    pub fn match_addon_tariffs(&self, t1: TariffNumber, t2: TariffNumber) -> bool {
        if t1 == t2 {
            return true;
        }
        self.records
            .iter()
            .any(|r| r.lists_addon_tariff(t1) && r.lists_addon_tariff(t2))
    }

    /// Is this add-on tariff published for the given global direction?
    pub fn is_global_dir_valid(&self, addon_tariff: TariffNumber, gd: GlobalDirection) -> bool {
        self.records.iter().any(|r| {
            r.lists_addon_tariff(addon_tariff)
                && (r.global_direction == gd || r.global_direction == GlobalDirection::Zz)
        })
    }
}
