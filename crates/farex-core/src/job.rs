use crate::config::ConstructionConfig;
use crate::datasource::DataSource;
use crate::diag::{DiagnosticCollector, DiagnosticKind};
use crate::error::Result;
use crate::spec_cache::SpecifiedFareCache;
use crate::types::*;
use chrono::NaiveDate;
use std::sync::Arc;

/// Everything one construction run needs from the surrounding pricing
/// transaction: market and date context, the data handle, an optional
/// diagnostic collector, and the shared specified-fare cache.
#[derive(Clone)]
pub struct ConstructionJob {
    pub vendor_code: VendorCode,
    pub carrier: CarrierCode,
    pub origin: LocCode,
    pub destination: LocCode,
    pub board_multi_city: LocCode,
    pub off_multi_city: LocCode,
    pub origin_nation: NationCode,
    pub destination_nation: NationCode,
    pub global_direction: GlobalDirection,
    pub travel_date: NaiveDate,
    pub ticketing_date: NaiveDate,
    pub is_historical: bool,
    pub is_rtw: bool,
    pub single_over_double: bool,
    pub config: ConstructionConfig,
    pub data: Arc<dyn DataSource>,
    pub diagnostics: Option<Arc<DiagnosticCollector>>,
    pub specified_cache: Arc<SpecifiedFareCache>,
}

impl std::fmt::Debug for ConstructionJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructionJob")
            .field("vendor_code", &self.vendor_code)
            .field("carrier", &self.carrier)
            .field("origin", &self.origin)
            .field("destination", &self.destination)
            .field("travel_date", &self.travel_date)
            .field("is_historical", &self.is_historical)
            .finish_non_exhaustive()
    }
}

impl ConstructionJob {
    /// Build a job, resolving both markets through the data source.
    /// An unresolved location aborts the job here.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        vendor_code: impl Into<VendorCode>,
        carrier: impl Into<CarrierCode>,
        origin: &str,
        destination: &str,
        global_direction: GlobalDirection,
        travel_date: NaiveDate,
        ticketing_date: NaiveDate,
        data: Arc<dyn DataSource>,
        specified_cache: Arc<SpecifiedFareCache>,
    ) -> Result<Self> {
        let orig = data.get_location(origin)?;
        let dest = data.get_location(destination)?;
        let is_historical = data.is_historical();
        Ok(Self {
            vendor_code: vendor_code.into(),
            carrier: carrier.into(),
            origin: orig.loc,
            destination: dest.loc,
            board_multi_city: orig.multi_city,
            off_multi_city: dest.multi_city,
            origin_nation: orig.nation,
            destination_nation: dest.nation,
            global_direction,
            travel_date,
            ticketing_date,
            is_historical,
            is_rtw: false,
            single_over_double: false,
            config: ConstructionConfig::default(),
            data,
            diagnostics: None,
            specified_cache,
        })
    }

    pub fn with_rtw(mut self, is_rtw: bool) -> Self {
        self.is_rtw = is_rtw;
        self
    }

    pub fn with_single_over_double(mut self, prefer: bool) -> Self {
        self.single_over_double = prefer;
        self
    }

    pub fn with_config(mut self, config: ConstructionConfig) -> Self {
        self.single_over_double = config.prefer_single_over_double;
        self.config = config;
        self
    }

    pub fn with_diagnostics(mut self, diag: Arc<DiagnosticCollector>) -> Self {
        self.diagnostics = Some(diag);
        self
    }

    pub fn is_sita(&self) -> bool {
        self.vendor_code == SITA_VENDOR_CODE
    }

    pub fn is_smf(&self) -> bool {
        self.vendor_code == SMF_VENDOR_CODE
    }

    pub fn construction_point(&self, cp: ConstructionPoint) -> &LocCode {
        match cp {
            ConstructionPoint::Origin => &self.origin,
            ConstructionPoint::Destination => &self.destination,
        }
    }

    pub fn multi_city(&self, cp: ConstructionPoint) -> &LocCode {
        match cp {
            ConstructionPoint::Origin => &self.board_multi_city,
            ConstructionPoint::Destination => &self.off_multi_city,
        }
    }

    pub fn nation(&self, cp: ConstructionPoint) -> &NationCode {
        match cp {
            ConstructionPoint::Origin => &self.origin_nation,
            ConstructionPoint::Destination => &self.destination_nation,
        }
    }

    /// Reference-data retrieval date.
    pub fn as_of_date(&self) -> NaiveDate {
        self.ticketing_date
    }

    pub fn diag<F>(&self, kind: DiagnosticKind, line: F)
    where
        F: FnOnce() -> String,
    {
        if let Some(diag) = &self.diagnostics {
            diag.record(kind, line);
        }
    }
}
