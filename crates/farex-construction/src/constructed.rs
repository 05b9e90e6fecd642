use crate::cortege::AddonFareCortege;
use farex_core::{
    Amount, ConstructedFareInfo, ConstructionType, DateInterval, FareInfo, LocCode,
};

/// Constructed-fare candidate while a gateway pair is matching. It
/// becomes a `ConstructedFareInfo` only if it survives the final match
/// and interval intersection.
#[derive(Debug, Clone)]
pub struct ConstructedFare {
    pub specified: FareInfo,
    /// The specified fare was matched in reversed orientation
    /// (its market1 is the far gateway).
    pub opposite_specified: bool,
    pub gateway1: LocCode,
    pub gateway2: LocCode,
    pub origin_addon: Option<AddonFareCortege>,
    pub dest_addon: Option<AddonFareCortege>,
    pub origin_interval: Option<DateInterval>,
    pub dest_interval: Option<DateInterval>,
    pub fare_display_only: bool,
    pub pricing_only: bool,
    valid: bool,
}

impl ConstructedFare {
    pub fn new(
        specified: FareInfo,
        gateway1: impl Into<LocCode>,
        gateway2: impl Into<LocCode>,
        opposite_specified: bool,
    ) -> Self {
        Self {
            specified,
            opposite_specified,
            gateway1: gateway1.into(),
            gateway2: gateway2.into(),
            origin_addon: None,
            dest_addon: None,
            origin_interval: None,
            dest_interval: None,
            fare_display_only: false,
            pricing_only: false,
            valid: true,
        }
    }

    pub fn set_addon(&mut self, cortege: AddonFareCortege, is_origin: bool, interval: DateInterval) {
        if is_origin {
            self.origin_addon = Some(cortege);
            self.origin_interval = Some(interval);
        } else {
            self.dest_addon = Some(cortege);
            self.dest_interval = Some(interval);
        }
    }

    pub fn construction_type(&self) -> ConstructionType {
        match (&self.origin_addon, &self.dest_addon) {
            (Some(_), Some(_)) => ConstructionType::DoubleEnded,
            (Some(_), None) => ConstructionType::SingleOrigin,
            _ => ConstructionType::SingleDestination,
        }
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Shape validity: a double-ended fare needs both add-ons, any
    /// other shape at least one.
    pub fn is_valid(&self) -> bool {
        self.valid && (self.origin_addon.is_some() || self.dest_addon.is_some())
    }

    /// Combined validity interval: intersection of every contributing
    /// side. `None` when the sides do not overlap.
    pub fn combined_interval(&self) -> Option<DateInterval> {
        match (&self.origin_interval, &self.dest_interval) {
            (Some(o), Some(d)) => o.intersect(d),
            (Some(o), None) => Some(*o),
            (None, Some(d)) => Some(*d),
            (None, None) => None,
        }
    }

    pub fn constructed_amount(&self) -> Amount {
        self.specified.amount
            + self.origin_addon.as_ref().map_or(0.0, |a| a.addon_fare.amount)
            + self.dest_addon.as_ref().map_or(0.0, |a| a.addon_fare.amount)
    }

    /// Finalize into a response-ready record. The constructed markets
    /// run interior-to-interior: an add-on side contributes its
    /// interior market, a bare gateway side its gateway.
    pub fn to_info(&self) -> Option<ConstructedFareInfo> {
        if !self.is_valid() {
            return None;
        }
        let interval = self.combined_interval()?;

        let market1 = self
            .origin_addon
            .as_ref()
            .map(|a| a.addon_fare.interior_market.clone())
            .unwrap_or_else(|| self.gateway1.clone());
        let market2 = self
            .dest_addon
            .as_ref()
            .map(|a| a.addon_fare.interior_market.clone())
            .unwrap_or_else(|| self.gateway2.clone());

        Some(ConstructedFareInfo {
            construction_type: self.construction_type(),
            gateway1: self.gateway1.clone(),
            gateway2: self.gateway2.clone(),
            market1,
            market2,
            specified: self.specified.clone(),
            origin_addon: self.origin_addon.as_ref().map(|a| a.addon_fare.clone()),
            dest_addon: self.dest_addon.as_ref().map(|a| a.addon_fare.clone()),
            constructed_amount: self.constructed_amount(),
            interval,
            fare_display_only: self.fare_display_only,
            pricing_only: self.pricing_only,
        })
    }
}
