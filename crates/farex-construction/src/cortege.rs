use farex_core::{AddonFareInfo, DateInterval, DirectionalFootnote};
use serde::{Deserialize, Serialize};

/// Generic-class tier of an add-on fare class. The order doubles as a
/// combinability/tie-break score: REGULAR > ALPHA_FIVE_STAR > SIX_STAR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GenericAddonClass {
    SixStar,
    AlphaFiveStar,
    Regular,
}

impl GenericAddonClass {
    /// "******" is six-star, a single letter followed by "*****" is
    /// alpha-five-star, anything else is a regular class.
    pub fn classify(fare_class: &str) -> Self {
        if fare_class == "******" {
            GenericAddonClass::SixStar
        } else if fare_class.len() == 6
            && fare_class[1..] == *"*****"
            && fare_class.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        {
            GenericAddonClass::AlphaFiveStar
        } else {
            GenericAddonClass::Regular
        }
    }

    pub fn priority(self) -> u8 {
        match self {
            GenericAddonClass::Regular => 3,
            GenericAddonClass::AlphaFiveStar => 2,
            GenericAddonClass::SixStar => 1,
        }
    }

    /// Combination-table key character for generic classes; regular
    /// classes are matched exactly, not through the table.
    pub fn table_char(fare_class: &str) -> Option<char> {
        match Self::classify(fare_class) {
            GenericAddonClass::SixStar => Some('*'),
            GenericAddonClass::AlphaFiveStar => fare_class.chars().next(),
            GenericAddonClass::Regular => None,
        }
    }
}

/// One add-on fare plus its derived classification. One cortege exists
/// per valid zone sub-interval of the underlying fare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonFareCortege {
    pub addon_fare: AddonFareInfo,
    pub generic_class: GenericAddonClass,
    pub directional_footnote: DirectionalFootnote,
    /// Zone-validated interval, already intersected with the fare's
    /// own effective range.
    pub interval: DateInterval,
    /// Sequence within the gateway run and the run length, back-filled
    /// by the mark-up pass after sorting.
    pub sequence_number: usize,
    pub gateway_fare_count: usize,
}

impl AddonFareCortege {
    pub fn new(addon_fare: AddonFareInfo, interval: DateInterval) -> Self {
        let generic_class = GenericAddonClass::classify(&addon_fare.fare_class);
        let directional_footnote = addon_fare.directional_footnote();
        Self {
            addon_fare,
            generic_class,
            directional_footnote,
            interval,
            sequence_number: 0,
            gateway_fare_count: 0,
        }
    }

    pub fn gateway(&self) -> &str {
        &self.addon_fare.gateway_market
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_covers_all_three_tiers() {
        assert_eq!(GenericAddonClass::classify("******"), GenericAddonClass::SixStar);
        assert_eq!(
            GenericAddonClass::classify("Y*****"),
            GenericAddonClass::AlphaFiveStar
        );
        assert_eq!(
            GenericAddonClass::classify("YHAPABCD"),
            GenericAddonClass::Regular
        );
        assert_eq!(GenericAddonClass::classify("H*****"), GenericAddonClass::AlphaFiveStar);
        // A digit prefix is not an alpha-five-star class.
        assert_eq!(GenericAddonClass::classify("1*****"), GenericAddonClass::Regular);
    }

    #[test]
    fn priority_orders_regular_over_generics() {
        assert!(
            GenericAddonClass::Regular.priority() > GenericAddonClass::AlphaFiveStar.priority()
        );
        assert!(
            GenericAddonClass::AlphaFiveStar.priority() > GenericAddonClass::SixStar.priority()
        );
    }

    #[test]
    fn table_char_uses_the_alpha_prefix() {
        assert_eq!(GenericAddonClass::table_char("Y*****"), Some('Y'));
        assert_eq!(GenericAddonClass::table_char("******"), Some('*'));
        assert_eq!(GenericAddonClass::table_char("YHAP"), None);
    }
}
