use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Effective-date range of one reference-data record, plus the record
/// lifetime (create/expire) that historical jobs must also respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    pub create_date: NaiveDate,
    pub eff_date: NaiveDate,
    pub disc_date: NaiveDate,
    pub expire_date: NaiveDate,
}

impl DateInterval {
    /// Interval with an unbounded record lifetime.
    pub fn effective(eff_date: NaiveDate, disc_date: NaiveDate) -> Self {
        Self {
            create_date: NaiveDate::MIN,
            eff_date,
            disc_date,
            expire_date: NaiveDate::MAX,
        }
    }

    pub fn with_lifetime(mut self, create_date: NaiveDate, expire_date: NaiveDate) -> Self {
        self.create_date = create_date;
        self.expire_date = expire_date;
        self
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.eff_date <= date && date <= self.disc_date
    }

    fn narrowed(&self, other: &DateInterval) -> DateInterval {
        DateInterval {
            create_date: self.create_date.max(other.create_date),
            eff_date: self.eff_date.max(other.eff_date),
            disc_date: self.disc_date.min(other.disc_date),
            expire_date: self.expire_date.min(other.expire_date),
        }
    }

    /// Intersection of two effective ranges. `None` when disjoint.
    pub fn intersect(&self, other: &DateInterval) -> Option<DateInterval> {
        let r = self.narrowed(other);
        (r.eff_date <= r.disc_date).then_some(r)
    }

    /// Historical variant: the record lifetimes must overlap as well.
    pub fn intersect_historical(&self, other: &DateInterval) -> Option<DateInterval> {
        let r = self.narrowed(other);
        (r.eff_date <= r.disc_date && r.create_date <= r.expire_date).then_some(r)
    }

    /// Smallest interval covering both operands.
    pub fn union(&self, other: &DateInterval) -> DateInterval {
        DateInterval {
            create_date: self.create_date.min(other.create_date),
            eff_date: self.eff_date.min(other.eff_date),
            disc_date: self.disc_date.max(other.disc_date),
            expire_date: self.expire_date.max(other.expire_date),
        }
    }
}
