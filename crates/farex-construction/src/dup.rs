use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use tracing::debug;

use crate::cortege::GenericAddonClass;
use farex_core::{AddonFareInfo, ConstructedFareInfo, RoutingNumber, TariffNumber};

/// Amounts closer than this are treated as equal during resolution.
const AMOUNT_EPSILON: f64 = 1e-6;

/// Outcome of offering a constructed fare to the response set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DupResolution {
    /// No structural duplicate existed, the fare was added.
    Accepted,
    /// A duplicate existed and the new fare won, replacing it.
    Replaced,
    /// A duplicate existed and the existing fare was kept.
    Dropped,
}

/// Accumulates the constructed fares of one job, eliminating
/// structural duplicates as they arrive. Buckets are keyed by a
/// structural hash; equality inside a bucket is the full
/// field-by-field comparator.
#[derive(Debug)]
pub struct DuplicateResponseSet {
    buckets: HashMap<u64, Vec<ConstructedFareInfo>>,
    len: usize,
    /// Non-SITA vendors prefer higher add-on-class priority first.
    use_class_priority: bool,
    single_over_double: bool,
    historical: bool,
    ticketing_date: NaiveDate,
    travel_date: NaiveDate,
}

impl DuplicateResponseSet {
    pub fn new(
        use_class_priority: bool,
        single_over_double: bool,
        historical: bool,
        ticketing_date: NaiveDate,
        travel_date: NaiveDate,
    ) -> Self {
        Self {
            buckets: HashMap::new(),
            len: 0,
            use_class_priority,
            single_over_double,
            historical,
            ticketing_date,
            travel_date,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offer a fare; first decisive resolution rule wins, ties fall
    /// through to the next rule.
    pub fn add(&mut self, fare: ConstructedFareInfo) -> DupResolution {
        let hash = structural_hash(&fare);
        let existing = self
            .buckets
            .get(&hash)
            .and_then(|bucket| bucket.iter().position(|f| self.is_structural_dup(f, &fare)));
        let Some(idx) = existing else {
            self.buckets.entry(hash).or_default().push(fare);
            self.len += 1;
            return DupResolution::Accepted;
        };

        if self.new_fare_wins(&self.buckets[&hash][idx], &fare) {
            debug!(
                market1 = %fare.market1,
                market2 = %fare.market2,
                "duplicate resolved in favor of new fare"
            );
            if let Some(bucket) = self.buckets.get_mut(&hash) {
                bucket[idx] = fare;
            }
            DupResolution::Replaced
        } else {
            DupResolution::Dropped
        }
    }

    /// Drain every surviving fare in a deterministic order.
    pub fn into_fares(self) -> Vec<ConstructedFareInfo> {
        let mut fares: Vec<ConstructedFareInfo> =
            self.buckets.into_values().flatten().collect();
        fares.sort_by(|a, b| {
            (&a.market1, &a.market2, &a.specified.fare_class, a.specified.fare_tariff)
                .cmp(&(&b.market1, &b.market2, &b.specified.fare_class, b.specified.fare_tariff))
                .then_with(|| {
                    (a.construction_type, &a.gateway1, &a.gateway2)
                        .cmp(&(b.construction_type, &b.gateway1, &b.gateway2))
                })
                .then_with(|| a.constructed_amount.total_cmp(&b.constructed_amount))
        });
        fares
    }

    fn new_fare_wins(&self, existing: &ConstructedFareInfo, candidate: &ConstructedFareInfo) -> bool {
        // Rule 1: add-on-class priority, gateways matching exactly.
        // Priorities are only comparable between fares of the same
        // endedness; a second add-on must not outrank by count alone.
        if self.use_class_priority
            && existing.is_double_ended() == candidate.is_double_ended()
            && existing.gateway1 == candidate.gateway1
            && existing.gateway2 == candidate.gateway2
        {
            let ep = class_priority(existing);
            let cp = class_priority(candidate);
            if ep != cp {
                let loser = if ep < cp { existing } else { candidate };
                if !(self.historical && self.on_interval_boundary(loser)) {
                    return cp > ep;
                }
            }
        }

        // Rule 2: single-ended preference.
        if self.single_over_double
            && existing.is_double_ended() != candidate.is_double_ended()
        {
            return existing.is_double_ended();
        }

        // Rule 3: lowest amount; first-seen wins on a tie.
        candidate.constructed_amount < existing.constructed_amount - AMOUNT_EPSILON
    }

    /// Historical jobs skip the priority rule when the request date
    /// sits exactly on a boundary of the losing fare's effectiveness
    /// or record lifetime.
    fn on_interval_boundary(&self, fare: &ConstructedFareInfo) -> bool {
        [self.ticketing_date, self.travel_date].iter().any(|d| {
            *d == fare.interval.eff_date
                || *d == fare.interval.disc_date
                || *d == fare.interval.expire_date
        })
    }

    fn is_structural_dup(&self, a: &ConstructedFareInfo, b: &ConstructedFareInfo) -> bool {
        a.specified.fare_tariff == b.specified.fare_tariff
            && a.specified.owrt == b.specified.owrt
            && a.specified.global_direction == b.specified.global_direction
            && a.specified.fare_class == b.specified.fare_class
            && a.specified.vendor == b.specified.vendor
            && a.specified.carrier == b.specified.carrier
            && a.specified.currency == b.specified.currency
            && a.specified.rule_number == b.specified.rule_number
            && a.specified.directionality == b.specified.directionality
            && a.market1 == b.market1
            && a.market2 == b.market2
            && routing_equal(a, b)
            && footnote_pairs(a, self.use_class_priority)
                == footnote_pairs(b, self.use_class_priority)
    }
}

/// Summed priority of the fare's add-on classes.
fn class_priority(fare: &ConstructedFareInfo) -> u32 {
    let side = |a: &Option<AddonFareInfo>| {
        a.as_ref().map_or(0, |a| {
            u32::from(GenericAddonClass::classify(&a.fare_class).priority())
        })
    };
    side(&fare.origin_addon) + side(&fare.dest_addon)
}

fn structural_hash(fare: &ConstructedFareInfo) -> u64 {
    let mut h = std::collections::hash_map::DefaultHasher::new();
    fare.specified.fare_tariff.hash(&mut h);
    fare.specified.owrt.hash(&mut h);
    fare.specified.global_direction.hash(&mut h);
    fare.specified.fare_class.hash(&mut h);
    fare.specified.vendor.hash(&mut h);
    fare.specified.carrier.hash(&mut h);
    fare.specified.currency.hash(&mut h);
    fare.specified.rule_number.hash(&mut h);
    fare.specified.directionality.hash(&mut h);
    fare.market1.hash(&mut h);
    fare.market2.hash(&mut h);
    h.finish()
}

/// Ordered routing array: origin add-on, specified, destination
/// add-on, absent sides omitted.
fn routing_array(fare: &ConstructedFareInfo) -> Vec<&RoutingNumber> {
    let mut out = Vec::with_capacity(3);
    if let Some(a) = &fare.origin_addon {
        out.push(&a.routing);
    }
    out.push(&fare.specified.routing);
    if let Some(a) = &fare.dest_addon {
        out.push(&a.routing);
    }
    out
}

/// Two fares are routing-equal if their arrays match element-wise, or
/// every routing number across both arrays is the same value (one side
/// publishing a routing the other shares implicitly).
fn routing_equal(a: &ConstructedFareInfo, b: &ConstructedFareInfo) -> bool {
    let ra = routing_array(a);
    let rb = routing_array(b);
    if ra.len() == rb.len() && ra == rb {
        return true;
    }
    let first = ra[0];
    ra.iter().chain(rb.iter()).all(|r| *r == first)
}

/// Unique (tariff, footnote) pairs across all three fare components.
/// Non-SITA vendors skip directional TO/FROM footnotes, which are
/// consumed by direction matching rather than duplicate identity.
fn footnote_pairs(
    fare: &ConstructedFareInfo,
    skip_directional: bool,
) -> BTreeSet<(TariffNumber, char)> {
    let mut pairs = BTreeSet::new();
    let mut addon = |a: &Option<AddonFareInfo>| {
        if let Some(a) = a {
            for fn_str in [&a.footnote1, &a.footnote2].into_iter().flatten() {
                if let Some(c) = fn_str.chars().next() {
                    if skip_directional && (c == 'T' || c == 'F') && fn_str.len() == 1 {
                        continue;
                    }
                    pairs.insert((a.addon_tariff, c));
                }
            }
        }
    };
    addon(&fare.origin_addon);
    addon(&fare.dest_addon);
    for fn_str in [&fare.specified.footnote1, &fare.specified.footnote2]
        .into_iter()
        .flatten()
    {
        if let Some(c) = fn_str.chars().next() {
            pairs.insert((fare.specified.fare_tariff, c));
        }
    }
    pairs
}
