use crate::types::CarrierCode;
use serde::Deserialize;
use std::collections::HashSet;

/// Tunables for one construction engine instance. Deserializable so
/// the surrounding framework can load it from its own config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConstructionConfig {
    /// Carriers for which add-ons must match the specified fare's
    /// currency.
    pub match_currency_carriers: HashSet<CarrierCode>,
    /// Default for the single-over-double duplicate preference when
    /// the job does not override it.
    pub prefer_single_over_double: bool,
    /// Worker-pool size hint for the gateway-pair preparation phase.
    /// `None` uses the global pool.
    pub worker_threads: Option<usize>,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            match_currency_carriers: HashSet::new(),
            prefer_single_over_double: false,
            worker_threads: None,
        }
    }
}

impl ConstructionConfig {
    pub fn prefers_matching_currency(&self, carrier: &str) -> bool {
        self.match_currency_carriers.contains(carrier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: ConstructionConfig =
            serde_json::from_str(r#"{"match_currency_carriers": ["LH"]}"#).unwrap();
        assert!(cfg.prefers_matching_currency("LH"));
        assert!(!cfg.prefers_matching_currency("AA"));
        assert!(!cfg.prefer_single_over_double);
        assert!(cfg.worker_threads.is_none());
    }
}
