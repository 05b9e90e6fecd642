use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Diagnostic stream selector, one per major construction step. The
/// collector is resolved once per job and passed down as a typed
/// optional; its absence changes no outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    AddonRetrieval,
    ZoneValidation,
    SpecifiedFares,
    GatewayMatching,
    ConstructedFares,
    DuplicateRemoval,
    Reconstruction,
}

/// Purely observational line collector for one diagnostic kind.
#[derive(Debug)]
pub struct DiagnosticCollector {
    kind: DiagnosticKind,
    lines: Mutex<Vec<String>>,
}

impl DiagnosticCollector {
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            kind,
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn is_active(&self, kind: DiagnosticKind) -> bool {
        self.kind == kind
    }

    /// Append a line if this collector listens to `kind`. The closure
    /// only runs when the line will actually be kept.
    pub fn record<F>(&self, kind: DiagnosticKind, line: F)
    where
        F: FnOnce() -> String,
    {
        if self.kind == kind {
            self.lines.lock().push(line());
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_only_keeps_its_own_kind() {
        let diag = DiagnosticCollector::new(DiagnosticKind::GatewayMatching);
        diag.record(DiagnosticKind::GatewayMatching, || "GW LON-DFW".into());
        diag.record(DiagnosticKind::DuplicateRemoval, || "DUP".into());
        assert_eq!(diag.lines(), vec!["GW LON-DFW".to_string()]);
    }
}
