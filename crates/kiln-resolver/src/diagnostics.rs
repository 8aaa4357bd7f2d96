//! Append-only record of resolver decisions.
//!
//! Recording never changes an outcome; it exists so a surprising resolution
//! can be explained after the fact.

use std::path::Path;

use kiln_util::errors::KilnError;
use serde::Serialize;

/// One decision taken while resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum DiagnosticEvent {
    /// The root manifest was read.
    RootExpanded { iteration: usize, project: String },
    /// A project was popped and matched. `changed` is false when the winner
    /// equals the revision already expanded, in which case nothing else happens.
    Resolved {
        iteration: usize,
        project: String,
        predicates: Vec<String>,
        /// Everything the source offered, newest first.
        candidates: Vec<String>,
        /// The candidates left after intersecting `predicates`.
        satisfying: Vec<String>,
        winner: String,
        changed: bool,
    },
    /// A previously chosen version was replaced and its subtree re-queued.
    Invalidated {
        iteration: usize,
        project: String,
        previous: String,
        winner: String,
    },
    /// A project became unreachable and its contributions were retracted.
    Orphaned { iteration: usize, project: String },
    /// A project was popped while unreachable and had nothing to retract.
    Skipped { iteration: usize, project: String },
    /// A pinned revision was kept despite a predicate it does not satisfy.
    PinConflict {
        iteration: usize,
        project: String,
        pinned: String,
        predicate: String,
        required_by: String,
    },
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct DiagnosticsLog {
    events: Vec<DiagnosticEvent>,
}

impl DiagnosticsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: DiagnosticEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_json(&self) -> Result<String, KilnError> {
        serde_json::to_string_pretty(self).map_err(|e| KilnError::Generic {
            message: format!("Failed to serialize diagnostics: {e}"),
        })
    }

    /// Write the log as pretty JSON, replacing any previous export atomically.
    pub fn write_to(&self, path: &Path) -> Result<(), KilnError> {
        let json = self.to_json()?;
        kiln_util::fs::write_atomic(path, json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kind_tag() {
        let mut log = DiagnosticsLog::new();
        log.record(DiagnosticEvent::Resolved {
            iteration: 1,
            project: "Lib".to_string(),
            predicates: vec![">= 1.0 (from app)".to_string()],
            candidates: vec!["2.0".to_string(), "1.3".to_string(), "1.0".to_string()],
            satisfying: vec!["1.3".to_string(), "1.0".to_string()],
            winner: "1.3".to_string(),
            changed: true,
        });
        log.record(DiagnosticEvent::Orphaned {
            iteration: 2,
            project: "Old".to_string(),
        });

        let json: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        let events = json["events"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event"], "resolved");
        assert_eq!(events[0]["winner"], "1.3");
        assert_eq!(events[0]["candidates"][0], "2.0");
        assert_eq!(events[0]["satisfying"][0], "1.3");
        assert_eq!(events[1]["event"], "orphaned");
    }

    #[test]
    fn write_to_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("diag.json");
        let mut log = DiagnosticsLog::new();
        log.record(DiagnosticEvent::Orphaned {
            iteration: 1,
            project: "X".to_string(),
        });
        log.write_to(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"orphaned\""));
    }
}
