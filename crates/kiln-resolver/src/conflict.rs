//! Pin conflict reporting.

use std::fmt;

/// All constraints a pinned resolution had to ignore.
#[derive(Debug, Default, Clone)]
pub struct ConflictReport {
    pub conflicts: Vec<PinConflict>,
}

/// A pinned revision that does not satisfy a predicate declared by a dependent.
/// The pin wins; the predicate is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinConflict {
    pub project: String,
    pub pinned: String,
    pub predicate: String,
    pub required_by: String,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a conflict. Returns `false` if it was already reported.
    pub fn add(&mut self, conflict: PinConflict) -> bool {
        if self.conflicts.contains(&conflict) {
            return false;
        }
        self.conflicts.push(conflict);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No pin conflicts.");
        }
        writeln!(f, "Pin conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PinConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pinned at {} but {} requires {}",
            self.project, self.pinned, self.required_by, self.predicate
        )
    }
}
