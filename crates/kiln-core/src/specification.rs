use std::fmt;

use crate::identifier::ProjectIdentifier;
use crate::predicate::VersionPredicate;

/// A single declared dependency: which project, under which constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specification {
    pub identifier: ProjectIdentifier,
    pub predicate: VersionPredicate,
}

impl Specification {
    pub fn new(identifier: ProjectIdentifier, predicate: VersionPredicate) -> Self {
        Self {
            identifier,
            predicate,
        }
    }
}

impl fmt::Display for Specification {
    /// Renders the manifest line: `github "owner/Repo" ~> 1.2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\"",
            self.identifier.kind().keyword(),
            self.identifier.link()
        )?;
        if !self.predicate.is_any() {
            write!(f, " {}", self.predicate)?;
        }
        Ok(())
    }
}
