//! Per-resolution memo of source answers.
//!
//! A resolution may revisit the same project many times while constraints
//! settle; each distinct question goes to the source once.

use std::collections::HashMap;

use kiln_core::identifier::ProjectIdentifier;
use kiln_core::predicate::VersionPredicate;
use kiln_core::revision::Revision;
use kiln_core::specification::Specification;
use kiln_util::errors::KilnError;

use crate::source::DependencySource;

#[derive(Debug, Default)]
pub struct SourceCache {
    candidates: HashMap<ProjectIdentifier, Vec<Revision>>,
    specifications: HashMap<(ProjectIdentifier, Option<Revision>), Vec<Specification>>,
    names: HashMap<(ProjectIdentifier, String), Revision>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every candidate revision of `identifier`.
    pub fn candidates<S: DependencySource + ?Sized>(
        &mut self,
        source: &S,
        identifier: &ProjectIdentifier,
    ) -> Result<Vec<Revision>, KilnError> {
        if let Some(hit) = self.candidates.get(identifier) {
            return Ok(hit.clone());
        }
        let revisions = source.candidate_revisions(identifier, &VersionPredicate::Any)?;
        self.candidates
            .insert(identifier.clone(), revisions.clone());
        Ok(revisions)
    }

    pub fn specifications<S: DependencySource + ?Sized>(
        &mut self,
        source: &S,
        identifier: &ProjectIdentifier,
        revision: Option<&Revision>,
    ) -> Result<Vec<Specification>, KilnError> {
        let key = (identifier.clone(), revision.cloned());
        if let Some(hit) = self.specifications.get(&key) {
            return Ok(hit.clone());
        }
        let specs = source.specifications(identifier, revision)?;
        self.specifications.insert(key, specs.clone());
        Ok(specs)
    }

    pub fn revision_for_name<S: DependencySource + ?Sized>(
        &mut self,
        source: &S,
        identifier: &ProjectIdentifier,
        name: &str,
    ) -> Result<Revision, KilnError> {
        let key = (identifier.clone(), name.to_string());
        if let Some(hit) = self.names.get(&key) {
            return Ok(hit.clone());
        }
        let revision = source.revision_for_name(identifier, name)?;
        self.names.insert(key, revision.clone());
        Ok(revision)
    }
}
