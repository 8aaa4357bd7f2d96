//! The capability the engine uses to learn about projects.

use kiln_core::identifier::ProjectIdentifier;
use kiln_core::predicate::VersionPredicate;
use kiln_core::revision::Revision;
use kiln_core::specification::Specification;
use kiln_util::errors::KilnError;

/// Everything the resolver asks of the outside world.
///
/// Implementations decide how answers are obtained (git mirrors, local
/// directories, fixtures); the engine only sees these three calls.
pub trait DependencySource {
    /// Revisions available for `identifier` that match `predicate`.
    ///
    /// The engine always passes [`VersionPredicate::Any`] and filters itself.
    fn candidate_revisions(
        &self,
        identifier: &ProjectIdentifier,
        predicate: &VersionPredicate,
    ) -> Result<Vec<Revision>, KilnError>;

    /// The dependencies `identifier` declares at `revision`.
    ///
    /// `revision` is `None` only for the root project, whose manifest is read
    /// from its working directory.
    fn specifications(
        &self,
        identifier: &ProjectIdentifier,
        revision: Option<&Revision>,
    ) -> Result<Vec<Specification>, KilnError>;

    /// Look up an explicit commit, branch or tag name.
    ///
    /// Fails with [`KilnError::NoSuchRevision`] if it does not exist.
    fn revision_for_name(
        &self,
        identifier: &ProjectIdentifier,
        name: &str,
    ) -> Result<Revision, KilnError>;
}

impl<T: DependencySource + ?Sized> DependencySource for &T {
    fn candidate_revisions(
        &self,
        identifier: &ProjectIdentifier,
        predicate: &VersionPredicate,
    ) -> Result<Vec<Revision>, KilnError> {
        (**self).candidate_revisions(identifier, predicate)
    }

    fn specifications(
        &self,
        identifier: &ProjectIdentifier,
        revision: Option<&Revision>,
    ) -> Result<Vec<Specification>, KilnError> {
        (**self).specifications(identifier, revision)
    }

    fn revision_for_name(
        &self,
        identifier: &ProjectIdentifier,
        name: &str,
    ) -> Result<Revision, KilnError> {
        (**self).revision_for_name(identifier, name)
    }
}
