//! `Kilnfile.resolved`: the lock artifact.
//!
//! Same line grammar as the manifest, but every predicate is the quoted,
//! precise revision, one line per resolved project in build order.

use std::fmt;
use std::path::Path;

use kiln_util::errors::KilnError;

use crate::identifier::ProjectIdentifier;
use crate::manifest::{Manifest, ManifestOptions};
use crate::predicate::VersionPredicate;
use crate::revision::Revision;
use crate::specification::Specification;

/// File name of the lock artifact.
pub const RESOLVED_FILE: &str = "Kilnfile.resolved";

/// A single locked project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedProject {
    pub identifier: ProjectIdentifier,
    /// The exact revision name (tag, commit hash or `local`).
    pub revision: String,
}

/// Deterministic lock artifact recording exact resolved revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lockfile {
    pub projects: Vec<LockedProject>,
}

impl Lockfile {
    /// Build a lock from resolved `(identifier, revision)` pairs, preserving order.
    pub fn from_resolved<'a>(
        resolved: impl IntoIterator<Item = (&'a ProjectIdentifier, &'a Revision)>,
    ) -> Self {
        let projects = resolved
            .into_iter()
            .filter(|(id, _)| !id.is_root())
            .map(|(id, rev)| LockedProject {
                identifier: id.clone(),
                revision: rev.name().to_string(),
            })
            .collect();
        Self { projects }
    }

    /// Load and parse a `Kilnfile.resolved` file.
    pub fn from_path(path: &Path, options: &ManifestOptions) -> Result<Self, KilnError> {
        let content = std::fs::read_to_string(path).map_err(|e| KilnError::Manifest {
            message: format!("Failed to read lock file {}: {e}", path.display()),
        })?;
        Self::parse(&content, &path.display().to_string(), options)
    }

    /// Parse lock text; every entry must carry a quoted revision.
    pub fn parse(content: &str, origin: &str, options: &ManifestOptions) -> Result<Self, KilnError> {
        let manifest = Manifest::parse(content, origin, options)?;
        let mut projects = Vec::with_capacity(manifest.specifications.len());
        for spec in manifest.specifications {
            match spec.predicate {
                VersionPredicate::Named(revision) => projects.push(LockedProject {
                    identifier: spec.identifier,
                    revision,
                }),
                other => {
                    return Err(KilnError::Manifest {
                        message: format!(
                            "{origin}: {} must be pinned to a quoted revision, found `{other}`",
                            spec.identifier
                        ),
                    })
                }
            }
        }
        Ok(Self { projects })
    }

    /// The entries as manifest specifications with `Named` predicates.
    pub fn specifications(&self) -> Vec<Specification> {
        self.projects
            .iter()
            .map(|p| {
                Specification::new(
                    p.identifier.clone(),
                    VersionPredicate::Named(p.revision.clone()),
                )
            })
            .collect()
    }

    /// Write the lock file atomically.
    pub fn write_to(&self, path: &Path) -> Result<(), KilnError> {
        kiln_util::fs::write_atomic(path, self.to_string().as_bytes())?;
        tracing::debug!(path = %path.display(), entries = self.projects.len(), "wrote lock file");
        Ok(())
    }
}

impl fmt::Display for Lockfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for spec in self.specifications() {
            writeln!(f, "{spec}")?;
        }
        Ok(())
    }
}
