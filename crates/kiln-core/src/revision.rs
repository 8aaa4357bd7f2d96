//! Concrete, checkout-able revisions.

use std::cmp::Ordering;
use std::fmt;

use crate::version::SemanticVersion;

/// Name used for the sentinel revision of local-path projects.
pub const LOCAL_REVISION: &str = "local";

/// A git tag whose name parses as a semantic version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    name: String,
    version: SemanticVersion,
}

impl Tag {
    /// Returns `None` if `name` is not a semantic version tag.
    pub fn parse(name: &str) -> Option<Self> {
        let version = SemanticVersion::parse(name)?;
        Some(Self {
            name: name.to_string(),
            version,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &SemanticVersion {
        &self.version
    }
}

impl Ord for Tag {
    /// Semver precedence, then raw tag name so the order is total.
    fn cmp(&self, other: &Self) -> Ordering {
        self.version
            .cmp_precedence(&other.version)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A concrete version of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Revision {
    /// A semantic version tag.
    Tag(Tag),
    /// A commit hash (or a ref resolved to one). Only equality is meaningful.
    Commit(String),
    /// The single revision of a local-path project.
    Local,
}

impl Revision {
    /// Build a tag revision if `name` is a semantic version.
    pub fn tag(name: &str) -> Option<Self> {
        Tag::parse(name).map(Revision::Tag)
    }

    pub fn commit(hash: impl Into<String>) -> Self {
        Revision::Commit(hash.into())
    }

    /// The name recorded in the lock artifact and passed to git.
    pub fn name(&self) -> &str {
        match self {
            Revision::Tag(tag) => tag.name(),
            Revision::Commit(hash) => hash,
            Revision::Local => LOCAL_REVISION,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Revision::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Revision::Local)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sort tag revisions newest first, breaking precedence ties by tag name.
/// Non-tag revisions keep their relative order after all tags.
pub fn sort_by_precedence_desc(revisions: &mut [Revision]) {
    revisions.sort_by(|a, b| match (a.as_tag(), b.as_tag()) {
        (Some(a), Some(b)) => b
            .version()
            .cmp_precedence(a.version())
            .then_with(|| a.name().cmp(b.name())),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
