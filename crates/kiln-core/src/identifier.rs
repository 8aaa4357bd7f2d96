//! Project identifiers.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Where a project's sources come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// Full git remote URL: `git "https://example.com/lib.git"`.
    Git,
    /// GitHub `owner/repo` shorthand: `github "owner/repo"`.
    GitHub,
    /// A directory on disk: `local "../lib"`.
    Local,
    /// The project being resolved for.
    Root,
}

impl SourceKind {
    /// The manifest keyword for this kind. `Root` never appears in manifests.
    pub fn keyword(&self) -> &'static str {
        match self {
            SourceKind::Git => "git",
            SourceKind::GitHub => "github",
            SourceKind::Local => "local",
            SourceKind::Root => "root",
        }
    }

    /// Parse a manifest keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "git" => Some(SourceKind::Git),
            "github" => Some(SourceKind::GitHub),
            "local" => Some(SourceKind::Local),
            _ => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceKind::Git | SourceKind::GitHub)
    }
}

/// Identifies an upstream project.
///
/// Equality, hashing and ordering only look at `(kind, link)`: an identifier
/// with an override is the same project as one without.
#[derive(Debug, Clone)]
pub struct ProjectIdentifier {
    kind: SourceKind,
    link: String,
    project_name: String,
    override_link: Option<String>,
}

impl ProjectIdentifier {
    pub fn new(kind: SourceKind, link: impl Into<String>) -> Self {
        let link = link.into();
        let project_name = derive_project_name(&link);
        Self {
            kind,
            link,
            project_name,
            override_link: None,
        }
    }

    /// Identifier for the project rooted at `path`.
    pub fn root(path: &Path) -> Self {
        let project_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        Self {
            kind: SourceKind::Root,
            link: path.to_string_lossy().into_owned(),
            project_name,
            override_link: None,
        }
    }

    /// Redirect fetches to `link` (e.g. a local clone) without changing identity.
    pub fn with_override(mut self, link: impl Into<String>) -> Self {
        self.override_link = Some(link.into());
        self
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn override_link(&self) -> Option<&str> {
        self.override_link.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.kind == SourceKind::Root
    }

    /// The location git should fetch from.
    pub fn remote_url(&self, use_ssh: bool) -> String {
        if let Some(ref link) = self.override_link {
            return link.clone();
        }
        match self.kind {
            SourceKind::GitHub if use_ssh => format!("git@github.com:{}.git", self.link),
            SourceKind::GitHub => format!("https://github.com/{}.git", self.link),
            _ => self.link.clone(),
        }
    }

    /// True if `filter` is empty or names this project.
    pub fn matches(&self, filter: &[String]) -> bool {
        filter.is_empty() || filter.iter().any(|name| name == &self.project_name)
    }
}

impl PartialEq for ProjectIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.link == other.link
    }
}

impl Eq for ProjectIdentifier {}

impl Hash for ProjectIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.link.hash(state);
    }
}

impl Ord for ProjectIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.kind, &self.link).cmp(&(other.kind, &other.link))
    }
}

impl PartialOrd for ProjectIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ProjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.project_name)
    }
}

/// `https://host/owner/Repo.git` -> `Repo`, `git@host:owner/Repo.git` -> `Repo`,
/// `../libs/Repo/` -> `Repo`.
fn derive_project_name(link: &str) -> String {
    let trimmed = link.trim_end_matches(['/', '\\']);
    let last = trimmed
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        link.to_string()
    } else {
        name.to_string()
    }
}
