//! In-memory dependency source for resolver tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;

use kiln_core::identifier::{ProjectIdentifier, SourceKind};
use kiln_core::manifest::{Manifest, ManifestOptions};
use kiln_core::predicate::VersionPredicate;
use kiln_core::revision::{Revision, LOCAL_REVISION};
use kiln_core::specification::Specification;
use kiln_resolver::matcher;
use kiln_resolver::source::DependencySource;
use kiln_util::errors::KilnError;

#[derive(Default)]
struct Project {
    tags: Vec<String>,
    refs: HashMap<String, String>,
    manifests: HashMap<String, String>,
}

/// Projects keyed by GitHub-style link (`org/Name`) or local path.
pub struct MemorySource {
    root_manifest: String,
    projects: HashMap<String, Project>,
    pub calls: Cell<usize>,
}

pub fn root_id() -> ProjectIdentifier {
    ProjectIdentifier::root(Path::new("/work/App"))
}

pub fn github(link: &str) -> ProjectIdentifier {
    ProjectIdentifier::new(SourceKind::GitHub, link)
}

impl MemorySource {
    pub fn new(root_manifest: &str) -> Self {
        Self {
            root_manifest: root_manifest.to_string(),
            projects: HashMap::new(),
            calls: Cell::new(0),
        }
    }

    pub fn tags(mut self, link: &str, tags: &[&str]) -> Self {
        let project = self.projects.entry(link.to_string()).or_default();
        project.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn branch(mut self, link: &str, name: &str, commit: &str) -> Self {
        self.projects
            .entry(link.to_string())
            .or_default()
            .refs
            .insert(name.to_string(), commit.to_string());
        self
    }

    /// Declare the `Kilnfile` of `link` at `revision`.
    pub fn manifest(mut self, link: &str, revision: &str, text: &str) -> Self {
        self.projects
            .entry(link.to_string())
            .or_default()
            .manifests
            .insert(revision.to_string(), text.to_string());
        self
    }

    fn project(&self, identifier: &ProjectIdentifier) -> Result<&Project, KilnError> {
        self.projects
            .get(identifier.link())
            .ok_or_else(|| KilnError::Git {
                message: format!("repository not found: {}", identifier.link()),
            })
    }

    fn parse(text: &str, origin: &str) -> Result<Vec<Specification>, KilnError> {
        Ok(Manifest::parse(text, origin, &ManifestOptions::default())?.specifications)
    }

    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl DependencySource for MemorySource {
    fn candidate_revisions(
        &self,
        identifier: &ProjectIdentifier,
        predicate: &VersionPredicate,
    ) -> Result<Vec<Revision>, KilnError> {
        self.tick();
        if identifier.kind() == SourceKind::Local {
            return Ok(vec![Revision::Local]);
        }
        if let VersionPredicate::Named(name) = predicate {
            return Ok(vec![self.revision_for_name(identifier, name)?]);
        }
        let project = self.project(identifier)?;
        let tags: Vec<Revision> = project.tags.iter().filter_map(|t| Revision::tag(t)).collect();
        Ok(matcher::match_candidates(predicate, &tags))
    }

    fn specifications(
        &self,
        identifier: &ProjectIdentifier,
        revision: Option<&Revision>,
    ) -> Result<Vec<Specification>, KilnError> {
        self.tick();
        if identifier.is_root() {
            return Self::parse(&self.root_manifest, "Kilnfile");
        }
        let project = self.project(identifier)?;
        let name = revision.map(|r| r.name()).unwrap_or(LOCAL_REVISION);
        match project.manifests.get(name) {
            Some(text) => Self::parse(text, identifier.link()),
            None => Ok(Vec::new()),
        }
    }

    fn revision_for_name(
        &self,
        identifier: &ProjectIdentifier,
        name: &str,
    ) -> Result<Revision, KilnError> {
        self.tick();
        if identifier.kind() == SourceKind::Local && name == LOCAL_REVISION {
            return Ok(Revision::Local);
        }
        let project = self.project(identifier)?;
        if project.tags.iter().any(|t| t == name) {
            if let Some(tag) = Revision::tag(name) {
                return Ok(tag);
            }
        }
        if let Some(commit) = project.refs.get(name) {
            return Ok(Revision::commit(commit.clone()));
        }
        if project.refs.values().any(|c| c == name) {
            return Ok(Revision::commit(name));
        }
        Err(KilnError::NoSuchRevision {
            project: identifier.project_name().to_string(),
            revision: name.to_string(),
        })
    }
}
