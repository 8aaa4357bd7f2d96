//! One provider per project identifier, chosen by source kind.

use std::path::{Path, PathBuf};

use kiln_core::config::Settings;
use kiln_core::identifier::{ProjectIdentifier, SourceKind};
use kiln_core::manifest::{Manifest, ManifestOptions, MANIFEST_FILE};
use kiln_core::revision::{sort_by_precedence_desc, Revision, LOCAL_REVISION};
use kiln_core::specification::Specification;
use kiln_util::errors::KilnError;

use crate::git::GitRepository;
use crate::local::LocalProject;

/// Where a project's revisions and manifests come from.
#[derive(Debug)]
pub enum SourceProvider {
    /// `git` / `github` projects, served from a bare mirror.
    Remote {
        identifier: ProjectIdentifier,
        repository: GitRepository,
    },
    Local {
        identifier: ProjectIdentifier,
        project: LocalProject,
    },
    /// The project kiln is running in.
    Root {
        identifier: ProjectIdentifier,
        path: PathBuf,
    },
}

impl SourceProvider {
    /// Build the provider for `identifier`. Remote mirrors are cloned (or
    /// refreshed when `settings.fetch` is set) here, once per session.
    pub fn open(identifier: &ProjectIdentifier, settings: &Settings) -> Result<Self, KilnError> {
        match identifier.kind() {
            SourceKind::Root => Ok(SourceProvider::Root {
                identifier: identifier.clone(),
                path: settings.root_path.clone(),
            }),
            SourceKind::Local => {
                let link = identifier.override_link().unwrap_or(identifier.link());
                Ok(SourceProvider::Local {
                    identifier: identifier.clone(),
                    project: LocalProject::new(&settings.root_path, link),
                })
            }
            SourceKind::Git | SourceKind::GitHub => {
                let url = fetch_location(&settings.root_path, &identifier.remote_url(settings.use_ssh));
                let path = GitRepository::mirror_path(
                    &settings.repo_cache_path(),
                    identifier.project_name(),
                    &url,
                );
                let repository = GitRepository::new(url, path);
                repository.ensure(settings.fetch)?;
                Ok(SourceProvider::Remote {
                    identifier: identifier.clone(),
                    repository,
                })
            }
        }
    }

    pub fn identifier(&self) -> &ProjectIdentifier {
        match self {
            SourceProvider::Remote { identifier, .. }
            | SourceProvider::Local { identifier, .. }
            | SourceProvider::Root { identifier, .. } => identifier,
        }
    }

    /// Candidate revisions, newest tag first.
    ///
    /// A remote without any semantic tags offers its default branch head.
    pub fn revisions(&self) -> Result<Vec<Revision>, KilnError> {
        match self {
            SourceProvider::Remote { repository, .. } => {
                let mut tags: Vec<Revision> = repository
                    .tags()?
                    .iter()
                    .filter_map(|name| Revision::tag(name))
                    .collect();
                if tags.is_empty() {
                    return Ok(vec![Revision::commit(repository.head()?)]);
                }
                sort_by_precedence_desc(&mut tags);
                Ok(tags)
            }
            SourceProvider::Local { .. } => Ok(vec![Revision::Local]),
            SourceProvider::Root { .. } => Ok(Vec::new()),
        }
    }

    /// Dependencies declared at `revision`.
    pub fn specifications(
        &self,
        revision: Option<&Revision>,
        options: &ManifestOptions,
    ) -> Result<Vec<Specification>, KilnError> {
        match self {
            SourceProvider::Remote {
                identifier,
                repository,
            } => {
                let revision = revision.ok_or_else(|| KilnError::Generic {
                    message: format!("No revision given for {identifier}"),
                })?;
                let origin = format!("{identifier}@{revision}:{MANIFEST_FILE}");
                match repository.show_file(revision.name(), MANIFEST_FILE)? {
                    Some(content) => Ok(Manifest::parse(&content, &origin, options)?.specifications),
                    None => Ok(Vec::new()),
                }
            }
            SourceProvider::Local { project, .. } => project.specifications(options),
            SourceProvider::Root { path, .. } => {
                Ok(Manifest::from_path(&path.join(MANIFEST_FILE), options)?.specifications)
            }
        }
    }

    /// Resolve a commit, branch or tag name.
    pub fn revision_for_name(&self, name: &str) -> Result<Revision, KilnError> {
        let no_such = || KilnError::NoSuchRevision {
            project: self.identifier().project_name().to_string(),
            revision: name.to_string(),
        };
        match self {
            SourceProvider::Remote { repository, .. } => {
                let hash = repository.rev_parse(name)?.ok_or_else(no_such)?;
                let is_tag = repository.tags()?.iter().any(|t| t == name);
                match Revision::tag(name) {
                    Some(tag) if is_tag => Ok(tag),
                    _ => Ok(Revision::commit(hash)),
                }
            }
            SourceProvider::Local { .. } if name == LOCAL_REVISION => Ok(Revision::Local),
            SourceProvider::Local { .. } | SourceProvider::Root { .. } => Err(no_such()),
        }
    }

    /// Put `revision` in place at `dest`.
    pub fn checkout(&self, revision: &Revision, dest: &Path) -> Result<(), KilnError> {
        match self {
            SourceProvider::Remote { repository, .. } => {
                repository.checkout_to(revision.name(), dest)
            }
            SourceProvider::Local { project, .. } => project.link_into(dest),
            SourceProvider::Root { identifier, .. } => Err(KilnError::Generic {
                message: format!("The root project {identifier} is never checked out"),
            }),
        }
    }
}

/// Relative paths used as git links are taken relative to the project root.
fn fetch_location(root: &Path, url: &str) -> String {
    let candidate = Path::new(url);
    if candidate.is_relative() && root.join(candidate).exists() {
        return root.join(candidate).to_string_lossy().into_owned();
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::config::{GlobalConfig, ProjectConfig};

    fn settings(root: &Path) -> Settings {
        Settings::resolve(root, &GlobalConfig::default(), &ProjectConfig::default())
    }

    #[test]
    fn fetch_location_keeps_urls() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(
            fetch_location(tmp.path(), "https://example.com/Lib.git"),
            "https://example.com/Lib.git"
        );
        std::fs::create_dir(tmp.path().join("Lib")).unwrap();
        assert_eq!(
            fetch_location(tmp.path(), "Lib"),
            tmp.path().join("Lib").to_string_lossy()
        );
    }

    #[test]
    fn local_provider_has_single_revision() {
        let tmp = tempfile::tempdir().unwrap();
        let id = ProjectIdentifier::new(SourceKind::Local, "Shared");
        let provider = SourceProvider::open(&id, &settings(tmp.path())).unwrap();
        assert_eq!(provider.revisions().unwrap(), vec![Revision::Local]);
        assert_eq!(provider.revision_for_name("local").unwrap(), Revision::Local);
        assert!(matches!(
            provider.revision_for_name("1.0"),
            Err(KilnError::NoSuchRevision { .. })
        ));
    }

    #[test]
    fn root_provider_reads_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_FILE), "local \"../Shared\"\n").unwrap();
        let id = ProjectIdentifier::root(tmp.path());
        let provider = SourceProvider::open(&id, &settings(tmp.path())).unwrap();
        let specs = provider
            .specifications(None, &ManifestOptions::default())
            .unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].identifier.project_name(), "Shared");
    }
}
