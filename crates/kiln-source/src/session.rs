//! The dependency source the resolver talks to during one kiln invocation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use kiln_core::config::Settings;
use kiln_core::identifier::ProjectIdentifier;
use kiln_core::manifest::ManifestOptions;
use kiln_core::predicate::VersionPredicate;
use kiln_core::revision::Revision;
use kiln_core::specification::Specification;
use kiln_resolver::matcher;
use kiln_resolver::source::DependencySource;
use kiln_util::errors::KilnError;

use crate::provider::SourceProvider;

/// Lazily opened providers for every project touched in this session.
pub struct ProjectSources {
    settings: Settings,
    manifest_options: ManifestOptions,
    root: ProjectIdentifier,
    providers: Mutex<HashMap<ProjectIdentifier, Arc<SourceProvider>>>,
}

impl ProjectSources {
    pub fn new(settings: Settings) -> Self {
        let root = ProjectIdentifier::root(&settings.root_path);
        let manifest_options = settings.manifest_options();
        Self {
            settings,
            manifest_options,
            root,
            providers: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &ProjectIdentifier {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The provider for `identifier`, opening it on first use.
    pub fn provider(&self, identifier: &ProjectIdentifier) -> Result<Arc<SourceProvider>, KilnError> {
        let mut providers = self.providers.lock().map_err(|_| KilnError::Generic {
            message: "source provider table poisoned by an earlier panic".to_string(),
        })?;
        if let Some(provider) = providers.get(identifier) {
            return Ok(Arc::clone(provider));
        }
        let provider = Arc::new(SourceProvider::open(identifier, &self.settings)?);
        providers.insert(identifier.clone(), Arc::clone(&provider));
        Ok(provider)
    }
}

impl DependencySource for ProjectSources {
    fn candidate_revisions(
        &self,
        identifier: &ProjectIdentifier,
        predicate: &VersionPredicate,
    ) -> Result<Vec<Revision>, KilnError> {
        if let VersionPredicate::Named(name) = predicate {
            return Ok(vec![self.revision_for_name(identifier, name)?]);
        }
        let revisions = self.provider(identifier)?.revisions()?;
        Ok(matcher::match_candidates(predicate, &revisions))
    }

    fn specifications(
        &self,
        identifier: &ProjectIdentifier,
        revision: Option<&Revision>,
    ) -> Result<Vec<Specification>, KilnError> {
        self.provider(identifier)?
            .specifications(revision, &self.manifest_options)
    }

    fn revision_for_name(
        &self,
        identifier: &ProjectIdentifier,
        name: &str,
    ) -> Result<Revision, KilnError> {
        self.provider(identifier)?.revision_for_name(name)
    }
}
