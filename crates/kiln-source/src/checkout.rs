//! Working copies under `Kiln/Checkouts`.

use std::path::{Path, PathBuf};

use kiln_core::config::Settings;
use kiln_core::identifier::ProjectIdentifier;
use kiln_core::revision::Revision;
use kiln_util::errors::KilnError;
use kiln_util::fs::{ensure_dir, remove_path, symlink_dir};

use crate::provider::SourceProvider;

/// A resolved project to be placed in the checkouts directory.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub identifier: ProjectIdentifier,
    pub revision: Revision,
    pub path: PathBuf,
    /// Projects with their own dependencies get a `Kiln/Build` link back to
    /// the root build directory.
    pub has_dependencies: bool,
}

impl Checkout {
    pub fn new(
        identifier: ProjectIdentifier,
        revision: Revision,
        has_dependencies: bool,
        settings: &Settings,
    ) -> Self {
        let path = settings.checkouts_path().join(identifier.project_name());
        Self {
            identifier,
            revision,
            path,
            has_dependencies,
        }
    }

    /// Check out the revision and wire up the build directory link.
    pub fn prepare(&self, provider: &SourceProvider, build_path: &Path) -> Result<(), KilnError> {
        provider.checkout(&self.revision, &self.path)?;
        if !self.path.exists() {
            return Err(KilnError::Generic {
                message: format!("No checkout at path: {}", self.path.display()),
            });
        }

        if self.has_dependencies {
            ensure_dir(build_path)?;
            let kiln_dir = self.path.join("Kiln");
            ensure_dir(&kiln_dir)?;
            let link = kiln_dir.join("Build");
            remove_path(&link)?;
            tracing::debug!(link = %link.display(), target = %build_path.display(), "linking build directory");
            symlink_dir(build_path, &link)?;
        }
        Ok(())
    }
}
