//! Projects referenced by filesystem path.

use std::path::{Path, PathBuf};

use kiln_core::manifest::{Manifest, ManifestOptions, MANIFEST_FILE};
use kiln_core::specification::Specification;
use kiln_util::errors::KilnError;
use kiln_util::fs::{ensure_dir, remove_path, symlink_dir};

/// A directory on disk; it always has exactly one revision, `local`.
#[derive(Debug, Clone)]
pub struct LocalProject {
    path: PathBuf,
}

impl LocalProject {
    /// `link` is resolved against `root` unless absolute.
    pub fn new(root: &Path, link: &str) -> Self {
        Self {
            path: root.join(link),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared dependencies; a project without a `Kilnfile` has none.
    pub fn specifications(&self, options: &ManifestOptions) -> Result<Vec<Specification>, KilnError> {
        let manifest_path = self.path.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Ok(Vec::new());
        }
        Ok(Manifest::from_path(&manifest_path, options)?.specifications)
    }

    /// Point `dest` at the project directory with a symlink.
    pub fn link_into(&self, dest: &Path) -> Result<(), KilnError> {
        if !self.path.is_dir() {
            return Err(KilnError::Generic {
                message: format!("Local project not found at {}", self.path.display()),
            });
        }
        let target = self.path.canonicalize()?;
        if std::fs::read_link(dest).is_ok_and(|current| current == target) {
            return Ok(());
        }
        remove_path(dest)?;
        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }
        symlink_dir(&target, dest)?;
        Ok(())
    }
}
