//! Operation: remove checkouts, build products and cached mirrors.

use std::path::{Path, PathBuf};

use kiln_core::config::Settings;
use kiln_util::errors::KilnError;
use kiln_util::fs::remove_path;

/// Options for `kiln clean`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CleanOptions {
    pub checkouts: bool,
    /// Also remove the global repository mirrors.
    pub caches: bool,
    pub all: bool,
}

/// Result of a clean operation.
#[derive(Debug, PartialEq, Eq)]
pub enum CleanResult {
    Removed(Vec<PathBuf>),
    NothingToClean,
}

/// `Kiln/Build` is always removed; the flags widen the scope.
pub fn clean(project_root: &Path, opts: &CleanOptions) -> miette::Result<CleanResult> {
    let settings = Settings::load(project_root)?;

    let mut targets = vec![settings.build_path()];
    if opts.checkouts || opts.all {
        targets.push(settings.checkouts_path());
    }
    if opts.caches || opts.all {
        targets.push(settings.repo_cache_path());
    }

    let mut removed = Vec::new();
    for target in targets {
        if remove_path(&target).map_err(KilnError::Io)? {
            tracing::info!("Removed {}", target.display());
            removed.push(target);
        }
    }

    if opts.all {
        let kiln_dir = settings.kiln_path();
        if std::fs::read_dir(&kiln_dir).is_ok_and(|mut entries| entries.next().is_none()) {
            std::fs::remove_dir(&kiln_dir).map_err(KilnError::Io)?;
        }
    }

    if removed.is_empty() {
        Ok(CleanResult::NothingToClean)
    } else {
        Ok(CleanResult::Removed(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_build_by_default_and_checkouts_on_request() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("Kiln/Build/Lib")).unwrap();
        std::fs::create_dir_all(root.join("Kiln/Checkouts/Lib")).unwrap();

        let result = clean(root, &CleanOptions::default()).unwrap();
        assert_eq!(result, CleanResult::Removed(vec![root.join("Kiln/Build")]));
        assert!(root.join("Kiln/Checkouts/Lib").exists());

        let opts = CleanOptions {
            checkouts: true,
            ..Default::default()
        };
        let result = clean(root, &opts).unwrap();
        assert_eq!(
            result,
            CleanResult::Removed(vec![root.join("Kiln/Checkouts")])
        );
    }

    #[test]
    fn nothing_to_clean() {
        let tmp = tempfile::tempdir().unwrap();
        let result = clean(tmp.path(), &CleanOptions::default()).unwrap();
        assert_eq!(result, CleanResult::NothingToClean);
    }
}
