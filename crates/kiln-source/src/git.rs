//! Bare mirror repositories driven through the `git` binary.

use std::path::{Path, PathBuf};

use kiln_util::errors::KilnError;
use kiln_util::fs::{ensure_dir, remove_path};
use kiln_util::hash::short_digest;
use kiln_util::process::CommandBuilder;
use kiln_util::progress::status;

/// A bare `--mirror` clone of a remote, kept in the repository cache.
#[derive(Debug, Clone)]
pub struct GitRepository {
    url: String,
    path: PathBuf,
}

impl GitRepository {
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
        }
    }

    /// Cache location for `url`: `<cache>/<name>-<digest>`, so two remotes
    /// with the same project name never share a mirror.
    pub fn mirror_path(cache_root: &Path, name: &str, url: &str) -> PathBuf {
        cache_root.join(format!("{name}-{}", short_digest(url, 12)))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.join("HEAD").is_file()
    }

    /// Clone the mirror if missing; otherwise refresh it when `fetch` is set.
    pub fn ensure(&self, fetch: bool) -> Result<(), KilnError> {
        if !self.exists() {
            if let Some(parent) = self.path.parent() {
                ensure_dir(parent)?;
            }
            remove_path(&self.path)?;
            tracing::info!(url = %self.url, "cloning mirror");
            status("Cloning", &self.url);
            CommandBuilder::new("git")
                .args(["clone", "--quiet", "--mirror"])
                .arg(&self.url)
                .arg(self.path.to_string_lossy())
                .run()?;
        } else if fetch {
            tracing::info!(url = %self.url, "updating mirror");
            status("Fetching", &self.url);
            self.git().args(["remote", "update", "--prune"]).run()?;
        }
        Ok(())
    }

    fn git(&self) -> CommandBuilder {
        CommandBuilder::new("git").cwd(&self.path)
    }

    /// Every tag name in the mirror.
    pub fn tags(&self) -> Result<Vec<String>, KilnError> {
        let out = self.git().args(["tag", "--list"]).run()?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    /// Full hash of the default branch head.
    pub fn head(&self) -> Result<String, KilnError> {
        self.git().args(["rev-parse", "HEAD"]).run()
    }

    /// Full commit hash `name` points at, or `None` if it names nothing.
    pub fn rev_parse(&self, name: &str) -> Result<Option<String>, KilnError> {
        let output = self
            .git()
            .args(["rev-parse", "--verify", "--quiet"])
            .arg(format!("{name}^{{commit}}"))
            .exec()?;
        if !output.status.success() {
            return Ok(None);
        }
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!hash.is_empty()).then_some(hash))
    }

    /// Contents of `file` at `revision`, or `None` if it does not exist there.
    pub fn show_file(&self, revision: &str, file: &str) -> Result<Option<String>, KilnError> {
        let output = self
            .git()
            .arg("show")
            .arg(format!("{revision}:{file}"))
            .exec()?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    /// Materialise `revision` as a working copy at `dest`, cloning from the
    /// mirror on first use and reusing the working copy afterwards.
    pub fn checkout_to(&self, revision: &str, dest: &Path) -> Result<(), KilnError> {
        if dest.join(".git").exists() {
            CommandBuilder::new("git")
                .cwd(dest)
                .args(["fetch", "--quiet", "--tags", "--force", "origin"])
                .run()?;
        } else {
            remove_path(dest)?;
            if let Some(parent) = dest.parent() {
                ensure_dir(parent)?;
            }
            CommandBuilder::new("git")
                .args(["clone", "--quiet", "--no-checkout"])
                .arg(self.path.to_string_lossy())
                .arg(dest.to_string_lossy())
                .run()?;
        }
        CommandBuilder::new("git")
            .cwd(dest)
            .args(["checkout", "--quiet", "--force", "--detach"])
            .arg(revision)
            .run()?;
        Ok(())
    }
}
