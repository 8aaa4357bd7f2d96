use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kiln_util::errors::KilnError;

use crate::manifest::ManifestOptions;

/// File name of the per-project configuration.
pub const PROJECT_CONFIG_FILE: &str = "kiln.toml";

/// Default per-identifier expansion budget for the resolver.
pub const DEFAULT_MAX_EXPANSIONS: usize = 32;

/// Global user configuration loaded from `~/.kiln/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub git: GitConfig,
}

/// Repository cache settings from `[cache]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> String {
    "~/.kiln/cache".to_string()
}

/// Git settings from `[git]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default, rename = "use-ssh")]
    pub use_ssh: bool,
}

/// Per-project configuration loaded from `kiln.toml` next to the `Kilnfile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub defaults: ProjectDefaults,

    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Project name -> replacement link used instead of the declared remote.
    #[serde(default, rename = "repo-overrides")]
    pub repo_overrides: BTreeMap<String, String>,
}

/// `[defaults]` in `kiln.toml`. Unset values fall back to the global config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDefaults {
    #[serde(default, rename = "use-ssh")]
    pub use_ssh: Option<bool>,
    #[serde(default)]
    pub fetch: Option<bool>,
}

/// `[resolver]` in `kiln.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default, rename = "max-expansions")]
    pub max_expansions: Option<usize>,
}

impl GlobalConfig {
    /// Load the global configuration from `~/.kiln/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> Result<Self, KilnError> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, KilnError> {
        load_toml(path, "global config")
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

impl ProjectConfig {
    /// Load `kiln.toml` from the project root, or defaults if absent.
    pub fn load(project_root: &Path) -> Result<Self, KilnError> {
        load_toml(&project_root.join(PROJECT_CONFIG_FILE), "project config")
    }
}

fn load_toml<T>(path: &Path, what: &str) -> Result<T, KilnError>
where
    T: Default + for<'de> Deserialize<'de>,
{
    if !path.is_file() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| KilnError::Config {
        message: format!("Failed to read {what} {}: {e}", path.display()),
    })?;
    toml::from_str(&content).map_err(|e| KilnError::Config {
        message: format!("Failed to parse {what} {}: {e}", path.display()),
    })
}

/// Effective settings for one invocation: global config, then `kiln.toml`,
/// then command-line flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root_path: PathBuf,
    pub use_ssh: bool,
    pub fetch: bool,
    pub max_expansions: usize,
    pub repo_overrides: BTreeMap<String, String>,
    pub cache_dir: PathBuf,
}

impl Settings {
    /// Merge the global and project configuration for `root_path`.
    pub fn resolve(root_path: &Path, global: &GlobalConfig, project: &ProjectConfig) -> Self {
        Self {
            root_path: root_path.to_path_buf(),
            use_ssh: project.defaults.use_ssh.unwrap_or(global.git.use_ssh),
            fetch: project.defaults.fetch.unwrap_or(true),
            max_expansions: project
                .resolver
                .max_expansions
                .unwrap_or(DEFAULT_MAX_EXPANSIONS),
            repo_overrides: project.repo_overrides.clone(),
            cache_dir: expand_home(&global.cache.dir),
        }
    }

    /// Load both config files from their default locations.
    pub fn load(root_path: &Path) -> Result<Self, KilnError> {
        let global = GlobalConfig::load()?;
        let project = ProjectConfig::load(root_path)?;
        Ok(Self::resolve(root_path, &global, &project))
    }

    /// Apply command-line overrides; `None` leaves the configured value.
    pub fn with_cli(mut self, use_ssh: Option<bool>, fetch: Option<bool>) -> Self {
        if let Some(v) = use_ssh {
            self.use_ssh = v;
        }
        if let Some(v) = fetch {
            self.fetch = v;
        }
        self
    }

    pub fn manifest_options(&self) -> ManifestOptions {
        ManifestOptions {
            overrides: self.repo_overrides.clone(),
        }
    }

    /// `<root>/Kiln`: everything kiln writes inside the project.
    pub fn kiln_path(&self) -> PathBuf {
        self.root_path.join("Kiln")
    }

    /// `<root>/Kiln/Checkouts`: one working copy per dependency.
    pub fn checkouts_path(&self) -> PathBuf {
        self.kiln_path().join("Checkouts")
    }

    /// `<root>/Kiln/Build`: shared build products directory.
    pub fn build_path(&self) -> PathBuf {
        self.kiln_path().join("Build")
    }

    /// `<cache>/repos`: bare mirrors of remote repositories.
    pub fn repo_cache_path(&self) -> PathBuf {
        self.cache_dir.join("repos")
    }
}

/// Returns the path to the kiln data directory (`~/.kiln/`).
pub fn dirs_path() -> PathBuf {
    home_dir().join(".kiln")
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None if path == "~" => home_dir(),
        None => PathBuf::from(path),
    }
}
