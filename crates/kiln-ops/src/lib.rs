pub mod ops_clean;
pub mod ops_fetch;
pub mod ops_graph;
pub mod ops_resolve;
pub mod ops_tree;
pub mod ops_update;

use std::path::Path;

use kiln_core::config::Settings;
use kiln_core::manifest::MANIFEST_FILE;
use kiln_resolver::resolver::{Resolution, ResolveOptions, Resolver};
use kiln_source::session::ProjectSources;
use kiln_util::errors::KilnError;

/// Written next to the manifest by `kiln resolve --export-diagnostics`.
pub const DIAGNOSTICS_FILE: &str = "kiln-diagnostics.json";

/// Command-line overrides for how sources are reached.
#[derive(Debug, Default, Clone)]
pub struct SourceOptions {
    pub use_ssh: Option<bool>,
    pub fetch: Option<bool>,
}

/// Effective settings for the project at `project_root`, which must hold a `Kilnfile`.
pub fn load_settings(project_root: &Path, opts: &SourceOptions) -> miette::Result<Settings> {
    if !project_root.join(MANIFEST_FILE).is_file() {
        return Err(KilnError::Manifest {
            message: format!("No {MANIFEST_FILE} found in {}", project_root.display()),
        }
        .into());
    }
    Ok(Settings::load(project_root)?.with_cli(opts.use_ssh, opts.fetch))
}

/// Resolve from the manifest alone, ignoring any lock file.
pub(crate) fn resolve_fresh(
    sources: &ProjectSources,
    record_diagnostics: bool,
) -> miette::Result<Resolution> {
    let options = ResolveOptions {
        max_expansions: sources.settings().max_expansions,
        record_diagnostics,
    };
    let resolution = Resolver::new(sources, sources.root().clone())
        .with_options(options)
        .resolve_build_order()?;
    Ok(resolution)
}
