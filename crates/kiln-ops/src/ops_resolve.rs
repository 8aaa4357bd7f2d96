//! Operation: resolve all dependencies and regenerate Kilnfile.resolved.

use std::path::Path;

use kiln_core::lockfile::RESOLVED_FILE;
use kiln_resolver::resolver::Resolution;
use kiln_source::session::ProjectSources;
use kiln_util::progress::{spinner, status, status_info};

use crate::{load_settings, resolve_fresh, SourceOptions, DIAGNOSTICS_FILE};

/// Options for `kiln resolve`.
#[derive(Debug, Default, Clone)]
pub struct ResolveCommandOptions {
    /// Also write every resolver decision to `kiln-diagnostics.json`.
    pub export_diagnostics: bool,
    pub source: SourceOptions,
}

/// Resolve from the manifest and write the lock file.
pub fn resolve(project_root: &Path, opts: &ResolveCommandOptions) -> miette::Result<Resolution> {
    let settings = load_settings(project_root, &opts.source)?;
    let sources = ProjectSources::new(settings);
    resolve_and_write(&sources, opts.export_diagnostics)
}

/// Shared by `resolve`, `update` and a `fetch` without a lock file.
///
/// Nothing is written unless resolution succeeds.
pub(crate) fn resolve_and_write(
    sources: &ProjectSources,
    export_diagnostics: bool,
) -> miette::Result<Resolution> {
    let root = &sources.settings().root_path;

    let sp = spinner("Resolving dependencies...");
    let result = resolve_fresh(sources, export_diagnostics);
    sp.finish_and_clear();
    let resolution = result?;

    for (index, node) in resolution.dependencies().enumerate() {
        tracing::debug!("{} {} ({})", index + 1, node, node.identifier.link());
    }

    resolution.to_lockfile().write_to(&root.join(RESOLVED_FILE))?;

    if let Some(log) = &resolution.diagnostics {
        let path = root.join(DIAGNOSTICS_FILE);
        log.write_to(&path)?;
        status_info("Diagnostics", &path.display().to_string());
    }

    status(
        "Resolved",
        &format!("{} dependencies", resolution.dependencies().count()),
    );
    Ok(resolution)
}
