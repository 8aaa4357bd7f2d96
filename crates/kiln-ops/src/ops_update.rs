//! Operation: re-resolve from the manifest and check out the result.

use std::path::Path;
use std::sync::Arc;

use kiln_source::checkout::Checkout;
use kiln_source::session::ProjectSources;

use crate::ops_fetch::checkout_resolution;
use crate::ops_resolve::resolve_and_write;
use crate::{load_settings, SourceOptions};

/// Options for `kiln update`.
#[derive(Debug, Default, Clone)]
pub struct UpdateOptions {
    /// Only check out these projects after resolving; empty means all.
    pub deps: Vec<String>,
    pub source: SourceOptions,
}

/// Resolve to the newest allowed revisions, rewrite the lock and check out.
pub async fn update(project_root: &Path, opts: &UpdateOptions) -> miette::Result<Vec<Checkout>> {
    let settings = load_settings(project_root, &opts.source)?;
    let sources = Arc::new(ProjectSources::new(settings));
    let resolution = resolve_and_write(&sources, false)?;
    checkout_resolution(sources, &resolution, &opts.deps).await
}
