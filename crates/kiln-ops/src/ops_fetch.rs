//! Operation: check out the locked dependencies.

use std::path::Path;
use std::sync::Arc;

use kiln_core::identifier::ProjectIdentifier;
use kiln_core::lockfile::{Lockfile, RESOLVED_FILE};
use kiln_core::predicate::VersionPredicate;
use kiln_core::revision::Revision;
use kiln_resolver::resolver::{Resolution, ResolveOptions, Resolver};
use kiln_resolver::source::DependencySource;
use kiln_source::checkout::Checkout;
use kiln_source::session::ProjectSources;
use kiln_util::errors::KilnError;
use kiln_util::fs::ensure_dir;
use kiln_util::progress::{progress_bar, spinner, status, status_warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::{load_settings, SourceOptions};

const MAX_CONCURRENT_CHECKOUTS: usize = 8;

/// Options for `kiln fetch`.
#[derive(Debug, Default, Clone)]
pub struct FetchOptions {
    /// Only check out these projects (by name); empty means all.
    pub deps: Vec<String>,
    pub source: SourceOptions,
}

/// Check out every locked dependency at its locked revision.
///
/// Without a lock file the project is resolved (and the lock written) first.
pub async fn fetch(project_root: &Path, opts: &FetchOptions) -> miette::Result<Vec<Checkout>> {
    let settings = load_settings(project_root, &opts.source)?;
    let sources = Arc::new(ProjectSources::new(settings));
    let lock_path = project_root.join(RESOLVED_FILE);

    let resolution = if lock_path.is_file() {
        resolve_locked(&sources, &lock_path)?
    } else {
        status_warn("Warning", &format!("No {RESOLVED_FILE} found, resolving first"));
        crate::ops_resolve::resolve_and_write(&sources, false)?
    };

    checkout_resolution(sources, &resolution, &opts.deps).await
}

/// Resolve with every lock entry pinned.
fn resolve_locked(sources: &ProjectSources, lock_path: &Path) -> miette::Result<Resolution> {
    let lock = Lockfile::from_path(lock_path, &sources.settings().manifest_options())?;
    let sp = spinner("Reading locked revisions...");
    let pins = pins_from_lock(sources, &lock);
    sp.finish_and_clear();

    let options = ResolveOptions {
        max_expansions: sources.settings().max_expansions,
        record_diagnostics: false,
    };
    let resolution = Resolver::new(sources, sources.root().clone())
        .with_options(options)
        .resolve_versions(pins?)?;

    for conflict in &resolution.conflicts.conflicts {
        status_warn("Conflict", &conflict.to_string());
    }
    Ok(resolution)
}

/// Turn lock entries into pins. Entries naming a revision that no longer
/// exists are dropped with a warning so they are re-resolved.
pub fn pins_from_lock(
    sources: &dyn DependencySource,
    lock: &Lockfile,
) -> Result<Vec<(ProjectIdentifier, Revision)>, KilnError> {
    let mut pins = Vec::new();
    for spec in lock.specifications() {
        let VersionPredicate::Named(name) = &spec.predicate else {
            continue;
        };
        match sources.revision_for_name(&spec.identifier, name) {
            Ok(revision) => pins.push((spec.identifier, revision)),
            Err(KilnError::NoSuchRevision { project, revision }) => {
                tracing::warn!("No such revision `{revision}` for {project}; ignoring the lock entry");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(pins)
}

/// Materialise the resolved projects matching `filter` under `Kiln/Checkouts`,
/// several at a time. Results come back in build order.
pub(crate) async fn checkout_resolution(
    sources: Arc<ProjectSources>,
    resolution: &Resolution,
    filter: &[String],
) -> miette::Result<Vec<Checkout>> {
    let settings = sources.settings().clone();
    let build_path = settings.build_path();
    ensure_dir(&build_path).map_err(KilnError::Io)?;

    let selected: Vec<Checkout> = resolution
        .dependencies()
        .filter(|node| node.identifier.matches(filter))
        .filter_map(|node| {
            let revision = node.version.clone()?;
            let has_dependencies = resolution
                .graph
                .find(&node.identifier)
                .is_some_and(|idx| !resolution.graph.dependencies_of(idx).is_empty());
            Some(Checkout::new(
                node.identifier.clone(),
                revision,
                has_dependencies,
                &settings,
            ))
        })
        .collect();

    let pb = progress_bar(selected.len() as u64, "Checking out");
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_CHECKOUTS));
    let mut join_set = JoinSet::new();

    for (index, checkout) in selected.into_iter().enumerate() {
        let provider = sources.provider(&checkout.identifier)?;
        let sem = Arc::clone(&semaphore);
        let build_path = build_path.clone();
        join_set.spawn(async move {
            let _permit = sem.acquire_owned().await.map_err(|e| KilnError::Generic {
                message: format!("checkout scheduler closed: {e}"),
            })?;
            let done = tokio::task::spawn_blocking(move || {
                checkout.prepare(&provider, &build_path).map(|()| checkout)
            })
            .await
            .map_err(|e| KilnError::Generic {
                message: format!("checkout task failed: {e}"),
            })??;
            Ok::<_, KilnError>((index, done))
        });
    }

    let mut finished = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        let result = joined.map_err(|e| KilnError::Generic {
            message: format!("checkout task failed: {e}"),
        })?;
        finished.push(result?);
        pb.inc(1);
    }
    pb.finish_and_clear();

    finished.sort_by_key(|(index, _)| *index);
    let checkouts: Vec<Checkout> = finished.into_iter().map(|(_, c)| c).collect();
    for checkout in &checkouts {
        status(
            "Checked out",
            &format!("{} {}", checkout.identifier.project_name(), checkout.revision),
        );
    }
    Ok(checkouts)
}
