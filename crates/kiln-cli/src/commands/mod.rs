//! Command dispatch and handler modules.

mod clean;
mod fetch;
mod graph;
mod resolve;
mod tree;
mod update;

use std::path::PathBuf;

use kiln_core::manifest::MANIFEST_FILE;
use kiln_util::errors::KilnError;
use kiln_util::fs::find_ancestor_with;
use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve {
            export_diagnostics,
            source,
        } => resolve::exec(export_diagnostics, source.into_options()),
        Command::Fetch { deps, source } => fetch::exec(deps, source.into_options()).await,
        Command::Update { deps, source } => update::exec(deps, source.into_options()).await,
        Command::Graph { output, source } => graph::exec(output, source.into_options()),
        Command::Tree {
            depth,
            why,
            inverted,
            source,
        } => tree::exec(depth, why, inverted, source.into_options()),
        Command::Clean {
            checkouts,
            caches,
            all,
        } => clean::exec(checkouts, caches, all),
    }
}

/// The nearest directory at or above the current one holding a `Kilnfile`.
pub(crate) fn project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(KilnError::Io)?;
    let root = find_ancestor_with(&cwd, MANIFEST_FILE).ok_or_else(|| KilnError::Manifest {
        message: format!("Could not find {MANIFEST_FILE} in current or parent directories"),
    })?;
    Ok(root)
}
