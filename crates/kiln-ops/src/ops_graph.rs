//! Operation: export the resolved dependency graph as Graphviz dot.

use std::path::{Path, PathBuf};

use kiln_source::session::ProjectSources;
use kiln_util::errors::KilnError;
use kiln_util::progress::status;

use crate::{load_settings, resolve_fresh, SourceOptions};

/// Options for `kiln graph`.
#[derive(Debug, Default, Clone)]
pub struct GraphOptions {
    /// Write here instead of stdout.
    pub output: Option<PathBuf>,
    pub source: SourceOptions,
}

/// Resolve and render the graph. Returns the dot text.
pub fn graph(project_root: &Path, opts: &GraphOptions) -> miette::Result<String> {
    let settings = load_settings(project_root, &opts.source)?;
    let sources = ProjectSources::new(settings);
    let resolution = resolve_fresh(&sources, false)?;
    let dot = resolution.graph.to_dot();

    match &opts.output {
        Some(path) => {
            kiln_util::fs::write_atomic(path, dot.as_bytes()).map_err(KilnError::Io)?;
            status("Wrote", &path.display().to_string());
        }
        None => print!("{dot}"),
    }
    Ok(dot)
}
