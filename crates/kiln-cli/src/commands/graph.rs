//! Handler for `kiln graph`.

use std::path::PathBuf;

use miette::Result;

use kiln_ops::ops_graph::{self, GraphOptions};
use kiln_ops::SourceOptions;

pub fn exec(output: Option<PathBuf>, source: SourceOptions) -> Result<()> {
    let project_root = super::project_root()?;
    ops_graph::graph(&project_root, &GraphOptions { output, source })?;
    Ok(())
}
