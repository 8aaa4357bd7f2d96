//! Handler for `kiln tree`.

use miette::Result;

use kiln_ops::ops_tree::{self, TreeOptions};
use kiln_ops::SourceOptions;

pub fn exec(
    depth: Option<usize>,
    why: Option<String>,
    inverted: bool,
    source: SourceOptions,
) -> Result<()> {
    let project_root = super::project_root()?;
    let opts = TreeOptions {
        depth,
        why,
        inverted,
        source,
    };
    ops_tree::tree(&project_root, &opts)
}
