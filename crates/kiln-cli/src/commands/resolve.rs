//! Handler for `kiln resolve`.

use miette::Result;

use kiln_ops::ops_resolve::{self, ResolveCommandOptions};
use kiln_ops::SourceOptions;

pub fn exec(export_diagnostics: bool, source: SourceOptions) -> Result<()> {
    let project_root = super::project_root()?;
    let opts = ResolveCommandOptions {
        export_diagnostics,
        source,
    };
    let resolution = ops_resolve::resolve(&project_root, &opts)?;
    for node in resolution.dependencies() {
        println!("{node}");
    }
    Ok(())
}
