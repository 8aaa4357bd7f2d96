//! Handler for `kiln fetch`.

use miette::Result;

use kiln_ops::ops_fetch::{self, FetchOptions};
use kiln_ops::SourceOptions;

pub async fn exec(deps: Vec<String>, source: SourceOptions) -> Result<()> {
    let project_root = super::project_root()?;
    ops_fetch::fetch(&project_root, &FetchOptions { deps, source }).await?;
    Ok(())
}
