//! Handler for `kiln update`.

use miette::Result;

use kiln_ops::ops_update::{self, UpdateOptions};
use kiln_ops::SourceOptions;

pub async fn exec(deps: Vec<String>, source: SourceOptions) -> Result<()> {
    let project_root = super::project_root()?;
    ops_update::update(&project_root, &UpdateOptions { deps, source }).await?;
    Ok(())
}
