//! Handler for `kiln clean`.

use console::style;
use miette::Result;

use kiln_ops::ops_clean::{self, CleanOptions, CleanResult};

pub fn exec(checkouts: bool, caches: bool, all: bool) -> Result<()> {
    let project_root = super::project_root()?;
    let opts = CleanOptions {
        checkouts,
        caches,
        all,
    };
    match ops_clean::clean(&project_root, &opts)? {
        CleanResult::Removed(paths) => {
            for path in paths {
                println!("{} {}", style("Removed").green().bold(), path.display());
            }
        }
        CleanResult::NothingToClean => println!("Nothing to clean"),
    }
    Ok(())
}
