//! Operation: display the dependency tree.

use std::path::Path;

use kiln_resolver::resolver::Resolution;
use kiln_source::session::ProjectSources;

use crate::{load_settings, resolve_fresh, SourceOptions};

/// Options for `kiln tree`.
#[derive(Debug, Default, Clone)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the path from the root to this project.
    pub why: Option<String>,
    /// Show dependents instead of dependencies.
    pub inverted: bool,
    pub source: SourceOptions,
}

/// Resolve and print the tree.
pub fn tree(project_root: &Path, opts: &TreeOptions) -> miette::Result<()> {
    let settings = load_settings(project_root, &opts.source)?;
    let sources = ProjectSources::new(settings);
    let resolution = resolve_fresh(&sources, false)?;
    print!("{}", render(&resolution, opts));
    Ok(())
}

/// The text `kiln tree` prints for `resolution`.
pub fn render(resolution: &Resolution, opts: &TreeOptions) -> String {
    let graph = &resolution.graph;

    if let Some(ref target) = opts.why {
        if opts.inverted {
            let inverted = graph.print_inverted_tree(target);
            if inverted.is_empty() {
                return format!("Dependency '{target}' not found in the graph.\n");
            }
            return inverted;
        }
        return match graph.find_path(target) {
            Some(path) => {
                let mut out = format!("Path to {target}:\n");
                for (i, node) in path.iter().enumerate() {
                    out.push_str(&format!("{}{node}\n", "  ".repeat(i)));
                }
                out
            }
            None => format!("Dependency '{target}' not found in the graph.\n"),
        };
    }

    if opts.inverted {
        if graph.is_empty() {
            return "No dependencies.\n".to_string();
        }
        return graph
            .all_nodes()
            .iter()
            .filter(|node| !node.identifier.is_root())
            .map(|node| graph.print_inverted_tree(node.identifier.link()))
            .collect::<Vec<_>>()
            .join("\n");
    }

    graph.print_tree(opts.depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops_resolve::{resolve, ResolveCommandOptions};
    use crate::test_support::local_workspace;

    fn resolved() -> (tempfile::TempDir, Resolution) {
        let tmp = tempfile::tempdir().unwrap();
        let app = local_workspace(tmp.path());
        let resolution = resolve(&app, &ResolveCommandOptions::default()).unwrap();
        (tmp, resolution)
    }

    #[test]
    fn full_tree_and_depth_limit() {
        let (_tmp, resolution) = resolved();
        let full = render(&resolution, &TreeOptions::default());
        assert_eq!(full, "App\n└── Shared local\n    └── Util local\n");

        let shallow = render(
            &resolution,
            &TreeOptions {
                depth: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(shallow, "App\n└── Shared local\n");
    }

    #[test]
    fn why_shows_path_from_root() {
        let (_tmp, resolution) = resolved();
        let opts = TreeOptions {
            why: Some("Util".to_string()),
            ..Default::default()
        };
        assert_eq!(
            render(&resolution, &opts),
            "Path to Util:\nApp\n  Shared local\n    Util local\n"
        );

        let missing = TreeOptions {
            why: Some("Nope".to_string()),
            ..Default::default()
        };
        assert_eq!(
            render(&resolution, &missing),
            "Dependency 'Nope' not found in the graph.\n"
        );
    }

    #[test]
    fn inverted_lists_dependents() {
        let (_tmp, resolution) = resolved();
        let opts = TreeOptions {
            why: Some("Util".to_string()),
            inverted: true,
            ..Default::default()
        };
        assert_eq!(
            render(&resolution, &opts),
            "Util local\n└── Shared local\n    └── App\n"
        );
    }
}
