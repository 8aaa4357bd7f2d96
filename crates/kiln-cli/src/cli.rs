//! CLI argument definitions for Kiln.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "A dependency manager for git-hosted projects",
    long_about = "Kiln resolves the dependencies declared in a Kilnfile to one revision per \
                  project, records them in Kilnfile.resolved and checks them out in build order."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// How remote sources are reached; overrides `kiln.toml` and the global config.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Use SSH URLs for GitHub projects
    #[arg(long)]
    pub use_ssh: bool,
    /// Do not refresh repository mirrors that already exist
    #[arg(long)]
    pub no_fetch: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve dependencies and write Kilnfile.resolved
    Resolve {
        /// Write every resolver decision to kiln-diagnostics.json
        #[arg(long)]
        export_diagnostics: bool,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Check out the dependencies recorded in Kilnfile.resolved
    Fetch {
        /// Only fetch these dependencies
        deps: Vec<String>,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Re-resolve dependencies and check out the result
    Update {
        /// Only check out these dependencies after resolving
        deps: Vec<String>,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Output the dependency graph in Graphviz dot format
    Graph {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Display the dependency tree
    Tree {
        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,
        /// Show why a dependency is included
        #[arg(long)]
        why: Option<String>,
        /// Show reverse dependencies
        #[arg(short, long)]
        inverted: bool,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Remove build products, checkouts and cached mirrors
    Clean {
        /// Also remove Kiln/Checkouts
        #[arg(long)]
        checkouts: bool,
        /// Also remove the repository mirror cache
        #[arg(long)]
        caches: bool,
        /// Remove everything kiln created
        #[arg(long)]
        all: bool,
    },
}

impl SourceArgs {
    /// Flags only ever switch a setting; absent flags defer to configuration.
    pub fn into_options(self) -> kiln_ops::SourceOptions {
        kiln_ops::SourceOptions {
            use_ssh: self.use_ssh.then_some(true),
            fetch: self.no_fetch.then_some(false),
        }
    }
}

/// Parse command-line arguments into a [`Cli`] struct.
pub fn parse() -> Cli {
    Cli::parse()
}
