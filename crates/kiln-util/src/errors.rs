use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all kiln operations.
#[derive(Debug, Error, Diagnostic)]
pub enum KilnError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed manifest (`Kilnfile` or `Kilnfile.resolved`).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Each line must read: <git|github|local> \"<link>\" [predicate]"))]
    Manifest { message: String },

    /// A manifest declares a source kind no dependency source can handle.
    #[error("Unknown source kind `{kind}` in {location}")]
    #[diagnostic(help("Supported source kinds are `git`, `github` and `local`"))]
    UnknownSourceKind { kind: String, location: String },

    /// A named ref, tag or commit does not exist for a project.
    #[error("No such revision `{revision}` for {project}")]
    NoSuchRevision { project: String, revision: String },

    /// The accumulated predicates for a project admit no candidate revision.
    #[error("Unsatisfiable constraints for {project}: {predicates}")]
    #[diagnostic(help("Relax one of the listed requirements so they share a version"))]
    UnsatisfiableConstraint { project: String, predicates: String },

    /// A project appears on its own dependency path.
    #[error("Dependency cycle detected: {path}")]
    CycleDetected { path: String },

    /// The re-expansion budget for a project was exhausted.
    #[error("Resolution did not converge: {project} was expanded {attempts} times")]
    #[diagnostic(help("Raise `max-expansions` under [resolver] in kiln.toml if this is expected"))]
    ResolutionDidNotConverge { project: String, attempts: usize },

    /// A git invocation failed.
    #[error("Git error: {message}")]
    Git { message: String },

    /// Invalid configuration file.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type KilnResult<T> = miette::Result<T>;
