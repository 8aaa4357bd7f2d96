//! Dependency resolution engine: turns declared `(project, predicate)`
//! pairs, recursively expanded through each project's own manifest, into one
//! revision per project, an acyclic graph and a deterministic build order.

pub mod cache;
pub mod conflict;
pub mod diagnostics;
pub mod graph;
pub mod matcher;
pub mod resolver;
pub mod source;
