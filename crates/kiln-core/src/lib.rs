//! Core data types for kiln.
//!
//! This crate defines the value types the resolver consumes: project
//! identifiers, semantic versions, version predicates, revisions and
//! specifications, together with the `Kilnfile` / `Kilnfile.resolved` line
//! grammar and the layered configuration.
//!
//! This crate is intentionally free of async code, git and network I/O.

pub mod config;
pub mod identifier;
pub mod lockfile;
pub mod manifest;
pub mod predicate;
pub mod revision;
pub mod specification;
pub mod version;
