//! Shared utilities for kiln.
//!
//! This crate provides cross-cutting concerns used by all other kiln crates:
//! the unified error type, filesystem helpers, hashing, external process
//! spawning (git), and terminal status output.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod progress;
