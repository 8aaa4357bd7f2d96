//! Concrete dependency sources: where candidate revisions, manifests and
//! working copies of each project come from.

pub mod checkout;
pub mod git;
pub mod local;
pub mod provider;
pub mod session;
