//! Constraint matching: which revisions satisfy which predicates.
//!
//! Candidate lists are ordered newest first; every function here preserves
//! that order, so the first surviving revision is always the winner.

use std::cmp::Ordering;

use kiln_core::predicate::VersionPredicate;
use kiln_core::revision::{sort_by_precedence_desc, Revision};
use kiln_core::version::SemanticVersion;
use kiln_util::errors::KilnError;

/// Filter `candidates` by a single predicate, preserving order.
///
/// `Named` predicates can only be checked structurally here (by revision
/// name); use [`intersect`] to resolve names through a source.
pub fn match_candidates(predicate: &VersionPredicate, candidates: &[Revision]) -> Vec<Revision> {
    candidates
        .iter()
        .filter(|rev| match predicate {
            VersionPredicate::Named(name) => rev.name() == name,
            other => admits(other, rev),
        })
        .cloned()
        .collect()
}

/// True if `revision` satisfies a non-`Named` predicate.
///
/// Local revisions satisfy everything; commits only satisfy `Any`.
pub fn admits(predicate: &VersionPredicate, revision: &Revision) -> bool {
    if revision.is_local() {
        return true;
    }
    let version = match (predicate, revision.as_tag()) {
        (VersionPredicate::Any, _) => return true,
        (VersionPredicate::Named(name), _) => return revision.name() == name,
        (_, None) => return false,
        (_, Some(tag)) => tag.version(),
    };
    match predicate {
        VersionPredicate::Exact(bound) => version.cmp_precedence(bound) == Ordering::Equal,
        VersionPredicate::AtLeast(bound) => {
            prerelease_allowed(version, bound) && version.cmp_precedence(bound) != Ordering::Less
        }
        VersionPredicate::Compatible(bound) => {
            prerelease_allowed(version, bound)
                && version.cmp_precedence(bound) != Ordering::Less
                && within_compatible_range(version, bound)
        }
        VersionPredicate::Any | VersionPredicate::Named(_) => unreachable!("handled above"),
    }
}

/// Upper bound of `~>`: `~> 1.2.3` stays on 1.2.x, `~> 1.2` on 1.x,
/// and a `0.y` bound never leaves 0.y.
fn within_compatible_range(version: &SemanticVersion, bound: &SemanticVersion) -> bool {
    let (v, b) = (version.version(), bound.version());
    if v.major != b.major {
        return false;
    }
    if bound.components() >= 3 || b.major == 0 {
        return v.minor == b.minor;
    }
    true
}

/// Pre-release tags only satisfy a range whose bound is a pre-release of
/// the same major.minor.patch.
fn prerelease_allowed(version: &SemanticVersion, bound: &SemanticVersion) -> bool {
    if !version.is_prerelease() {
        return true;
    }
    let (v, b) = (version.version(), bound.version());
    bound.is_prerelease() && v.major == b.major && v.minor == b.minor && v.patch == b.patch
}

/// Revisions satisfying every predicate, newest first.
///
/// The canonical order is `candidates` sorted by precedence, followed by any
/// revisions produced by resolving `Named` predicates through `resolve_name`
/// (which are not necessarily in the candidate list, e.g. branch heads).
pub fn intersect<F>(
    predicates: &[&VersionPredicate],
    candidates: &[Revision],
    mut resolve_name: F,
) -> Result<Vec<Revision>, KilnError>
where
    F: FnMut(&str) -> Result<Revision, KilnError>,
{
    let mut named: Vec<(&str, Revision)> = Vec::new();
    for predicate in predicates {
        if let VersionPredicate::Named(name) = predicate {
            if !named.iter().any(|(n, _)| n == name) {
                named.push((name.as_str(), resolve_name(name)?));
            }
        }
    }

    let mut universe = candidates.to_vec();
    sort_by_precedence_desc(&mut universe);
    for (_, revision) in &named {
        if !universe.contains(revision) {
            universe.push(revision.clone());
        }
    }

    universe.retain(|revision| {
        predicates.iter().all(|predicate| match predicate {
            VersionPredicate::Named(name) => named
                .iter()
                .any(|(n, resolved)| n == name && resolved == revision),
            other => admits(other, revision),
        })
    });
    Ok(universe)
}
