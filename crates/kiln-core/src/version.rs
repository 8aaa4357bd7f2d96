//! Semantic versions as written in tags and predicates.
//!
//! Tags in the wild are looser than semver: `v1.2`, `2.0`, `1.4.0-beta.1`.
//! Missing minor/patch components are padded with zero, a leading `v` is
//! dropped, and the number of components actually written is kept so that
//! `~> 1.2` and `~> 1.2.0` can mean different things.

use std::cmp::Ordering;
use std::fmt;

use semver::Version;

/// A parsed semantic version plus the text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticVersion {
    raw: String,
    version: Version,
    components: u8,
}

impl SemanticVersion {
    /// Parse a tag or predicate value. Returns `None` for anything that is not
    /// a 1-3 component numeric version with optional pre-release/build suffix.
    pub fn parse(text: &str) -> Option<Self> {
        let raw = text.trim();
        let body = raw
            .strip_prefix('v')
            .or_else(|| raw.strip_prefix('V'))
            .unwrap_or(raw);

        let split = body.find(['-', '+']).unwrap_or(body.len());
        let (core, suffix) = body.split_at(split);

        let mut numbers = Vec::with_capacity(3);
        for part in core.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            numbers.push(part.parse::<u64>().ok()?);
        }
        if numbers.is_empty() || numbers.len() > 3 {
            return None;
        }
        let components = numbers.len() as u8;
        numbers.resize(3, 0);

        let normalized = format!("{}.{}.{}{suffix}", numbers[0], numbers[1], numbers[2]);
        let version = Version::parse(&normalized).ok()?;
        Some(Self {
            raw: raw.to_string(),
            version,
            components,
        })
    }

    /// The normalized semver value.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// How many numeric components were written (1-3).
    pub fn components(&self) -> u8 {
        self.components
    }

    /// The text as written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }

    /// Compare by semver precedence (build metadata ignored).
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.version.cmp_precedence(&other.version)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
