//! `Kilnfile` parsing.
//!
//! One declaration per line:
//!
//! ```text
//! # comment
//! github "owner/Networking" ~> 4.2
//! git "https://example.com/team/Json.git" >= 1.0
//! git "https://example.com/team/Logging.git" "develop"
//! local "../SharedKit"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use kiln_util::errors::KilnError;

use crate::identifier::{ProjectIdentifier, SourceKind};
use crate::predicate::VersionPredicate;
use crate::specification::Specification;

/// File name of a project's dependency manifest.
pub const MANIFEST_FILE: &str = "Kilnfile";

/// Options applied while turning manifest lines into identifiers.
#[derive(Debug, Clone, Default)]
pub struct ManifestOptions {
    /// Project name -> replacement link (see `[repo-overrides]` in `kiln.toml`).
    pub overrides: BTreeMap<String, String>,
}

/// A parsed manifest: the project's direct dependency declarations, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub specifications: Vec<Specification>,
}

impl Manifest {
    /// Load and parse a manifest file.
    pub fn from_path(path: &Path, options: &ManifestOptions) -> Result<Self, KilnError> {
        let content = std::fs::read_to_string(path).map_err(|e| KilnError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse(&content, &path.display().to_string(), options)
    }

    /// Parse manifest text. `origin` names the source in error messages.
    pub fn parse(content: &str, origin: &str, options: &ManifestOptions) -> Result<Self, KilnError> {
        let mut specifications = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let location = format!("{origin}:{}", index + 1);
            if let Some(spec) = parse_line(line, &location, options)? {
                specifications.push(spec);
            }
        }
        tracing::debug!(
            origin,
            count = specifications.len(),
            "parsed manifest"
        );
        Ok(Self { specifications })
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for spec in &self.specifications {
            writeln!(f, "{spec}")?;
        }
        Ok(())
    }
}

/// Parse a single line. Blank and comment-only lines yield `None`.
pub fn parse_line(
    line: &str,
    location: &str,
    options: &ManifestOptions,
) -> Result<Option<Specification>, KilnError> {
    let line = strip_comment(line).trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (keyword, rest) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    let kind = SourceKind::from_keyword(keyword).ok_or_else(|| KilnError::UnknownSourceKind {
        kind: keyword.to_string(),
        location: location.to_string(),
    })?;

    let rest = rest.trim_start();
    let after_quote = rest.strip_prefix('"').ok_or_else(|| KilnError::Manifest {
        message: format!("{location}: expected a quoted link after `{keyword}`"),
    })?;
    let (link, predicate_text) = after_quote.split_once('"').ok_or_else(|| KilnError::Manifest {
        message: format!("{location}: unterminated link"),
    })?;
    if link.is_empty() {
        return Err(KilnError::Manifest {
            message: format!("{location}: empty link"),
        });
    }

    let predicate = VersionPredicate::parse(predicate_text).map_err(|e| match e {
        KilnError::Manifest { message } => KilnError::Manifest {
            message: format!("{location}: {message}"),
        },
        other => other,
    })?;

    let mut identifier = ProjectIdentifier::new(kind, link);
    if let Some(target) = options.overrides.get(identifier.project_name()) {
        tracing::debug!(project = %identifier, %target, "applying repo override");
        identifier = identifier.with_override(target.clone());
    }
    Ok(Some(Specification::new(identifier, predicate)))
}

/// Cut a line at the first `#` that is not inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..i],
            _ => {}
        }
    }
    line
}
