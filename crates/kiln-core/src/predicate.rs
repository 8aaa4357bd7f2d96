//! Declared version constraints.

use std::fmt;

use kiln_util::errors::KilnError;

use crate::version::SemanticVersion;

/// The comparison a predicate performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionOperator {
    Any,
    Exact,
    AtLeast,
    Compatible,
    Named,
}

/// A version constraint attached to a dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionPredicate {
    /// No constraint.
    Any,
    /// `== 1.2.3`: exactly this tag.
    Exact(SemanticVersion),
    /// `>= 1.2.3`: this version or newer.
    AtLeast(SemanticVersion),
    /// `~> 1.2` / `~> 1.2.3`: newer within the same major (or major.minor).
    Compatible(SemanticVersion),
    /// `"name"`: a commit, branch or tag resolved structurally.
    Named(String),
}

impl VersionPredicate {
    /// Parse the predicate part of a manifest line. An empty string is `Any`.
    pub fn parse(text: &str) -> Result<Self, KilnError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(VersionPredicate::Any);
        }

        if let Some(rest) = text.strip_prefix('"') {
            let name = rest.strip_suffix('"').ok_or_else(|| KilnError::Manifest {
                message: format!("unterminated quoted revision: {text}"),
            })?;
            if name.is_empty() || name.contains('"') {
                return Err(KilnError::Manifest {
                    message: format!("invalid quoted revision: {text}"),
                });
            }
            return Ok(VersionPredicate::Named(name.to_string()));
        }

        let operator = text.get(..2).unwrap_or(text);
        let value = text.get(2..).unwrap_or("");
        let version = || {
            SemanticVersion::parse(value).ok_or_else(|| KilnError::Manifest {
                message: format!("invalid version `{}` in predicate `{text}`", value.trim()),
            })
        };
        match operator {
            "==" => Ok(VersionPredicate::Exact(version()?)),
            ">=" => Ok(VersionPredicate::AtLeast(version()?)),
            "~>" => Ok(VersionPredicate::Compatible(version()?)),
            _ => Err(KilnError::Manifest {
                message: format!("unrecognised predicate `{text}`"),
            }),
        }
    }

    pub fn operator(&self) -> VersionOperator {
        match self {
            VersionPredicate::Any => VersionOperator::Any,
            VersionPredicate::Exact(_) => VersionOperator::Exact,
            VersionPredicate::AtLeast(_) => VersionOperator::AtLeast,
            VersionPredicate::Compatible(_) => VersionOperator::Compatible,
            VersionPredicate::Named(_) => VersionOperator::Named,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, VersionPredicate::Any)
    }
}

impl fmt::Display for VersionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionPredicate::Any => f.write_str("*"),
            VersionPredicate::Exact(v) => write!(f, "== {v}"),
            VersionPredicate::AtLeast(v) => write!(f, ">= {v}"),
            VersionPredicate::Compatible(v) => write!(f, "~> {v}"),
            VersionPredicate::Named(name) => write!(f, "\"{name}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_operators() {
        assert_eq!(VersionPredicate::parse("").unwrap(), VersionPredicate::Any);
        assert_eq!(
            VersionPredicate::parse("== 1.0").unwrap().operator(),
            VersionOperator::Exact
        );
        assert_eq!(
            VersionPredicate::parse(">=1.2.3").unwrap().operator(),
            VersionOperator::AtLeast
        );
        assert_eq!(
            VersionPredicate::parse("~> 1.2").unwrap().operator(),
            VersionOperator::Compatible
        );
        assert_eq!(
            VersionPredicate::parse("\"develop\"").unwrap(),
            VersionPredicate::Named("develop".to_string())
        );
    }

    #[test]
    fn compatible_keeps_precision() {
        match VersionPredicate::parse("~> 1.2").unwrap() {
            VersionPredicate::Compatible(v) => assert_eq!(v.components(), 2),
            other => panic!("unexpected predicate {other:?}"),
        }
    }

    #[test]
    fn display_round_trips() {
        for text in ["== 1.0", ">= 2.1.0", "~> 1.2", "\"abc123\""] {
            let p = VersionPredicate::parse(text).unwrap();
            assert_eq!(p.to_string(), text);
            assert_eq!(VersionPredicate::parse(&p.to_string()).unwrap(), p);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(VersionPredicate::parse("<= 1.0").is_err());
        assert!(VersionPredicate::parse("== banana").is_err());
        assert!(VersionPredicate::parse("\"open").is_err());
        assert!(VersionPredicate::parse("\"\"").is_err());
        assert!(VersionPredicate::parse("1.0").is_err());
    }
}
