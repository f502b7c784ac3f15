//! Requirement parsing
//!
//! Grammar: `PROJECT[EXTRA,...][OP VERSION[,OP VERSION...]]` with the
//! operators `==`, `!=`, `>=`, `<=`, `>` and `<`. Whitespace is allowed
//! around operators and separators.

use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use wheelhouse_errors::VersionError;

/// Normalize a project name
///
/// Names compare case-insensitively and treat runs of `-`, `_` and `.` as
/// a single `-`.
#[must_use]
pub fn normalize_project_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_separator = true;
            continue;
        }
        if pending_separator && !normalized.is_empty() {
            normalized.push('-');
        }
        pending_separator = false;
        normalized.push(ch.to_ascii_lowercase());
    }
    normalized
}

/// Comparison operator of a version constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
}

impl Operator {
    /// Two-character operators come first so `>=` is never read as `>`
    const ALL: [(&'static str, Self); 6] = [
        ("==", Self::Equal),
        ("!=", Self::NotEqual),
        (">=", Self::GreaterEqual),
        ("<=", Self::LessEqual),
        (">", Self::Greater),
        ("<", Self::Less),
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterEqual => ">=",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::Less => "<",
        }
    }

    /// Compare `candidate` against `target`
    #[must_use]
    pub fn matches(self, candidate: &Version, target: &Version) -> bool {
        match self {
            Self::Equal => candidate == target,
            Self::NotEqual => candidate != target,
            Self::GreaterEqual => candidate >= target,
            Self::LessEqual => candidate <= target,
            Self::Greater => candidate > target,
            Self::Less => candidate < target,
        }
    }

    fn split_prefix(input: &str) -> Option<(Self, &str)> {
        Self::ALL
            .iter()
            .find_map(|(symbol, op)| input.strip_prefix(symbol).map(|rest| (*op, rest)))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single version constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub op: Operator,
    pub version: Version,
}

impl Constraint {
    #[must_use]
    pub fn new(op: Operator, version: Version) -> Self {
        Self { op, version }
    }

    /// Check if a version satisfies this constraint
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.op.matches(version, &self.version)
    }

    fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let (op, rest) =
            Operator::split_prefix(trimmed).ok_or_else(|| VersionError::InvalidConstraint {
                input: trimmed.to_string(),
            })?;
        let version = Version::parse(rest).map_err(|_| VersionError::InvalidConstraint {
            input: trimmed.to_string(),
        })?;
        Ok(Self { op, version })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// A parsed package requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Normalized project name
    pub project: String,
    pub extras: BTreeSet<String>,
    /// Constraints in the order they were written
    pub constraints: Vec<Constraint>,
}

impl Requirement {
    /// Requirement for any release of `project`
    #[must_use]
    pub fn any(project: &str) -> Self {
        Self {
            project: normalize_project_name(project),
            extras: BTreeSet::new(),
            constraints: Vec::new(),
        }
    }

    /// Parse a requirement string
    ///
    /// An empty or whitespace-only string yields `Ok(None)`, meaning no
    /// requirement at all.
    ///
    /// # Errors
    ///
    /// Returns a `VersionError` if the project name, extras or any
    /// constraint is malformed.
    pub fn parse(input: &str) -> Result<Option<Self>, VersionError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }
        let invalid = || VersionError::InvalidRequirement {
            input: input.to_string(),
        };

        let name_end = input
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(input.len());
        let name = &input[..name_end];
        if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err(invalid());
        }

        let mut rest = input[name_end..].trim_start();
        let mut extras = BTreeSet::new();
        if let Some(after_bracket) = rest.strip_prefix('[') {
            let close = after_bracket.find(']').ok_or_else(invalid)?;
            for extra in after_bracket[..close].split(',') {
                let extra = extra.trim();
                if extra.is_empty() {
                    continue;
                }
                if !extra
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
                {
                    return Err(invalid());
                }
                extras.insert(extra.to_string());
            }
            rest = after_bracket[close + 1..].trim_start();
        }

        let constraints = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',')
                .map(Constraint::parse)
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Some(Self {
            project: normalize_project_name(name),
            extras,
            constraints,
        }))
    }

    /// Check if a version satisfies every constraint
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(version))
    }

    /// Check if this requirement accepts any version
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl FromStr for Requirement {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)?.ok_or_else(|| VersionError::InvalidRequirement {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.project)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        let constraints: Vec<String> = self.constraints.iter().map(ToString::to_string).collect();
        f.write_str(&constraints.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_project_name() {
        assert_eq!(normalize_project_name("Package_One"), "package-one");
        assert_eq!(normalize_project_name("foo-bar.baz"), "foo-bar-baz");
        assert_eq!(normalize_project_name("a__-b"), "a-b");
        assert_eq!(normalize_project_name("error_pkg"), "error-pkg");
    }

    #[test]
    fn test_parse_empty_is_none() {
        assert_eq!(Requirement::parse("").unwrap(), None);
        assert_eq!(Requirement::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_extras_and_constraint() {
        let req = Requirement::parse("foo-bar.baz[stuff]==1.2.3").unwrap().unwrap();
        assert_eq!(req.project, "foo-bar-baz");
        assert_eq!(req.extras.iter().collect::<Vec<_>>(), vec!["stuff"]);
        assert_eq!(req.constraints.len(), 1);
        assert_eq!(req.constraints[0].op, Operator::Equal);
        assert_eq!(req.constraints[0].version, Version::parse("1.2.3").unwrap());
    }

    #[test]
    fn test_parse_whitespace_and_multiple_constraints() {
        let req: Requirement = "package_one >= 1.0, < 1.2.4 ,!=1.1".parse().unwrap();
        assert_eq!(req.to_string(), "package-one>=1.0,<1.2.4,!=1.1");
        assert!(req.matches(&Version::parse("1.2.3").unwrap()));
        assert!(!req.matches(&Version::parse("1.1").unwrap()));
        assert!(!req.matches(&Version::parse("1.2.4").unwrap()));
    }

    #[test]
    fn test_display_renders_alpha_as_canonical() {
        let req: Requirement = "package-one == 1.2.3-alpha1".parse().unwrap();
        assert_eq!(req.to_string(), "package-one==1.2.3a1");
    }

    #[test]
    fn test_invalid_requirements() {
        assert!(Requirement::parse("foo ~= 1.0").is_err());
        assert!(Requirement::parse("foo == banana").is_err());
        assert!(Requirement::parse("foo[bar").is_err());
        assert!(Requirement::parse("==1.0").is_err());
    }

    #[test]
    fn test_bare_name_accepts_everything() {
        let req = Requirement::any("Package_Two");
        assert!(req.is_any());
        assert!(req.matches(&Version::parse("0.0.1.dev1").unwrap()));
        assert_eq!(req.to_string(), "package-two");
    }
}
