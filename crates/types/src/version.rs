//! Release version parsing and ordering
//!
//! Versions follow the Python packaging scheme:
//! - `1.2.3` - release segments, trailing zeros are insignificant
//! - `1!2.0` - epoch
//! - `1.2.3a1`, `1.2.3-beta.2`, `1.2.3rc1` - pre-releases
//! - `1.2.3.post1`, `1.2.3-1`, `1.2.3rev2` - post-releases
//! - `1.2.3.dev4` - development releases
//! - `1.2.3+ubuntu.1` - local version labels
//!
//! Ordering is dev < pre-release < release < post-release for the same
//! release segments, with a dev suffix sorting before the release it is
//! attached to.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use wheelhouse_errors::VersionError;

/// Pre-release phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

impl PreKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::Rc => "rc",
        }
    }
}

/// One dot-separated piece of a local version label
///
/// Numeric segments sort after alphanumeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalSegment {
    Text(String),
    Number(u64),
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A parsed release version
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreKind, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

/// Ordering helper placing a missing segment below or above every value
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Bound<T> {
    Below,
    At(T),
    Above,
}

impl Version {
    /// Parse a version string
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidVersion` if the input is not a valid version.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let lowered = input.trim().to_ascii_lowercase();
        let body = lowered.strip_prefix('v').unwrap_or(&lowered);
        Parser::new(body)
            .version()
            .ok_or_else(|| VersionError::InvalidVersion {
                input: input.to_string(),
            })
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    #[must_use]
    pub fn pre(&self) -> Option<(PreKind, u64)> {
        self.pre
    }

    #[must_use]
    pub fn post(&self) -> Option<u64> {
        self.post
    }

    #[must_use]
    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    #[must_use]
    pub fn local(&self) -> &[LocalSegment] {
        &self.local
    }

    fn trimmed_release(&self) -> &[u64] {
        let end = self
            .release
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |idx| idx + 1);
        &self.release[..end]
    }

    fn pre_key(&self) -> Bound<(PreKind, u64)> {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => Bound::Below,
            (None, _, _) => Bound::Above,
            (Some(pre), _, _) => Bound::At(pre),
        }
    }

    fn post_key(&self) -> Bound<u64> {
        self.post.map_or(Bound::Below, Bound::At)
    }

    fn dev_key(&self) -> Bound<u64> {
        self.dev.map_or(Bound::Above, Bound::At)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.trimmed_release().cmp(other.trimmed_release()))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post_key().cmp(&other.post_key()))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.epoch.hash(state);
        self.trimmed_release().hash(state);
        self.pre.hash(state);
        self.post.hash(state);
        self.dev.hash(state);
        self.local.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        for (idx, part) in self.release.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        if let Some((kind, n)) = self.pre {
            write!(f, "{}{n}", kind.as_str())?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if !self.local.is_empty() {
            let local: Vec<String> = self.local.iter().map(ToString::to_string).collect();
            write!(f, "+{}", local.join("."))?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Cursor over a lowercased version string
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

const PRE_LABELS: &[(&str, PreKind)] = &[
    ("preview", PreKind::Rc),
    ("alpha", PreKind::Alpha),
    ("beta", PreKind::Beta),
    ("pre", PreKind::Rc),
    ("rc", PreKind::Rc),
    ("a", PreKind::Alpha),
    ("b", PreKind::Beta),
    ("c", PreKind::Rc),
];

const POST_LABELS: &[&str] = &["post", "rev", "r"];

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn eat_separator(&mut self) -> bool {
        if matches!(self.peek(), Some(b'-' | b'_' | b'.')) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Option<u64> {
        let digits = self
            .rest()
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return None;
        }
        let value = self.rest()[..digits].parse().ok()?;
        self.pos += digits;
        Some(value)
    }

    /// A number optionally preceded by one separator; consumes nothing on failure
    fn separated_number(&mut self) -> Option<u64> {
        let start = self.pos;
        self.eat_separator();
        let value = self.number();
        if value.is_none() {
            self.pos = start;
        }
        value
    }

    fn version(mut self) -> Option<Version> {
        let first = self.number()?;
        let epoch;
        let mut release;
        if self.eat("!") {
            epoch = first;
            release = vec![self.number()?];
        } else {
            epoch = 0;
            release = vec![first];
        }
        while self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            release.push(self.number()?);
        }

        let pre = self.pre_release();
        let post = self.post_release();
        let dev = self.dev_release();
        let local = self.local()?;

        if self.pos != self.input.len() {
            return None;
        }

        Some(Version {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    fn pre_release(&mut self) -> Option<(PreKind, u64)> {
        let start = self.pos;
        self.eat_separator();
        for (label, kind) in PRE_LABELS {
            if self.eat(label) {
                let n = self.separated_number().unwrap_or(0);
                return Some((*kind, n));
            }
        }
        self.pos = start;
        None
    }

    fn post_release(&mut self) -> Option<u64> {
        let start = self.pos;
        if self.peek() == Some(b'-') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            return self.number();
        }
        self.eat_separator();
        for label in POST_LABELS {
            if self.eat(label) {
                return Some(self.separated_number().unwrap_or(0));
            }
        }
        self.pos = start;
        None
    }

    fn dev_release(&mut self) -> Option<u64> {
        let start = self.pos;
        self.eat_separator();
        if self.eat("dev") {
            return Some(self.separated_number().unwrap_or(0));
        }
        self.pos = start;
        None
    }

    /// `None` signals a malformed label, an absent label is an empty list
    fn local(&mut self) -> Option<Vec<LocalSegment>> {
        if !self.eat("+") {
            return Some(Vec::new());
        }
        let label = self.rest();
        self.pos = self.input.len();
        label
            .split(['-', '_', '.'])
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_alphanumeric()) {
                    None
                } else if let Ok(n) = segment.parse::<u64>() {
                    Some(LocalSegment::Number(n))
                } else {
                    Some(LocalSegment::Text(segment.to_string()))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_canonical_forms() {
        assert_eq!(v("1.2.3").to_string(), "1.2.3");
        assert_eq!(v("1.2.3-alpha1").to_string(), "1.2.3a1");
        assert_eq!(v("1.2.3.BETA.2").to_string(), "1.2.3b2");
        assert_eq!(v("1.0c1").to_string(), "1.0rc1");
        assert_eq!(v("1.2.4.post1").to_string(), "1.2.4.post1");
        assert_eq!(v("1.2.4-1").to_string(), "1.2.4.post1");
        assert_eq!(v("1.2.4rev").to_string(), "1.2.4.post0");
        assert_eq!(v("0.0.1.dev2").to_string(), "0.0.1.dev2");
        assert_eq!(v("v2!1.0+Ubuntu-1").to_string(), "2!1.0+ubuntu.1");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "py2", "1.2.3-py2", "1.0-", "1..0", "1.0+", "1.0+a..b", "none"] {
            assert!(Version::parse(input).is_err(), "{input} should not parse");
        }
    }

    #[test]
    fn test_ordering_of_phases() {
        let ordered = [
            "1.0.dev0", "1.0a1.dev1", "1.0a1", "1.0b1", "1.0rc1", "1.0", "1.0+local",
            "1.0.post1.dev1", "1.0.post1", "1.1",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_trailing_zeros_are_insignificant() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        assert_ne!(v("1.0"), v("1.0.1"));
    }

    #[test]
    fn test_local_numeric_beats_text() {
        assert!(v("1.0+abc") < v("1.0+5"));
        assert!(v("1.0+5") < v("1.0+5.1"));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("1.2.3-alpha1")).unwrap();
        assert_eq!(json, "\"1.2.3a1\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("1.2.3a1"));
    }
}
