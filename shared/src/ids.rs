//! Qualified identifiers (`namespace:path`) for effects and rendering primitives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Namespace used when an identifier is written without one.
pub const DEFAULT_NAMESPACE: &str = "aurafx";

/// Error produced when a string is not a valid qualified identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,
    #[error("invalid namespace '{0}'")]
    InvalidNamespace(String),
    #[error("invalid path '{0}'")]
    InvalidPath(String),
}

/// A qualified identifier: `namespace:path`.
///
/// Used both as the key of an effect definition and as the reference to a
/// rendering primitive inside a placement layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EffectId {
    namespace: String,
    path: String,
}

impl EffectId {
    /// Build an identifier from its parts, validating both.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, IdError> {
        let namespace = namespace.into();
        let path = path.into();
        if !is_valid_namespace(&namespace) {
            return Err(IdError::InvalidNamespace(namespace));
        }
        if !is_valid_path(&path) {
            return Err(IdError::InvalidPath(path));
        }
        Ok(Self { namespace, path })
    }

    /// Build an identifier from parts already known to be valid.
    pub(crate) fn from_static(namespace: &'static str, path: &'static str) -> Self {
        debug_assert!(is_valid_namespace(namespace) && is_valid_path(path));
        Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        }
    }

    /// Parse `namespace:path`, or a bare `path` in [`DEFAULT_NAMESPACE`].
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        match s.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, s),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for EffectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EffectId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EffectId> for String {
    fn from(id: EffectId) -> Self {
        id.to_string()
    }
}

/// Namespace rules: non-empty, `[a-z0-9_.-]` only.
fn is_valid_namespace(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-'))
}

/// Path rules: namespace rules plus `/`, and no empty segments.
fn is_valid_path(s: &str) -> bool {
    if s.is_empty() || s.starts_with('/') || s.ends_with('/') || s.contains("//") {
        return false;
    }
    s.chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-' | '/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qualified() {
        let id = EffectId::parse("aurafx:halo/gold").unwrap();
        assert_eq!(id.namespace(), "aurafx");
        assert_eq!(id.path(), "halo/gold");
        assert_eq!(id.to_string(), "aurafx:halo/gold");
    }

    #[test]
    fn test_parse_bare_path_uses_default_namespace() {
        let id = EffectId::parse("ember_ring").unwrap();
        assert_eq!(id.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(id.path(), "ember_ring");
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        assert_eq!(EffectId::parse(""), Err(IdError::Empty));
        assert!(matches!(
            EffectId::parse("Bad:thing"),
            Err(IdError::InvalidNamespace(_))
        ));
        assert!(matches!(
            EffectId::parse("ok:Upper"),
            Err(IdError::InvalidPath(_))
        ));
        assert!(EffectId::parse("ok:a//b").is_err());
        assert!(EffectId::parse("ok:/lead").is_err());
        assert!(EffectId::parse(":path").is_err());
        assert!(EffectId::parse("ns:").is_err());
    }

    #[test]
    fn test_ordering_is_by_namespace_then_path() {
        let mut ids = vec![
            EffectId::parse("b:a").unwrap(),
            EffectId::parse("a:z").unwrap(),
            EffectId::parse("a:b").unwrap(),
        ];
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a:b", "a:z", "b:a"]);
    }
}
