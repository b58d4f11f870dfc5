use std::fmt;
use std::str::FromStr;

use super::element::Element;

/// Canonical dispatch key of a rule: `key=value` or `key=*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keystring {
    Exact { key: String, value: String },
    Exists { key: String },
}

impl Keystring {
    #[must_use]
    pub fn exact(key: impl Into<String>, value: impl Into<String>) -> Self {
        Keystring::Exact {
            key: key.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn exists(key: impl Into<String>) -> Self {
        Keystring::Exists { key: key.into() }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Keystring::Exact { key, .. } | Keystring::Exists { key } => key,
        }
    }

    /// True if the element's current tags satisfy this key.
    #[must_use]
    pub fn holds_for(&self, element: &Element) -> bool {
        match self {
            Keystring::Exact { key, value } => element.tag(key) == Some(value.as_str()),
            Keystring::Exists { key } => element.has_tag(key),
        }
    }
}

impl fmt::Display for Keystring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keystring::Exact { key, value } => write!(f, "{key}={value}"),
            Keystring::Exists { key } => write!(f, "{key}=*"),
        }
    }
}

impl FromStr for Keystring {
    type Err = crate::parse::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse::parse_keystring(s)
    }
}

/// A tag that a rule's actions may change, with the new value when it is
/// known at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeableTag {
    Key(String),
    KeyValue(String, String),
}

impl ChangeableTag {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            ChangeableTag::Key(key) | ChangeableTag::KeyValue(key, _) => key,
        }
    }
}

impl fmt::Display for ChangeableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeableTag::Key(key) => write!(f, "{key}"),
            ChangeableTag::KeyValue(key, value) => write!(f, "{key}={value}"),
        }
    }
}
