use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The OSM entity type an element was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

/// A map element carrying string tags.
///
/// The tag map is shared copy-on-write: cloning an element is cheap and the
/// map is only duplicated when one of the copies is modified. Forked copies
/// never observe each other's writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    kind: ElementKind,
    id: i64,
    tags: Arc<BTreeMap<String, String>>,
}

impl Element {
    /// Create an element without tags.
    #[must_use]
    pub fn new(kind: ElementKind, id: i64) -> Self {
        Self {
            kind,
            id,
            tags: Arc::new(BTreeMap::new()),
        }
    }

    /// Set a tag, replacing any previous value.
    #[must_use]
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.set_tag(key, value);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Set a tag, replacing any previous value.
    pub fn set_tag(&mut self, key: &str, value: &str) {
        if self.tag(key) == Some(value) {
            return;
        }
        Arc::make_mut(&mut self.tags).insert(key.to_owned(), value.to_owned());
    }

    /// Set a tag only if it is not already present. Returns `true` if the tag
    /// was added.
    pub fn add_tag(&mut self, key: &str, value: &str) -> bool {
        if self.has_tag(key) {
            return false;
        }
        Arc::make_mut(&mut self.tags).insert(key.to_owned(), value.to_owned());
        true
    }

    /// Remove a tag, returning its previous value.
    pub fn delete_tag(&mut self, key: &str) -> Option<String> {
        if !self.has_tag(key) {
            return None;
        }
        Arc::make_mut(&mut self.tags).remove(key)
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// True if both elements still share the same tag map allocation.
    #[must_use]
    pub fn shares_tags_with(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.tags, &other.tags)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        };
        write!(f, "{kind} {}", self.id)?;
        for (k, v) in self.tags() {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}
