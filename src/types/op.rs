use std::fmt;
use std::ops::Not;

use regex::Regex;

use super::element::Element;
use super::value::compare_values;

/// Ordering comparisons supported in tag predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

/// The shape of an [`Op`] node, without its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Value,
    Tag,
    Equals,
    Exists,
    NotExists,
    Compare(CompareOp),
    Regex,
    And,
    Or,
    Not,
    LinkedAlt,
}

/// A reference to a tag key on an element.
///
/// Only indexable references may become the dispatch key of a rule. Computed
/// values (lengths, derived flags and the like) are read through the same tag
/// lookup but are never used as an index key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagRef {
    key: String,
    indexable: bool,
}

impl TagRef {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            indexable: true,
        }
    }

    #[must_use]
    pub fn computed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            indexable: false,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn is_indexable(&self) -> bool {
        self.indexable
    }
}

/// A compiled regular expression that must match the whole tag value.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source` anchored at both ends.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`regex::Error`] if the pattern is invalid.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_owned(),
            regex,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Boolean predicate over an element's tags.
///
/// Binary and unary nodes own their children. `LinkedAlt` is the only list
/// shaped node: it chains independently keyed alternatives produced when a
/// top-level OR is split for indexing.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Value(String),
    Tag(TagRef),
    Equals(Box<Op>, Box<Op>),
    Exists(Box<Op>),
    NotExists(Box<Op>),
    Compare(CompareOp, Box<Op>, Box<Op>),
    Regex(Box<Op>, Pattern),
    And(Box<Op>, Box<Op>),
    Or(Box<Op>, Box<Op>),
    Not(Box<Op>),
    LinkedAlt(Box<Op>, Option<Box<Op>>),
}

impl Op {
    #[must_use]
    pub fn and(self, other: Op) -> Op {
        Op::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Op) -> Op {
        Op::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Op::Value(_) => NodeKind::Value,
            Op::Tag(_) => NodeKind::Tag,
            Op::Equals(..) => NodeKind::Equals,
            Op::Exists(_) => NodeKind::Exists,
            Op::NotExists(_) => NodeKind::NotExists,
            Op::Compare(op, ..) => NodeKind::Compare(*op),
            Op::Regex(..) => NodeKind::Regex,
            Op::And(..) => NodeKind::And,
            Op::Or(..) => NodeKind::Or,
            Op::Not(_) => NodeKind::Not,
            Op::LinkedAlt(..) => NodeKind::LinkedAlt,
        }
    }

    /// The left (or only) child of this node.
    #[must_use]
    pub fn first(&self) -> Option<&Op> {
        match self {
            Op::Value(_) | Op::Tag(_) => None,
            Op::Equals(a, _)
            | Op::Compare(_, a, _)
            | Op::And(a, _)
            | Op::Or(a, _)
            | Op::LinkedAlt(a, _) => Some(a),
            Op::Exists(a) | Op::NotExists(a) | Op::Regex(a, _) | Op::Not(a) => Some(a),
        }
    }

    /// The right child of a binary node, or the next alternative of a
    /// `LinkedAlt`.
    #[must_use]
    pub fn second(&self) -> Option<&Op> {
        match self {
            Op::Equals(_, b) | Op::Compare(_, _, b) | Op::And(_, b) | Op::Or(_, b) => Some(b),
            Op::LinkedAlt(_, next) => next.as_deref(),
            _ => None,
        }
    }

    /// The tag read by this node's key side, if it has one.
    #[must_use]
    pub fn key_ref(&self) -> Option<&TagRef> {
        match self {
            Op::Tag(t) => Some(t),
            Op::Equals(a, _)
            | Op::Exists(a)
            | Op::NotExists(a)
            | Op::Compare(_, a, _)
            | Op::Regex(a, _) => match a.as_ref() {
                Op::Tag(t) => Some(t),
                _ => None,
            },
            _ => None,
        }
    }

    /// True if this node can serve as a dispatch key on its own: an equality
    /// between an indexable tag and a literal, or an existence test on an
    /// indexable tag.
    #[must_use]
    pub fn is_indexable(&self) -> bool {
        let indexable_key = self.key_ref().is_some_and(TagRef::is_indexable);
        match self {
            Op::Equals(_, b) => indexable_key && matches!(b.as_ref(), Op::Value(_)),
            Op::Exists(_) => indexable_key,
            _ => false,
        }
    }

    /// True if this node is false whenever its key is absent, so it can be
    /// guarded with an existence test on that key.
    #[must_use]
    pub fn needs_exists(&self) -> bool {
        matches!(self, Op::Equals(..) | Op::Compare(..) | Op::Regex(..))
            && self.key_ref().is_some_and(TagRef::is_indexable)
    }

    /// The string value of a `Value` or `Tag` operand.
    fn operand<'a>(&'a self, element: &'a Element) -> Option<&'a str> {
        match self {
            Op::Value(v) => Some(v),
            Op::Tag(t) => element.tag(t.key()),
            _ => None,
        }
    }

    /// Evaluate this predicate directly against the element's current tags.
    ///
    /// This is the plain tree walk with no indexing involved.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Op::Value(_) => false,
            Op::Tag(t) => element.tag(t.key()).is_some(),
            Op::Equals(a, b) => match (a.operand(element), b.operand(element)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
            Op::Exists(a) => a.operand(element).is_some(),
            Op::NotExists(a) => a.operand(element).is_none(),
            Op::Compare(op, a, b) => match (a.operand(element), b.operand(element)) {
                (Some(x), Some(y)) => compare_values(x, *op, y),
                _ => false,
            },
            Op::Regex(a, pattern) => a.operand(element).is_some_and(|v| pattern.is_match(v)),
            Op::And(a, b) => a.matches(element) && b.matches(element),
            Op::Or(a, b) => a.matches(element) || b.matches(element),
            Op::Not(inner) => !inner.matches(element),
            Op::LinkedAlt(a, next) => {
                a.matches(element) || next.as_ref().is_some_and(|n| n.matches(element))
            }
        }
    }

    /// Iterate over the alternatives of a `LinkedAlt` chain. Any other node
    /// yields itself once.
    pub fn alternatives(&self) -> impl Iterator<Item = &Op> {
        let mut current = Some(self);
        std::iter::from_fn(move || {
            let op = current?;
            match op {
                Op::LinkedAlt(a, next) => {
                    current = next.as_deref();
                    Some(a.as_ref())
                }
                other => {
                    current = None;
                    Some(other)
                }
            }
        })
    }

    /// Chain alternatives into a `LinkedAlt`. A single alternative is returned
    /// unchanged.
    pub(crate) fn linked(mut alternatives: Vec<Op>) -> Option<Op> {
        let last = alternatives.pop()?;
        if alternatives.is_empty() {
            return Some(last);
        }
        let mut chain = Op::LinkedAlt(Box::new(last), None);
        while let Some(op) = alternatives.pop() {
            chain = Op::LinkedAlt(Box::new(op), Some(Box::new(chain)));
        }
        Some(chain)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

fn is_plain(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Value(v) if is_plain(v) => write!(f, "{v}"),
            Op::Value(v) => write!(f, "'{v}'"),
            Op::Tag(t) => write!(f, "{}", t.key()),
            Op::Equals(a, b) => write!(f, "{a}={b}"),
            Op::Exists(a) => write!(f, "{a}=*"),
            Op::NotExists(a) => write!(f, "{a}!=*"),
            Op::Compare(op, a, b) => write!(f, "{a}{op}{b}"),
            Op::Regex(a, p) => write!(f, "{a}~'{}'", p.as_str()),
            Op::And(a, b) => write!(f, "({a} & {b})"),
            Op::Or(a, b) => write!(f, "({a} | {b})"),
            Op::Not(inner) => write!(f, "!{inner}"),
            Op::LinkedAlt(a, None) => write!(f, "{a}"),
            Op::LinkedAlt(a, Some(next)) => write!(f, "{a} | {next}"),
        }
    }
}

impl Not for Op {
    type Output = Op;

    fn not(self) -> Op {
        Op::Not(Box::new(self))
    }
}

/// Intermediate builder for tag tests. Created by [`tag()`] or [`computed()`].
#[derive(Debug, Clone)]
pub struct TagExpr {
    tag: TagRef,
}

impl TagExpr {
    fn subject(&self) -> Box<Op> {
        Box::new(Op::Tag(self.tag.clone()))
    }

    fn compare(self, op: CompareOp, value: impl Into<String>) -> Op {
        Op::Compare(op, self.subject(), Box::new(Op::Value(value.into())))
    }

    #[must_use]
    pub fn eq(self, value: impl Into<String>) -> Op {
        Op::Equals(self.subject(), Box::new(Op::Value(value.into())))
    }

    #[must_use]
    pub fn ne(self, value: impl Into<String>) -> Op {
        !self.eq(value)
    }

    /// Equality between two tags of the same element.
    #[must_use]
    pub fn eq_tag(self, other: &str) -> Op {
        Op::Equals(self.subject(), Box::new(Op::Tag(TagRef::new(other))))
    }

    #[must_use]
    pub fn exists(self) -> Op {
        Op::Exists(self.subject())
    }

    #[must_use]
    pub fn not_exists(self) -> Op {
        Op::NotExists(self.subject())
    }

    #[must_use]
    pub fn gt(self, value: impl Into<String>) -> Op {
        self.compare(CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(self, value: impl Into<String>) -> Op {
        self.compare(CompareOp::Gte, value)
    }

    #[must_use]
    pub fn lt(self, value: impl Into<String>) -> Op {
        self.compare(CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(self, value: impl Into<String>) -> Op {
        self.compare(CompareOp::Lte, value)
    }

    /// Full-value regular expression match.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if `pattern` does not compile.
    pub fn regex(self, pattern: &str) -> Result<Op, regex::Error> {
        Ok(Op::Regex(self.subject(), Pattern::new(pattern)?))
    }
}

/// Start a test on an indexable tag.
#[must_use]
pub fn tag(key: &str) -> TagExpr {
    TagExpr {
        tag: TagRef::new(key),
    }
}

/// Start a test on a computed value, which is never used as a dispatch key.
#[must_use]
pub fn computed(key: &str) -> TagExpr {
    TagExpr {
        tag: TagRef::computed(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, ElementKind};

    fn way() -> Element {
        Element::new(ElementKind::Way, 1)
            .with_tag("highway", "primary")
            .with_tag("maxspeed", "50")
            .with_tag("name", "Long Lane")
    }

    #[test]
    fn tag_eq_builds_equals() {
        let op = tag("highway").eq("primary");
        assert_eq!(
            op,
            Op::Equals(
                Box::new(Op::Tag(TagRef::new("highway"))),
                Box::new(Op::Value("primary".to_owned())),
            )
        );
        assert!(op.is_indexable());
    }

    #[test]
    fn computed_keys_are_not_indexable() {
        assert!(!computed("length()").eq("10").is_indexable());
        assert!(!computed("length()").gt("10").needs_exists());
    }

    #[test]
    fn exists_is_indexable_compare_needs_exists() {
        assert!(tag("name").exists().is_indexable());
        assert!(!tag("name").not_exists().is_indexable());
        let cmp = tag("maxspeed").gt("30");
        assert!(!cmp.is_indexable());
        assert!(cmp.needs_exists());
    }

    #[test]
    fn tag_to_tag_equality_is_not_indexable() {
        let op = tag("name").eq_tag("ref");
        assert!(!op.is_indexable());
        assert!(op.needs_exists());
    }

    #[test]
    fn matches_equals_and_exists() {
        let el = way();
        assert!(tag("highway").eq("primary").matches(&el));
        assert!(!tag("highway").eq("secondary").matches(&el));
        assert!(tag("name").exists().matches(&el));
        assert!(tag("ref").not_exists().matches(&el));
        assert!(!tag("ref").eq("A1").matches(&el));
    }

    #[test]
    fn matches_numeric_compare() {
        let el = way();
        assert!(tag("maxspeed").gt("40").matches(&el));
        assert!(tag("maxspeed").lte("50").matches(&el));
        assert!(!tag("maxspeed").lt("50").matches(&el));
        assert!(!tag("ref").lt("50").matches(&el));
    }

    #[test]
    fn ne_is_true_when_tag_missing() {
        let el = way();
        assert!(tag("ref").ne("A1").matches(&el));
        assert!(!tag("highway").ne("primary").matches(&el));
    }

    #[test]
    fn regex_matches_whole_value() {
        let el = way();
        assert!(tag("name").regex("Long.*").unwrap().matches(&el));
        assert!(!tag("name").regex("Long").unwrap().matches(&el));
        assert!(tag("name").regex("[").is_err());
    }

    #[test]
    fn boolean_combinators() {
        let el = way();
        let op = tag("highway")
            .eq("primary")
            .and(tag("name").exists().or(tag("ref").exists()));
        assert!(op.matches(&el));
        assert!(!(!op).matches(&el));
    }

    #[test]
    fn accessors_walk_children() {
        let op = tag("a").eq("1").and(tag("b").exists());
        assert_eq!(op.kind(), NodeKind::And);
        assert_eq!(op.first().map(Op::kind), Some(NodeKind::Equals));
        assert_eq!(op.second().map(Op::kind), Some(NodeKind::Exists));
        assert_eq!(tag("a").exists().second(), None);
    }

    #[test]
    fn linked_chain_round_trips_alternatives() {
        let alts = vec![
            tag("natural").eq("water"),
            tag("natural").eq("wetland"),
            tag("landuse").eq("reservoir"),
        ];
        let chain = Op::linked(alts.clone()).unwrap();
        assert_eq!(chain.kind(), NodeKind::LinkedAlt);
        let collected: Vec<Op> = chain.alternatives().cloned().collect();
        assert_eq!(collected, alts);
    }

    #[test]
    fn single_alternative_is_not_wrapped() {
        let op = Op::linked(vec![tag("a").eq("1")]).unwrap();
        assert_eq!(op, tag("a").eq("1"));
        assert_eq!(Op::linked(Vec::new()), None);
    }

    #[test]
    fn display_formats() {
        let op = tag("highway").eq("primary").and(tag("name").regex("A.*").unwrap());
        assert_eq!(op.to_string(), "(highway=primary & name~'A.*')");
        assert_eq!(tag("name").eq("Long Lane").to_string(), "name='Long Lane'");
        assert_eq!((!tag("x").exists()).to_string(), "!x=*");
        assert_eq!(tag("maxspeed").gte("30").to_string(), "maxspeed>=30");
    }
}
