use std::collections::BTreeSet;
use std::fmt;

use super::element::Element;
use super::keystring::ChangeableTag;

/// Tag written by the `name` action.
pub const LABEL_TAG: &str = "mkgmap:label:1";

/// Where the value written by an action comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Literal(String),
    /// The current value of another tag on the same element.
    FromTag(String),
}

impl TagValue {
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        TagValue::Literal(value.into())
    }

    #[must_use]
    pub fn from_tag(key: impl Into<String>) -> Self {
        TagValue::FromTag(key.into())
    }

    fn resolve<'a>(&'a self, element: &'a Element) -> Option<&'a str> {
        match self {
            TagValue::Literal(v) => Some(v),
            TagValue::FromTag(key) => element.tag(key),
        }
    }

    /// What writing this value to `key` may produce.
    fn changeable(&self, key: &str) -> ChangeableTag {
        match self {
            TagValue::Literal(v) => ChangeableTag::KeyValue(key.to_owned(), v.clone()),
            TagValue::FromTag(_) => ChangeableTag::Key(key.to_owned()),
        }
    }
}

/// The first alternative that resolves against the element.
fn first_value(values: &[TagValue], element: &Element) -> Option<String> {
    values
        .iter()
        .find_map(|v| v.resolve(element))
        .map(str::to_owned)
}

/// A single tag mutation performed when a rule matches.
///
/// `AddTag`, `SetTag` and `Name` carry `|`-separated alternatives: the first
/// one that resolves is written, and nothing happens if none does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Add the tag only if the element does not already carry it.
    AddTag { key: String, values: Vec<TagValue> },
    /// Set the tag, replacing any existing value.
    SetTag { key: String, values: Vec<TagValue> },
    DeleteTag { key: String },
    /// Move the value of `from` to `to`, replacing any value `to` had.
    Rename { from: String, to: String },
    /// Give the element a label unless it already has one.
    Name { values: Vec<TagValue> },
}

impl Action {
    /// Apply this action to the element. Returns `true` if a tag changed.
    pub fn perform(&self, element: &mut Element) -> bool {
        match self {
            Action::AddTag { key, values } => add(element, key, values),
            Action::SetTag { key, values } => match first_value(values, element) {
                Some(v) => {
                    let changed = element.tag(key) != Some(v.as_str());
                    element.set_tag(key, &v);
                    changed
                }
                None => false,
            },
            Action::DeleteTag { key } => element.delete_tag(key).is_some(),
            Action::Rename { from, to } => match element.delete_tag(from) {
                Some(v) => {
                    element.set_tag(to, &v);
                    true
                }
                None => false,
            },
            Action::Name { values } => add(element, LABEL_TAG, values),
        }
    }

    /// The tags this action may bring into existence or change to a new
    /// value. Deleting a tag cannot make any keystring hold, so deletes
    /// report nothing.
    #[must_use]
    pub fn changeable_tags(&self) -> Vec<ChangeableTag> {
        match self {
            Action::AddTag { key, values } | Action::SetTag { key, values } => {
                values.iter().map(|v| v.changeable(key)).collect()
            }
            Action::Name { values } => values.iter().map(|v| v.changeable(LABEL_TAG)).collect(),
            Action::Rename { to, .. } => vec![ChangeableTag::Key(to.clone())],
            Action::DeleteTag { .. } => Vec::new(),
        }
    }
}

fn add(element: &mut Element, key: &str, values: &[TagValue]) -> bool {
    if element.has_tag(key) {
        return false;
    }
    match first_value(values, element) {
        Some(v) => element.add_tag(key, &v),
        None => false,
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Literal(v) => write!(f, "'{v}'"),
            TagValue::FromTag(key) => write!(f, "${{{key}}}"),
        }
    }
}

struct Alternatives<'a>(&'a [TagValue]);

impl fmt::Display for Alternatives<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AddTag { key, values } => write!(f, "add {key}={}", Alternatives(values)),
            Action::SetTag { key, values } => write!(f, "set {key}={}", Alternatives(values)),
            Action::DeleteTag { key } => write!(f, "delete {key}"),
            Action::Rename { from, to } => write!(f, "rename {from} {to}"),
            Action::Name { values } => write!(f, "name {}", Alternatives(values)),
        }
    }
}

/// The ordered actions of a rule plus a summary of the tags they may change.
///
/// The summary only feeds the dispatch index closure; actions always run in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionList {
    actions: Vec<Action>,
    changeable: BTreeSet<ChangeableTag>,
}

impl ActionList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.changeable.extend(action.changeable_tags());
        self.actions.push(action);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[must_use]
    pub fn changeable_tags(&self) -> &BTreeSet<ChangeableTag> {
        &self.changeable
    }

    /// Run every action in order. Returns `true` if any tag changed.
    pub fn perform(&self, element: &mut Element) -> bool {
        let mut changed = false;
        for action in &self.actions {
            changed |= action.perform(element);
        }
        changed
    }
}

impl FromIterator<Action> for ActionList {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        let mut list = ActionList::new();
        for action in iter {
            list.push(action);
        }
        list
    }
}

impl fmt::Display for ActionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, " {action}")?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementKind;

    fn set(key: &str, value: &str) -> Action {
        Action::SetTag {
            key: key.into(),
            values: vec![TagValue::literal(value)],
        }
    }

    fn add(key: &str, value: &str) -> Action {
        Action::AddTag {
            key: key.into(),
            values: vec![TagValue::literal(value)],
        }
    }

    fn summary(action: &Action) -> Vec<String> {
        action
            .changeable_tags()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn add_respects_existing_value() {
        let mut el = Element::new(ElementKind::Way, 1).with_tag("fred", "1");
        assert!(!add("fred", "2").perform(&mut el));
        assert_eq!(el.tag("fred"), Some("1"));
    }

    #[test]
    fn set_overwrites() {
        let mut el = Element::new(ElementKind::Way, 1).with_tag("fred", "1");
        assert!(set("fred", "2").perform(&mut el));
        assert_eq!(el.tag("fred"), Some("2"));
        assert!(!set("fred", "2").perform(&mut el));
    }

    #[test]
    fn copy_from_other_tag() {
        let mut el = Element::new(ElementKind::Way, 1).with_tag("ref", "A1");
        let copy = Action::SetTag {
            key: "name".into(),
            values: vec![TagValue::from_tag("ref")],
        };
        assert!(copy.perform(&mut el));
        assert_eq!(el.tag("name"), Some("A1"));

        let missing = Action::AddTag {
            key: "label".into(),
            values: vec![TagValue::from_tag("int_ref")],
        };
        assert!(!missing.perform(&mut el));
        assert!(!el.has_tag("label"));
    }

    #[test]
    fn first_resolving_alternative_wins() {
        let action = Action::SetTag {
            key: "label".into(),
            values: vec![
                TagValue::from_tag("int_ref"),
                TagValue::from_tag("ref"),
                TagValue::literal("none"),
            ],
        };
        let mut el = Element::new(ElementKind::Way, 1).with_tag("ref", "A1");
        assert!(action.perform(&mut el));
        assert_eq!(el.tag("label"), Some("A1"));

        let mut bare = Element::new(ElementKind::Way, 2);
        assert!(action.perform(&mut bare));
        assert_eq!(bare.tag("label"), Some("none"));

        assert_eq!(summary(&action), vec!["label", "label", "label=none"]);
        assert_eq!(action.to_string(), "set label=${int_ref} | ${ref} | 'none'");
    }

    #[test]
    fn add_with_alternatives_keeps_existing_value() {
        let action = Action::AddTag {
            key: "access".into(),
            values: vec![TagValue::from_tag("motor_vehicle"), TagValue::literal("yes")],
        };
        let mut el = Element::new(ElementKind::Way, 1).with_tag("access", "no");
        assert!(!action.perform(&mut el));
        assert_eq!(el.tag("access"), Some("no"));
        assert_eq!(summary(&action), vec!["access", "access=yes"]);
    }

    #[test]
    fn rename_moves_the_value() {
        let action = Action::Rename {
            from: "old_name".into(),
            to: "name".into(),
        };
        let mut el = Element::new(ElementKind::Way, 1)
            .with_tag("old_name", "Mill Lane")
            .with_tag("name", "Station Road");
        assert!(action.perform(&mut el));
        assert_eq!(el.tag("name"), Some("Mill Lane"));
        assert!(!el.has_tag("old_name"));
        assert!(!action.perform(&mut el));
        assert_eq!(summary(&action), vec!["name"]);
        assert_eq!(action.to_string(), "rename old_name name");
    }

    #[test]
    fn name_picks_the_first_available_alternative() {
        let action = Action::Name {
            values: vec![TagValue::from_tag("name"), TagValue::from_tag("ref")],
        };
        let mut el = Element::new(ElementKind::Way, 1).with_tag("ref", "B12");
        assert!(action.perform(&mut el));
        assert_eq!(el.tag(LABEL_TAG), Some("B12"));

        // An existing label is kept.
        let mut labelled = Element::new(ElementKind::Way, 2)
            .with_tag("name", "High Street")
            .with_tag(LABEL_TAG, "keep");
        assert!(!action.perform(&mut labelled));
        assert_eq!(labelled.tag(LABEL_TAG), Some("keep"));

        let mut nothing = Element::new(ElementKind::Way, 3);
        assert!(!action.perform(&mut nothing));
        assert!(!nothing.has_tag(LABEL_TAG));

        assert_eq!(summary(&action), vec![LABEL_TAG, LABEL_TAG]);
    }

    #[test]
    fn delete_removes() {
        let mut el = Element::new(ElementKind::Way, 1).with_tag("fixme", "yes");
        let del = Action::DeleteTag { key: "fixme".into() };
        assert!(del.perform(&mut el));
        assert!(!del.perform(&mut el));
        assert!(del.changeable_tags().is_empty());
    }

    #[test]
    fn changeable_tags_summary() {
        let list: ActionList = vec![
            set("mkgmap:road-class", "2"),
            Action::SetTag {
                key: "name".into(),
                values: vec![TagValue::from_tag("ref")],
            },
            Action::DeleteTag { key: "fixme".into() },
            Action::Rename {
                from: "old_ref".into(),
                to: "ref".into(),
            },
            Action::Name {
                values: vec![TagValue::literal("unnamed")],
            },
        ]
        .into_iter()
        .collect();
        let tags: Vec<String> = list.changeable_tags().iter().map(ToString::to_string).collect();
        assert_eq!(
            tags,
            vec!["name", "ref", "mkgmap:label:1=unnamed", "mkgmap:road-class=2"]
        );
    }

    #[test]
    fn actions_run_in_order() {
        let list: ActionList = vec![add("fred", "1"), add("fred", "2"), set("abba", "x")]
            .into_iter()
            .collect();
        let mut el = Element::new(ElementKind::Way, 1);
        assert!(list.perform(&mut el));
        assert_eq!(el.tag("fred"), Some("1"));
        assert_eq!(list.to_string(), "{ add fred='1'; add fred='2'; set abba='x' }");
    }
}
