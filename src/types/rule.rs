use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::action::ActionList;
use super::element::Element;
use super::feature_type::{FeatureType, DEFAULT_NAME_TAG};
use super::keystring::Keystring;
use super::op::Op;
use super::resolved::Resolved;

/// What happened when a rule was offered an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The predicate did not hold.
    Skipped,
    /// The rule matched but the search goes on: it only ran actions, or its
    /// type asked to continue.
    Continued,
    /// The rule matched with a terminal type.
    Resolved,
}

impl Outcome {
    pub(crate) fn matched(self) -> bool {
        self != Outcome::Skipped
    }
}

/// Per-element state of one resolution pass.
#[derive(Debug, Default)]
pub(crate) struct Pass {
    /// OR groups that already matched through one of their branches.
    linked: HashSet<usize>,
}

/// Receives the feature types chosen for an element.
pub(crate) trait TypeSink {
    fn add(&mut self, feature_type: &Arc<FeatureType>, element: Element);
}

impl TypeSink for Vec<Resolved> {
    fn add(&mut self, feature_type: &Arc<FeatureType>, element: Element) {
        self.push(Resolved::new(Arc::clone(feature_type), element));
    }
}

/// Sink of the finalize section. Finalize rules are rejected at compile time
/// if they carry a type, so reaching this is a compiler bug.
pub(crate) struct FinalizeSink;

impl TypeSink for FinalizeSink {
    fn add(&mut self, feature_type: &Arc<FeatureType>, _element: Element) {
        panic!("finalize rule produced feature type {feature_type}");
    }
}

/// The dispatch key a rule was registered under plus whatever is left of its
/// predicate once that key is taken off.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Condition {
    pub(crate) head: Keystring,
    pub(crate) residual: Option<Op>,
}

impl Condition {
    /// Both parts are checked against the element's current tags. A rule can
    /// be reached through the tag closure before its key actually holds.
    pub(crate) fn holds(&self, element: &Element) -> bool {
        self.head.holds_for(element) && self.residual.as_ref().map_or(true, |r| r.matches(element))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.residual {
            Some(residual) => write!(f, "{} & {residual}", self.head),
            None => write!(f, "{}", self.head),
        }
    }
}

/// An executable rule.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Rule {
    /// Unconditional mapping from a single tag to a type.
    Fixed {
        head: Keystring,
        feature_type: Arc<FeatureType>,
    },
    Expression {
        condition: Condition,
        feature_type: Arc<FeatureType>,
    },
    Action {
        condition: Condition,
        actions: ActionList,
        feature_type: Option<Arc<FeatureType>>,
    },
    /// Rules sharing a keystring, tried in registration order.
    Sequence(Vec<Rule>),
    /// One branch of a split OR. All branches share `group` so the rule
    /// fires at most once per element.
    Linked { group: usize, rule: Box<Rule> },
}

impl Rule {
    pub(crate) fn resolve(&self, element: &mut Element, pass: &mut Pass, sink: &mut dyn TypeSink) -> Outcome {
        match self {
            Rule::Fixed { head, feature_type } => {
                if !head.holds_for(element) {
                    return Outcome::Skipped;
                }
                emit(feature_type, element.clone(), sink)
            }
            Rule::Expression {
                condition,
                feature_type,
            } => {
                if !condition.holds(element) {
                    return Outcome::Skipped;
                }
                emit(feature_type, element.clone(), sink)
            }
            Rule::Action {
                condition,
                actions,
                feature_type,
            } => {
                if !condition.holds(element) {
                    return Outcome::Skipped;
                }
                match feature_type {
                    None => {
                        actions.perform(element);
                        Outcome::Continued
                    }
                    Some(ty) if !ty.propagate_actions() => {
                        let mut copy = element.clone();
                        actions.perform(&mut copy);
                        emit(ty, copy, sink)
                    }
                    Some(ty) => {
                        actions.perform(element);
                        emit(ty, element.clone(), sink)
                    }
                }
            }
            Rule::Sequence(rules) => {
                let mut outcome = Outcome::Skipped;
                for rule in rules {
                    match rule.resolve(element, pass, sink) {
                        Outcome::Resolved => return Outcome::Resolved,
                        Outcome::Continued => outcome = Outcome::Continued,
                        Outcome::Skipped => {}
                    }
                }
                outcome
            }
            Rule::Linked { group, rule } => {
                if pass.linked.contains(group) {
                    return Outcome::Skipped;
                }
                let outcome = rule.resolve(element, pass, sink);
                if outcome.matched() {
                    pass.linked.insert(*group);
                }
                outcome
            }
        }
    }

    /// Append `next` so it is tried after everything already in this rule.
    pub(crate) fn then(self, next: Rule) -> Rule {
        match self {
            Rule::Sequence(mut rules) => {
                rules.push(next);
                Rule::Sequence(rules)
            }
            first => Rule::Sequence(vec![first, next]),
        }
    }
}

fn emit(feature_type: &Arc<FeatureType>, mut snapshot: Element, sink: &mut dyn TypeSink) -> Outcome {
    if let Some(name) = feature_type.default_name() {
        snapshot.set_tag(DEFAULT_NAME_TAG, name);
    }
    sink.add(feature_type, snapshot);
    if feature_type.continue_search() {
        Outcome::Continued
    } else {
        Outcome::Resolved
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Fixed { head, feature_type } => write!(f, "{head} {feature_type}"),
            Rule::Expression {
                condition,
                feature_type,
            } => write!(f, "{condition} {feature_type}"),
            Rule::Action {
                condition,
                actions,
                feature_type,
            } => {
                write!(f, "{condition} {actions}")?;
                if let Some(ty) = feature_type {
                    write!(f, " {ty}")?;
                }
                Ok(())
            }
            Rule::Sequence(rules) => {
                for (i, rule) in rules.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{rule}")?;
                }
                Ok(())
            }
            Rule::Linked { rule, .. } => write!(f, "{rule}"),
        }
    }
}
