use std::fmt;

use super::action::{Action, ActionList, TagValue};
use super::element::Element;
use super::error::{CompileError, SourceLocation};
use super::feature_type::{FeatureKind, FeatureTypeBuilder};
use super::keystring::Keystring;
use super::levels::LevelSpec;
use super::op::Op;
use super::report::ResolutionReport;
use super::resolved::Resolved;
use super::rule_table::RuleTable;
use crate::index::DispatchIndex;

/// A rule as written: condition, actions and type clauses.
#[derive(Debug, Clone, Default)]
pub(crate) struct RuleDef {
    pub(crate) condition: Option<Op>,
    pub(crate) actions: ActionList,
    pub(crate) types: Vec<FeatureTypeBuilder>,
    pub(crate) location: Option<SourceLocation>,
}

#[derive(Debug, Clone)]
pub(crate) enum Definition {
    Rule(RuleDef),
    Fixed {
        keystring: String,
        feature_type: FeatureTypeBuilder,
    },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FinalizeSection {
    pub(crate) rules: Vec<RuleDef>,
    pub(crate) location: Option<SourceLocation>,
}

/// Builder for constructing a [`RuleSet`].
///
/// Rules are added in file order. Their order is significant: when several
/// rules match an element, the one declared first is tried first.
///
/// # Example
///
/// ```
/// use tagstyle::{tag, Element, ElementKind, FeatureKind, FeatureType, RuleSetBuilder};
///
/// let rules = RuleSetBuilder::new(FeatureKind::Polyline)
///     .rule(|r| {
///         r.when(tag("highway").eq("primary"))
///             .set_tag("mkgmap:road-class", "2")
///             .with_type(FeatureType::builder(0x3).level(2))
///     })
///     .rule(|r| r.when(tag("highway").exists()).with_type(FeatureType::builder(0x6)))
///     .compile()
///     .unwrap();
///
/// let mut way = Element::new(ElementKind::Way, 1).with_tag("highway", "primary");
/// let resolved = rules.resolve(&mut way);
/// assert_eq!(resolved[0].feature_type().code(), 0x3);
/// ```
#[derive(Debug)]
#[must_use]
pub struct RuleSetBuilder {
    kind: FeatureKind,
    levels: LevelSpec,
    definitions: Vec<Definition>,
    finalize: Vec<FinalizeSection>,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug, Default)]
#[must_use]
pub struct RuleBuilder {
    def: RuleDef,
}

/// Builder for the finalize section, passed to
/// [`RuleSetBuilder::finalize`].
#[derive(Debug, Default)]
#[must_use]
pub struct FinalizeBuilder {
    section: FinalizeSection,
}

impl RuleSetBuilder {
    pub fn new(kind: FeatureKind) -> Self {
        Self {
            kind,
            levels: LevelSpec::default(),
            definitions: Vec::new(),
            finalize: Vec::new(),
        }
    }

    /// Level configuration used to turn `level` clauses into resolutions.
    pub fn levels(mut self, levels: LevelSpec) -> Self {
        self.levels = levels;
        self
    }

    /// Define a rule. The closure must call `.when(op)` and give at least one
    /// action or type.
    pub fn rule(mut self, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder::default());
        self.definitions.push(Definition::Rule(builder.def));
        self
    }

    /// Map a single `key=value` or `key=*` straight to a type.
    pub fn fixed(mut self, keystring: &str, feature_type: FeatureTypeBuilder) -> Self {
        self.definitions.push(Definition::Fixed {
            keystring: keystring.to_owned(),
            feature_type,
        });
        self
    }

    /// Define the finalize section, whose actions run on every result after
    /// the main rules. Only one section is allowed.
    pub fn finalize(mut self, f: impl FnOnce(FinalizeBuilder) -> FinalizeBuilder) -> Self {
        let builder = f(FinalizeBuilder::default());
        self.finalize.push(builder.section);
        self
    }

    /// Compile the rules into an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if a rule cannot be indexed, a type clause is
    /// invalid, or the finalize section is malformed.
    pub fn compile(self) -> Result<RuleSet, CompileError> {
        crate::compile::compile(self.kind, self.levels, self.definitions, self.finalize)
    }
}

impl RuleBuilder {
    pub fn when(mut self, condition: Op) -> Self {
        self.def.condition = Some(condition);
        self
    }

    /// Add a tag unless the element already has it.
    pub fn add_tag(self, key: &str, value: &str) -> Self {
        self.add_tag_any(key, [TagValue::literal(value)])
    }

    /// Like [`add_tag`](Self::add_tag), with alternatives: the first one that
    /// resolves on the element is used.
    pub fn add_tag_any(mut self, key: &str, values: impl IntoIterator<Item = TagValue>) -> Self {
        self.def.actions.push(Action::AddTag {
            key: key.to_owned(),
            values: values.into_iter().collect(),
        });
        self
    }

    pub fn set_tag(self, key: &str, value: &str) -> Self {
        self.set_tag_any(key, [TagValue::literal(value)])
    }

    pub fn set_tag_any(mut self, key: &str, values: impl IntoIterator<Item = TagValue>) -> Self {
        self.def.actions.push(Action::SetTag {
            key: key.to_owned(),
            values: values.into_iter().collect(),
        });
        self
    }

    /// Set `key` to the current value of `from`, if the element has it.
    pub fn copy_tag(self, key: &str, from: &str) -> Self {
        self.set_tag_any(key, [TagValue::from_tag(from)])
    }

    pub fn delete_tag(mut self, key: &str) -> Self {
        self.def.actions.push(Action::DeleteTag {
            key: key.to_owned(),
        });
        self
    }

    /// Move the value of `from` to `to`.
    pub fn rename_tag(mut self, from: &str, to: &str) -> Self {
        self.def.actions.push(Action::Rename {
            from: from.to_owned(),
            to: to.to_owned(),
        });
        self
    }

    /// Label the element with the first alternative that resolves, unless it
    /// already has a label.
    pub fn name(mut self, values: impl IntoIterator<Item = TagValue>) -> Self {
        self.def.actions.push(Action::Name {
            values: values.into_iter().collect(),
        });
        self
    }

    /// Add a type clause. With several clauses every one but the last keeps
    /// searching, and the actions run with the first only.
    pub fn with_type(mut self, feature_type: FeatureTypeBuilder) -> Self {
        self.def.types.push(feature_type);
        self
    }

    /// Source position reported in compile errors.
    pub fn at(mut self, file: &str, line: u32) -> Self {
        self.def.location = Some(SourceLocation::new(file, line));
        self
    }
}

impl FinalizeBuilder {
    /// Add a finalize rule. Finalize rules may only carry actions.
    pub fn rule(mut self, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder::default());
        self.section.rules.push(builder.def);
        self
    }

    pub fn at(mut self, file: &str, line: u32) -> Self {
        self.section.location = Some(SourceLocation::new(file, line));
        self
    }
}

/// A compiled, immutable rule set. Thread-safe and designed to live behind
/// `Arc`; each element must be resolved by one thread at a time.
#[derive(Debug)]
pub struct RuleSet {
    pub(crate) kind: FeatureKind,
    pub(crate) levels: LevelSpec,
    pub(crate) main: RuleTable,
    pub(crate) finalize: Option<RuleTable>,
}

impl RuleSet {
    /// Find the feature types for an element.
    ///
    /// Actions of matching rules are applied to `element`. Each result
    /// carries its own copy of the element's tags as they were when its type
    /// was chosen, with the finalize section applied. An empty result means
    /// no rule matched.
    pub fn resolve(&self, element: &mut Element) -> Vec<Resolved> {
        crate::evaluate::resolve(&self.main, self.finalize.as_ref(), element).0
    }

    /// Resolve with diagnostics: candidate and matched rule numbers and
    /// timing.
    pub fn resolve_detailed(&self, element: &mut Element) -> ResolutionReport {
        crate::evaluate::resolve_detailed(&self.main, self.finalize.as_ref(), element)
    }

    /// Rule numbers that would be tried for the element's current tags.
    #[must_use]
    pub fn candidates(&self, element: &Element) -> Vec<usize> {
        self.main.candidates(element)
    }

    /// Rule numbers found for a single tag, ascending.
    #[must_use]
    pub fn lookup(&self, key: &str, value: &str) -> Vec<usize> {
        let mut found: Vec<usize> = self.main.index().lookup(key, value).collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Number of rule entries after same-key rules were merged.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.main.len()
    }

    #[must_use]
    pub fn finalize_rule_count(&self) -> usize {
        self.finalize.as_ref().map_or(0, RuleTable::len)
    }

    /// Keystrings by rule number.
    pub fn keystrings(&self) -> impl Iterator<Item = &Keystring> {
        (0..self.main.len()).filter_map(|n| self.main.index().keystring(n))
    }

    #[must_use]
    pub fn index(&self) -> &DispatchIndex {
        self.main.index()
    }

    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    #[must_use]
    pub fn levels(&self) -> &LevelSpec {
        &self.levels
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.main)?;
        if let Some(finalize) = &self.finalize {
            writeln!(f, "<finalize>")?;
            write!(f, "{finalize}")?;
        }
        Ok(())
    }
}
