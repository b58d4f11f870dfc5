use std::collections::BTreeSet;
use std::fmt;

use super::element::Element;
use super::keystring::{ChangeableTag, Keystring};
use super::rule::Rule;
use crate::index::DispatchIndex;

/// Rules addressed by rule number, plus the index that finds them.
#[derive(Debug, Clone, Default)]
pub(crate) struct RuleTable {
    rules: Vec<Rule>,
    index: DispatchIndex,
    pending: Vec<(Keystring, Rule, BTreeSet<ChangeableTag>)>,
}

impl RuleTable {
    /// Queue a rule. A rule with the same keystring as the one added just
    /// before it is merged into that entry and tried after it.
    pub(crate) fn add(&mut self, keystring: Keystring, rule: Rule, changeable: BTreeSet<ChangeableTag>) {
        if let Some((last_key, last_rule, last_changeable)) = self.pending.last_mut() {
            if *last_key == keystring {
                let merged = std::mem::replace(last_rule, Rule::Sequence(Vec::new()));
                *last_rule = merged.then(rule);
                last_changeable.extend(changeable);
                return;
            }
        }
        self.pending.push((keystring, rule, changeable));
    }

    /// Register everything queued and close the index.
    pub(crate) fn close(&mut self) {
        for (keystring, rule, changeable) in std::mem::take(&mut self.pending) {
            let number = self.index.register(keystring, changeable);
            debug_assert_eq!(number, self.rules.len());
            self.rules.push(rule);
        }
        self.index.close();
    }

    pub(crate) fn len(&self) -> usize {
        self.rules.len()
    }

    pub(crate) fn rule(&self, number: usize) -> Option<&Rule> {
        self.rules.get(number)
    }

    pub(crate) fn index(&self) -> &DispatchIndex {
        &self.index
    }

    /// Rule numbers to try for the element's current tags, ascending and
    /// without repeats.
    pub(crate) fn candidates(&self, element: &Element) -> Vec<usize> {
        let mut found: Vec<usize> = element
            .tags()
            .flat_map(|(k, v)| self.index.lookup(k, v))
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}

impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (number, rule) in self.rules.iter().enumerate() {
            writeln!(f, "{number}: {rule}")?;
        }
        Ok(())
    }
}
