//! Dispatch index from tags to candidate rule numbers.

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use crate::types::{ChangeableTag, Keystring};

/// Maps `key=value` and `key=*` keystrings to the numbers of the rules that
/// may match an element carrying that tag.
///
/// Rule numbers are dense and assigned in registration order, which is also
/// the order rules are tried in. After [`close`](Self::close), looking up an
/// element's original tags also returns every later rule that could become
/// reachable once earlier rules have changed the element's tags.
#[derive(Debug, Clone, Default)]
pub struct DispatchIndex {
    /// key -> value -> rules keyed `key=value`.
    exact: HashMap<String, HashMap<String, BTreeSet<usize>>>,
    /// key -> rules keyed `key=*`.
    exists: HashMap<String, BTreeSet<usize>>,
    /// key -> every rule keyed on that key. Never touched by the closure.
    by_key: HashMap<String, BTreeSet<usize>>,
    keystrings: Vec<Keystring>,
    changeable: Vec<BTreeSet<ChangeableTag>>,
}

impl DispatchIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule and return its rule number.
    pub fn register(&mut self, keystring: Keystring, changeable: BTreeSet<ChangeableTag>) -> usize {
        let number = self.keystrings.len();
        match &keystring {
            Keystring::Exact { key, value } => {
                self.exact
                    .entry(key.clone())
                    .or_default()
                    .entry(value.clone())
                    .or_default()
                    .insert(number);
            }
            Keystring::Exists { key } => {
                self.exists.entry(key.clone()).or_default().insert(number);
            }
        }
        self.by_key
            .entry(keystring.key().to_owned())
            .or_default()
            .insert(number);
        tracing::debug!(rule = number, keystring = %keystring, "registered rule");
        self.keystrings.push(keystring);
        self.changeable.push(changeable);
        number
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keystrings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keystrings.is_empty()
    }

    #[must_use]
    pub fn keystring(&self, rule: usize) -> Option<&Keystring> {
        self.keystrings.get(rule)
    }

    #[must_use]
    pub fn changeable_tags(&self, rule: usize) -> Option<&BTreeSet<ChangeableTag>> {
        self.changeable.get(rule)
    }

    /// Candidate rules for a single tag: the `key=value` bucket together with
    /// the `key=*` bucket. The two may overlap.
    pub fn lookup<'a>(&'a self, key: &str, value: &str) -> impl Iterator<Item = usize> + 'a {
        let exact = self
            .exact
            .get(key)
            .and_then(|values| values.get(value))
            .into_iter()
            .flatten();
        let exists = self.exists.get(key).into_iter().flatten();
        exact.chain(exists).copied()
    }

    /// Every rule registered under `key`, whatever its value.
    pub fn rules_for_key<'a>(&'a self, key: &str) -> impl Iterator<Item = usize> + 'a {
        self.by_key.get(key).into_iter().flatten().copied()
    }

    /// Number of exact and existence buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.exact.values().map(HashMap::len).sum::<usize>() + self.exists.len()
    }

    /// Extend every bucket with the rules that tag-changing actions may make
    /// reachable. Returns the number of rule numbers added. Calling it again
    /// adds nothing.
    pub fn close(&mut self) -> usize {
        let start = Instant::now();
        let mut added = 0;
        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut changed = 0;
            for rule in 0..self.keystrings.len() {
                let reached = self.reachable_from(rule);
                if !reached.is_empty() {
                    changed += self.spread(rule, &reached);
                }
            }
            added += changed;
            if changed == 0 {
                break;
            }
        }
        tracing::info!(
            rules = self.len(),
            buckets = self.bucket_count(),
            added,
            rounds,
            elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
            "closed dispatch index"
        );
        added
    }

    /// Rules registered under the tag a change may produce.
    fn exposed_by(&self, tag: &ChangeableTag) -> Vec<usize> {
        match tag {
            ChangeableTag::Key(key) => self.rules_for_key(key).collect(),
            ChangeableTag::KeyValue(key, value) => self
                .rules_for_key(key)
                .filter(|&r| match &self.keystrings[r] {
                    Keystring::Exact { value: v, .. } => v == value,
                    Keystring::Exists { .. } => true,
                })
                .collect(),
        }
    }

    /// All later rules that `rule`'s actions may expose, directly or through
    /// the actions of the rules they expose in turn. A rule can only be
    /// exposed by one that runs before it.
    fn reachable_from(&self, rule: usize) -> BTreeSet<usize> {
        let mut reached = BTreeSet::new();
        let mut work: Vec<usize> = vec![rule];
        while let Some(source) = work.pop() {
            for tag in &self.changeable[source] {
                for target in self.exposed_by(tag) {
                    if target > source && target != rule && reached.insert(target) {
                        work.push(target);
                    }
                }
            }
        }
        reached
    }

    /// Add `reached` to every bucket that already holds `rule`.
    fn spread(&mut self, rule: usize, reached: &BTreeSet<usize>) -> usize {
        let buckets = self
            .exact
            .values_mut()
            .flat_map(HashMap::values_mut)
            .chain(self.exists.values_mut());
        let mut added = 0;
        for bucket in buckets {
            if bucket.contains(&rule) {
                let before = bucket.len();
                bucket.extend(reached.iter().copied());
                added += bucket.len() - before;
            }
        }
        added
    }
}
