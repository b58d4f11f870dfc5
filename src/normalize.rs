//! Rewriting of tag predicates into indexable form.
//!
//! A predicate can only be registered in the dispatch index when its
//! outermost term is an equality or existence test on an indexable tag. The
//! normalizer rearranges an arbitrary tree into one or more equivalent
//! alternatives that all start with such a term. Together the alternatives
//! match exactly the elements the original predicate matches.

use crate::types::{Keystring, Op};
use crate::CompileError;

/// Rank of a term that cannot serve as a dispatch key.
const UNINDEXABLE: u32 = 1000;

/// Normalize a predicate into a single tree. When the predicate had to be
/// split the result is a `LinkedAlt` chain of independently keyed
/// alternatives.
///
/// # Errors
///
/// Returns [`CompileError::NotIndexable`] when some part of the predicate
/// cannot be reached from any `tag=value` or `tag=*` test.
pub fn normalize(op: Op) -> Result<Op, CompileError> {
    let alternatives = alternatives(op)?;
    // `alternatives` never returns an empty list on success.
    Op::linked(alternatives).ok_or_else(|| CompileError::NotIndexable {
        predicate: String::new(),
        location: None,
    })
}

/// Normalize a predicate into its list of indexable alternatives.
pub(crate) fn alternatives(op: Op) -> Result<Vec<Op>, CompileError> {
    let original = op.to_string();
    let pushed = push_not(unlink(op), false);
    arrange(conjuncts(pushed)).ok_or(CompileError::NotIndexable {
        predicate: original,
        location: None,
    })
}

/// Split a normalized alternative into its dispatch key and the rest of the
/// conjunction.
pub(crate) fn split(alternative: Op) -> Option<(Keystring, Option<Op>)> {
    match alternative {
        Op::And(head, rest) => Some((keystring(&head)?, Some(*rest))),
        head => Some((keystring(&head)?, None)),
    }
}

/// The keystring of an indexable term.
pub(crate) fn keystring(op: &Op) -> Option<Keystring> {
    if !op.is_indexable() {
        return None;
    }
    let key = op.key_ref()?.key();
    match op {
        Op::Equals(_, value) => match value.as_ref() {
            Op::Value(v) => Some(Keystring::exact(key, v.as_str())),
            _ => None,
        },
        Op::Exists(_) => Some(Keystring::exists(key)),
        _ => None,
    }
}

/// Lower is better. AND and OR take the worst of their children.
fn selectivity(op: &Op) -> u32 {
    match op {
        Op::Equals(..) if op.is_indexable() => 0,
        Op::Exists(_) if op.is_indexable() => 10,
        Op::And(a, b) | Op::Or(a, b) => selectivity(a).max(selectivity(b)),
        _ => UNINDEXABLE,
    }
}

/// Turn any `LinkedAlt` chain back into plain ORs.
fn unlink(op: Op) -> Op {
    match op {
        Op::LinkedAlt(a, None) => unlink(*a),
        Op::LinkedAlt(a, Some(next)) => unlink(*a).or(unlink(*next)),
        Op::And(a, b) => unlink(*a).and(unlink(*b)),
        Op::Or(a, b) => unlink(*a).or(unlink(*b)),
        Op::Not(inner) => Op::Not(Box::new(unlink(*inner))),
        other => other,
    }
}

/// Move negations down to the leaves using only exact equivalences.
fn push_not(op: Op, negate: bool) -> Op {
    match (op, negate) {
        (Op::Not(inner), n) => push_not(*inner, !n),
        (Op::And(a, b), false) => push_not(*a, false).and(push_not(*b, false)),
        (Op::Or(a, b), false) => push_not(*a, false).or(push_not(*b, false)),
        (Op::And(a, b), true) => push_not(*a, true).or(push_not(*b, true)),
        (Op::Or(a, b), true) => push_not(*a, true).and(push_not(*b, true)),
        (Op::Exists(a), true) => Op::NotExists(a),
        (Op::NotExists(a), true) => Op::Exists(a),
        // A bare tag holds when the tag is present.
        (Op::Tag(t), false) => Op::Exists(Box::new(Op::Tag(t))),
        (Op::Tag(t), true) => Op::NotExists(Box::new(Op::Tag(t))),
        (leaf, false) => leaf,
        (leaf, true) => !leaf,
    }
}

fn conjuncts(op: Op) -> Vec<Op> {
    let mut out = Vec::new();
    flatten_and(op, &mut out);
    out
}

fn flatten_and(op: Op, out: &mut Vec<Op>) {
    match op {
        Op::And(a, b) => {
            flatten_and(*a, out);
            flatten_and(*b, out);
        }
        other => out.push(other),
    }
}

fn flatten_or(op: Op, out: &mut Vec<Op>) {
    match op {
        Op::Or(a, b) => {
            flatten_or(*a, out);
            flatten_or(*b, out);
        }
        other => out.push(other),
    }
}

/// Right-nested AND of the terms, or `None` for an empty list.
fn chain(terms: Vec<Op>) -> Option<Op> {
    terms.into_iter().rev().reduce(|rest, term| term.and(rest))
}

fn with_head(head: Op, rest: Vec<Op>) -> Op {
    match chain(rest) {
        Some(rest) => head.and(rest),
        None => head,
    }
}

/// Arrange a conjunction so that it starts with an indexable term. ORs are
/// distributed over the remaining conjuncts when that is the only way to
/// find one, producing several alternatives.
fn arrange(mut terms: Vec<Op>) -> Option<Vec<Op>> {
    // Stable, and a plain key wins a tie against an OR of keys.
    terms.sort_by_key(|t| (selectivity(t), !t.is_indexable()));

    if let Some(first) = terms.first() {
        if selectivity(first) < UNINDEXABLE {
            if first.is_indexable() {
                let head = terms.remove(0);
                return Some(vec![with_head(head, terms)]);
            }
            if matches!(first, Op::Or(..)) {
                return distribute(terms, 0);
            }
        }
    }

    if let Some(i) = terms.iter().position(Op::needs_exists) {
        let key = terms[i].first()?.clone();
        return Some(vec![with_head(Op::Exists(Box::new(key)), terms)]);
    }

    let i = terms.iter().position(|t| matches!(t, Op::Or(..)))?;
    distribute(terms, i)
}

/// `(A | B) & C` becomes `(A & C) | (B & C)`, each branch arranged on its own.
fn distribute(mut terms: Vec<Op>, at: usize) -> Option<Vec<Op>> {
    let or = terms.remove(at);
    let mut branches = Vec::new();
    flatten_or(or, &mut branches);

    let mut out = Vec::new();
    for branch in branches {
        let mut arm = terms.clone();
        flatten_and(branch, &mut arm);
        out.extend(arrange(arm)?);
    }
    Some(out)
}
