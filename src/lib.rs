//! Compiled, indexed style rules that turn map-element tags into feature
//! types.
//!
//! Rules are written as tag predicates with optional tag-changing actions and
//! a feature type. Compiling a [`RuleSet`] rewrites every predicate so that it
//! starts with a `key=value` or `key=*` test, registers the rules in a
//! dispatch index under that key, and closes the index over the tags that
//! actions may change. Resolving an element then only evaluates the rules its
//! tags can reach, in declaration order.

mod compile;
mod error;
mod evaluate;
mod index;
mod normalize;
pub mod parse;
mod types;

pub use error::StyleError;
pub use index::DispatchIndex;
pub use normalize::normalize;
pub use types::{
    compare_values, computed, tag, Action, ActionList, ChangeableTag, CompareOp, CompileError,
    Element, ElementKind, FeatureKind, FeatureType, FeatureTypeBuilder, FinalizeBuilder, Keystring,
    LevelInfo, LevelSpec, NodeKind, Op, Pattern, ResolutionReport, Resolved, RoadAttributes,
    RuleBuilder, RuleSet, RuleSetBuilder, SourceLocation, TagExpr, TagRef, TagValue,
    DEFAULT_NAME_TAG, LABEL_TAG, MAX_LEVEL, MAX_RESOLUTION,
};
