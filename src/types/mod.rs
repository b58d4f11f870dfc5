mod action;
mod element;
mod error;
mod feature_type;
mod keystring;
mod levels;
mod op;
mod report;
mod resolved;
mod rule;
mod rule_table;
mod ruleset;
mod value;

pub use action::{Action, ActionList, TagValue, LABEL_TAG};
pub use element::{Element, ElementKind};
pub use error::{CompileError, SourceLocation};
pub use feature_type::{
    FeatureKind, FeatureType, FeatureTypeBuilder, RoadAttributes, DEFAULT_NAME_TAG,
};
pub use keystring::{ChangeableTag, Keystring};
pub use levels::{LevelInfo, LevelSpec, MAX_LEVEL, MAX_RESOLUTION};
pub use op::{computed, tag, CompareOp, NodeKind, Op, Pattern, TagExpr, TagRef};
pub use report::ResolutionReport;
pub use resolved::Resolved;
pub use ruleset::{FinalizeBuilder, RuleBuilder, RuleSet, RuleSetBuilder};
pub use value::compare_values;

pub(crate) use rule::{Condition, FinalizeSink, Outcome, Pass, Rule, TypeSink};
pub(crate) use rule_table::RuleTable;
pub(crate) use ruleset::{Definition, FinalizeSection, RuleDef};
