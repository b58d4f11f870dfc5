use std::collections::BTreeSet;
use std::sync::Arc;

use crate::normalize;
use crate::types::{
    ActionList, Condition, Definition, FeatureType, FinalizeSection, Keystring, Rule, RuleDef,
    RuleTable,
};
use crate::{CompileError, FeatureKind, LevelSpec, RuleSet};

pub(crate) fn compile(
    kind: FeatureKind,
    levels: LevelSpec,
    definitions: Vec<Definition>,
    mut finalize: Vec<FinalizeSection>,
) -> Result<RuleSet, CompileError> {
    if let Some(extra) = finalize.get(1) {
        return Err(CompileError::DuplicateFinalize {
            location: extra.location.clone(),
        });
    }

    let mut compiler = Compiler {
        kind,
        levels: &levels,
        groups: 0,
        split: 0,
    };

    let mut main = RuleTable::default();
    for definition in definitions {
        match definition {
            Definition::Rule(def) => compiler.rule(def, &mut main, false)?,
            Definition::Fixed {
                keystring,
                feature_type,
            } => compiler.fixed(&keystring, &feature_type, &mut main)?,
        }
    }
    main.close();

    let finalize = match finalize.pop() {
        Some(section) => {
            let mut table = RuleTable::default();
            for def in section.rules {
                compiler.rule(def, &mut table, true)?;
            }
            table.close();
            Some(table)
        }
        None => None,
    };

    tracing::info!(
        %kind,
        rules = main.len(),
        finalize_rules = finalize.as_ref().map_or(0, RuleTable::len),
        split_predicates = compiler.split,
        buckets = main.index().bucket_count(),
        "compiled rule set"
    );

    Ok(RuleSet {
        kind,
        levels,
        main,
        finalize,
    })
}

struct Compiler<'a> {
    kind: FeatureKind,
    levels: &'a LevelSpec,
    /// Last OR group id handed out.
    groups: usize,
    /// Predicates that had to be split into several alternatives.
    split: usize,
}

impl Compiler<'_> {
    fn rule(&mut self, def: RuleDef, table: &mut RuleTable, finalize: bool) -> Result<(), CompileError> {
        let location = def.location.as_ref();
        let condition = def.condition.ok_or_else(|| CompileError::MissingCondition {
            location: def.location.clone(),
        })?;
        if finalize && !def.types.is_empty() {
            return Err(CompileError::TypedFinalizeRule {
                location: def.location.clone(),
            });
        }
        if !finalize && def.types.is_empty() && def.actions.is_empty() {
            return Err(CompileError::MissingType {
                location: def.location.clone(),
            });
        }

        let original = condition.to_string();
        let alternatives = normalize::alternatives(condition).map_err(|e| e.at(location))?;
        if alternatives.len() > 1 {
            self.split += 1;
        }
        tracing::debug!(
            predicate = %original,
            alternatives = alternatives.len(),
            first = %alternatives[0],
            "normalized predicate"
        );

        let mut types = Vec::with_capacity(def.types.len());
        let last = def.types.len().saturating_sub(1);
        for (i, builder) in def.types.iter().enumerate() {
            let builder = if i < last && !builder.is_continue() {
                builder.clone().continue_search()
            } else {
                builder.clone()
            };
            let ty = builder
                .build(self.kind, self.levels)
                .map_err(|e| e.at(location))?;
            types.push(Arc::new(ty));
        }

        // One executable body per type clause; the actions go with the first.
        let mut bodies: Vec<(Option<&ActionList>, Option<Arc<FeatureType>>)> = Vec::new();
        let actions = (!def.actions.is_empty()).then_some(&def.actions);
        if types.is_empty() {
            bodies.push((actions, None));
        }
        for (i, ty) in types.into_iter().enumerate() {
            bodies.push((if i == 0 { actions } else { None }, Some(ty)));
        }

        for (actions, ty) in bodies {
            let group = (alternatives.len() > 1).then(|| {
                self.groups += 1;
                self.groups
            });
            let changeable: BTreeSet<_> = actions
                .map(|a| a.changeable_tags().clone())
                .unwrap_or_default();
            for alternative in &alternatives {
                let (head, residual) = normalize::split(alternative.clone()).ok_or_else(|| {
                    CompileError::NotIndexable {
                        predicate: alternative.to_string(),
                        location: def.location.clone(),
                    }
                })?;
                let condition = Condition {
                    head: head.clone(),
                    residual,
                };
                let body = make_rule(condition, actions, ty.as_ref());
                let rule = match group {
                    Some(group) => Rule::Linked {
                        group,
                        rule: Box::new(body),
                    },
                    None => body,
                };
                table.add(head, rule, changeable.clone());
            }
        }
        Ok(())
    }

    fn fixed(
        &mut self,
        keystring: &str,
        feature_type: &crate::FeatureTypeBuilder,
        table: &mut RuleTable,
    ) -> Result<(), CompileError> {
        let head: Keystring = keystring
            .parse()
            .map_err(|_| CompileError::InvalidKeystring {
                keystring: keystring.to_owned(),
                location: None,
            })?;
        let feature_type = Arc::new(feature_type.build(self.kind, self.levels)?);
        table.add(
            head.clone(),
            Rule::Fixed { head, feature_type },
            BTreeSet::new(),
        );
        Ok(())
    }
}

fn make_rule(condition: Condition, actions: Option<&ActionList>, ty: Option<&Arc<FeatureType>>) -> Rule {
    match (actions, ty) {
        (None, Some(ty)) => Rule::Expression {
            condition,
            feature_type: Arc::clone(ty),
        },
        (actions, ty) => Rule::Action {
            condition,
            actions: actions.cloned().unwrap_or_default(),
            feature_type: ty.cloned(),
        },
    }
}
