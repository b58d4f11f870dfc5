use std::time::Instant;

use crate::types::{FinalizeSink, Outcome, Pass, ResolutionReport, Resolved, RuleTable, TypeSink};
use crate::Element;

/// Rule numbers seen during one pass over a table.
#[derive(Debug, Default)]
pub(crate) struct Trace {
    pub(crate) candidates: Vec<usize>,
    pub(crate) matched: Vec<usize>,
}

/// Run the candidates for the element's tags in rule-number order until one
/// resolves with a terminal type.
///
/// Candidates are looked up once from the tags the element has on entry; the
/// index closure already includes every rule that earlier actions may expose.
pub(crate) fn drive(table: &RuleTable, element: &mut Element, sink: &mut dyn TypeSink) -> Trace {
    let candidates = table.candidates(element);
    let mut pass = Pass::default();
    let mut matched = Vec::new();
    for &number in &candidates {
        let Some(rule) = table.rule(number) else {
            continue;
        };
        let outcome = rule.resolve(element, &mut pass, sink);
        tracing::trace!(rule = number, ?outcome, "evaluated candidate");
        if outcome.matched() {
            matched.push(number);
        }
        if outcome == Outcome::Resolved {
            break;
        }
    }
    Trace {
        candidates,
        matched,
    }
}

pub(crate) fn resolve(
    main: &RuleTable,
    finalize: Option<&RuleTable>,
    element: &mut Element,
) -> (Vec<Resolved>, Trace) {
    let mut results = Vec::new();
    let trace = drive(main, element, &mut results);
    if let Some(finalize) = finalize {
        for result in &mut results {
            drive(finalize, result.element_mut(), &mut FinalizeSink);
        }
    }
    (results, trace)
}

pub(crate) fn resolve_detailed(
    main: &RuleTable,
    finalize: Option<&RuleTable>,
    element: &mut Element,
) -> ResolutionReport {
    let start = Instant::now();
    let (results, trace) = resolve(main, finalize, element);
    ResolutionReport::new(results, trace.candidates, trace.matched, start.elapsed())
}

#[cfg(test)]
mod tests {
    use crate::{tag, Element, ElementKind, FeatureKind, FeatureType, RuleSet, RuleSetBuilder};

    fn way(tags: &[(&str, &str)]) -> Element {
        tags.iter()
            .fold(Element::new(ElementKind::Way, 1), |el, (k, v)| el.with_tag(k, v))
    }

    fn codes(rules: &RuleSet, el: &mut Element) -> Vec<u32> {
        rules
            .resolve(el)
            .iter()
            .map(|r| r.feature_type().code())
            .collect()
    }

    #[test]
    fn first_match_wins() {
        let rules = RuleSetBuilder::new(FeatureKind::Polyline)
            .rule(|r| r.when(tag("highway").eq("primary")).with_type(FeatureType::builder(0x2)))
            .rule(|r| r.when(tag("highway").exists()).with_type(FeatureType::builder(0x6)))
            .compile()
            .unwrap();
        assert_eq!(codes(&rules, &mut way(&[("highway", "primary")])), vec![0x2]);
        assert_eq!(codes(&rules, &mut way(&[("highway", "service")])), vec![0x6]);
        assert!(codes(&rules, &mut way(&[("waterway", "river")])).is_empty());
    }

    #[test]
    fn actions_are_seen_by_later_rules() {
        let rules = RuleSetBuilder::new(FeatureKind::Polyline)
            .rule(|r| r.when(tag("highway").eq("primary")).set_tag("mkgmap:road-class", "2"))
            .rule(|r| {
                r.when(tag("mkgmap:road-class").eq("2"))
                    .with_type(FeatureType::builder(0x10))
            })
            .compile()
            .unwrap();
        let mut el = way(&[("highway", "primary")]);
        assert_eq!(codes(&rules, &mut el), vec![0x10]);
        assert_eq!(el.tag("mkgmap:road-class"), Some("2"));
    }

    #[test]
    fn deleted_key_stops_later_rule() {
        let rules = RuleSetBuilder::new(FeatureKind::Polyline)
            .rule(|r| r.when(tag("highway").eq("primary")).delete_tag("highway"))
            .rule(|r| r.when(tag("highway").exists()).with_type(FeatureType::builder(0x6)))
            .compile()
            .unwrap();
        assert!(codes(&rules, &mut way(&[("highway", "primary")])).is_empty());
    }

    #[test]
    fn finalize_runs_on_each_result() {
        let rules = RuleSetBuilder::new(FeatureKind::Polyline)
            .rule(|r| {
                r.when(tag("highway").eq("primary"))
                    .with_type(FeatureType::builder(0x2).continue_search())
            })
            .rule(|r| r.when(tag("highway").exists()).with_type(FeatureType::builder(0x6)))
            .finalize(|f| f.rule(|r| r.when(tag("ref").exists()).copy_tag("name", "ref")))
            .compile()
            .unwrap();
        let mut el = way(&[("highway", "primary"), ("ref", "A1")]);
        let results = rules.resolve(&mut el);
        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.element().tag("name"), Some("A1"));
        }
        assert_eq!(el.tag("name"), None);
    }

    #[test]
    fn detailed_report_lists_candidates_and_matches() {
        let rules = RuleSetBuilder::new(FeatureKind::Polyline)
            .rule(|r| r.when(tag("highway").eq("primary")).add_tag("fred", "1"))
            .rule(|r| r.when(tag("name").exists()).with_type(FeatureType::builder(0x5)))
            .rule(|r| r.when(tag("highway").exists()).with_type(FeatureType::builder(0x6)))
            .compile()
            .unwrap();
        let mut el = way(&[("highway", "primary")]);
        let report = rules.resolve_detailed(&mut el);
        assert_eq!(report.candidates(), &[0, 2]);
        assert_eq!(report.matched(), &[0, 2]);
        assert_eq!(report.results()[0].feature_type().code(), 0x6);
    }
}
