use std::sync::Arc;
use std::thread;

use tagstyle::{tag, Element, ElementKind, FeatureKind, FeatureType, RuleSetBuilder};

fn main() {
    let rules = Arc::new(
        RuleSetBuilder::new(FeatureKind::Polyline)
            .rule(|r| r.when(tag("highway").eq("primary")).with_type(FeatureType::builder(0x3)))
            .rule(|r| r.when(tag("highway").eq("residential")).with_type(FeatureType::builder(0x6)))
            .rule(|r| r.when(tag("railway").eq("rail")).with_type(FeatureType::builder(0x14)))
            .compile()
            .expect("failed to compile rules"),
    );

    let tags = [
        ("highway", "primary"),
        ("highway", "residential"),
        ("railway", "rail"),
        ("waterway", "stream"),
    ];

    let handles: Vec<_> = tags
        .into_iter()
        .enumerate()
        .map(|(i, (key, value))| {
            let rules = Arc::clone(&rules);
            thread::spawn(move || {
                // Every thread owns its element; the rule set is shared.
                let mut el = Element::new(ElementKind::Way, i64::try_from(i).unwrap_or_default())
                    .with_tag(key, value);
                let codes: Vec<String> = rules
                    .resolve(&mut el)
                    .iter()
                    .map(|r| format!("{:#x}", r.feature_type().code()))
                    .collect();
                println!("Thread {i}: {key}={value} -> {codes:?}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
