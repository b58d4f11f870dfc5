use tagstyle::{tag, Element, ElementKind, FeatureKind, FeatureType, RuleSetBuilder};

fn main() {
    let rules = RuleSetBuilder::new(FeatureKind::Polygon)
        .rule(|r| r.when(tag("landuse").eq("forest")).set_tag("natural", "wood"))
        .rule(|r| {
            r.when(tag("natural").eq("water").and(tag("water").eq("lake")))
                .with_type(FeatureType::builder(0x3c).level(2))
        })
        .rule(|r| {
            r.when(tag("natural").eq("wood").or(tag("landuse").eq("orchard")))
                .with_type(FeatureType::builder(0x50).level(1))
        })
        .rule(|r| r.when(tag("area").eq("yes")).with_type(FeatureType::builder(0x13)))
        .compile()
        .expect("failed to compile rules");

    let mut area = Element::new(ElementKind::Way, 100)
        .with_tag("landuse", "forest")
        .with_tag("area", "yes");

    let report = rules.resolve_detailed(&mut area);

    println!("{report}");
    println!();
    println!("Candidate rules: {:?}", report.candidates());
    println!("Rules that matched: {:?}", report.matched());
    println!("Duration: {:?}", report.duration());
    println!("Lookup natural=wood: {:?}", rules.lookup("natural", "wood"));
}
