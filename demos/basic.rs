use tagstyle::{tag, Element, ElementKind, FeatureKind, FeatureType, RuleSetBuilder};

fn main() {
    // Define rules
    let rules = RuleSetBuilder::new(FeatureKind::Polyline)
        .rule(|r| {
            r.when(tag("highway").eq("motorway"))
                .set_tag("mkgmap:road-class", "4")
                .with_type(FeatureType::builder(0x1).level(4).road_class(4).road_speed(7))
        })
        .rule(|r| {
            r.when(tag("highway").eq("primary").and(tag("access").ne("no")))
                .set_tag("mkgmap:road-class", "2")
                .with_type(FeatureType::builder(0x3).level(2))
        })
        .rule(|r| r.when(tag("highway").exists()).with_type(FeatureType::builder(0x6)))
        .fixed("waterway=river", FeatureType::builder(0x1f).level(2))
        .compile()
        .expect("failed to compile rules");

    println!("{rules}");

    // Resolve a way
    let mut way = Element::new(ElementKind::Way, 42)
        .with_tag("highway", "primary")
        .with_tag("name", "High Street");

    let resolved = rules.resolve(&mut way);
    if resolved.is_empty() {
        println!("No rule matched.");
    }
    for result in &resolved {
        println!("Result: {result}");
    }
    println!("Tags after resolution: {way}");
}
