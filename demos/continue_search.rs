use tagstyle::{tag, Element, ElementKind, FeatureKind, FeatureType, RuleSetBuilder};

fn main() {
    // A bridge gets drawn twice: once as the road and once as the bridge
    // outline. The road rule keeps searching; its name change stays on the
    // road's own copy of the tags.
    let rules = RuleSetBuilder::new(FeatureKind::Polyline)
        .rule(|r| {
            r.when(tag("highway").eq("primary"))
                .copy_tag("mkgmap:label:1", "ref")
                .with_type(FeatureType::builder(0x3).level(2).continue_search())
        })
        .rule(|r| {
            r.when(tag("bridge").eq("yes"))
                .with_type(FeatureType::builder(0x1b).default_name("bridge"))
        })
        .rule(|r| r.when(tag("highway").exists()).with_type(FeatureType::builder(0x6)))
        .finalize(|f| {
            f.rule(|r| r.when(tag("name").exists()).add_tag("mkgmap:label:2", "named"))
        })
        .compile()
        .expect("failed to compile rules");

    let mut way = Element::new(ElementKind::Way, 7)
        .with_tag("highway", "primary")
        .with_tag("bridge", "yes")
        .with_tag("ref", "A1")
        .with_tag("name", "Old Bridge");

    for (i, result) in rules.resolve(&mut way).iter().enumerate() {
        println!("#{i}: {result}");
    }
    println!("Element afterwards: {way}");
}
