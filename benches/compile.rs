use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tagstyle::{normalize, tag, FeatureKind, FeatureType, RuleSetBuilder};

/// Rules whose actions feed each other, so closing the index takes several
/// rounds.
fn chained_builder(n: usize) -> RuleSetBuilder {
    let mut builder = RuleSetBuilder::new(FeatureKind::Polyline);
    for i in 0..n {
        let from = format!("s{i}");
        let to = format!("s{}", i + 1);
        builder = builder.rule(move |r| r.when(tag("step").eq(from.as_str())).set_tag("step", &to));
    }
    builder.rule(|r| r.when(tag("step").exists()).with_type(FeatureType::builder(0x6)))
}

/// Rules with OR and NOT trees that the normalizer has to split.
fn split_builder(n: usize) -> RuleSetBuilder {
    let mut builder = RuleSetBuilder::new(FeatureKind::Polygon);
    for i in 0..n {
        let a = format!("a{i}");
        let b = format!("b{i}");
        builder = builder.rule(move |r| {
            r.when(
                tag("landuse")
                    .eq(a.as_str())
                    .or(tag("natural").eq(b.as_str()))
                    .and(!tag("area").eq("no")),
            )
            .with_type(FeatureType::builder(1 + (i as u32) % 0x40))
        });
    }
    builder
}

fn bench_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("compilation");

    for &n in &[5, 50, 200] {
        group.bench_function(&format!("{n}_chained_rules"), |b| {
            b.iter(|| black_box(chained_builder(n).compile().unwrap()));
        });
        group.bench_function(&format!("{n}_split_rules"), |b| {
            b.iter(|| black_box(split_builder(n).compile().unwrap()));
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let predicate = tag("highway")
        .eq("primary")
        .or(tag("highway").eq("secondary"))
        .and(!(tag("access").eq("no").or(tag("area").eq("yes"))))
        .and(tag("name").exists().or(tag("ref").exists()));

    c.bench_function("normalize_nested", |b| {
        b.iter(|| normalize(black_box(predicate.clone())).unwrap());
    });
}

criterion_group!(benches, bench_compilation, bench_normalize);
criterion_main!(benches);
