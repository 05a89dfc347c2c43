//! Benchmarks for branch walks and searches.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dtsh_model::{
    CriteriaChain, Devicetree, NodeAttributes, SortKey, TextCriterion, TextCriterionKind, WalkOptions,
};

/// Generate a tree with `fanout` children per node, `depth` levels deep.
fn generate_tree(fanout: usize, depth: usize) -> Devicetree {
    let mut builder = Devicetree::builder();
    let mut level = vec![builder.root_id()];
    for d in 0..depth {
        let mut next = Vec::with_capacity(level.len() * fanout);
        for &parent in &level {
            for i in 0..fanout {
                let attrs = NodeAttributes {
                    status: if i % 7 == 6 { "disabled" } else { "okay" }.to_string(),
                    compatible: vec![format!("vnd,device-{}", i % 5)],
                    ..NodeAttributes::default()
                };
                let name = format!("node-{d}@{:x}", i * 0x100);
                next.push(builder.add_node(parent, &name, attrs).unwrap());
            }
        }
        level = next;
    }
    builder.build().unwrap()
}

fn bench_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk");

    for (fanout, depth) in [(4, 4), (8, 4), (6, 6)] {
        let tree = generate_tree(fanout, depth);
        let label = format!("{}_nodes", tree.len());

        group.bench_with_input(BenchmarkId::new("declaration_order", &label), &tree, |b, tree| {
            b.iter(|| tree.walk(tree.root_id(), &WalkOptions::default()));
        });

        let sorted = WalkOptions {
            order_by: Some(SortKey::UnitAddr),
            reverse: true,
            enabled_only: true,
            fixed_depth: 0,
        };
        group.bench_with_input(BenchmarkId::new("sorted_enabled", &label), &tree, |b, tree| {
            b.iter(|| tree.walk(tree.root_id(), &sorted));
        });
    }

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");

    let tree = generate_tree(8, 4);
    let label = format!("{}_nodes", tree.len());
    let criterion = TextCriterion::new(TextCriterionKind::Compatible, "device-3", false, false).unwrap();
    let chain = CriteriaChain::new(vec![criterion.into()], false, false);

    group.bench_with_input(BenchmarkId::new("compatible", &label), &tree, |b, tree| {
        b.iter(|| tree.find(tree.root_id(), &chain, Some(SortKey::Path), false, true));
    });

    group.finish();
}

criterion_group!(benches, bench_walk, bench_find);
criterion_main!(benches);
