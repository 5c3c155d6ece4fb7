use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use avl_dict::AvlTree;

const N: i32 = 100_000;

pub fn benchmarks(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut values: Vec<i32> = (1..=N).collect();
    values.shuffle(&mut rng);

    c.bench_function("tree_insert", |b| {
        b.iter_batched(
            AvlTree::new,
            |mut tree| {
                for value in &values {
                    let _ = tree.insert(*value, *value);
                }
                tree
            },
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree_finger_insert_ascending", |b| {
        b.iter_batched(
            AvlTree::new,
            |mut tree| {
                for value in 1..=N {
                    let _ = tree.finger_insert(value, value);
                }
                tree
            },
            BatchSize::LargeInput,
        )
    });

    let tree: AvlTree<i32, i32> = values.iter().map(|value| (*value, *value)).collect();

    c.bench_function("tree_search", |b| {
        b.iter(|| {
            for value in &values {
                black_box(tree.search(value));
            }
        })
    });

    c.bench_function("tree_finger_search_near_max", |b| {
        b.iter(|| {
            for value in N - 1_000..=N {
                black_box(tree.finger_search(&value));
            }
        })
    });

    c.bench_function("tree_iter", |b| {
        b.iter(|| {
            for (k, v) in &tree {
                black_box((k, v));
            }
        })
    });

    c.bench_function("tree_remove", |b| {
        b.iter_batched(
            || values.iter().map(|value| (*value, *value)).collect::<AvlTree<_, _>>(),
            |mut tree| {
                for value in &values {
                    tree.remove(value);
                }
                tree
            },
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree_split_join", |b| {
        let mut tree: AvlTree<i32, i32> = (1..=N).map(|value| (value, value)).collect();
        b.iter(|| {
            let handle = tree.search(&(N / 3)).0.map(|node| node.handle());
            if let Some(handle) = handle {
                if let Ok(mut split) = tree.split(&handle) {
                    let (key, value) = split.pivot;
                    let _ = split.left.join(split.right, key, value);
                    tree = split.left;
                }
            }
        })
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
