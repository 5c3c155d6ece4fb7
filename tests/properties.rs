//! Property-based tests checking the dictionary against a `BTreeMap` oracle.
//!
//! - Every operation keeps order, cached heights and balance intact
//! - In-order pairs equal the sorted inserted pairs
//! - Finger search finds exactly what root search finds
//! - Split followed by join gives back the original entries
//! - Root height stays within the AVL worst-case bound

use std::collections::BTreeMap;

use avl_dict::AvlTree;
use proptest::prelude::*;

fn unique_keys(max_len: usize) -> impl Strategy<Value = Vec<i32>> {
    prop::collection::hash_set(-10_000..10_000i32, 0..max_len)
        .prop_map(|set| set.into_iter().collect())
}

#[derive(Debug, Clone)]
enum Op {
    Insert(i32),
    FingerInsert(i32),
    Remove(i32),
    DeleteMax,
}

fn operations(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (-500..500i32).prop_map(Op::Insert),
            (-500..500i32).prop_map(Op::FingerInsert),
            (-500..500i32).prop_map(Op::Remove),
            Just(Op::DeleteMax),
        ],
        0..max_ops,
    )
}

fn assert_matches(tree: &AvlTree<i32, i32>, oracle: &BTreeMap<i32, i32>) -> Result<(), TestCaseError> {
    prop_assert!(tree.is_height_correct());
    prop_assert!(tree.is_balanced());
    prop_assert_eq!(tree.len(), oracle.len());
    prop_assert_eq!(tree.max().map(|max| *max.key()), oracle.keys().next_back().copied());
    let pairs: Vec<(i32, i32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
    let expected: Vec<(i32, i32)> = oracle.iter().map(|(k, v)| (*k, *v)).collect();
    prop_assert_eq!(pairs, expected);
    Ok(())
}

fn build(keys: &[i32]) -> AvlTree<i32, i32> {
    let mut tree = AvlTree::new();
    for key in keys {
        tree.insert(*key, key.wrapping_mul(3)).unwrap();
    }
    tree
}

proptest! {
    #[test]
    fn operations_match_oracle(ops in operations(300)) {
        let mut tree = AvlTree::new();
        let mut oracle = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    let fresh = !oracle.contains_key(&key);
                    prop_assert_eq!(tree.insert(key, key).is_ok(), fresh);
                    oracle.entry(key).or_insert(key);
                }
                Op::FingerInsert(key) => {
                    let fresh = !oracle.contains_key(&key);
                    prop_assert_eq!(tree.finger_insert(key, key).is_ok(), fresh);
                    oracle.entry(key).or_insert(key);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(tree.remove(&key), oracle.remove(&key));
                }
                Op::DeleteMax => {
                    if let Some(max) = tree.max().map(|max| max.handle()) {
                        let (key, _) = tree.delete(&max).unwrap();
                        prop_assert_eq!(oracle.pop_last().map(|(k, _)| k), Some(key));
                    }
                }
            }
            assert_matches(&tree, &oracle)?;
        }
    }

    #[test]
    fn finger_search_agrees_with_search(keys in unique_keys(300), probes in prop::collection::vec(-10_000..10_000i32, 0..50)) {
        let tree = build(&keys);
        for probe in keys.iter().chain(&probes) {
            let (by_finger, _) = tree.finger_search(probe);
            let (by_root, _) = tree.search(probe);
            prop_assert_eq!(by_finger, by_root);
        }
    }

    #[test]
    fn height_within_avl_bound(keys in unique_keys(2_000)) {
        let tree = build(&keys);
        let bound = 1.4404 * ((keys.len() + 2) as f64).log2() - 0.328;
        prop_assert!(f64::from(tree.height()) <= bound);
    }

    #[test]
    fn split_then_join_is_identity(keys in unique_keys(300), index in any::<prop::sample::Index>()) {
        prop_assume!(!keys.is_empty());
        let mut tree = build(&keys);
        let oracle: BTreeMap<i32, i32> = keys.iter().map(|k| (*k, k.wrapping_mul(3))).collect();
        let pivot = keys[index.index(keys.len())];

        let handle = tree.search(&pivot).0.unwrap().handle();
        let split = tree.split(&handle).unwrap();
        prop_assert!(tree.is_empty());
        prop_assert_eq!(split.left.len() + split.right.len() + 1, keys.len());
        prop_assert!(split.left.iter().all(|(k, _)| *k < pivot));
        prop_assert!(split.right.iter().all(|(k, _)| *k > pivot));
        prop_assert!(split.left.is_balanced() && split.left.is_height_correct());
        prop_assert!(split.right.is_balanced() && split.right.is_height_correct());

        let (key, value) = split.pivot;
        let mut joined = split.right;
        joined.join(split.left, key, value).unwrap();
        assert_matches(&joined, &oracle)?;
    }

    #[test]
    fn join_disjoint_trees(lower in unique_keys(200), upper in unique_keys(200)) {
        let lower: Vec<i32> = lower.into_iter().map(|k| k - 20_000).collect();
        let upper: Vec<i32> = upper.into_iter().map(|k| k + 20_000).collect();
        let mut oracle: BTreeMap<i32, i32> = lower
            .iter()
            .chain(&upper)
            .map(|k| (*k, k.wrapping_mul(3)))
            .collect();
        oracle.insert(0, 0);

        let mut tree = build(&lower);
        tree.join(build(&upper), 0, 0).unwrap();
        assert_matches(&tree, &oracle)?;
    }
}
