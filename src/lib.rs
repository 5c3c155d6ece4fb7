//! An ordered dictionary implemented with an AVL tree, with finger search
//! from the maximum, join of key-disjoint trees and split at a node.
//!
//! ```
//! use avl_dict::AvlTree;
//!
//! let mut lower = AvlTree::new();
//! for key in [5, 10, 15] {
//!     lower.insert(key, key).unwrap();
//! }
//! let upper: AvlTree<i32, i32> = [(25, 25), (30, 30), (35, 35)].into_iter().collect();
//!
//! lower.join(upper, 20, 20).unwrap();
//! let keys: Vec<i32> = lower.iter().map(|(key, _)| *key).collect();
//! assert_eq!(keys, [5, 10, 15, 20, 25, 30, 35]);
//! assert!(lower.is_balanced() && lower.is_height_correct());
//! ```

mod debug;
mod error;
mod iter;
mod join;
mod node;
mod rebalance;
mod tree;

pub use error::{Error, Result};
pub use iter::Iter;
pub use join::Split;
pub use node::{Handle, NodeRef};
pub use tree::{AvlTree, Inserted};
