//! Joining two trees around a separator and splitting a tree at a node.
//!
//! A join costs time proportional to the height difference of its inputs:
//! the separator is spliced into the spine of the taller tree at the height
//! of the shorter one and only the spine above it is rebalanced. A split
//! rebuilds both halves bottom-up with one join per ancestor of the split
//! node, which bounds it by the square of the tree height.

use std::fmt;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::node::{link_height, parent_side, rightmost, update, Handle, Node, NodePtr, Side};
use crate::rebalance::Mode;
use crate::tree::AvlTree;

/// The two halves produced by [`AvlTree::split`].
pub struct Split<K: Ord, V> {
    /// Every entry with a key below the pivot.
    pub left: AvlTree<K, V>,
    /// The entry held by the node the tree was split at.
    pub pivot: (K, V),
    /// Every entry with a key above the pivot.
    pub right: AvlTree<K, V>,
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Merges `other` and the entry `(key, value)` into this tree.
    ///
    /// `key` must be greater than every key of one tree and smaller than
    /// every key of the other; which side this tree is on does not matter.
    /// Otherwise fails with [`Error::KeyNotSeparating`], leaving this tree
    /// unchanged and dropping `other`.
    pub fn join(&mut self, other: Self, key: K, value: V) -> Result<()> {
        let this = self.take();
        let (lower, upper) = if Self::separates(&this, &key, &other) {
            (this, other)
        } else if Self::separates(&other, &key, &this) {
            (other, this)
        } else {
            *self = this;
            return Err(Error::KeyNotSeparating);
        };
        *self = Self::join_ordered(lower, key, value, upper);
        Ok(())
    }

    /// Splits the tree at the node named by `node`.
    ///
    /// Returns the entries below and above the node as two trees, and the
    /// node's own entry. This tree is left empty. Fails with
    /// [`Error::NodeNotFound`] if the handle does not name a node of this
    /// tree, in which case the tree is unchanged.
    pub fn split(&mut self, node: &Handle<K, V>) -> Result<Split<K, V>> {
        let node_ptr = self.resolve(node)?;
        let total = self.num_nodes;
        // The nodes are now owned by this function until handed to the halves.
        self.detach_root();

        let mut step = parent_side(node_ptr);
        let pivot = unsafe { Node::destroy(node_ptr) };
        let mut left = Self::from_subtree(pivot.left);
        let mut right = Self::from_subtree(pivot.right);

        while let Some((ancestor_ptr, side)) = step {
            step = parent_side(ancestor_ptr);
            let ancestor = unsafe { Node::destroy(ancestor_ptr) };
            trace!(?side, height = ancestor.height, "split: absorb ancestor");
            match side {
                // Arrived from the right: the ancestor and its left subtree are smaller.
                Side::Right => {
                    let smaller = Self::from_subtree(ancestor.left);
                    left = Self::join_ordered(smaller, ancestor.key, ancestor.value, left);
                }
                Side::Left => {
                    let larger = Self::from_subtree(ancestor.right);
                    right = Self::join_ordered(right, ancestor.key, ancestor.value, larger);
                }
            }
        }

        debug_assert_eq!(left.len() + right.len() + 1, total);
        debug!(left = left.len(), right = right.len(), "split complete");
        Ok(Split {
            left,
            pivot: (pivot.key, pivot.value),
            right,
        })
    }

    /// Returns true if every key of `lower` is below `key` and every key of
    /// `upper` above it.
    fn separates(lower: &Self, key: &K, upper: &Self) -> bool {
        lower.max().is_none_or(|max| max.key() < key)
            && upper.min().is_none_or(|min| key < min.key())
    }

    /// Joins two trees whose keys lie below and above `key` respectively.
    pub(crate) fn join_ordered(mut lower: Self, key: K, value: V, mut upper: Self) -> Self {
        let len = lower.len() + upper.len() + 1;
        let (lower_root, upper_root) = (lower.detach_root(), upper.detach_root());

        let (lower_ptr, upper_ptr) = match (lower_root, upper_root) {
            (None, None) => {
                let mut joined = Self::new();
                joined.insert_first(key, value);
                return joined;
            }
            (Some(_), None) | (None, Some(_)) => {
                let mut joined = Self::from_subtree(lower_root.or(upper_root));
                let inserted = joined.insert(key, value).is_ok();
                debug_assert!(inserted);
                return joined;
            }
            (Some(lower_ptr), Some(upper_ptr)) => (lower_ptr, upper_ptr),
        };

        let lower_height = link_height(lower_root);
        let upper_height = link_height(upper_root);
        trace!(lower_height, upper_height, "join");

        let separator_ptr = Node::create(None, key, value);
        let mut joined = Self::new();
        if (lower_height - upper_height).abs() <= 1 {
            Self::attach(separator_ptr, Some(lower_ptr), Some(upper_ptr));
            joined.root = Some(separator_ptr);
        } else if lower_height > upper_height {
            // Walk down the right spine to the first node not taller than `upper`
            let mut spine_ptr = lower_ptr;
            while let Some(next_ptr) = unsafe { spine_ptr.as_ref().right }
                .filter(|&next_ptr| link_height(Some(next_ptr)) > upper_height)
            {
                spine_ptr = next_ptr;
            }
            let inner = unsafe { spine_ptr.as_ref().right };
            Self::attach(separator_ptr, inner, Some(upper_ptr));
            unsafe {
                spine_ptr.as_mut().right = Some(separator_ptr);
                (*separator_ptr.as_ptr()).parent = Some(spine_ptr);
            }
            joined.root = Some(lower_ptr);
            joined.rebalance(Some(separator_ptr), Mode::FullWalk);
        } else {
            // Walk down the left spine to the first node not taller than `lower`
            let mut spine_ptr = upper_ptr;
            while let Some(next_ptr) = unsafe { spine_ptr.as_ref().left }
                .filter(|&next_ptr| link_height(Some(next_ptr)) > lower_height)
            {
                spine_ptr = next_ptr;
            }
            let inner = unsafe { spine_ptr.as_ref().left };
            Self::attach(separator_ptr, Some(lower_ptr), inner);
            unsafe {
                spine_ptr.as_mut().left = Some(separator_ptr);
                (*separator_ptr.as_ptr()).parent = Some(spine_ptr);
            }
            joined.root = Some(upper_ptr);
            joined.rebalance(Some(separator_ptr), Mode::FullWalk);
        }

        joined.num_nodes = len;
        joined.max_node = joined.root.map(rightmost);
        joined
    }

    /// Hangs `left` and `right` below `node_ptr` and recomputes its height.
    fn attach(
        mut node_ptr: NodePtr<K, V>,
        left: Option<NodePtr<K, V>>,
        right: Option<NodePtr<K, V>>,
    ) {
        unsafe {
            node_ptr.as_mut().left = left;
            node_ptr.as_mut().right = right;
            for mut child_ptr in left.into_iter().chain(right) {
                child_ptr.as_mut().parent = Some(node_ptr);
            }
        }
        update(node_ptr);
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for Split<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Split")
            .field("left", &self.left)
            .field("pivot", &self.pivot)
            .field("right", &self.right)
            .finish()
    }
}
