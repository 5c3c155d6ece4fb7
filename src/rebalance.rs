use tracing::trace;

use crate::node::{balance_factor, update, Link, NodePtr};
use crate::tree::AvlTree;

/// How far [`AvlTree::rebalance`] walks towards the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Stop after the first rotation.
    /// This is enough to restore balance after a single insert operation.
    SingleFix,
    /// Visit every node up to the root.
    /// Needed after a delete or a join, where several ancestors may need rotations.
    FullWalk,
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Rebalances nodes starting from given position up to the root node.
    /// Returns the number of rotations applied, a double rotation counting as two.
    pub(crate) fn rebalance(&mut self, start_from: Link<K, V>, mode: Mode) -> usize {
        let mut rotations = 0;
        let mut current = start_from;
        while let Some(node_ptr) = current {
            let parent = unsafe { node_ptr.as_ref().parent };
            let applied = self.rebalance_node(node_ptr);
            rotations += applied;
            if applied > 0 && mode == Mode::SingleFix {
                break;
            }
            current = parent;
        }
        rotations
    }

    /// Restores AVL condition (balance) at given node if necessary and adjusts height.
    /// Resulting balance will be +1, 0 or -1 height difference between left and right subtree.
    /// Initial balance must not exceed +2 or -2, which always holds after a single update.
    /// Returns the number of rotations performed.
    fn rebalance_node(&mut self, node_ptr: NodePtr<K, V>) -> usize {
        let bf = balance_factor(node_ptr);
        debug_assert!((-2..=2).contains(&bf));
        let (left, right) = unsafe { (node_ptr.as_ref().left, node_ptr.as_ref().right) };
        match (bf, left, right) {
            (2, Some(left_ptr), _) => {
                if balance_factor(left_ptr) < 0 {
                    trace!(height = unsafe { node_ptr.as_ref().height }, "left-right rotation");
                    self.rotate_left(left_ptr);
                    self.rotate_right(node_ptr);
                    2
                } else {
                    trace!(height = unsafe { node_ptr.as_ref().height }, "right rotation");
                    self.rotate_right(node_ptr);
                    1
                }
            }
            (-2, _, Some(right_ptr)) => {
                if balance_factor(right_ptr) > 0 {
                    trace!(height = unsafe { node_ptr.as_ref().height }, "right-left rotation");
                    self.rotate_right(right_ptr);
                    self.rotate_left(node_ptr);
                    2
                } else {
                    trace!(height = unsafe { node_ptr.as_ref().height }, "left rotation");
                    self.rotate_left(node_ptr);
                    1
                }
            }
            _ => {
                update(node_ptr);
                0
            }
        }
    }

    fn rotate_left(&mut self, mut node_ptr: NodePtr<K, V>) {
        unsafe {
            if let Some(mut right_ptr) = node_ptr.as_ref().right {
                node_ptr.as_mut().right = right_ptr.as_ref().left;
                if let Some(mut right_left_ptr) = right_ptr.as_ref().left {
                    right_left_ptr.as_mut().parent = Some(node_ptr);
                }

                right_ptr.as_mut().parent = node_ptr.as_ref().parent;
                self.replace_child(node_ptr.as_ref().parent, node_ptr, Some(right_ptr));

                right_ptr.as_mut().left = Some(node_ptr);
                node_ptr.as_mut().parent = Some(right_ptr);

                update(node_ptr);
                update(right_ptr);
            }
        }
    }

    fn rotate_right(&mut self, mut node_ptr: NodePtr<K, V>) {
        unsafe {
            if let Some(mut left_ptr) = node_ptr.as_ref().left {
                node_ptr.as_mut().left = left_ptr.as_ref().right;
                if let Some(mut left_right_ptr) = left_ptr.as_ref().right {
                    left_right_ptr.as_mut().parent = Some(node_ptr);
                }

                left_ptr.as_mut().parent = node_ptr.as_ref().parent;
                self.replace_child(node_ptr.as_ref().parent, node_ptr, Some(left_ptr));

                left_ptr.as_mut().right = Some(node_ptr);
                node_ptr.as_mut().parent = Some(left_ptr);

                update(node_ptr);
                update(left_ptr);
            }
        }
    }

    /// Points the link that held `old` at `new` instead.
    /// A `None` parent means `old` was the root.
    pub(crate) fn replace_child(
        &mut self,
        parent: Link<K, V>,
        old: NodePtr<K, V>,
        new: Link<K, V>,
    ) {
        match parent {
            None => self.root = new,
            Some(mut parent_ptr) => unsafe {
                if parent_ptr.as_ref().left == Some(old) {
                    parent_ptr.as_mut().left = new;
                } else {
                    parent_ptr.as_mut().right = new;
                }
            },
        }
    }
}
