use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::mem;

use tracing::trace;

use crate::error::{Error, Result};
use crate::iter::Iter;
use crate::node::{
    balance_factor, leftmost, link_height, rightmost, update, Handle, Link, Node, NodePtr,
    NodeRef,
};
use crate::rebalance::Mode;

/// An ordered dictionary implemented with an AVL tree.
///
/// Besides the usual root-based search and insert, the tree keeps a finger on
/// its maximum node, supports joining two trees around a separating key and
/// splitting a tree at one of its nodes.
///
/// ```
/// use avl_dict::AvlTree;
///
/// let mut tree = AvlTree::new();
/// for key in [10, 5, 15, 3, 7, 12, 20] {
///     tree.insert(key, key.to_string()).unwrap();
/// }
/// let (found, edges) = tree.search(&7);
/// assert_eq!(found.map(|node| node.value().as_str()), Some("7"));
/// assert_eq!(edges, 3);
///
/// let node = tree.finger_search(&15).0.unwrap().handle();
/// let split = tree.split(&node).unwrap();
/// assert_eq!(split.left.len(), 5);
/// assert_eq!(split.right.len(), 1);
/// ```
pub struct AvlTree<K: Ord, V> {
    pub(crate) root: Link<K, V>,
    pub(crate) max_node: Link<K, V>,
    pub(crate) num_nodes: usize,
    _marker: PhantomData<Box<Node<K, V>>>,
}

/// Outcome of [`AvlTree::insert`] and [`AvlTree::finger_insert`].
#[derive(Debug)]
pub struct Inserted<'a, K, V> {
    /// The freshly created node.
    pub node: NodeRef<'a, K, V>,
    /// Edges walked to find the insert position, before any rebalancing.
    pub edges: usize,
    /// Rotations applied while rebalancing: 0, 1, or 2 for a double rotation.
    pub rotations: usize,
    /// Ancestors whose height grew by one when the new leaf was attached,
    /// counted up to the node where a rotation happened.
    pub promotions: usize,
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Creates an empty tree.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            max_node: None,
            num_nodes: 0,
            _marker: PhantomData,
        }
    }

    /// Returns true if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the height of the root, -1 for an empty tree.
    pub fn height(&self) -> i32 {
        link_height(self.root)
    }

    pub fn root(&self) -> Option<NodeRef<'_, K, V>> {
        self.root.map(NodeRef::new)
    }

    /// Returns the node holding the greatest key.
    pub fn max(&self) -> Option<NodeRef<'_, K, V>> {
        self.max_node.map(NodeRef::new)
    }

    /// Returns the node holding the smallest key.
    pub fn min(&self) -> Option<NodeRef<'_, K, V>> {
        self.root.map(|root_ptr| NodeRef::new(leftmost(root_ptr)))
    }

    /// Clears the tree, deallocating all memory.
    pub fn clear(&mut self) {
        self.postorder(|node_ptr| unsafe {
            Node::destroy(node_ptr);
        });
        self.root = None;
        self.max_node = None;
        self.num_nodes = 0;
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key)
            .map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.value)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.find(key).map(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            (&node.key, &node.value)
        })
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Searches for `key` starting at the root.
    ///
    /// Returns the node holding the key, if any, and the number of nodes
    /// compared on the way: one more than the number of edges walked.
    /// An empty tree reports 0.
    pub fn search(&self, key: &K) -> (Option<NodeRef<'_, K, V>>, usize) {
        match self.root {
            None => (None, 0),
            Some(root_ptr) => {
                let (found, edges) = Self::descend(root_ptr, key);
                (found.map(NodeRef::new), edges)
            }
        }
    }

    /// Searches for `key` starting at the maximum node.
    ///
    /// Climbs the right spine while `key` cannot be in the subtree of the
    /// current node, then descends as [`search`](Self::search) does. Finds the
    /// same node as `search`; the edge count covers both phases and is small
    /// for keys close to the maximum.
    pub fn finger_search(&self, key: &K) -> (Option<NodeRef<'_, K, V>>, usize) {
        let Some(mut node_ptr) = self.max_node else {
            return (None, 0);
        };
        let mut edges = 1;
        unsafe {
            while let Some(parent_ptr) = node_ptr.as_ref().parent {
                if *key == node_ptr.as_ref().key {
                    return (Some(NodeRef::new(node_ptr)), edges);
                }
                if *key <= parent_ptr.as_ref().key {
                    node_ptr = parent_ptr;
                    edges += 1;
                } else {
                    break;
                }
            }
        }
        let (found, descent) = Self::descend(node_ptr, key);
        (found.map(NodeRef::new), edges + descent - 1)
    }

    /// Inserts a key-value pair, searching for the position from the root.
    ///
    /// Fails with [`Error::DuplicateKey`] if the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> Result<Inserted<'_, K, V>> {
        match self.root {
            None => Ok(self.insert_first(key, value)),
            Some(root_ptr) => self.insert_below(root_ptr, 0, key, value),
        }
    }

    /// Inserts a key-value pair, searching for the position from the maximum node.
    ///
    /// Climbing steps from the maximum count towards [`Inserted::edges`].
    /// Fails with [`Error::DuplicateKey`] if the key is already present.
    pub fn finger_insert(&mut self, key: K, value: V) -> Result<Inserted<'_, K, V>> {
        let Some(mut node_ptr) = self.max_node else {
            return Ok(self.insert_first(key, value));
        };
        let mut edges = 0;
        while let Some(parent_ptr) = unsafe { node_ptr.as_ref().parent } {
            if &key <= unsafe { &parent_ptr.as_ref().key } {
                node_ptr = parent_ptr;
                edges += 1;
            } else {
                break;
            }
        }
        self.insert_below(node_ptr, edges, key, value)
    }

    /// Removes the node named by `node` and returns its key-value pair.
    ///
    /// Fails with [`Error::NodeNotFound`] if the handle does not name a node
    /// of this tree.
    pub fn delete(&mut self, node: &Handle<K, V>) -> Result<(K, V)> {
        let node_ptr = self.resolve(node)?;
        Ok(self.remove_node(node_ptr))
    }

    /// Removes a key from the tree.
    /// Returns the value at the key if the key was previously in the tree.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let node_ptr = self.find(key)?;
        Some(self.remove_node(node_ptr).1)
    }

    /// Gets an iterator over the entries of the tree, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.map(leftmost), self.num_nodes)
    }

    /// Collects all entries in key order.
    pub fn to_ordered_pairs(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    /// Returns true if every node caches the height of its subtree.
    pub fn is_height_correct(&self) -> bool {
        let mut correct = true;
        self.preorder(|node_ptr| {
            let node = unsafe { node_ptr.as_ref() };
            let expected = 1 + link_height(node.left).max(link_height(node.right));
            correct &= node.height == expected;
        });
        correct
    }

    /// Returns true if every node has a balance factor of -1, 0 or +1.
    pub fn is_balanced(&self) -> bool {
        let mut balanced = true;
        self.preorder(|node_ptr| balanced &= balance_factor(node_ptr).abs() <= 1);
        balanced
    }

    /// Asserts every structural invariant: parent links, key order, cached
    /// heights and sizes, balance, length and the maximum finger.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        unsafe {
            // Check root link
            if let Some(root_node_ptr) = self.root {
                assert!(root_node_ptr.as_ref().parent.is_none());
            }

            // Check tree nodes
            let mut num_nodes = 0;
            self.preorder(|node_ptr| {
                let node = node_ptr.as_ref();
                let mut size = 1;

                // Check link for left child node
                if let Some(left_ptr) = node.left {
                    assert!(left_ptr.as_ref().parent == Some(node_ptr));
                    assert!(left_ptr.as_ref().key < node.key);
                    assert!(rightmost(left_ptr).as_ref().key < node.key);
                    size += left_ptr.as_ref().size;
                }

                // Check link for right child node
                if let Some(right_ptr) = node.right {
                    assert!(right_ptr.as_ref().parent == Some(node_ptr));
                    assert!(right_ptr.as_ref().key > node.key);
                    assert!(leftmost(right_ptr).as_ref().key > node.key);
                    size += right_ptr.as_ref().size;
                }

                // Check height and size
                let left_height = link_height(node.left);
                let right_height = link_height(node.right);
                assert_eq!(node.height, 1 + left_height.max(right_height));
                assert_eq!(node.size, size);

                // Check AVL condition (nearly balance)
                assert!((left_height - right_height).abs() <= 1);

                num_nodes += 1;
            });

            // Check number of nodes and the finger
            assert_eq!(num_nodes, self.num_nodes);
            assert!(self.max_node == self.root.map(rightmost));
        }
    }

    pub(crate) fn find(&self, key: &K) -> Link<K, V> {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => break,
                    Ordering::Less => node_ptr.as_ref().left,
                    Ordering::Greater => node_ptr.as_ref().right,
                }
            }
        }
        current
    }

    /// Maps a handle back to the node it names, if that node is in this tree.
    pub(crate) fn resolve(&self, handle: &Handle<K, V>) -> Result<NodePtr<K, V>> {
        match self.find(handle.key()) {
            Some(node_ptr) if node_ptr == handle.ptr() => Ok(node_ptr),
            _ => Err(Error::NodeNotFound),
        }
    }

    /// Descends from `start` towards `key`, counting every node compared.
    fn descend(start: NodePtr<K, V>, key: &K) -> (Link<K, V>, usize) {
        let mut node_ptr = start;
        let mut edges = 1;
        loop {
            let node = unsafe { node_ptr.as_ref() };
            let next = match key.cmp(&node.key) {
                Ordering::Equal => return (Some(node_ptr), edges),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
            match next {
                None => return (None, edges),
                Some(next_ptr) => {
                    node_ptr = next_ptr;
                    edges += 1;
                }
            }
        }
    }

    pub(crate) fn insert_first(&mut self, key: K, value: V) -> Inserted<'_, K, V> {
        debug_assert!(self.is_empty());
        let node_ptr = Node::create(None, key, value);
        self.root = Some(node_ptr);
        self.max_node = Some(node_ptr);
        self.num_nodes = 1;
        Inserted {
            node: NodeRef::new(node_ptr),
            edges: 0,
            rotations: 0,
            promotions: 0,
        }
    }

    /// Attaches a new leaf below `start`, whose subtree must be able to hold `key`.
    fn insert_below(
        &mut self,
        start: NodePtr<K, V>,
        mut edges: usize,
        key: K,
        value: V,
    ) -> Result<Inserted<'_, K, V>> {
        let mut parent_ptr = start;
        let node_ptr = unsafe {
            loop {
                edges += 1;
                let parent = parent_ptr.as_mut();
                let link = match key.cmp(&parent.key) {
                    Ordering::Equal => return Err(Error::DuplicateKey),
                    Ordering::Less => &mut parent.left,
                    Ordering::Greater => &mut parent.right,
                };
                match *link {
                    Some(child_ptr) => parent_ptr = child_ptr,
                    None => {
                        let node_ptr = Node::create(Some(parent_ptr), key, value);
                        *link = Some(node_ptr);
                        break node_ptr;
                    }
                }
            }
        };

        self.num_nodes += 1;
        let is_new_max = match self.max_node {
            None => true,
            Some(max_ptr) => unsafe { node_ptr.as_ref().key > max_ptr.as_ref().key },
        };
        if is_new_max {
            self.max_node = Some(node_ptr);
        }

        let mut ancestor = Some(parent_ptr);
        while let Some(mut ancestor_ptr) = ancestor {
            unsafe {
                ancestor_ptr.as_mut().size += 1;
                ancestor = ancestor_ptr.as_ref().parent;
            }
        }

        let promotions = Self::promote(parent_ptr);
        let rotations = self.rebalance(Some(parent_ptr), Mode::SingleFix);
        Ok(Inserted {
            node: NodeRef::new(node_ptr),
            edges,
            rotations,
            promotions,
        })
    }

    /// Raises cached heights from `start` upwards after a leaf was attached below it.
    /// Stops at the first node whose height is unchanged or that became unbalanced,
    /// leaving the latter to the rebalancer. Returns the number of raised heights.
    fn promote(start: NodePtr<K, V>) -> usize {
        let mut promotions = 0;
        let mut current = Some(start);
        while let Some(node_ptr) = current {
            if balance_factor(node_ptr).abs() > 1 {
                break;
            }
            let before = unsafe { node_ptr.as_ref().height };
            update(node_ptr);
            if unsafe { node_ptr.as_ref().height } == before {
                break;
            }
            promotions += 1;
            current = unsafe { node_ptr.as_ref().parent };
        }
        promotions
    }

    fn remove_node(&mut self, node_ptr: NodePtr<K, V>) -> (K, V) {
        debug_assert!(self.num_nodes >= 1);
        self.unlink_node(node_ptr);
        self.num_nodes -= 1;
        if self.max_node == Some(node_ptr) {
            self.max_node = self.root.map(rightmost);
        }
        let node = unsafe { Node::destroy(node_ptr) };
        (node.key, node.value)
    }

    fn unlink_node(&mut self, node_ptr: NodePtr<K, V>) {
        unsafe {
            let node = node_ptr.as_ref();
            let rebalance_from = match (node.left, node.right) {
                (Some(mut left_ptr), Some(mut right_ptr)) => {
                    // Find smallest child node in right sub tree
                    let mut successor_parent_ptr = node_ptr;
                    let mut successor_ptr = right_ptr;
                    while let Some(next_ptr) = successor_ptr.as_ref().left {
                        successor_parent_ptr = successor_ptr;
                        successor_ptr = next_ptr;
                    }
                    trace!(
                        adjacent = successor_ptr == right_ptr,
                        "delete node with two children"
                    );

                    if successor_ptr != right_ptr {
                        // Unlink successor, its right child takes its place
                        let successor_right = successor_ptr.as_ref().right;
                        successor_parent_ptr.as_mut().left = successor_right;
                        if let Some(mut successor_right_ptr) = successor_right {
                            successor_right_ptr.as_mut().parent = Some(successor_parent_ptr);
                        }
                        successor_ptr.as_mut().right = Some(right_ptr);
                        right_ptr.as_mut().parent = Some(successor_ptr);
                    }

                    // Replace node to-unlink by its successor
                    successor_ptr.as_mut().left = Some(left_ptr);
                    left_ptr.as_mut().parent = Some(successor_ptr);
                    successor_ptr.as_mut().parent = node.parent;
                    self.replace_child(node.parent, node_ptr, Some(successor_ptr));

                    if successor_parent_ptr == node_ptr {
                        Some(successor_ptr)
                    } else {
                        Some(successor_parent_ptr)
                    }
                }
                (left, right) => {
                    // Node to-unlink is stem or leaf, splice its only child in
                    trace!(leaf = left.is_none() && right.is_none(), "delete node");
                    let child = left.or(right);
                    if let Some(mut child_ptr) = child {
                        child_ptr.as_mut().parent = node.parent;
                    }
                    self.replace_child(node.parent, node_ptr, child);
                    node.parent
                }
            };
            self.rebalance(rebalance_from, Mode::FullWalk);
        }
    }

    /// Takes the nodes out of this tree, leaving it empty.
    pub(crate) fn detach_root(&mut self) -> Link<K, V> {
        self.max_node = None;
        self.num_nodes = 0;
        self.root.take()
    }

    /// Wraps a detached subtree into a tree of its own.
    pub(crate) fn from_subtree(link: Link<K, V>) -> Self {
        let mut tree = Self::new();
        if let Some(mut root_ptr) = link {
            unsafe {
                root_ptr.as_mut().parent = None;
                tree.num_nodes = root_ptr.as_ref().size;
            }
            tree.root = link;
            tree.max_node = Some(rightmost(root_ptr));
        }
        tree
    }

    pub(crate) fn preorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(f, |_| {}, |_| {});
    }

    fn postorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(|_| {}, |_| {}, f);
    }

    fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(NodePtr<K, V>),
        In: FnMut(NodePtr<K, V>),
        Post: FnMut(NodePtr<K, V>),
    {
        if let Some(mut node_ptr) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(node_ptr);
                        if let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
                            node_ptr = left_ptr;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(node_ptr);
                        if let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
                            node_ptr = right_ptr;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        // Post order traversal is used for node deletion,
                        // so make sure not to use node pointer after postorder call.
                        if let Some(parent_ptr) = unsafe { node_ptr.as_ref().parent } {
                            if Some(node_ptr) == unsafe { parent_ptr.as_ref().left } {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            postorder(node_ptr);
                            node_ptr = parent_ptr;
                        } else {
                            postorder(node_ptr);
                            break;
                        }
                    }
                }
            }
        }
    }
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K: Ord, V> Drop for AvlTree<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: Ord, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: a tree exclusively owns its nodes; nothing is shared between trees.
unsafe impl<K: Ord + Send, V: Send> Send for AvlTree<K, V> {}
unsafe impl<K: Ord + Sync, V: Sync> Sync for AvlTree<K, V> {}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a AvlTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Keys already present keep their first value.
impl<K: Ord, V> Extend<(K, V)> for AvlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let _ = self.finger_insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Leaves `self` empty and returns its former contents.
    pub(crate) fn take(&mut self) -> Self {
        mem::take(self)
    }
}
