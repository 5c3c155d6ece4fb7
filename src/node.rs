use std::cmp;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Height reported for an absent child.
pub(crate) const NIL_HEIGHT: i32 = -1;

pub(crate) type NodePtr<K, V> = NonNull<Node<K, V>>;
pub(crate) type Link<K, V> = Option<NodePtr<K, V>>;

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    pub(crate) parent: Link<K, V>,
    pub(crate) height: i32,
    pub(crate) size: usize,
}

/// Which child link of its parent a node hangs off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl<K, V> Node<K, V> {
    pub(crate) fn create(parent: Link<K, V>, key: K, value: V) -> NodePtr<K, V> {
        let boxed = Box::new(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            height: 0,
            size: 1,
        });
        NonNull::from(Box::leak(boxed))
    }

    /// Frees the node and hands back its contents.
    /// Links of the returned node still point into the tree.
    pub(crate) unsafe fn destroy(node_ptr: NodePtr<K, V>) -> Node<K, V> {
        *Box::from_raw(node_ptr.as_ptr())
    }
}

pub(crate) fn link_height<K, V>(link: Link<K, V>) -> i32 {
    match link {
        None => NIL_HEIGHT,
        Some(node_ptr) => unsafe { node_ptr.as_ref().height },
    }
}

fn link_size<K, V>(link: Link<K, V>) -> usize {
    match link {
        None => 0,
        Some(node_ptr) => unsafe { node_ptr.as_ref().size },
    }
}

pub(crate) fn balance_factor<K, V>(node_ptr: NodePtr<K, V>) -> i32 {
    let node = unsafe { node_ptr.as_ref() };
    link_height(node.left) - link_height(node.right)
}

/// Recomputes the cached height and subtree size from the children.
pub(crate) fn update<K, V>(mut node_ptr: NodePtr<K, V>) {
    unsafe {
        let node = node_ptr.as_mut();
        node.height = 1 + cmp::max(link_height(node.left), link_height(node.right));
        node.size = 1 + link_size(node.left) + link_size(node.right);
    }
}

pub(crate) fn leftmost<K, V>(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
    while let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
        node_ptr = left_ptr;
    }
    node_ptr
}

pub(crate) fn rightmost<K, V>(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
    while let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
        node_ptr = right_ptr;
    }
    node_ptr
}

/// Returns the parent of a node together with the side the node hangs off.
pub(crate) fn parent_side<K, V>(node_ptr: NodePtr<K, V>) -> Option<(NodePtr<K, V>, Side)> {
    let parent_ptr = unsafe { node_ptr.as_ref().parent }?;
    if unsafe { parent_ptr.as_ref().left } == Some(node_ptr) {
        Some((parent_ptr, Side::Left))
    } else {
        Some((parent_ptr, Side::Right))
    }
}

/// A shared reference to a node of an [`AvlTree`](crate::AvlTree).
///
/// Two `NodeRef`s compare equal iff they refer to the very same node.
pub struct NodeRef<'a, K, V> {
    ptr: NodePtr<K, V>,
    _marker: PhantomData<&'a Node<K, V>>,
}

impl<'a, K, V> NodeRef<'a, K, V> {
    pub(crate) fn new(ptr: NodePtr<K, V>) -> Self {
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    fn node(&self) -> &'a Node<K, V> {
        unsafe { &*self.ptr.as_ptr() }
    }

    pub fn key(&self) -> &'a K {
        &self.node().key
    }

    pub fn value(&self) -> &'a V {
        &self.node().value
    }

    /// Height of the subtree rooted at this node; a leaf has height 0.
    pub fn height(&self) -> i32 {
        self.node().height
    }

    /// Number of nodes in the subtree rooted at this node.
    pub fn subtree_len(&self) -> usize {
        self.node().size
    }

    /// Left subtree height minus right subtree height.
    pub fn balance_factor(&self) -> i32 {
        balance_factor(self.ptr)
    }

    pub fn is_leaf(&self) -> bool {
        self.node().left.is_none() && self.node().right.is_none()
    }

    pub fn left(&self) -> Option<NodeRef<'a, K, V>> {
        self.node().left.map(NodeRef::new)
    }

    pub fn right(&self) -> Option<NodeRef<'a, K, V>> {
        self.node().right.map(NodeRef::new)
    }

    pub fn parent(&self) -> Option<NodeRef<'a, K, V>> {
        self.node().parent.map(NodeRef::new)
    }

    /// Returns an owned identity of this node, usable with
    /// [`AvlTree::delete`](crate::AvlTree::delete) and [`AvlTree::split`](crate::AvlTree::split)
    /// after the borrow of the tree has ended.
    pub fn handle(&self) -> Handle<K, V>
    where
        K: Clone,
    {
        Handle {
            ptr: self.ptr,
            key: self.key().clone(),
        }
    }
}

impl<K, V> Clone for NodeRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeRef<'_, K, V> {}

impl<K, V> PartialEq for NodeRef<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<K, V> Eq for NodeRef<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeRef<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("value", self.value())
            .field("height", &self.height())
            .finish()
    }
}

/// An owned identity of a node that does not borrow the tree.
///
/// A handle never dereferences the node it names. The tree resolves it by
/// descending to the handle's key and comparing node addresses, so a stale
/// handle or one taken from another tree is reported as
/// [`Error::NodeNotFound`](crate::Error::NodeNotFound).
pub struct Handle<K, V> {
    ptr: NodePtr<K, V>,
    key: K,
}

impl<K, V> Handle<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn ptr(&self) -> NodePtr<K, V> {
        self.ptr
    }
}

// SAFETY: the address is only ever compared, never dereferenced.
unsafe impl<K: Send, V> Send for Handle<K, V> {}
unsafe impl<K: Sync, V> Sync for Handle<K, V> {}

impl<K: Clone, V> Clone for Handle<K, V> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            key: self.key.clone(),
        }
    }
}

impl<K, V> PartialEq for Handle<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<K, V> Eq for Handle<K, V> {}

impl<K: fmt::Debug, V> fmt::Debug for Handle<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.key).finish()
    }
}
