use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::node::{leftmost, parent_side, Link, Node, Side};

/// An iterator over the entries of an [`AvlTree`](crate::AvlTree), sorted by key.
///
/// Created by [`AvlTree::iter`](crate::AvlTree::iter).
pub struct Iter<'a, K, V> {
    next: Link<K, V>,
    remaining: usize,
    _marker: PhantomData<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(first: Link<K, V>, len: usize) -> Self {
        Self {
            next: first,
            remaining: len,
            _marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node_ptr = self.next?;
        let node = unsafe { &*node_ptr.as_ptr() };

        // In-order successor: leftmost node of the right subtree, or else the
        // first ancestor reached from its left side.
        self.next = match node.right {
            Some(right_ptr) => Some(leftmost(right_ptr)),
            None => {
                let mut current = node_ptr;
                loop {
                    match parent_side(current) {
                        None => break None,
                        Some((parent_ptr, Side::Left)) => break Some(parent_ptr),
                        Some((parent_ptr, Side::Right)) => current = parent_ptr,
                    }
                }
            }
        };
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            next: self.next,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
