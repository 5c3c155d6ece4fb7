use std::fmt;

use crate::node::{Link, NodePtr};
use crate::tree::AvlTree;

impl<K: Ord + fmt::Display, V> AvlTree<K, V> {
    /// Writes an ASCII rendering of the tree shape, one node per line with
    /// its cached height. Absent children of inner nodes are drawn as `·`.
    ///
    /// ```text
    /// 2 (h=1)
    /// ├── 1 (h=0)
    /// └── 3 (h=0)
    /// ```
    pub fn dump<W: fmt::Write>(&self, mut w: W) -> fmt::Result {
        match self.root {
            None => writeln!(w, "(empty)"),
            Some(root_ptr) => Self::dump_node(&mut w, root_ptr, "", ""),
        }
    }

    fn dump_node<W: fmt::Write>(
        w: &mut W,
        node_ptr: NodePtr<K, V>,
        head: &str,
        tail: &str,
    ) -> fmt::Result {
        let node = unsafe { node_ptr.as_ref() };
        writeln!(w, "{head}{} (h={})", node.key, node.height)?;
        if node.left.is_none() && node.right.is_none() {
            return Ok(());
        }
        Self::dump_link(w, node.left, &format!("{tail}├── "), &format!("{tail}│   "))?;
        Self::dump_link(w, node.right, &format!("{tail}└── "), &format!("{tail}    "))
    }

    fn dump_link<W: fmt::Write>(w: &mut W, link: Link<K, V>, head: &str, tail: &str) -> fmt::Result {
        match link {
            None => writeln!(w, "{head}·"),
            Some(node_ptr) => Self::dump_node(w, node_ptr, head, tail),
        }
    }
}

impl<K: Ord + fmt::Display, V> fmt::Display for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f)
    }
}

#[cfg(test)]
mod tests {
    use crate::AvlTree;

    #[test]
    fn dump_shape() {
        let mut tree = AvlTree::new();
        for key in [2, 1, 3, 4] {
            tree.insert(key, ()).unwrap();
        }
        let expected = "\
2 (h=2)
├── 1 (h=0)
└── 3 (h=1)
    ├── ·
    └── 4 (h=0)
";
        assert_eq!(tree.to_string(), expected);
    }

    #[test]
    fn dump_empty() {
        let tree = AvlTree::<i32, ()>::new();
        let mut out = String::new();
        tree.dump(&mut out).unwrap();
        assert_eq!(out, "(empty)\n");
    }
}
