use thiserror::Error;

/// Precondition violations reported by the structural operations of
/// [`AvlTree`](crate::AvlTree).
///
/// A search that finds nothing is not an error; it returns `None`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The key passed to an insert is already present. The tree is unchanged.
    #[error("key is already present in the tree")]
    DuplicateKey,

    /// The handle does not name a node of this tree, either because the node
    /// has been deleted, belongs to another tree, or the tree is empty.
    /// The tree is unchanged.
    #[error("node does not belong to this tree")]
    NodeNotFound,

    /// The separator passed to a join is not strictly between the key sets
    /// of the two trees. The receiving tree is unchanged.
    #[error("join key does not separate the two trees")]
    KeyNotSeparating,
}

pub type Result<T> = std::result::Result<T, Error>;
