//! Error types for graph operations.
//!
//! Every rejected graph operation leaves the graph unchanged and reports one of
//! these variants to its caller. None of them is fatal: a failed drag-connect in
//! an editor simply leaves the topology as it was.

use core::fmt;

use thiserror::Error;

use crate::key::Key;

/// The kind of object a lookup was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// An external input slot.
    Input,
    /// An external output slot.
    Output,
    /// An internal (container-side) input slot.
    InternalInput,
    /// An internal (container-side) output slot.
    InternalOutput,
    /// A child node of a container.
    Child,
    /// A registered plugin type.
    NodeType,
    /// A named root graph.
    Root,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::InternalInput => "internal input",
            Self::InternalOutput => "internal output",
            Self::Child => "child",
            Self::NodeType => "node type",
            Self::Root => "root",
        };
        f.write_str(label)
    }
}

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// No object matches the given id or name.
    #[error("{target} {key} not found")]
    NotFound {
        /// What was being looked up.
        target: Target,
        /// The id or name that failed to resolve.
        key: Key,
    },

    /// The caller supplied both or neither of an id/name pair, or a field that
    /// the requested connection shape forbids.
    #[error("malformed request: {0}")]
    Malformed(&'static str),

    /// A slot, child or root with this name already exists.
    #[error("name '{0}' is already in use")]
    DuplicateName(String),

    /// The endpoint is already part of a connection.
    #[error("{target} {key} is already connected")]
    AlreadyConnected {
        /// Which side of the connection was busy.
        target: Target,
        /// The endpoint that was busy.
        key: Key,
    },

    /// The endpoint has no live connection.
    #[error("{target} {key} is not connected")]
    NotConnected {
        /// Which slot registry the endpoint lives in.
        target: Target,
        /// The endpoint that was expected to be connected.
        key: Key,
    },

    /// The slot (or its internal mirror) is engaged in a connection and cannot
    /// be removed.
    #[error("{target} {key} is engaged in a connection")]
    SlotInUse {
        /// Which slot registry the slot lives in.
        target: Target,
        /// The slot that is still connected.
        key: Key,
    },

    /// The child still has live connections and cannot be deleted.
    #[error("child '{0}' still has live connections")]
    ChildConnected(String),

    /// The node wraps a leaf plugin and therefore has no children or internal
    /// slots.
    #[error("node '{0}' is a leaf and cannot act as a container")]
    LeafNode(String),

    /// The operation needs a parent but the node is a root.
    #[error("node '{0}' has no parent")]
    NoParent(String),

    /// The connection changed on another thread between lookup and locking.
    #[error("connection of {target} {key} changed concurrently")]
    Contended {
        /// Which slot registry the endpoint lives in.
        target: Target,
        /// The endpoint whose connection changed.
        key: Key,
    },
}

impl GraphError {
    /// Create a lookup failure.
    pub fn not_found(target: Target, key: impl Into<Key>) -> Self {
        GraphError::NotFound {
            target,
            key: key.into(),
        }
    }

    /// Returns true if this error is a lookup failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = GraphError::not_found(Target::Input, "src");
        assert_eq!(err.to_string(), "input 'src' not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn id_keys_display_with_hash() {
        let err = GraphError::AlreadyConnected {
            target: Target::InternalOutput,
            key: Key::Id(4),
        };
        assert_eq!(err.to_string(), "internal output #4 is already connected");
    }

    #[test]
    fn malformed_display() {
        let err = GraphError::Malformed("both an id and a name were supplied");
        assert_eq!(
            err.to_string(),
            "malformed request: both an id and a name were supplied"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn leaf_node_display() {
        let err = GraphError::LeafNode("blur_2".to_string());
        assert_eq!(
            err.to_string(),
            "node 'blur_2' is a leaf and cannot act as a container"
        );
    }
}
