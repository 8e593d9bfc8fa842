// SPDX-License-Identifier: MIT OR Apache-2.0
//! Object identity and type tags shared by graphs, nodes and edges.

use crate::tree::GraphKey;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Arena index of a node instance within a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(pub(crate) u32);

/// Arena index of an edge instance within a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey(pub(crate) u32);

/// Object category used by the namespace and for picking discipline hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjKind {
    /// Root graph or subgraph
    Graph,
    /// Node
    Node,
    /// Edge, regardless of the direction it was reached from
    Edge,
}

/// A tagged reference to any object in a tree.
///
/// An edge is reachable as an in-edge from its head and as an out-edge from
/// its tail. Both tags name the same edge for identity and callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Object {
    /// A graph
    Graph(GraphKey),
    /// A node instance
    Node(NodeKey),
    /// An edge seen from its head
    InEdge(EdgeKey),
    /// An edge seen from its tail
    OutEdge(EdgeKey),
}

impl Object {
    /// Category of this object
    pub fn kind(&self) -> ObjKind {
        match self {
            Self::Graph(_) => ObjKind::Graph,
            Self::Node(_) => ObjKind::Node,
            Self::InEdge(_) | Self::OutEdge(_) => ObjKind::Edge,
        }
    }

    /// The edge key, if this is an edge under either tag
    pub fn as_edge(&self) -> Option<EdgeKey> {
        match self {
            Self::InEdge(e) | Self::OutEdge(e) => Some(*e),
            _ => None,
        }
    }

    /// Flip an edge between its in and out views. Other objects are returned unchanged.
    pub fn opposite(&self) -> Self {
        match *self {
            Self::InEdge(e) => Self::OutEdge(e),
            Self::OutEdge(e) => Self::InEdge(e),
            other => other,
        }
    }

    /// Whether two references denote the same underlying entity
    pub fn same_entity(&self, other: &Object) -> bool {
        match (self.as_edge(), other.as_edge()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl From<GraphKey> for Object {
    fn from(g: GraphKey) -> Self {
        Self::Graph(g)
    }
}

impl From<NodeKey> for Object {
    fn from(n: NodeKey) -> Self {
        Self::Node(n)
    }
}

impl From<EdgeKey> for Object {
    fn from(e: EdgeKey) -> Self {
        Self::OutEdge(e)
    }
}

/// Identity fields common to every stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ObjBase {
    pub(crate) id: u64,
    pub(crate) seq: u64,
}

/// Snapshot of an object handed to discipline hooks and kept in recorded events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// The object as it was referenced
    pub object: Object,
    /// Object category
    pub kind: ObjKind,
    /// Namespace id
    pub id: u64,
    /// Creation order
    pub seq: u64,
    /// Owning graph
    pub graph: GraphKey,
    /// Name bound to the id, if any
    pub name: Option<String>,
}

impl ObjectInfo {
    /// Order by namespace id
    pub fn cmp_by_id(&self, other: &ObjectInfo) -> Ordering {
        self.id.cmp(&other.id)
    }

    /// Order by creation sequence
    pub fn cmp_by_seq(&self, other: &ObjectInfo) -> Ordering {
        self.seq.cmp(&other.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_tags_share_identity() {
        let e = EdgeKey(3);
        let out = Object::OutEdge(e);
        let inn = Object::InEdge(e);

        assert_ne!(out, inn);
        assert!(out.same_entity(&inn));
        assert_eq!(out.opposite(), inn);
        assert_eq!(inn.kind(), ObjKind::Edge);
        assert!(!Object::Node(NodeKey(3)).same_entity(&out));
    }

    #[test]
    fn test_info_ordering() {
        let a = ObjectInfo {
            object: Object::Node(NodeKey(0)),
            kind: ObjKind::Node,
            id: 7,
            seq: 1,
            graph: GraphKey(0),
            name: None,
        };
        let b = ObjectInfo { id: 2, seq: 5, ..a.clone() };

        assert_eq!(a.cmp_by_id(&b), Ordering::Greater);
        assert_eq!(a.cmp_by_seq(&b), Ordering::Less);
    }
}
