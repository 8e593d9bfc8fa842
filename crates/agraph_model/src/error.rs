// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors returned by graph operations.

use crate::object::ObjKind;
use thiserror::Error;

/// Graph object model errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Stale handle, closed tree, or an operation the object's tag does not support
    #[error("bad object in {op}")]
    BadObject {
        /// Operation that rejected the object
        op: &'static str,
    },

    /// Target graph does not own the object
    #[error("object does not belong to the target graph in {op}")]
    WrongGraph {
        /// Operation that rejected the graph
        op: &'static str,
    },

    /// The namespace could not provide an id
    #[error("id unavailable for {kind:?} {name:?}")]
    Unavailable {
        /// Object category
        kind: ObjKind,
        /// Requested name
        name: Option<String>,
    },

    /// No stack entry for the discipline
    #[error("discipline is not on the stack")]
    DisciplineNotFound,

    /// Self-loops are disabled for this graph
    #[error("self-loop not allowed")]
    SelfLoop,

    /// Strict graphs allow one edge per endpoint pair
    #[error("strict graph already has an edge between these nodes")]
    MultiEdge,
}

impl GraphError {
    pub(crate) fn bad(op: &'static str) -> Self {
        Self::BadObject { op }
    }

    pub(crate) fn wrong_graph(op: &'static str) -> Self {
        Self::WrongGraph { op }
    }

    pub(crate) fn unavailable(kind: ObjKind, name: Option<&str>) -> Self {
        Self::Unavailable {
            kind,
            name: name.map(str::to_owned),
        }
    }
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
