// SPDX-License-Identifier: MIT OR Apache-2.0
//! Attributed graph object model.
//!
//! Graphs, subgraphs, nodes and edges are uniformly identified objects whose
//! lifecycle can be observed by pluggable disciplines. This crate is the layer
//! that layout, rendering and parsing tools build on:
//! - Object identity (namespace ids, creation order) and type tags
//! - Root/subgraph trees with node and edge projection between graphs
//! - A discipline stack observing create, update and delete
//! - Rename and delete orchestration that keeps ids consistent
//!
//! ## Architecture
//!
//! A [`GraphTree`] is an arena holding one root graph and everything beneath
//! it. Objects are addressed by copyable keys and tagged with [`Object`].
//! The discipline stack, callback switch, [`Namespace`] and [`EventSink`] live
//! once per tree and are shared by every subgraph.

pub mod object;
pub mod error;
pub mod config;
pub mod namespace;
pub mod event;
pub mod discipline;
pub mod tree;
mod dispatch;
mod projection;
mod lifecycle;

pub use object::{EdgeKey, NodeKey, ObjKind, Object, ObjectInfo};
pub use error::{GraphError, Result};
pub use config::{ConfigError, GraphDesc, TreeConfig};
pub use namespace::{NameTable, Namespace};
pub use event::{AttrSym, EventKind, EventQueue, EventSink, RecordedEvent};
pub use discipline::{Discipline, DisciplineId, DisciplineStack, HookSet, ObjectHook, UpdateHook};
pub use tree::{GraphKey, GraphTree};
