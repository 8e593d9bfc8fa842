// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph tree arena.
//!
//! A [`GraphTree`] owns a root graph, every subgraph beneath it, and every node
//! and edge instance in any of them. Objects refer to each other by key, and
//! the closure (discipline stack, callback flag, namespace, event sink) lives
//! once in the tree, so every subgraph shares it.

use crate::config::{GraphDesc, TreeConfig};
use crate::discipline::DisciplineStack;
use crate::error::{GraphError, Result};
use crate::event::{EventKind, EventQueue, EventSink};
use crate::namespace::{NameTable, Namespace};
use crate::object::{EdgeKey, NodeKey, ObjBase, ObjKind, Object, ObjectInfo};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Arena index of a graph within a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphKey(pub(crate) u32);

pub(crate) struct GraphRec {
    pub(crate) base: ObjBase,
    pub(crate) parent: Option<GraphKey>,
    /// Set only on the tree root
    pub(crate) maingraph: bool,
    pub(crate) node_ids: IndexMap<u64, NodeKey>,
    pub(crate) node_seq: BTreeMap<u64, NodeKey>,
    pub(crate) edge_ids: IndexMap<u64, EdgeKey>,
    pub(crate) edge_seq: BTreeMap<u64, EdgeKey>,
    pub(crate) subg_ids: IndexMap<u64, GraphKey>,
    pub(crate) subg_seq: BTreeMap<u64, GraphKey>,
}

impl GraphRec {
    fn new(base: ObjBase, parent: Option<GraphKey>) -> Self {
        Self {
            base,
            parent,
            maingraph: parent.is_none(),
            node_ids: IndexMap::new(),
            node_seq: BTreeMap::new(),
            edge_ids: IndexMap::new(),
            edge_seq: BTreeMap::new(),
            subg_ids: IndexMap::new(),
            subg_seq: BTreeMap::new(),
        }
    }
}

pub(crate) struct NodeRec {
    pub(crate) base: ObjBase,
    pub(crate) graph: GraphKey,
    pub(crate) out_edges: Vec<EdgeKey>,
    pub(crate) in_edges: Vec<EdgeKey>,
}

pub(crate) struct EdgeRec {
    pub(crate) base: ObjBase,
    pub(crate) tail: NodeKey,
    pub(crate) head: NodeKey,
}

/// State shared by the root and all subgraphs
pub(crate) struct Closure {
    pub(crate) disciplines: DisciplineStack,
    pub(crate) callbacks_enabled: bool,
    pub(crate) namespace: Box<dyn Namespace>,
    pub(crate) sink: Box<dyn EventSink>,
    graph_seq: u64,
    node_seq: u64,
    edge_seq: u64,
}

impl Closure {
    fn next_seq(&mut self, kind: ObjKind) -> u64 {
        let counter = match kind {
            ObjKind::Graph => &mut self.graph_seq,
            ObjKind::Node => &mut self.node_seq,
            ObjKind::Edge => &mut self.edge_seq,
        };
        *counter += 1;
        *counter
    }
}

/// A root graph with its subgraphs, nodes and edges.
///
/// Arena slots of deleted objects are never reused, so a key that outlives
/// its object keeps failing with `BadObject` instead of aliasing a newer one.
pub struct GraphTree {
    pub(crate) graphs: Vec<Option<GraphRec>>,
    pub(crate) nodes: Vec<Option<NodeRec>>,
    pub(crate) edges: Vec<Option<EdgeRec>>,
    pub(crate) root: GraphKey,
    pub(crate) desc: GraphDesc,
    pub(crate) clos: Closure,
}

impl GraphTree {
    /// Open a new root graph with the default namespace and event queue
    pub fn open(name: &str, config: TreeConfig) -> Result<Self> {
        let namespace = NameTable::new(config.anonymous_ids);
        Self::with_collaborators(Some(name), config, Box::new(namespace), Box::new(EventQueue::new()))
    }

    /// Open a new root graph using the given namespace and event sink
    pub fn with_collaborators(
        name: Option<&str>,
        config: TreeConfig,
        mut namespace: Box<dyn Namespace>,
        sink: Box<dyn EventSink>,
    ) -> Result<Self> {
        let id = namespace
            .map_name_to_id(ObjKind::Graph, name, true)
            .ok_or_else(|| GraphError::unavailable(ObjKind::Graph, name))?;
        let mut clos = Closure {
            disciplines: DisciplineStack::new(),
            callbacks_enabled: config.callbacks_enabled,
            namespace,
            sink,
            graph_seq: 0,
            node_seq: 0,
            edge_seq: 0,
        };
        let seq = clos.next_seq(ObjKind::Graph);
        let root = GraphKey(0);
        let mut tree = Self {
            graphs: vec![Some(GraphRec::new(ObjBase { id, seq }, None))],
            nodes: Vec::new(),
            edges: Vec::new(),
            root,
            desc: config.desc,
            clos,
        };
        tracing::debug!("Opened root graph {:?} (id {})", name, id);
        tree.emit(EventKind::Initialize, Object::Graph(root), None)?;
        Ok(tree)
    }

    /// The root graph
    pub fn root(&self) -> GraphKey {
        self.root
    }

    /// Description shared by every graph in the tree
    pub fn desc(&self) -> GraphDesc {
        self.desc
    }

    /// Whether the root has been closed
    pub fn is_closed(&self) -> bool {
        self.graph_opt(self.root).is_none()
    }

    /// Mutable access to the namespace collaborator
    pub fn namespace_mut(&mut self) -> &mut dyn Namespace {
        self.clos.namespace.as_mut()
    }

    pub(crate) fn graph_opt(&self, g: GraphKey) -> Option<&GraphRec> {
        self.graphs.get(g.0 as usize).and_then(Option::as_ref)
    }

    pub(crate) fn graph_rec(&self, g: GraphKey, op: &'static str) -> Result<&GraphRec> {
        self.graph_opt(g).ok_or(GraphError::bad(op))
    }

    pub(crate) fn graph_rec_mut(&mut self, g: GraphKey, op: &'static str) -> Result<&mut GraphRec> {
        self.graphs
            .get_mut(g.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::bad(op))
    }

    pub(crate) fn node_rec(&self, n: NodeKey, op: &'static str) -> Result<&NodeRec> {
        self.nodes
            .get(n.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(GraphError::bad(op))
    }

    pub(crate) fn edge_rec(&self, e: EdgeKey, op: &'static str) -> Result<&EdgeRec> {
        self.edges
            .get(e.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(GraphError::bad(op))
    }

    /// Graph that contains `obj`: an edge's tail node's graph, a node's graph, or a graph itself
    pub fn owning_graph(&self, obj: Object) -> Result<GraphKey> {
        const OP: &str = "owning_graph";
        match obj {
            Object::InEdge(e) | Object::OutEdge(e) => {
                let tail = self.edge_rec(e, OP)?.tail;
                Ok(self.node_rec(tail, OP)?.graph)
            }
            Object::Node(n) => Ok(self.node_rec(n, OP)?.graph),
            Object::Graph(g) => self.graph_rec(g, OP).map(|_| g),
        }
    }

    /// Whether `obj` lives directly in the root graph
    pub fn is_root_object(&self, obj: Object) -> Result<bool> {
        let g = self.owning_graph(obj)?;
        Ok(self.graph_rec(g, "is_root_object")?.maingraph)
    }

    fn base_of(&self, obj: Object, op: &'static str) -> Result<ObjBase> {
        Ok(match obj {
            Object::Graph(g) => self.graph_rec(g, op)?.base,
            Object::Node(n) => self.node_rec(n, op)?.base,
            Object::InEdge(e) | Object::OutEdge(e) => self.edge_rec(e, op)?.base,
        })
    }

    /// Snapshot of an object's identity
    pub fn info(&self, obj: Object) -> Result<ObjectInfo> {
        let base = self.base_of(obj, "info")?;
        let graph = self.owning_graph(obj)?;
        let kind = obj.kind();
        Ok(ObjectInfo {
            object: obj,
            kind,
            id: base.id,
            seq: base.seq,
            graph,
            name: self.clos.namespace.name_of(kind, base.id).map(str::to_owned),
        })
    }

    /// Namespace id of an object
    pub fn id_of(&self, obj: impl Into<Object>) -> Result<u64> {
        Ok(self.base_of(obj.into(), "id_of")?.id)
    }

    /// Creation sequence number of an object
    pub fn seq_of(&self, obj: impl Into<Object>) -> Result<u64> {
        Ok(self.base_of(obj.into(), "seq_of")?.seq)
    }

    /// Name bound to an object's id
    pub fn name_of(&self, obj: impl Into<Object>) -> Result<Option<&str>> {
        let obj = obj.into();
        let id = self.base_of(obj, "name_of")?.id;
        Ok(self.clos.namespace.name_of(obj.kind(), id))
    }

    /// Parent of a subgraph, `None` for the root
    pub fn parent(&self, g: GraphKey) -> Result<Option<GraphKey>> {
        Ok(self.graph_rec(g, "parent")?.parent)
    }

    /// Tail node of an edge
    pub fn tail(&self, e: EdgeKey) -> Result<NodeKey> {
        Ok(self.edge_rec(e, "tail")?.tail)
    }

    /// Head node of an edge
    pub fn head(&self, e: EdgeKey) -> Result<NodeKey> {
        Ok(self.edge_rec(e, "head")?.head)
    }

    /// Nodes of a graph in creation order
    pub fn nodes(&self, g: GraphKey) -> Result<impl Iterator<Item = NodeKey> + '_> {
        Ok(self.graph_rec(g, "nodes")?.node_seq.values().copied())
    }

    /// Edges of a graph in creation order
    pub fn edges(&self, g: GraphKey) -> Result<impl Iterator<Item = EdgeKey> + '_> {
        Ok(self.graph_rec(g, "edges")?.edge_seq.values().copied())
    }

    /// Immediate subgraphs in creation order
    pub fn subgraphs(&self, g: GraphKey) -> Result<impl Iterator<Item = GraphKey> + '_> {
        Ok(self.graph_rec(g, "subgraphs")?.subg_seq.values().copied())
    }

    /// Edges leaving a node, tagged as out-edges
    pub fn out_edges(&self, n: NodeKey) -> Result<impl Iterator<Item = Object> + '_> {
        Ok(self.node_rec(n, "out_edges")?.out_edges.iter().map(|e| Object::OutEdge(*e)))
    }

    /// Edges entering a node, tagged as in-edges
    pub fn in_edges(&self, n: NodeKey) -> Result<impl Iterator<Item = Object> + '_> {
        Ok(self.node_rec(n, "in_edges")?.in_edges.iter().map(|e| Object::InEdge(*e)))
    }

    /// Number of nodes in a graph
    pub fn node_count(&self, g: GraphKey) -> Result<usize> {
        Ok(self.graph_rec(g, "node_count")?.node_ids.len())
    }

    /// Number of edges in a graph
    pub fn edge_count(&self, g: GraphKey) -> Result<usize> {
        Ok(self.graph_rec(g, "edge_count")?.edge_ids.len())
    }

    /// Node instance with `id` in `g`
    pub fn find_node_by_id(&self, g: GraphKey, id: u64) -> Result<Option<NodeKey>> {
        Ok(self.graph_rec(g, "find_node_by_id")?.node_ids.get(&id).copied())
    }

    /// Edge instance with `id` in `g`
    pub fn find_edge_by_id(&self, g: GraphKey, id: u64) -> Result<Option<EdgeKey>> {
        Ok(self.graph_rec(g, "find_edge_by_id")?.edge_ids.get(&id).copied())
    }

    /// Immediate subgraph of `parent` with `id`
    pub fn find_subgraph_by_id(&self, parent: GraphKey, id: u64) -> Result<Option<GraphKey>> {
        Ok(self.graph_rec(parent, "find_subgraph_by_id")?.subg_ids.get(&id).copied())
    }

    /// Find or create a subgraph of `parent`
    pub fn subgraph(&mut self, parent: GraphKey, name: Option<&str>, create: bool) -> Result<Option<GraphKey>> {
        self.graph_rec(parent, "subgraph")?;
        if let Some(id) = self.clos.namespace.map_name_to_id(ObjKind::Graph, name, false) {
            if let Some(found) = self.find_subgraph_by_id(parent, id)? {
                return Ok(Some(found));
            }
        }
        if !create {
            return Ok(None);
        }

        let id = self
            .clos
            .namespace
            .map_name_to_id(ObjKind::Graph, name, true)
            .ok_or_else(|| GraphError::unavailable(ObjKind::Graph, name))?;
        let seq = self.clos.next_seq(ObjKind::Graph);
        let key = GraphKey(self.graphs.len() as u32);
        self.graphs.push(Some(GraphRec::new(ObjBase { id, seq }, Some(parent))));
        let rec = self.graph_rec_mut(parent, "subgraph")?;
        rec.subg_ids.insert(id, key);
        rec.subg_seq.insert(seq, key);

        tracing::debug!("Created subgraph {:?} (id {}) under {:?}", name, id, parent);
        self.emit(EventKind::Initialize, Object::Graph(key), None)?;
        Ok(Some(key))
    }

    /// Find or create a node in `g`.
    ///
    /// A node that exists elsewhere in the tree is projected into `g` when
    /// `create` is set. A new node is created in the root and projected down.
    pub fn node(&mut self, g: GraphKey, name: Option<&str>, create: bool) -> Result<Option<NodeKey>> {
        self.graph_rec(g, "node")?;
        let root = self.root;
        if let Some(id) = self.clos.namespace.map_name_to_id(ObjKind::Node, name, false) {
            if let Some(found) = self.find_node_by_id(g, id)? {
                return Ok(Some(found));
            }
            if create {
                if let Some(in_root) = self.find_node_by_id(root, id)? {
                    return self.project_node(g, in_root, true);
                }
            }
        }
        if !create {
            return Ok(None);
        }

        let id = self
            .clos
            .namespace
            .map_name_to_id(ObjKind::Node, name, true)
            .ok_or_else(|| GraphError::unavailable(ObjKind::Node, name))?;
        let key = self.insert_node(root, id)?;
        tracing::debug!("Created node {:?} (id {})", name, id);
        self.emit(EventKind::Initialize, Object::Node(key), None)?;
        self.project_node(g, key, true)
    }

    /// Find or create an edge from `tail` to `head`, both of which must be in `g`
    pub fn edge(
        &mut self,
        g: GraphKey,
        tail: NodeKey,
        head: NodeKey,
        name: Option<&str>,
        create: bool,
    ) -> Result<Option<EdgeKey>> {
        const OP: &str = "edge";
        self.graph_rec(g, OP)?;
        let (tail_id, tail_graph) = {
            let rec = self.node_rec(tail, OP)?;
            (rec.base.id, rec.graph)
        };
        let (head_id, head_graph) = {
            let rec = self.node_rec(head, OP)?;
            (rec.base.id, rec.graph)
        };
        if tail_graph != g || head_graph != g {
            return Err(GraphError::wrong_graph(OP));
        }

        let named_id = match name {
            Some(_) => self.clos.namespace.map_name_to_id(ObjKind::Edge, name, false),
            None => None,
        };
        // Anonymous lookups match any edge between the endpoints.
        let probe = named_id.is_some() || (name.is_none() && (!create || self.desc.strict));
        if probe {
            if let Some(found) = self.find_edge_between(tail, head, named_id) {
                return Ok(Some(found));
            }
            if create {
                if let Some(found) = self.root_edge_between(tail_id, head_id, named_id)? {
                    return self.project_edge(g, found, true);
                }
            }
        }
        if !create {
            return Ok(None);
        }

        if self.desc.no_loop && tail == head {
            return Err(GraphError::SelfLoop);
        }
        // a parallel edge may exist in the root without being projected into `g`
        if self.desc.strict
            && (self.find_edge_between(tail, head, None).is_some()
                || self.root_edge_between(tail_id, head_id, None)?.is_some())
        {
            return Err(GraphError::MultiEdge);
        }
        if let Some(id) = named_id {
            // the name already belongs to an edge between other endpoints
            if self.find_edge_by_id(self.root, id)?.is_some() {
                return Err(GraphError::unavailable(ObjKind::Edge, name));
            }
        }

        let id = self
            .clos
            .namespace
            .map_name_to_id(ObjKind::Edge, name, true)
            .ok_or_else(|| GraphError::unavailable(ObjKind::Edge, name))?;
        let root = self.root;
        let root_tail = self.project_node(root, tail, true)?.ok_or(GraphError::bad(OP))?;
        let root_head = self.project_node(root, head, true)?.ok_or(GraphError::bad(OP))?;
        let key = self.insert_edge(root, id, root_tail, root_head)?;
        tracing::debug!("Created edge {:?} (id {}) {} -> {}", name, id, tail_id, head_id);
        self.emit(EventKind::Initialize, Object::OutEdge(key), None)?;
        self.project_edge(g, key, true)
    }

    /// Root instance of an edge between the nodes with ids `tail_id` and `head_id`
    fn root_edge_between(&self, tail_id: u64, head_id: u64, id: Option<u64>) -> Result<Option<EdgeKey>> {
        let root = self.root;
        let tail = self.find_node_by_id(root, tail_id)?;
        let head = self.find_node_by_id(root, head_id)?;
        Ok(match (tail, head) {
            (Some(t), Some(h)) => self.find_edge_between(t, h, id),
            _ => None,
        })
    }

    /// Edge from `tail` to `head` (either way round if undirected), optionally with a given id
    fn find_edge_between(&self, tail: NodeKey, head: NodeKey, id: Option<u64>) -> Option<EdgeKey> {
        let matches = |e: EdgeKey, t: NodeKey, h: NodeKey| {
            self.edge_rec(e, "find_edge").is_ok_and(|rec| {
                rec.tail == t && rec.head == h && id.map_or(true, |id| rec.base.id == id)
            })
        };
        let forward = self
            .node_rec(tail, "find_edge")
            .ok()?
            .out_edges
            .iter()
            .find(|e| matches(**e, tail, head))
            .copied();
        if forward.is_some() || self.desc.directed {
            return forward;
        }
        self.node_rec(head, "find_edge")
            .ok()?
            .out_edges
            .iter()
            .find(|e| matches(**e, head, tail))
            .copied()
    }

    pub(crate) fn insert_node(&mut self, g: GraphKey, id: u64) -> Result<NodeKey> {
        let seq = self.clos.next_seq(ObjKind::Node);
        let key = NodeKey(self.nodes.len() as u32);
        let rec = self.graph_rec_mut(g, "insert_node")?;
        rec.node_ids.insert(id, key);
        rec.node_seq.insert(seq, key);
        self.nodes.push(Some(NodeRec {
            base: ObjBase { id, seq },
            graph: g,
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        }));
        Ok(key)
    }

    pub(crate) fn insert_edge(&mut self, g: GraphKey, id: u64, tail: NodeKey, head: NodeKey) -> Result<EdgeKey> {
        let seq = self.clos.next_seq(ObjKind::Edge);
        let key = EdgeKey(self.edges.len() as u32);
        let rec = self.graph_rec_mut(g, "insert_edge")?;
        rec.edge_ids.insert(id, key);
        rec.edge_seq.insert(seq, key);
        if let Some(Some(t)) = self.nodes.get_mut(tail.0 as usize) {
            t.out_edges.push(key);
        }
        if let Some(Some(h)) = self.nodes.get_mut(head.0 as usize) {
            h.in_edges.push(key);
        }
        self.edges.push(Some(EdgeRec {
            base: ObjBase { id, seq },
            tail,
            head,
        }));
        Ok(key)
    }
}

impl fmt::Debug for GraphTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphTree")
            .field("root", &self.root)
            .field("desc", &self.desc)
            .field("graphs", &self.graphs.iter().flatten().count())
            .field("nodes", &self.nodes.iter().flatten().count())
            .field("edges", &self.edges.iter().flatten().count())
            .field("disciplines", &self.clos.disciplines)
            .field("callbacks_enabled", &self.clos.callbacks_enabled)
            .finish()
    }
}
