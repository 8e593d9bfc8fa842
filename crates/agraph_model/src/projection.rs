// SPDX-License-Identifier: MIT OR Apache-2.0
//! Projection of nodes and edges across the graphs of one tree.
//!
//! A node or edge that exists in one graph can have a peer instance in any
//! other graph of the same tree. Peers share the namespace id and nothing else.
//! Creating a peer in a subgraph installs it in every ancestor first, so an
//! object present in a graph is always present in that graph's parent.

use crate::error::{GraphError, Result};
use crate::event::EventKind;
use crate::object::{EdgeKey, NodeKey, Object};
use crate::tree::{GraphKey, GraphTree};

impl GraphTree {
    /// Resolve `obj` into its counterpart inside `target`.
    ///
    /// Objects already in `target` come back unchanged. Nodes and edges are
    /// looked up by id and, with `create_if_absent`, projected into `target`.
    /// A graph always resolves to `target` itself. Returns `None` only for a
    /// find-only lookup that misses.
    pub fn rebind(&mut self, target: GraphKey, obj: Object, create_if_absent: bool) -> Result<Option<Object>> {
        const OP: &str = "rebind";
        let home = self.owning_graph(obj)?;
        self.graph_rec(target, OP)?;
        if home == target {
            return Ok(Some(obj));
        }

        match obj {
            Object::Node(n) => Ok(self.project_node(target, n, create_if_absent)?.map(Object::Node)),
            Object::InEdge(e) => Ok(self.project_edge(target, e, create_if_absent)?.map(Object::InEdge)),
            Object::OutEdge(e) => Ok(self.project_edge(target, e, create_if_absent)?.map(Object::OutEdge)),
            Object::Graph(_) => Ok(Some(Object::Graph(target))),
        }
    }

    /// Find or create the instance of node `n` in `g`
    pub(crate) fn project_node(&mut self, g: GraphKey, n: NodeKey, create: bool) -> Result<Option<NodeKey>> {
        const OP: &str = "project_node";
        let id = self.node_rec(n, OP)?.base.id;
        let rec = self.graph_rec(g, OP)?;
        if let Some(found) = rec.node_ids.get(&id) {
            return Ok(Some(*found));
        }
        if !create {
            return Ok(None);
        }

        let parent = rec.parent;
        match parent {
            Some(parent) => {
                self.project_node(parent, n, true)?;
            }
            // every node has an instance in the root
            None => return Err(GraphError::bad(OP)),
        }
        let key = self.insert_node(g, id)?;
        tracing::debug!("Projected node {} into {:?}", id, g);
        self.emit(EventKind::Initialize, Object::Node(key), None)?;
        Ok(Some(key))
    }

    /// Find or create the instance of edge `e` in `g`, projecting its endpoints as needed
    pub(crate) fn project_edge(&mut self, g: GraphKey, e: EdgeKey, create: bool) -> Result<Option<EdgeKey>> {
        const OP: &str = "project_edge";
        let (id, tail, head) = {
            let rec = self.edge_rec(e, OP)?;
            (rec.base.id, rec.tail, rec.head)
        };
        let rec = self.graph_rec(g, OP)?;
        if let Some(found) = rec.edge_ids.get(&id) {
            return Ok(Some(*found));
        }
        if !create {
            return Ok(None);
        }

        let parent = rec.parent;
        match parent {
            Some(parent) => {
                self.project_edge(parent, e, true)?;
            }
            None => return Err(GraphError::bad(OP)),
        }
        let tail = self.project_node(g, tail, true)?.ok_or(GraphError::bad(OP))?;
        let head = self.project_node(g, head, true)?.ok_or(GraphError::bad(OP))?;
        let key = self.insert_edge(g, id, tail, head)?;
        tracing::debug!("Projected edge {} into {:?}", id, g);
        self.emit(EventKind::Initialize, Object::OutEdge(key), None)?;
        Ok(Some(key))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TreeConfig;
    use crate::object::Object;
    use crate::tree::GraphTree;

    #[test]
    fn test_rebind_same_graph_is_identity() {
        let mut t = GraphTree::open("R", TreeConfig::default()).unwrap();
        let root = t.root();
        let n = t.node(root, Some("n"), true).unwrap().unwrap();

        assert_eq!(t.rebind(root, Object::Node(n), false).unwrap(), Some(Object::Node(n)));
        assert_eq!(t.node_count(root).unwrap(), 1);
    }

    #[test]
    fn test_rebind_find_only_misses() {
        let mut t = GraphTree::open("R", TreeConfig::default()).unwrap();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let n = t.node(root, Some("n"), true).unwrap().unwrap();

        assert_eq!(t.rebind(s, Object::Node(n), false).unwrap(), None);
        assert_eq!(t.node_count(s).unwrap(), 0);
    }

    #[test]
    fn test_rebind_node_creates_peer() {
        let mut t = GraphTree::open("R", TreeConfig::default()).unwrap();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let n = t.node(root, Some("n"), true).unwrap().unwrap();

        let Some(Object::Node(peer)) = t.rebind(s, Object::Node(n), true).unwrap() else {
            panic!("expected a node");
        };
        assert_ne!(peer, n);
        assert_eq!(t.id_of(peer).unwrap(), t.id_of(n).unwrap());
        assert_ne!(t.seq_of(peer).unwrap(), t.seq_of(n).unwrap());
        assert_eq!(t.owning_graph(Object::Node(peer)).unwrap(), s);
        // the source instance keeps its membership
        assert_eq!(t.owning_graph(Object::Node(n)).unwrap(), root);

        let again = t.rebind(s, Object::Node(n), true).unwrap();
        assert_eq!(again, Some(Object::Node(peer)));
        assert_eq!(t.rebind(s, Object::Node(peer), true).unwrap(), Some(Object::Node(peer)));
    }

    #[test]
    fn test_rebind_edge_keeps_tag_and_projects_endpoints() {
        let mut t = GraphTree::open("R", TreeConfig::default()).unwrap();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let a = t.node(root, Some("a"), true).unwrap().unwrap();
        let b = t.node(root, Some("b"), true).unwrap().unwrap();
        let e = t.edge(root, a, b, None, true).unwrap().unwrap();

        let peer = t.rebind(s, Object::InEdge(e), true).unwrap().unwrap();
        let Object::InEdge(pe) = peer else {
            panic!("expected an in-edge");
        };
        assert_eq!(t.id_of(pe).unwrap(), t.id_of(e).unwrap());
        assert_eq!(t.node_count(s).unwrap(), 2);
        assert_eq!(t.owning_graph(peer).unwrap(), s);
        assert_eq!(t.rebind(root, peer, false).unwrap(), Some(Object::InEdge(e)));
    }

    #[test]
    fn test_rebind_into_nested_subgraph_fills_ancestors() {
        let mut t = GraphTree::open("R", TreeConfig::default()).unwrap();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let ss = t.subgraph(s, Some("SS"), true).unwrap().unwrap();
        let n = t.node(root, Some("n"), true).unwrap().unwrap();

        t.rebind(ss, Object::Node(n), true).unwrap().unwrap();
        assert_eq!(t.node_count(s).unwrap(), 1);
        assert_eq!(t.node_count(ss).unwrap(), 1);
    }

    #[test]
    fn test_rebind_graph_yields_target() {
        let mut t = GraphTree::open("R", TreeConfig::default()).unwrap();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();

        assert_eq!(t.rebind(s, Object::Graph(root), false).unwrap(), Some(Object::Graph(s)));
        assert_eq!(t.rebind(root, Object::Graph(s), false).unwrap(), Some(Object::Graph(root)));
    }
}
