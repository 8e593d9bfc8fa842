// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rename and delete.
//!
//! Both operations check everything that can fail before touching the tree,
//! so a refused call leaves ids, indices and the namespace as they were.
//! Deletion notifies disciplines about each instance before it is unlinked.

use crate::error::{GraphError, Result};
use crate::event::EventKind;
use crate::object::{NodeKey, ObjKind, Object};
use crate::tree::{GraphKey, GraphRec, GraphTree};

impl GraphTree {
    /// Give an object a new name.
    ///
    /// Graphs and nodes take the id the namespace maps `new_name` to. Edges
    /// cannot be renamed.
    pub fn rename(&mut self, obj: Object, new_name: &str) -> Result<()> {
        match obj {
            Object::Graph(g) => self.rename_graph(g, new_name),
            Object::Node(n) => self.relabel_node(n, new_name),
            Object::InEdge(_) | Object::OutEdge(_) => Err(GraphError::bad("rename")),
        }
    }

    fn rename_graph(&mut self, g: GraphKey, new_name: &str) -> Result<()> {
        const OP: &str = "rename";
        let (old_id, parent) = {
            let rec = self.graph_rec(g, OP)?;
            (rec.base.id, rec.parent)
        };
        let unavailable = || GraphError::unavailable(ObjKind::Graph, Some(new_name));

        let new_id = self
            .clos
            .namespace
            .map_name_to_id(ObjKind::Graph, Some(new_name), false)
            .ok_or_else(unavailable)?;
        if new_id == old_id {
            return Ok(());
        }
        let new_id = self
            .clos
            .namespace
            .map_name_to_id(ObjKind::Graph, Some(new_name), true)
            .ok_or_else(unavailable)?;
        if let Some(parent) = parent {
            let taken = self
                .find_subgraph_by_id(parent, new_id)?
                .is_some_and(|other| other != g);
            if taken {
                self.clos.namespace.free_id(ObjKind::Graph, new_id);
                tracing::debug!("Rename of graph {} to {:?} refused: name in use", old_id, new_name);
                return Err(unavailable());
            }
        }

        self.clos.namespace.free_id(ObjKind::Graph, old_id);
        self.graph_rec_mut(g, OP)?.base.id = new_id;
        if let Some(parent) = parent {
            let rec = self.graph_rec_mut(parent, OP)?;
            rec.subg_ids.shift_remove(&old_id);
            rec.subg_ids.insert(new_id, g);
        }
        tracing::debug!("Renamed graph {} to {:?} (id {})", old_id, new_name, new_id);
        Ok(())
    }

    /// Relabel a node and every projection of it
    fn relabel_node(&mut self, n: NodeKey, new_name: &str) -> Result<()> {
        const OP: &str = "rename";
        let old_id = self.node_rec(n, OP)?.base.id;
        let root = self.root;
        let unavailable = || GraphError::unavailable(ObjKind::Node, Some(new_name));

        if let Some(id) = self.clos.namespace.map_name_to_id(ObjKind::Node, Some(new_name), false) {
            if id == old_id {
                return Ok(());
            }
            if self.find_node_by_id(root, id)?.is_some() {
                return Err(unavailable());
            }
        }
        let new_id = self
            .clos
            .namespace
            .map_name_to_id(ObjKind::Node, Some(new_name), true)
            .ok_or_else(unavailable)?;
        if self.find_node_by_id(root, new_id)?.is_some() {
            self.clos.namespace.free_id(ObjKind::Node, new_id);
            return Err(unavailable());
        }

        self.clos.namespace.free_id(ObjKind::Node, old_id);
        for rec in self.graphs.iter_mut().flatten() {
            let Some(key) = rec.node_ids.shift_remove(&old_id) else {
                continue;
            };
            rec.node_ids.insert(new_id, key);
            if let Some(Some(node)) = self.nodes.get_mut(key.0 as usize) {
                node.base.id = new_id;
            }
        }
        tracing::debug!("Relabelled node {} to {:?} (id {})", old_id, new_name, new_id);
        Ok(())
    }

    /// Delete `obj` from `target`.
    ///
    /// `obj` must belong to `target`, except that a subgraph may also be
    /// deleted through its parent. Deleting a node or edge from a subgraph
    /// removes only the projections at and below that subgraph; deleting it
    /// from the root removes it everywhere and releases its id. Deleting a
    /// graph closes it, and closing the root closes the whole tree.
    pub fn delete(&mut self, target: GraphKey, obj: Object) -> Result<()> {
        const OP: &str = "delete";
        let home = self.owning_graph(obj)?;
        self.graph_rec(target, OP)?;
        if home != target {
            let deleted_by_parent = matches!(obj, Object::Graph(_)) && self.parent(home)? == Some(target);
            if !deleted_by_parent {
                tracing::debug!("Delete refused: {:?} is not in {:?}", obj, target);
                return Err(GraphError::wrong_graph(OP));
            }
        }

        match obj {
            Object::Node(n) => {
                let id = self.node_rec(n, OP)?.base.id;
                self.delete_node_from(home, id)
            }
            Object::InEdge(e) | Object::OutEdge(e) => {
                let id = self.edge_rec(e, OP)?.base.id;
                self.delete_edge_from(home, id)
            }
            Object::Graph(g) => self.close_graph(g),
        }
    }

    fn subgraphs_holding(&self, g: GraphKey, holds: impl Fn(&GraphRec) -> bool) -> Result<Vec<GraphKey>> {
        let rec = self.graph_rec(g, "delete")?;
        Ok(rec
            .subg_seq
            .values()
            .copied()
            .filter(|s| self.graph_opt(*s).is_some_and(&holds))
            .collect())
    }

    /// Remove node `id` from `g` and every subgraph below it, deepest first
    fn delete_node_from(&mut self, g: GraphKey, id: u64) -> Result<()> {
        const OP: &str = "delete_node";
        for sub in self.subgraphs_holding(g, |rec| rec.node_ids.contains_key(&id))? {
            self.delete_node_from(sub, id)?;
        }
        let Some(n) = self.find_node_by_id(g, id)? else {
            return Ok(());
        };

        let mut incident: Vec<u64> = Vec::new();
        {
            let rec = self.node_rec(n, OP)?;
            for e in rec.out_edges.iter().chain(rec.in_edges.iter()) {
                let eid = self.edge_rec(*e, OP)?.base.id;
                if !incident.contains(&eid) {
                    incident.push(eid);
                }
            }
        }
        for eid in incident {
            self.delete_edge_from(g, eid)?;
        }

        self.emit(EventKind::Delete, Object::Node(n), None)?;
        let seq = self.node_rec(n, OP)?.base.seq;
        let rec = self.graph_rec_mut(g, OP)?;
        rec.node_ids.shift_remove(&id);
        rec.node_seq.remove(&seq);
        self.nodes[n.0 as usize] = None;
        if g == self.root {
            self.clos.namespace.free_id(ObjKind::Node, id);
        }
        tracing::debug!("Deleted node {} from {:?}", id, g);
        Ok(())
    }

    /// Remove edge `id` from `g` and every subgraph below it, deepest first
    fn delete_edge_from(&mut self, g: GraphKey, id: u64) -> Result<()> {
        const OP: &str = "delete_edge";
        for sub in self.subgraphs_holding(g, |rec| rec.edge_ids.contains_key(&id))? {
            self.delete_edge_from(sub, id)?;
        }
        let Some(e) = self.find_edge_by_id(g, id)? else {
            return Ok(());
        };

        self.emit(EventKind::Delete, Object::OutEdge(e), None)?;
        let (seq, tail, head) = {
            let rec = self.edge_rec(e, OP)?;
            (rec.base.seq, rec.tail, rec.head)
        };
        let rec = self.graph_rec_mut(g, OP)?;
        rec.edge_ids.shift_remove(&id);
        rec.edge_seq.remove(&seq);
        if let Some(Some(t)) = self.nodes.get_mut(tail.0 as usize) {
            t.out_edges.retain(|x| *x != e);
        }
        if let Some(Some(h)) = self.nodes.get_mut(head.0 as usize) {
            h.in_edges.retain(|x| *x != e);
        }
        self.edges[e.0 as usize] = None;
        if g == self.root {
            self.clos.namespace.free_id(ObjKind::Edge, id);
        }
        tracing::debug!("Deleted edge {} from {:?}", id, g);
        Ok(())
    }

    /// Close a graph: its subgraphs, then its nodes, then the graph itself
    fn close_graph(&mut self, g: GraphKey) -> Result<()> {
        const OP: &str = "close";
        let subs: Vec<GraphKey> = self.subgraphs(g)?.collect();
        for sub in subs {
            self.close_graph(sub)?;
        }
        let node_ids: Vec<u64> = {
            let rec = self.graph_rec(g, OP)?;
            rec.node_seq
                .values()
                .filter_map(|n| self.node_rec(*n, OP).ok().map(|r| r.base.id))
                .collect()
        };
        for id in node_ids {
            self.delete_node_from(g, id)?;
        }

        self.emit(EventKind::Delete, Object::Graph(g), None)?;
        let rec = self.graphs[g.0 as usize].take().ok_or(GraphError::bad(OP))?;
        self.clos.namespace.free_id(ObjKind::Graph, rec.base.id);
        match rec.parent {
            Some(parent) => {
                let parent_rec = self.graph_rec_mut(parent, OP)?;
                parent_rec.subg_ids.shift_remove(&rec.base.id);
                parent_rec.subg_seq.remove(&rec.base.seq);
                tracing::debug!("Closed subgraph {} of {:?}", rec.base.id, parent);
            }
            None => {
                // nothing is left to replay recorded events against
                let dropped = self.clos.sink.drain().len();
                tracing::debug!("Closed root graph {} ({} recorded events dropped)", rec.base.id, dropped);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TreeConfig;
    use crate::error::GraphError;
    use crate::object::{ObjKind, Object};
    use crate::tree::GraphTree;

    fn tree() -> GraphTree {
        GraphTree::open("R", TreeConfig::default()).unwrap()
    }

    #[test]
    fn test_rename_graph() {
        let mut t = tree();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let old_id = t.id_of(s).unwrap();

        t.rename(Object::Graph(s), "T").unwrap();
        let new_id = t.id_of(s).unwrap();
        assert_ne!(new_id, old_id);
        assert_eq!(t.name_of(s).unwrap(), Some("T"));
        assert_eq!(t.find_subgraph_by_id(root, new_id).unwrap(), Some(s));
        assert_eq!(t.find_subgraph_by_id(root, old_id).unwrap(), None);
        assert_eq!(t.subgraph(root, Some("T"), false).unwrap(), Some(s));
        assert_eq!(t.subgraph(root, Some("S"), false).unwrap(), None);
    }

    #[test]
    fn test_rename_graph_to_same_name() {
        let mut t = tree();
        let root = t.root();
        let id = t.id_of(root).unwrap();
        t.rename(Object::Graph(root), "R").unwrap();
        assert_eq!(t.id_of(root).unwrap(), id);
    }

    #[test]
    fn test_rename_graph_collision() {
        let mut t = tree();
        let root = t.root();
        let a = t.subgraph(root, Some("A"), true).unwrap().unwrap();
        let b = t.subgraph(root, Some("B"), true).unwrap().unwrap();
        let a_id = t.id_of(a).unwrap();

        assert!(matches!(
            t.rename(Object::Graph(a), "B"),
            Err(GraphError::Unavailable { kind: ObjKind::Graph, .. })
        ));
        assert_eq!(t.id_of(a).unwrap(), a_id);
        assert_eq!(t.name_of(a).unwrap(), Some("A"));
        assert_eq!(t.name_of(b).unwrap(), Some("B"));
        assert_eq!(t.subgraph(root, Some("B"), false).unwrap(), Some(b));
    }

    #[test]
    fn test_rename_edge_is_bad_object() {
        let mut t = tree();
        let root = t.root();
        let a = t.node(root, Some("a"), true).unwrap().unwrap();
        let b = t.node(root, Some("b"), true).unwrap().unwrap();
        let e = t.edge(root, a, b, None, true).unwrap().unwrap();

        assert_eq!(t.rename(Object::InEdge(e), "x"), Err(GraphError::BadObject { op: "rename" }));
        assert_eq!(t.rename(Object::OutEdge(e), "x"), Err(GraphError::BadObject { op: "rename" }));
    }

    #[test]
    fn test_relabel_node_rekeys_projections() {
        let mut t = tree();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let n = t.node(s, Some("n"), true).unwrap().unwrap();
        let in_root = t.rebind(root, Object::Node(n), false).unwrap().unwrap();

        t.rename(Object::Node(n), "m").unwrap();
        let id = t.id_of(n).unwrap();
        assert_eq!(t.id_of(in_root).unwrap(), id);
        assert_eq!(t.node(s, Some("m"), false).unwrap(), Some(n));
        assert_eq!(t.node(root, Some("n"), false).unwrap(), None);
        assert_eq!(t.name_of(in_root).unwrap(), Some("m"));
    }

    #[test]
    fn test_relabel_node_refuses_existing_name() {
        let mut t = tree();
        let root = t.root();
        let a = t.node(root, Some("a"), true).unwrap().unwrap();
        t.node(root, Some("b"), true).unwrap();

        assert!(t.rename(Object::Node(a), "b").is_err());
        assert_eq!(t.name_of(a).unwrap(), Some("a"));
    }

    #[test]
    fn test_delete_wrong_graph() {
        let mut t = tree();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let ss = t.subgraph(s, Some("SS"), true).unwrap().unwrap();
        let n = t.node(root, Some("n"), true).unwrap().unwrap();

        assert_eq!(t.delete(s, Object::Node(n)), Err(GraphError::WrongGraph { op: "delete" }));
        // only the direct parent may delete a subgraph
        assert_eq!(t.delete(root, Object::Graph(ss)), Err(GraphError::WrongGraph { op: "delete" }));
        assert_eq!(t.node_count(root).unwrap(), 1);
        assert_eq!(t.subgraphs(s).unwrap().count(), 1);
    }

    #[test]
    fn test_delete_subgraph_projection_only() {
        let mut t = tree();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let n = t.node(s, Some("n"), true).unwrap().unwrap();

        t.delete(s, Object::Node(n)).unwrap();
        assert_eq!(t.node_count(s).unwrap(), 0);
        assert_eq!(t.node_count(root).unwrap(), 1);
        assert!(t.id_of(n).is_err());
    }

    #[test]
    fn test_delete_root_node_removes_everywhere() {
        let mut t = tree();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let a = t.node(s, Some("a"), true).unwrap().unwrap();
        let b = t.node(s, Some("b"), true).unwrap().unwrap();
        t.edge(s, a, b, None, true).unwrap();
        let root_a = t.node(root, Some("a"), false).unwrap().unwrap();

        t.delete(root, Object::Node(root_a)).unwrap();
        assert_eq!(t.node_count(root).unwrap(), 1);
        assert_eq!(t.node_count(s).unwrap(), 1);
        assert_eq!(t.edge_count(root).unwrap(), 0);
        assert_eq!(t.edge_count(s).unwrap(), 0);
        assert_eq!(t.out_edges(a).map(|_| ()), Err(GraphError::BadObject { op: "out_edges" }));
        let root_b = t.node(root, Some("b"), false).unwrap().unwrap();
        assert_eq!(t.in_edges(root_b).unwrap().count(), 0);
    }

    #[test]
    fn test_delete_edge_in_subgraph() {
        let mut t = tree();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let a = t.node(s, Some("a"), true).unwrap().unwrap();
        let b = t.node(s, Some("b"), true).unwrap().unwrap();
        let e = t.edge(s, a, b, Some("ab"), true).unwrap().unwrap();

        t.delete(s, Object::InEdge(e)).unwrap();
        assert_eq!(t.edge_count(s).unwrap(), 0);
        assert_eq!(t.edge_count(root).unwrap(), 1);
        assert_eq!(t.out_edges(a).unwrap().count(), 0);
    }

    #[test]
    fn test_parent_closes_subgraph() {
        let mut t = tree();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        let ss = t.subgraph(s, Some("SS"), true).unwrap().unwrap();
        t.node(ss, Some("n"), true).unwrap();

        t.delete(root, Object::Graph(s)).unwrap();
        assert_eq!(t.subgraphs(root).unwrap().count(), 0);
        assert!(t.parent(ss).is_err());
        assert_eq!(t.node_count(root).unwrap(), 1);
        assert_eq!(t.subgraph(root, Some("S"), false).unwrap(), None);
    }

    #[test]
    fn test_close_root() {
        let mut t = tree();
        let root = t.root();
        let s = t.subgraph(root, Some("S"), true).unwrap().unwrap();
        t.node(s, Some("n"), true).unwrap();

        t.delete(root, Object::Graph(root)).unwrap();
        assert!(t.is_closed());
        assert!(matches!(t.node(root, Some("m"), true), Err(GraphError::BadObject { .. })));
    }

    #[test]
    fn test_close_root_drops_recorded_events() {
        let mut t = tree();
        let root = t.root();
        t.set_callbacks(root, false).unwrap();
        t.node(root, Some("n"), true).unwrap();
        assert_eq!(t.pending_events(), 1);

        t.delete(root, Object::Graph(root)).unwrap();
        assert_eq!(t.pending_events(), 0);
        assert!(matches!(t.set_callbacks(root, true), Err(GraphError::BadObject { .. })));
    }

    #[test]
    fn test_deleted_key_stays_stale() {
        let mut t = tree();
        let root = t.root();
        let a = t.node(root, Some("a"), true).unwrap().unwrap();
        t.delete(root, Object::Node(a)).unwrap();

        let b = t.node(root, Some("b"), true).unwrap().unwrap();
        assert_ne!(a, b);
        assert_eq!(t.id_of(a), Err(GraphError::BadObject { op: "id_of" }));
        assert_eq!(t.node(root, Some("b"), false).unwrap(), Some(b));
    }
}
