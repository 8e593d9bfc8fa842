// SPDX-License-Identifier: MIT OR Apache-2.0
//! Name to id reservation.
//!
//! A tree consults its [`Namespace`] whenever an object is created or renamed.
//! Ids are unique per object kind within one tree and are never handed out
//! again while any reference to them is outstanding.

use crate::object::ObjKind;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Reserves and releases integer ids for named or anonymous objects
pub trait Namespace {
    /// Look up or reserve the id for `name`.
    ///
    /// Without `commit` this only reports which id the name maps to (or would
    /// map to); nothing is reserved. With `commit` a reference to the id is
    /// taken and must later be returned with [`Namespace::free_id`].
    /// `None` means the name cannot be mapped under the current policy.
    fn map_name_to_id(&mut self, kind: ObjKind, name: Option<&str>, commit: bool) -> Option<u64>;

    /// Release one reference to `id`
    fn free_id(&mut self, kind: ObjKind, id: u64);

    /// Name bound to `id`, if it was reserved by name
    fn name_of(&self, kind: ObjKind, id: u64) -> Option<&str>;
}

#[derive(Debug, Default)]
struct KindTable {
    /// Next id to allocate
    next: u64,
    by_name: HashMap<String, u64>,
    /// Live ids with their optional name and reference count
    live: IndexMap<u64, (Option<String>, usize)>,
}

impl KindTable {
    fn new() -> Self {
        Self {
            next: 1,
            ..Self::default()
        }
    }

    fn allocate(&mut self, name: Option<&str>) -> u64 {
        let id = self.next;
        self.next += 1;
        if let Some(name) = name {
            self.by_name.insert(name.to_owned(), id);
        }
        self.live.insert(id, (name.map(str::to_owned), 1));
        id
    }
}

/// Default namespace: names are interned per kind and ids come from a counter
#[derive(Debug)]
pub struct NameTable {
    graphs: KindTable,
    nodes: KindTable,
    edges: KindTable,
    anonymous: bool,
}

impl NameTable {
    /// Create an empty table. `anonymous` allows committing unnamed objects.
    pub fn new(anonymous: bool) -> Self {
        Self {
            graphs: KindTable::new(),
            nodes: KindTable::new(),
            edges: KindTable::new(),
            anonymous,
        }
    }

    fn table(&self, kind: ObjKind) -> &KindTable {
        match kind {
            ObjKind::Graph => &self.graphs,
            ObjKind::Node => &self.nodes,
            ObjKind::Edge => &self.edges,
        }
    }

    fn table_mut(&mut self, kind: ObjKind) -> &mut KindTable {
        match kind {
            ObjKind::Graph => &mut self.graphs,
            ObjKind::Node => &mut self.nodes,
            ObjKind::Edge => &mut self.edges,
        }
    }

    /// Number of live ids of a kind
    pub fn live_count(&self, kind: ObjKind) -> usize {
        self.table(kind).live.len()
    }

    /// Whether `id` is currently reserved
    pub fn is_reserved(&self, kind: ObjKind, id: u64) -> bool {
        self.table(kind).live.contains_key(&id)
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Namespace for NameTable {
    fn map_name_to_id(&mut self, kind: ObjKind, name: Option<&str>, commit: bool) -> Option<u64> {
        let anonymous = self.anonymous;
        let table = self.table_mut(kind);
        match name {
            Some(name) => match table.by_name.get(name).copied() {
                Some(id) => {
                    if commit {
                        if let Some((_, refs)) = table.live.get_mut(&id) {
                            *refs += 1;
                        }
                    }
                    Some(id)
                }
                None if commit => Some(table.allocate(Some(name))),
                None => Some(table.next),
            },
            None if commit && anonymous => Some(table.allocate(None)),
            None => None,
        }
    }

    fn free_id(&mut self, kind: ObjKind, id: u64) {
        let table = self.table_mut(kind);
        let Some((name, refs)) = table.live.get_mut(&id) else {
            return;
        };
        *refs -= 1;
        if *refs == 0 {
            if let Some(name) = name.take() {
                table.by_name.remove(&name);
            }
            table.live.shift_remove(&id);
        }
    }

    fn name_of(&self, kind: ObjKind, id: u64) -> Option<&str> {
        self.table(kind)
            .live
            .get(&id)
            .and_then(|(name, _)| name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_per_kind() {
        let mut ns = NameTable::default();
        assert_eq!(ns.map_name_to_id(ObjKind::Graph, Some("g"), true), Some(1));
        assert_eq!(ns.map_name_to_id(ObjKind::Node, Some("a"), true), Some(1));
        assert_eq!(ns.map_name_to_id(ObjKind::Node, Some("b"), true), Some(2));
        assert_eq!(ns.name_of(ObjKind::Node, 2), Some("b"));
    }

    #[test]
    fn test_lookup_does_not_reserve() {
        let mut ns = NameTable::default();
        assert_eq!(ns.map_name_to_id(ObjKind::Node, Some("a"), false), Some(1));
        assert!(!ns.is_reserved(ObjKind::Node, 1));
        assert_eq!(ns.map_name_to_id(ObjKind::Node, Some("a"), true), Some(1));
        assert!(ns.is_reserved(ObjKind::Node, 1));
    }

    #[test]
    fn test_refcounted_free() {
        let mut ns = NameTable::default();
        let id = ns.map_name_to_id(ObjKind::Graph, Some("s"), true).unwrap();
        ns.map_name_to_id(ObjKind::Graph, Some("s"), true);

        ns.free_id(ObjKind::Graph, id);
        assert_eq!(ns.name_of(ObjKind::Graph, id), Some("s"));

        ns.free_id(ObjKind::Graph, id);
        assert!(!ns.is_reserved(ObjKind::Graph, id));
        assert_ne!(ns.map_name_to_id(ObjKind::Graph, Some("s"), false), Some(id));
    }

    #[test]
    fn test_anonymous_policy() {
        let mut ns = NameTable::new(false);
        assert_eq!(ns.map_name_to_id(ObjKind::Edge, None, true), None);

        let mut ns = NameTable::new(true);
        assert_eq!(ns.map_name_to_id(ObjKind::Edge, None, false), None);
        let id = ns.map_name_to_id(ObjKind::Edge, None, true).unwrap();
        assert_eq!(ns.name_of(ObjKind::Edge, id), None);
        assert!(ns.is_reserved(ObjKind::Edge, id));
    }
}
