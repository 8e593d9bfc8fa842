// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lifecycle observers.
//!
//! A [`Discipline`] bundles up to nine optional hooks (init, update and delete
//! for graphs, nodes and edges). Disciplines are pushed onto a tree's
//! [`DisciplineStack`] together with their own opaque state. When an event is
//! dispatched, the oldest entry sees it first and the newest sees it last.

use crate::event::{AttrSym, EventKind};
use crate::object::{ObjKind, ObjectInfo};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Hook for init and delete events
pub type ObjectHook = Rc<dyn Fn(&ObjectInfo, &mut dyn Any)>;

/// Hook for update events
pub type UpdateHook = Rc<dyn Fn(&ObjectInfo, &mut dyn Any, &AttrSym)>;

/// Unique identifier for a discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisciplineId(pub Uuid);

impl DisciplineId {
    /// Create a new random discipline ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DisciplineId {
    fn default() -> Self {
        Self::new()
    }
}

/// Hooks for one object category
#[derive(Clone, Default)]
pub struct HookSet {
    /// Called after the object is created
    pub init: Option<ObjectHook>,
    /// Called after an attribute changes
    pub update: Option<UpdateHook>,
    /// Called before the object is removed
    pub delete: Option<ObjectHook>,
}

impl HookSet {
    fn is_empty(&self) -> bool {
        self.init.is_none() && self.update.is_none() && self.delete.is_none()
    }
}

/// A caller-supplied set of lifecycle hooks
#[derive(Clone)]
pub struct Discipline {
    /// Identity used for pop and state lookup
    pub id: DisciplineId,
    /// Graph hooks
    pub graph: HookSet,
    /// Node hooks
    pub node: HookSet,
    /// Edge hooks
    pub edge: HookSet,
}

impl Discipline {
    /// Create a discipline with no hooks
    pub fn new() -> Self {
        Self {
            id: DisciplineId::new(),
            graph: HookSet::default(),
            node: HookSet::default(),
            edge: HookSet::default(),
        }
    }

    /// Hooks for a category
    pub fn hooks(&self, kind: ObjKind) -> &HookSet {
        match kind {
            ObjKind::Graph => &self.graph,
            ObjKind::Node => &self.node,
            ObjKind::Edge => &self.edge,
        }
    }

    fn hooks_mut(&mut self, kind: ObjKind) -> &mut HookSet {
        match kind {
            ObjKind::Graph => &mut self.graph,
            ObjKind::Node => &mut self.node,
            ObjKind::Edge => &mut self.edge,
        }
    }

    /// Set the init hook for a category
    pub fn on_init(mut self, kind: ObjKind, f: impl Fn(&ObjectInfo, &mut dyn Any) + 'static) -> Self {
        self.hooks_mut(kind).init = Some(Rc::new(f));
        self
    }

    /// Set the update hook for a category
    pub fn on_update(
        mut self,
        kind: ObjKind,
        f: impl Fn(&ObjectInfo, &mut dyn Any, &AttrSym) + 'static,
    ) -> Self {
        self.hooks_mut(kind).update = Some(Rc::new(f));
        self
    }

    /// Set the delete hook for a category
    pub fn on_delete(mut self, kind: ObjKind, f: impl Fn(&ObjectInfo, &mut dyn Any) + 'static) -> Self {
        self.hooks_mut(kind).delete = Some(Rc::new(f));
        self
    }

    /// Finish building
    pub fn into_shared(self) -> Rc<Self> {
        Rc::new(self)
    }
}

impl Default for Discipline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let installed: Vec<_> = [ObjKind::Graph, ObjKind::Node, ObjKind::Edge]
            .into_iter()
            .filter(|kind| !self.hooks(*kind).is_empty())
            .collect();
        f.debug_struct("Discipline")
            .field("id", &self.id)
            .field("hooks", &installed)
            .finish()
    }
}

struct StackEntry {
    discipline: Rc<Discipline>,
    state: Box<dyn Any>,
}

/// Ordered chain of disciplines, oldest first
#[derive(Default)]
pub struct DisciplineStack {
    entries: Vec<StackEntry>,
}

impl DisciplineStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a discipline with its state. The same discipline may be pushed more than once.
    pub fn push(&mut self, discipline: Rc<Discipline>, state: Box<dyn Any>) {
        self.entries.push(StackEntry { discipline, state });
    }

    /// Remove the most recently pushed entry for `id`, returning its state
    pub fn pop(&mut self, id: DisciplineId) -> Option<Box<dyn Any>> {
        let pos = self.entries.iter().rposition(|e| e.discipline.id == id)?;
        Some(self.entries.remove(pos).state)
    }

    /// State of the most recently pushed entry for `id`
    pub fn state(&self, id: DisciplineId) -> Option<&dyn Any> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.discipline.id == id)
            .map(|e| e.state.as_ref())
    }

    /// Mutable state of the most recently pushed entry for `id`
    pub fn state_mut(&mut self, id: DisciplineId) -> Option<&mut dyn Any> {
        self.entries
            .iter_mut()
            .rev()
            .find(|e| e.discipline.id == id)
            .map(|e| e.state.as_mut())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stack is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discipline ids, oldest first
    pub fn ids(&self) -> impl Iterator<Item = DisciplineId> + '_ {
        self.entries.iter().map(|e| e.discipline.id)
    }

    /// Invoke the matching hook of every entry, oldest first
    pub fn dispatch(&mut self, kind: EventKind, info: &ObjectInfo, attr: Option<&AttrSym>) {
        for entry in &mut self.entries {
            let hooks = entry.discipline.hooks(info.kind);
            match kind {
                EventKind::Initialize => {
                    if let Some(f) = &hooks.init {
                        f(info, entry.state.as_mut());
                    }
                }
                EventKind::Update => {
                    if let (Some(f), Some(attr)) = (&hooks.update, attr) {
                        f(info, entry.state.as_mut(), attr);
                    }
                }
                EventKind::Delete => {
                    if let Some(f) = &hooks.delete {
                        f(info, entry.state.as_mut());
                    }
                }
            }
        }
    }
}

impl fmt::Debug for DisciplineStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.discipline.id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{NodeKey, Object};
    use crate::tree::GraphKey;
    use std::cell::RefCell;

    fn node_info() -> ObjectInfo {
        ObjectInfo {
            object: Object::Node(NodeKey(0)),
            kind: ObjKind::Node,
            id: 1,
            seq: 1,
            graph: GraphKey(0),
            name: Some("n".into()),
        }
    }

    fn tagged(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Rc<Discipline> {
        let init_log = Rc::clone(log);
        Discipline::new()
            .on_init(ObjKind::Node, move |_, _| init_log.borrow_mut().push(tag))
            .into_shared()
    }

    #[test]
    fn test_dispatch_oldest_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = DisciplineStack::new();
        stack.push(tagged(&log, "a"), Box::new(()));
        stack.push(tagged(&log, "b"), Box::new(()));
        stack.push(tagged(&log, "c"), Box::new(()));

        stack.dispatch(EventKind::Initialize, &node_info(), None);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_pop_from_middle_keeps_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = tagged(&log, "a");
        let b = tagged(&log, "b");
        let c = tagged(&log, "c");
        let mut stack = DisciplineStack::new();
        stack.push(Rc::clone(&a), Box::new(()));
        stack.push(Rc::clone(&b), Box::new(()));
        stack.push(Rc::clone(&c), Box::new(()));

        assert!(stack.pop(b.id).is_some());
        assert_eq!(stack.ids().collect::<Vec<_>>(), vec![a.id, c.id]);
        assert!(stack.pop(b.id).is_none());
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_newest_state_shadows() {
        let d = Discipline::new().into_shared();
        let mut stack = DisciplineStack::new();
        stack.push(Rc::clone(&d), Box::new(1u32));
        stack.push(Rc::clone(&d), Box::new(2u32));

        assert_eq!(stack.state(d.id).and_then(|s| s.downcast_ref::<u32>()), Some(&2));

        let popped = stack.pop(d.id).unwrap();
        assert_eq!(popped.downcast_ref::<u32>(), Some(&2));
        assert_eq!(stack.state(d.id).and_then(|s| s.downcast_ref::<u32>()), Some(&1));
    }

    #[test]
    fn test_missing_hooks_skipped() {
        let d = Discipline::new()
            .on_delete(ObjKind::Edge, |_, state| {
                if let Some(n) = state.downcast_mut::<u32>() {
                    *n += 1;
                }
            })
            .into_shared();
        let mut stack = DisciplineStack::new();
        stack.push(Rc::clone(&d), Box::new(0u32));

        stack.dispatch(EventKind::Delete, &node_info(), None);
        stack.dispatch(EventKind::Initialize, &node_info(), None);
        assert_eq!(stack.state(d.id).and_then(|s| s.downcast_ref::<u32>()), Some(&0));
    }

    #[test]
    fn test_update_receives_attribute() {
        let d = Discipline::new()
            .on_update(ObjKind::Node, |_, state, attr| {
                if let Some(seen) = state.downcast_mut::<Vec<String>>() {
                    seen.push(attr.name.clone());
                }
            })
            .into_shared();
        let mut stack = DisciplineStack::new();
        stack.push(Rc::clone(&d), Box::new(Vec::<String>::new()));

        stack.dispatch(EventKind::Update, &node_info(), Some(&AttrSym::new("label")));
        let seen = stack.state(d.id).and_then(|s| s.downcast_ref::<Vec<String>>());
        assert_eq!(seen, Some(&vec!["label".to_string()]));
    }
}
