// SPDX-License-Identifier: MIT OR Apache-2.0
//! Discipline registration and lifecycle notification for a tree.

use crate::discipline::{Discipline, DisciplineId};
use crate::error::{GraphError, Result};
use crate::event::{AttrSym, EventKind, RecordedEvent};
use crate::object::Object;
use crate::tree::{GraphKey, GraphTree};
use std::any::Any;
use std::rc::Rc;

impl GraphTree {
    /// Push a discipline and its state onto the tree's stack.
    ///
    /// The stack is shared by every graph of the tree, so `graph` only has to
    /// be a live graph of this tree.
    pub fn push_discipline(&mut self, graph: GraphKey, discipline: Rc<Discipline>, state: impl Any) -> Result<()> {
        self.graph_rec(graph, "push_discipline")?;
        tracing::debug!("Pushed discipline {:?}", discipline.id);
        self.clos.disciplines.push(discipline, Box::new(state));
        Ok(())
    }

    /// Remove the most recently pushed entry for `id` and return its state
    pub fn pop_discipline(&mut self, graph: GraphKey, id: DisciplineId) -> Result<Box<dyn Any>> {
        self.graph_rec(graph, "pop_discipline")?;
        let state = self.clos.disciplines.pop(id).ok_or(GraphError::DisciplineNotFound)?;
        tracing::debug!("Popped discipline {:?}", id);
        Ok(state)
    }

    /// State of the most recently pushed entry for `id`
    pub fn discipline_state(&self, graph: GraphKey, id: DisciplineId) -> Option<&dyn Any> {
        self.graph_opt(graph)?;
        self.clos.disciplines.state(id)
    }

    /// Mutable state of the most recently pushed entry for `id`
    pub fn discipline_state_mut(&mut self, graph: GraphKey, id: DisciplineId) -> Option<&mut dyn Any> {
        self.graph_opt(graph)?;
        self.clos.disciplines.state_mut(id)
    }

    /// Whether lifecycle events are dispatched immediately
    pub fn callbacks_enabled(&self) -> bool {
        self.clos.callbacks_enabled
    }

    /// Number of events waiting to be replayed
    pub fn pending_events(&self) -> usize {
        self.clos.sink.len()
    }

    /// Enable or disable immediate dispatch, returning the previous setting.
    ///
    /// Turning dispatch back on replays every recorded event, oldest first.
    /// Events still pending when the root is closed are discarded.
    pub fn set_callbacks(&mut self, graph: GraphKey, enabled: bool) -> Result<bool> {
        self.graph_rec(graph, "set_callbacks")?;
        let previous = self.clos.callbacks_enabled;
        self.clos.callbacks_enabled = enabled;
        if enabled && !previous {
            let events = self.clos.sink.drain();
            tracing::debug!("Replaying {} recorded events", events.len());
            for event in events {
                self.clos
                    .disciplines
                    .dispatch(event.kind, &event.object, event.attr.as_ref());
            }
        }
        Ok(previous)
    }

    /// Announce that `obj` was created
    pub fn notify_init(&mut self, graph: GraphKey, obj: Object) -> Result<()> {
        self.graph_rec(graph, "notify_init")?;
        self.emit(EventKind::Initialize, obj, None)
    }

    /// Announce that `attr` of `obj` changed
    pub fn notify_update(&mut self, graph: GraphKey, obj: Object, attr: &AttrSym) -> Result<()> {
        self.graph_rec(graph, "notify_update")?;
        self.emit(EventKind::Update, obj, Some(attr))
    }

    /// Announce that `obj` is about to be removed
    pub fn notify_delete(&mut self, graph: GraphKey, obj: Object) -> Result<()> {
        self.graph_rec(graph, "notify_delete")?;
        self.emit(EventKind::Delete, obj, None)
    }

    /// Dispatch to the stack, or record while callbacks are disabled
    pub(crate) fn emit(&mut self, kind: EventKind, obj: Object, attr: Option<&AttrSym>) -> Result<()> {
        let info = self.info(obj)?;
        if self.clos.callbacks_enabled {
            tracing::trace!("Dispatching {:?} for {:?} {}", kind, info.kind, info.id);
            self.clos.disciplines.dispatch(kind, &info, attr);
        } else {
            tracing::trace!("Recording {:?} for {:?} {}", kind, info.kind, info.id);
            self.clos.sink.record(RecordedEvent {
                kind,
                object: info,
                attr: attr.cloned(),
            });
        }
        Ok(())
    }
}
