//! Change events and listener registration.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::cell::CellHandle;
use crate::metadata::{CellMetadata, NotebookMetadata};
use crate::output::CellOutput;
use crate::selection::SelectionState;

/// One raw change record; a batch produces one per observable edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RawChange {
    /// `delete_count` cells removed at `index`, then `inserted` put there.
    ModelChange {
        index: usize,
        delete_count: usize,
        inserted: Vec<CellHandle>,
    },
    /// With `append`, `outputs` holds only the appended outputs.
    Output {
        index: usize,
        handle: CellHandle,
        outputs: Vec<CellOutput>,
        append: bool,
    },
    Metadata {
        index: usize,
        handle: CellHandle,
        metadata: CellMetadata,
    },
    Content {
        index: usize,
        handle: CellHandle,
    },
    DocumentMetadata {
        metadata: NotebookMetadata,
    },
}

/// What produced a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOrigin {
    Edit,
    Undo,
    Redo,
}

/// Fired once per observable batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Document version after the batch.
    pub version: u64,
    pub origin: ChangeOrigin,
    /// Raw records in the order the edits were applied.
    pub raw_events: Vec<RawChange>,
    pub end_selection: Option<SelectionState>,
}

type Listener<T> = Box<dyn FnMut(&T)>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
    firing: bool,
    removed_while_firing: Vec<u64>,
    /// Events fired by a listener, delivered once the current one is done.
    queued: VecDeque<T>,
}

/// Synchronous event source with disposable registrations.
pub struct Emitter<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
                firing: false,
                removed_while_firing: Vec::new(),
                queued: VecDeque::new(),
            })),
        }
    }

    /// Register a listener. It stays registered until the returned
    /// `Subscription` is disposed or dropped.
    pub fn subscribe(&self, listener: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, Box::new(listener)));
            id
        };

        let weak: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                let Some(registry) = weak.upgrade() else {
                    return;
                };
                let mut registry = registry.borrow_mut();
                if registry.firing {
                    registry.removed_while_firing.push(id);
                }
                registry.listeners.retain(|(listener_id, _)| *listener_id != id);
            })),
        }
    }

    /// Deliver `event` to every listener, in registration order.
    ///
    /// Listeners may subscribe or dispose while the event is delivered;
    /// new listeners first see the next event. An event fired from inside a
    /// listener is queued and delivered to everyone after the current one.
    pub fn fire(&self, event: &T)
    where
        T: Clone,
    {
        {
            let mut registry = self.registry.borrow_mut();
            if registry.firing {
                registry.queued.push_back(event.clone());
                return;
            }
            registry.firing = true;
        }

        self.deliver(event);
        loop {
            let next = self.registry.borrow_mut().queued.pop_front();
            match next {
                Some(queued) => self.deliver(&queued),
                None => break,
            }
        }

        self.registry.borrow_mut().firing = false;
    }

    fn deliver(&self, event: &T) {
        let mut active = std::mem::take(&mut self.registry.borrow_mut().listeners);

        for (_, listener) in active.iter_mut() {
            listener(event);
        }

        let mut registry = self.registry.borrow_mut();
        let added = std::mem::take(&mut registry.listeners);
        let removed = std::mem::take(&mut registry.removed_while_firing);
        active.extend(added);
        active.retain(|(id, _)| !removed.contains(id));
        registry.listeners = active;
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.registry.try_borrow().map(|r| r.listeners.len()).ok();
        f.debug_struct("Emitter").field("listeners", &listeners).finish()
    }
}

/// Registration handle returned by `Emitter::subscribe`.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unregister the listener now.
    pub fn dispose(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
