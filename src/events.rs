//! Event delegation: One native listener per event type at the render root, dispatching to handlers keyed by live node.

use crate::{
	dom::{Dom, NativeHandler, NodeKey},
	value::{Callback, Event},
};
use core::cell::{Ref, RefCell};
use hashbrown::HashMap;
use indexmap::IndexSet;
use std::rc::Rc;
use tracing::{error, instrument, trace, trace_span};

/// Event type → live element → handlers, in registration order.
///
/// Event types stay registered once seen, so that later listener setup keeps listening for them.
#[derive(Debug, Default)]
pub struct EventRegistry {
	handlers: HashMap<Rc<str>, HashMap<NodeKey, IndexSet<Callback>>>,
}

impl EventRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `false` if `handler` was already registered for this element and type.
	pub fn add(&mut self, element: NodeKey, event_type: &str, handler: Callback) -> bool {
		self.handlers.entry_ref(event_type).or_default().entry(element).or_default().insert(handler)
	}

	/// Returns `false` if `handler` wasn't registered for this element and type.
	pub fn remove(&mut self, element: NodeKey, event_type: &str, handler: &Callback) -> bool {
		let elements = match self.handlers.get_mut(event_type) {
			Some(elements) => elements,
			None => return false,
		};
		let handlers = match elements.get_mut(&element) {
			Some(handlers) => handlers,
			None => return false,
		};
		let removed = handlers.shift_remove(handler);
		if handlers.is_empty() {
			elements.remove(&element);
		}
		removed
	}

	/// A snapshot, so that handlers can be invoked without holding a borrow.
	#[must_use]
	pub fn handlers(&self, event_type: &str, element: NodeKey) -> Vec<Callback> {
		self.handlers
			.get(event_type)
			.and_then(|elements| elements.get(&element))
			.map(|handlers| handlers.iter().cloned().collect())
			.unwrap_or_default()
	}

	pub fn event_types(&self) -> impl '_ + Iterator<Item = &Rc<str>> {
		self.handlers.keys()
	}

	/// How many handlers are registered for `event_type` across all elements.
	#[must_use]
	pub fn handler_count(&self, event_type: &str) -> usize {
		self.handlers.get(event_type).map_or(0, |elements| elements.values().map(IndexSet::len).sum())
	}

	/// How many elements have at least one handler for `event_type`.
	#[must_use]
	pub fn element_count(&self, event_type: &str) -> usize {
		self.handlers.get(event_type).map_or(0, HashMap::len)
	}

	/// Total handler count.
	#[must_use]
	pub fn len(&self) -> usize {
		self.handlers.values().flat_map(HashMap::values).map(IndexSet::len).sum()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Owns an [`EventRegistry`] and the native listeners installed for it.
pub struct EventManager<D: Dom> {
	dom: D,
	registry: Rc<RefCell<EventRegistry>>,
	installed: HashMap<(NodeKey, Rc<str>), (D::Node, D::Listener)>,
}

impl<D: Dom> EventManager<D> {
	#[must_use]
	pub fn new(dom: D) -> Self {
		Self {
			dom,
			registry: Rc::default(),
			installed: HashMap::new(),
		}
	}

	pub fn registry(&self) -> Ref<'_, EventRegistry> {
		self.registry.borrow()
	}

	/// How many native listeners this manager currently has installed, across all roots.
	#[must_use]
	pub fn installed_count(&self) -> usize {
		self.installed.len()
	}

	#[instrument(skip(self, handler))]
	pub fn add_event(&self, element: &D::Node, event_type: &str, handler: Callback) {
		let key = self.dom.key(element);
		if !self.registry.borrow_mut().add(key, event_type, handler) {
			trace!(%key, "Handler was already registered.");
		}
	}

	/// Unregistering a handler that isn't registered is a no-op.
	#[instrument(skip(self, handler))]
	pub fn remove_event(&self, element: &D::Node, event_type: &str, handler: &Callback) {
		let key = self.dom.key(element);
		if !self.registry.borrow_mut().remove(key, event_type, handler) {
			trace!(%key, "Handler wasn't registered.");
		}
	}

	/// (Re)installs exactly one native listener per registered event type on `root`.
	///
	/// Idempotent: A listener previously installed by this manager for the same root and type is removed first.
	#[instrument(skip(self))]
	pub fn setup_event_listeners(&mut self, root: &D::Node) {
		let root_key = self.dom.key(root);
		let event_types: Vec<Rc<str>> = self.registry.borrow().event_types().cloned().collect();
		for event_type in event_types {
			if let Some((_, previous)) = self.installed.remove(&(root_key, Rc::clone(&event_type))) {
				if let Err(error) = self.dom.remove_event_listener(root, &event_type, &previous) {
					error!("Failed to remove previous {:?} listener: {}", event_type, error);
				}
			}

			let registry = Rc::downgrade(&self.registry);
			let handler: NativeHandler<D> = Rc::new(move |dom: &D, target: &D::Node, event: &Event| {
				if let Some(registry) = registry.upgrade() {
					delegate(dom, &registry, root_key, target, event)
				}
			});
			match self.dom.add_event_listener(root, &event_type, handler) {
				Ok(listener) => {
					self.installed.insert((root_key, event_type), (root.clone(), listener));
				}
				Err(error) => error!("Failed to install {:?} listener: {}", event_type, error),
			}
		}
	}
}

impl<D: Dom> Drop for EventManager<D> {
	fn drop(&mut self) {
		trace!("Removing {} native listener(s).", self.installed.len());
		for ((_, event_type), (root, listener)) in self.installed.drain() {
			if let Err(error) = self.dom.remove_event_listener(&root, &event_type, &listener) {
				error!("Failed to remove {:?} listener: {}", event_type, error);
			}
		}
	}
}

/// Walks from `target` up to (excluding) `root`, invoking each element's handlers for the event type.
fn delegate<D: Dom>(dom: &D, registry: &RefCell<EventRegistry>, root: NodeKey, target: &D::Node, event: &Event) {
	let span = trace_span!("Delegating event", event_type = event.event_type(), target = %event.target());
	let _enter = span.enter();

	let mut current = Some(target.clone());
	while let Some(node) = current {
		let key = dom.key(&node);
		if key == root {
			break;
		}

		let handlers = registry.borrow().handlers(event.event_type(), key);
		if !handlers.is_empty() {
			trace!(%key, count = handlers.len(), "Invoking handlers.");
			let event = event.at(key);
			for handler in &handlers {
				handler.call(&event)
			}
		}

		current = dom.parent(&node);
	}
}
