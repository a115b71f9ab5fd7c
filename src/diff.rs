use crate::{
	dom::{Dom, DomError, NodeKey},
	equals::is_identical,
	events::EventManager,
	value::{Object, Value},
	vnode::{normalize_vnode, Canonical, VNode},
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{error, info, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// Renders virtual node trees into containers of a [`Dom`], diffing against what was rendered there before.
///
/// A [`Renderer`] owns the render history of each container it rendered into and the event registry
/// for all elements it created, so independent renderers never see each other's state.
///
/// # Correct Use
///
/// Each container's children must only be modified through the same [`Renderer`], and the container must have had no children
/// before the first render. The differ locates live nodes by position, so outside modifications cause it to patch the wrong nodes.
pub struct Renderer<D: Dom> {
	dom: D,
	events: EventManager<D>,
	history: HashMap<NodeKey, Canonical>,
}

/// The event type an `on`-prefixed prop name binds, like `"click"` for `onClick`.
fn event_type(prop_name: &str) -> Option<String> {
	prop_name.strip_prefix("on").filter(|rest| !rest.is_empty()).map(str::to_ascii_lowercase)
}

impl<D: Dom> Renderer<D> {
	#[must_use]
	pub fn new(dom: D) -> Self {
		Self {
			events: EventManager::new(dom.clone()),
			dom,
			history: HashMap::new(),
		}
	}

	pub fn dom(&self) -> &D {
		&self.dom
	}

	pub fn events(&self) -> &EventManager<D> {
		&self.events
	}

	/// The canonical tree last rendered into `container`.
	pub fn history(&self, container: &D::Node) -> Option<&Canonical> {
		self.history.get(&self.dom.key(container))
	}

	/// Normalizes `vnode` and renders it into `container`.
	///
	/// The first render into a container appends a freshly created tree. Later ones diff against the previous render.
	/// Afterwards, `container` becomes the delegation root for all registered event types.
	///
	/// Panics raised by components propagate. If that happens during normalization, nothing was changed yet.
	#[instrument(skip(self, vnode))]
	pub fn render_element(&mut self, vnode: &VNode, container: &D::Node) {
		let new_tree = normalize_vnode(vnode);
		let key = self.dom.key(container);

		match self.history.get(&key).cloned() {
			None => {
				let span = trace_span!("Initial render", container = %key);
				let _enter = span.enter();
				self.append_new(container, &new_tree);
			}
			Some(old_tree) => {
				let span = trace_span!("Rerender", container = %key);
				let _enter = span.enter();
				self.update_element(container, Some(&new_tree), Some(&old_tree), 0);
			}
		}

		self.history.insert(key, new_tree);
		self.events.setup_event_listeners(container);

		info!(
			"Event handler count/native listener count: {}/{}",
			self.events.registry().len(),
			self.events.installed_count()
		);
	}

	/// Materializes a canonical node that has no live counterpart yet.
	#[instrument(skip(self, node))]
	pub fn create_element(&self, node: &Canonical) -> Result<D::Node, DomError> {
		match node {
			Canonical::Text(text) => {
				let span = trace_span!("Creating text node", len = text.len());
				let _enter = span.enter();
				if cfg!(feature = "dangerous-logging") {
					trace!(text = &**text);
				}
				Ok(self.dom.create_text_node(text))
			}
			Canonical::Element(element) => {
				let span = trace_span!("Creating element", tag = &*element.tag, "children.len()" = element.children.len());
				let _enter = span.enter();

				let dom_element = self.dom.create_element(&element.tag)?;
				self.update_attributes(&dom_element, &element.props, &Object::new());
				for child in &element.children {
					match self.create_element(child) {
						Ok(dom_child) => {
							if let Err(error) = self.dom.append_child(&dom_element, &dom_child) {
								error!("Failed to append child to <{}>: {}", element.tag, error);
							}
						}
						Err(error) => error!("Failed to create child of <{}>: {}", element.tag, error),
					}
				}
				Ok(dom_element)
			}
		}
	}

	/// Reconciles the live child of `parent` at `index`, which corresponds to `old`, so that it matches `new`.
	///
	/// Positional: Child lists are never matched up by key, so a reordered list is patched (or recreated) position by position.
	#[allow(clippy::similar_names)]
	#[instrument(skip(self, new, old))]
	pub fn update_element(&self, parent: &D::Node, new: Option<&Canonical>, old: Option<&Canonical>, index: usize) {
		match (new, old) {
			(None, None) => trace!("Nothing to reconcile."),

			(None, Some(old)) => {
				let span = trace_span!("Removing node", index);
				let _enter = span.enter();
				match self.dom.child_at(parent, index) {
					Some(child) => {
						self.unbind_node(old, &child);
						if let Err(error) = self.dom.remove_child(parent, &child) {
							error!("{}", error);
						}
					}
					None => error!("Expected to remove node at index {} beyond end of the parent's children. Skipping.", index),
				}
			}

			(Some(new), None) => {
				let span = trace_span!("Appending node", index);
				let _enter = span.enter();
				self.append_new(parent, new);
			}

			(Some(Canonical::Text(t_new)), Some(Canonical::Text(t_old))) => {
				let span = trace_span!("Diffing text node", index);
				let _enter = span.enter();
				if t_new == t_old {
					return;
				}
				if cfg!(feature = "dangerous-logging") {
					trace!(t_old = &**t_old, t_new = &**t_new);
				}
				match self.dom.child_at(parent, index) {
					Some(text) => {
						let replacement = self.dom.create_text_node(t_new);
						if let Err(error) = self.dom.replace_child(parent, &replacement, &text) {
							error!("{}", error);
						}
					}
					None => {
						error!("Expected text beyond end of the parent's children. Switching to insertion.");
						self.append_new(parent, &Canonical::Text(Rc::clone(t_new)));
					}
				}
			}

			(Some(Canonical::Element(e_new)), Some(Canonical::Element(e_old))) if e_new.tag == e_old.tag => {
				let span = trace_span!("Diffing element", tag = &*e_new.tag, index);
				let _enter = span.enter();
				let element = match self.dom.child_at(parent, index) {
					Some(element) => element,
					None => {
						error!("Expected <{}> beyond end of the parent's children. Switching to insertion.", e_new.tag);
						return self.append_new(parent, &Canonical::Element(Rc::clone(e_new)));
					}
				};

				self.update_attributes(&element, &e_new.props, &e_old.props);

				// Highest index first, so that removals don't shift the positions still to be removed.
				for i in (e_new.children.len()..e_old.children.len()).rev() {
					self.update_element(&element, None, e_old.children.get(i), i);
				}
				for (i, child) in e_new.children.iter().enumerate() {
					self.update_element(&element, Some(child), e_old.children.get(i), i);
				}
			}

			// Mismatching nodes: Destroy and rebuild.
			(Some(new), Some(old)) => {
				let span = trace_span!("Replacing mismatching", index);
				let _enter = span.enter();

				if let (true, Canonical::Element(e_new), Canonical::Element(e_old)) = (STATIC_MAX_LEVEL >= Level::WARN, new, old) {
					if e_new.tag.eq_ignore_ascii_case(&e_old.tag) {
						warn!(
							"Recreating element due to different tag name casing: {:?} -> {:?}\n\
							The tags are compared exactly, so this replaces the whole subtree.",
							e_old.tag, e_new.tag
						)
					}
				}

				let current = match self.dom.child_at(parent, index) {
					Some(current) => current,
					None => {
						error!("Expected node to replace beyond end of the parent's children. Switching to insertion.");
						return self.append_new(parent, new);
					}
				};
				self.unbind_node(old, &current);
				match self.create_element(new) {
					Ok(replacement) => {
						if let Err(error) = self.dom.replace_child(parent, &replacement, &current) {
							error!("{}", error);
						}
					}
					Err(error) => error!("{}", error),
				}
			}
		}
	}

	fn append_new(&self, parent: &D::Node, node: &Canonical) {
		match self.create_element(node) {
			Ok(dom_node) => {
				if let Err(error) = self.dom.append_child(parent, &dom_node) {
					error!("{}", error);
				}
			}
			Err(error) => error!("{}", error),
		}
	}

	/// Unregisters the event handlers of a to-be-removed live subtree, without removing it from the DOM.
	#[instrument(skip(self, node))]
	fn unbind_node(&self, node: &Canonical, live: &D::Node) {
		let element = match node {
			Canonical::Text(_) => return,
			Canonical::Element(element) => element,
		};

		let span = trace_span!("Unbinding element", tag = &*element.tag);
		let _enter = span.enter();

		for (name, value) in element.props.iter() {
			if let (Some(event_type), Value::Function(handler)) = (event_type(name), value) {
				self.events.remove_event(live, &event_type, handler);
			}
		}

		for (i, child) in element.children.iter().enumerate() {
			match self.dom.child_at(live, i) {
				Some(live_child) => self.unbind_node(child, &live_child),
				None => {
					error!("Expected to unbind node at index {} beyond end of <{}>'s children. Ignoring bindings.", i, element.tag);
					break;
				}
			}
		}
	}

	/// Brings the live element's attributes, properties, style and event handlers from `old_props` to `new_props`.
	///
	/// Props whose value is identical in both are not touched.
	#[instrument(skip(self, new_props, old_props))]
	fn update_attributes(&self, element: &D::Node, new_props: &Object, old_props: &Object) {
		if core::ptr::eq(new_props, old_props) {
			trace!("Props unchanged (same object).");
			return;
		}

		for (name, old_value) in old_props {
			if !new_props.contains_key(name) {
				self.remove_prop(element, name, old_value);
			}
		}

		for (name, value) in new_props {
			let old_value = old_props.get(name);
			if old_value.map_or(false, |old_value| is_identical(old_value, value)) {
				continue;
			}
			self.set_prop(element, name, value, old_value);
		}
	}

	fn remove_prop(&self, element: &D::Node, name: &str, old_value: &Value) {
		let span = trace_span!("Removing prop", name);
		let _enter = span.enter();

		let result = match (event_type(name), old_value) {
			(Some(event_type), Value::Function(handler)) => {
				self.events.remove_event(element, &event_type, handler);
				Ok(())
			}
			_ if name == "className" => self.dom.remove_attribute(element, "class"),
			(_, Value::Bool(_)) => self.dom.set_property(element, name, false).and_then(|()| self.dom.remove_attribute(element, name)),
			_ => self.dom.remove_attribute(element, name),
		};
		if let Err(error) = result {
			warn!("Could not remove prop {:?}: {}", name, error)
		}
	}

	fn set_prop(&self, element: &D::Node, name: &str, value: &Value, old_value: Option<&Value>) {
		let span = trace_span!("Setting prop", name);
		let _enter = span.enter();
		if cfg!(feature = "dangerous-logging") {
			trace!(?value, ?old_value);
		}

		let event_type = event_type(name);
		if let (Some(event_type), Some(Value::Function(previous))) = (&event_type, old_value) {
			// Replaced by another handler or changed away from a function.
			self.events.remove_event(element, event_type, previous);
		}

		let result = match value {
			_ if name == "className" => self.dom.set_attribute(element, "class", &value.to_string()),
			Value::Function(handler) if event_type.is_some() => {
				if let Some(event_type) = &event_type {
					self.events.add_event(element, event_type, handler.clone());
				}
				Ok(())
			}
			Value::Object(style) if name == "style" => style.iter().try_for_each(|(property, value)| {
				let value = match value {
					Value::Null => String::new(),
					value => value.to_string(),
				};
				self.dom.set_style(element, property, &value)
			}),
			Value::Bool(value) => self.dom.set_property(element, name, *value),
			value => self.dom.set_attribute(element, name, &value.to_string()),
		};
		if let Err(error) = result {
			error!("Could not set prop {:?}: {}", name, error)
		}
	}
}
