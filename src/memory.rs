//! An in-memory [`Dom`], for rendering outside of a browser and for inspecting results.
//!
//! It models what the differ touches: Elements with string attributes, boolean properties and inline style,
//! text nodes, and native listeners with bubbling dispatch.
//! Boolean properties never reflect to attributes here.
//!
//! Nodes removed or replaced through [`Dom::remove_child`] and [`Dom::replace_child`] are freed along with their subtrees,
//! so their [`NodeKey`]s become unknown afterwards.

use crate::{
	dom::{Dom, DomError, NativeHandler, NodeKey},
	value::Event,
};
use core::{cell::RefCell, fmt::Write as _};
use hashbrown::HashMap;
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::trace;

#[derive(Clone, Default)]
pub struct MemoryDom(Rc<RefCell<Document>>);

/// Identifies one listener installed through [`Dom::add_event_listener`].
#[derive(Debug)]
pub struct MemoryListener(u64);

#[derive(Default)]
struct Document {
	nodes: HashMap<NodeKey, NodeData>,
	next_key: u64,
	next_listener: u64,
}

struct NodeData {
	parent: Option<NodeKey>,
	children: Vec<NodeKey>,
	kind: NodeKind,
	listeners: Vec<InstalledListener>,
}

enum NodeKind {
	Element {
		tag: Rc<str>,
		attributes: IndexMap<String, String>,
		properties: IndexMap<String, bool>,
		style: IndexMap<String, String>,
	},
	Text(String),
}

struct InstalledListener {
	id: u64,
	event_type: Rc<str>,
	handler: NativeHandler<MemoryDom>,
}

impl Document {
	fn insert(&mut self, kind: NodeKind) -> NodeKey {
		let key = NodeKey(self.next_key);
		self.next_key += 1;
		self.nodes.insert(
			key,
			NodeData {
				parent: None,
				children: vec![],
				kind,
				listeners: vec![],
			},
		);
		key
	}

	fn node(&self, key: NodeKey) -> Option<&NodeData> {
		self.nodes.get(&key)
	}

	fn is_inclusive_ancestor(&self, ancestor: NodeKey, mut node: NodeKey) -> bool {
		loop {
			if node == ancestor {
				return true;
			}
			match self.node(node).and_then(|data| data.parent) {
				Some(parent) => node = parent,
				None => return false,
			}
		}
	}

	fn detach(&mut self, child: NodeKey) {
		let parent = match self.nodes.get_mut(&child) {
			Some(data) => data.parent.take(),
			None => return,
		};
		if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(&parent)) {
			parent.children.retain(|&c| c != child);
		}
	}

	/// Removes `key` and its descendants from the node table.
	///
	/// The removed data is returned, so that listener handlers can be dropped after the document is released.
	fn free(&mut self, key: NodeKey) -> Vec<NodeData> {
		let mut freed = vec![];
		let mut pending = vec![key];
		while let Some(key) = pending.pop() {
			if let Some(data) = self.nodes.remove(&key) {
				pending.extend(data.children.iter().copied());
				freed.push(data);
			}
		}
		freed
	}

	fn check_insertion(&self, parent: NodeKey, child: NodeKey) -> Result<(), String> {
		match self.node(parent) {
			None => return Err(format!("unknown parent {}", parent)),
			Some(NodeData { kind: NodeKind::Text(_), .. }) => return Err(format!("text node {} can't have children", parent)),
			Some(_) => (),
		}
		if self.node(child).is_none() {
			return Err(format!("unknown child {}", child));
		}
		if self.is_inclusive_ancestor(child, parent) {
			return Err(format!("{} is an ancestor of {}", child, parent));
		}
		Ok(())
	}

	fn element_mut(&mut self, key: NodeKey) -> Option<(&mut IndexMap<String, String>, &mut IndexMap<String, bool>, &mut IndexMap<String, String>)> {
		match self.nodes.get_mut(&key) {
			Some(NodeData {
				kind: NodeKind::Element { attributes, properties, style, .. },
				..
			}) => Some((attributes, properties, style)),
			_ => None,
		}
	}
}

fn kebab_case(camel: &str) -> String {
	let mut kebab = String::with_capacity(camel.len() + 2);
	for c in camel.chars() {
		if c.is_ascii_uppercase() {
			kebab.push('-');
			kebab.push(c.to_ascii_lowercase());
		} else {
			kebab.push(c)
		}
	}
	kebab
}

fn camel_case(kebab: &str) -> String {
	let mut camel = String::with_capacity(kebab.len());
	let mut upper = false;
	for c in kebab.chars() {
		if c == '-' {
			upper = true;
		} else if upper {
			camel.push(c.to_ascii_uppercase());
			upper = false;
		} else {
			camel.push(c)
		}
	}
	camel
}

fn serialize_style(style: &IndexMap<String, String>) -> String {
	style.iter().map(|(name, value)| format!("{}: {};", kebab_case(name), value)).collect::<Vec<_>>().join(" ")
}

fn parse_style(style: &str) -> IndexMap<String, String> {
	style
		.split(';')
		.filter_map(|declaration| {
			let (name, value) = declaration.split_once(':')?;
			let name = name.trim();
			(!name.is_empty()).then(|| (camel_case(name), value.trim().to_owned()))
		})
		.collect()
}

fn escape(text: &str, attribute: bool) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' if !attribute => escaped.push_str("&lt;"),
			'>' if !attribute => escaped.push_str("&gt;"),
			'"' if attribute => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	escaped
}

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The boolean property last set through [`Dom::set_property`], if any.
	#[must_use]
	pub fn property(&self, element: &NodeKey, name: &str) -> Option<bool> {
		match &self.0.borrow().node(*element)?.kind {
			NodeKind::Element { properties, .. } => properties.get(name).copied(),
			NodeKind::Text(_) => None,
		}
	}

	/// One inline style property, by camelCase name.
	#[must_use]
	pub fn style(&self, element: &NodeKey, name: &str) -> Option<String> {
		match &self.0.borrow().node(*element)?.kind {
			NodeKind::Element { style, .. } => style.get(name).cloned(),
			NodeKind::Text(_) => None,
		}
	}

	/// How many nodes the document holds, attached or not.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.0.borrow().nodes.len()
	}

	#[must_use]
	pub fn children(&self, parent: &NodeKey) -> Vec<NodeKey> {
		self.0.borrow().node(*parent).map(|data| data.children.clone()).unwrap_or_default()
	}

	/// How many native listeners are installed on `target` for `event_type`.
	#[must_use]
	pub fn listener_count(&self, target: &NodeKey, event_type: &str) -> usize {
		self.0
			.borrow()
			.node(*target)
			.map_or(0, |data| data.listeners.iter().filter(|listener| &*listener.event_type == event_type).count())
	}

	#[must_use]
	pub fn text_content(&self, node: &NodeKey) -> String {
		let document = self.0.borrow();
		let mut text = String::new();
		Self::collect_text(&document, *node, &mut text);
		text
	}

	fn collect_text(document: &Document, key: NodeKey, text: &mut String) {
		if let Some(data) = document.node(key) {
			match &data.kind {
				NodeKind::Text(data) => text.push_str(data),
				NodeKind::Element { .. } => {
					for &child in &data.children {
						Self::collect_text(document, child, text)
					}
				}
			}
		}
	}

	/// The node and its subtree as HTML.
	#[must_use]
	pub fn outer_html(&self, node: &NodeKey) -> String {
		let document = self.0.borrow();
		let mut html = String::new();
		Self::serialize(&document, *node, &mut html);
		html
	}

	/// The node's children as HTML.
	#[must_use]
	pub fn inner_html(&self, node: &NodeKey) -> String {
		let document = self.0.borrow();
		let mut html = String::new();
		if let Some(data) = document.node(*node) {
			for &child in &data.children {
				Self::serialize(&document, child, &mut html)
			}
		}
		html
	}

	fn serialize(document: &Document, key: NodeKey, html: &mut String) {
		let data = match document.node(key) {
			Some(data) => data,
			None => return,
		};
		match &data.kind {
			NodeKind::Text(text) => html.push_str(&escape(text, false)),
			NodeKind::Element { tag, attributes, .. } => {
				html.push('<');
				html.push_str(tag);
				for (name, value) in attributes {
					let _ = write!(html, " {}=\"{}\"", name, escape(value, true));
				}
				html.push('>');
				for &child in &data.children {
					Self::serialize(document, child, html)
				}
				let _ = write!(html, "</{}>", tag);
			}
		}
	}

	/// Fires `event_type` at `target` and bubbles it through all ancestors' native listeners.
	///
	/// Returns how many native listeners ran.
	/// Listeners run without any borrow of the document held, so they may mutate it (and re-render).
	pub fn dispatch_event(&self, target: &NodeKey, event_type: &str) -> usize {
		let event = Event::new(event_type, *target);
		let path = {
			let document = self.0.borrow();
			let mut path = vec![];
			let mut current = document.node(*target).map(|_| *target);
			while let Some(key) = current {
				path.push(key);
				current = document.node(key).and_then(|data| data.parent);
			}
			path
		};

		let mut fired = 0;
		for key in path {
			let handlers: Vec<NativeHandler<MemoryDom>> = match self.0.borrow().node(key) {
				Some(data) => data
					.listeners
					.iter()
					.filter(|listener| &*listener.event_type == event_type)
					.map(|listener| Rc::clone(&listener.handler))
					.collect(),
				None => continue,
			};
			for handler in handlers {
				fired += 1;
				handler(self, target, &event);
			}
		}
		trace!(event_type, %target, fired, "Dispatched event.");
		fired
	}
}

impl Dom for MemoryDom {
	type Node = NodeKey;
	type Listener = MemoryListener;

	fn key(&self, node: &NodeKey) -> NodeKey {
		*node
	}

	fn create_element(&self, tag: &str) -> Result<NodeKey, DomError> {
		if tag.is_empty() || tag.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '/' | '"' | '\'' | '=')) {
			return Err(DomError::CreateElement {
				tag: tag.to_owned(),
				reason: "invalid character in tag name".to_owned(),
			});
		}
		Ok(self.0.borrow_mut().insert(NodeKind::Element {
			tag: tag.to_ascii_lowercase().into(),
			attributes: IndexMap::new(),
			properties: IndexMap::new(),
			style: IndexMap::new(),
		}))
	}

	fn create_text_node(&self, text: &str) -> NodeKey {
		self.0.borrow_mut().insert(NodeKind::Text(text.to_owned()))
	}

	fn parent(&self, node: &NodeKey) -> Option<NodeKey> {
		self.0.borrow().node(*node)?.parent
	}

	fn child_at(&self, parent: &NodeKey, index: usize) -> Option<NodeKey> {
		self.0.borrow().node(*parent)?.children.get(index).copied()
	}

	fn child_count(&self, parent: &NodeKey) -> usize {
		self.0.borrow().node(*parent).map_or(0, |data| data.children.len())
	}

	fn append_child(&self, parent: &NodeKey, child: &NodeKey) -> Result<(), DomError> {
		let mut document = self.0.borrow_mut();
		document.check_insertion(*parent, *child).map_err(|reason| DomError::Insert { reason })?;
		document.detach(*child);
		if let Some(data) = document.nodes.get_mut(child) {
			data.parent = Some(*parent);
		}
		if let Some(data) = document.nodes.get_mut(parent) {
			data.children.push(*child);
		}
		Ok(())
	}

	fn replace_child(&self, parent: &NodeKey, new_child: &NodeKey, old_child: &NodeKey) -> Result<(), DomError> {
		let mut document = self.0.borrow_mut();
		if document.node(*old_child).and_then(|data| data.parent) != Some(*parent) {
			return Err(DomError::Replace {
				reason: format!("{} is not a child of {}", old_child, parent),
			});
		}
		if new_child == old_child {
			return Ok(());
		}
		document.check_insertion(*parent, *new_child).map_err(|reason| DomError::Replace { reason })?;
		document.detach(*new_child);
		if let Some(data) = document.nodes.get_mut(parent) {
			if let Some(slot) = data.children.iter_mut().find(|c| **c == *old_child) {
				*slot = *new_child;
			}
		}
		if let Some(data) = document.nodes.get_mut(new_child) {
			data.parent = Some(*parent);
		}
		let freed = document.free(*old_child);
		drop(document);
		trace!("Freed {} replaced node(s).", freed.len());
		Ok(())
	}

	fn remove_child(&self, parent: &NodeKey, child: &NodeKey) -> Result<(), DomError> {
		let mut document = self.0.borrow_mut();
		if document.node(*child).and_then(|data| data.parent) != Some(*parent) {
			return Err(DomError::Remove {
				reason: format!("{} is not a child of {}", child, parent),
			});
		}
		document.detach(*child);
		let freed = document.free(*child);
		drop(document);
		trace!("Freed {} removed node(s).", freed.len());
		Ok(())
	}

	fn tag_name(&self, node: &NodeKey) -> Option<String> {
		match &self.0.borrow().node(*node)?.kind {
			NodeKind::Element { tag, .. } => Some(tag.to_ascii_uppercase()),
			NodeKind::Text(_) => None,
		}
	}

	fn text_data(&self, node: &NodeKey) -> Option<String> {
		match &self.0.borrow().node(*node)?.kind {
			NodeKind::Text(text) => Some(text.clone()),
			NodeKind::Element { .. } => None,
		}
	}

	fn attributes(&self, element: &NodeKey) -> Vec<(String, String)> {
		match self.0.borrow().node(*element).map(|data| &data.kind) {
			Some(NodeKind::Element { attributes, .. }) => attributes.iter().map(|(name, value)| (name.clone(), value.clone())).collect(),
			_ => vec![],
		}
	}

	fn get_attribute(&self, element: &NodeKey, name: &str) -> Option<String> {
		match &self.0.borrow().node(*element)?.kind {
			NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
			NodeKind::Text(_) => None,
		}
	}

	fn set_attribute(&self, element: &NodeKey, name: &str, value: &str) -> Result<(), DomError> {
		let mut document = self.0.borrow_mut();
		let (attributes, _, style) = document.element_mut(*element).ok_or_else(|| DomError::Attribute {
			name: name.to_owned(),
			reason: format!("{} is not an element", element),
		})?;
		if name == "style" {
			*style = parse_style(value);
		}
		attributes.insert(name.to_owned(), value.to_owned());
		Ok(())
	}

	fn remove_attribute(&self, element: &NodeKey, name: &str) -> Result<(), DomError> {
		let mut document = self.0.borrow_mut();
		if let Some((attributes, _, style)) = document.element_mut(*element) {
			if name == "style" {
				style.clear();
			}
			attributes.shift_remove(name);
		}
		Ok(())
	}

	fn set_property(&self, element: &NodeKey, name: &str, value: bool) -> Result<(), DomError> {
		let mut document = self.0.borrow_mut();
		let (_, properties, _) = document.element_mut(*element).ok_or_else(|| DomError::Property {
			name: name.to_owned(),
			reason: format!("{} is not an element", element),
		})?;
		properties.insert(name.to_owned(), value);
		Ok(())
	}

	fn set_style(&self, element: &NodeKey, name: &str, value: &str) -> Result<(), DomError> {
		let mut document = self.0.borrow_mut();
		let (attributes, _, style) = document.element_mut(*element).ok_or_else(|| DomError::Property {
			name: format!("style.{}", name),
			reason: format!("{} is not an element", element),
		})?;
		if value.is_empty() {
			style.shift_remove(name);
		} else {
			style.insert(name.to_owned(), value.to_owned());
		}
		if style.is_empty() {
			attributes.shift_remove("style");
		} else {
			attributes.insert("style".to_owned(), serialize_style(style));
		}
		Ok(())
	}

	fn add_event_listener(&self, target: &NodeKey, event_type: &str, handler: NativeHandler<Self>) -> Result<MemoryListener, DomError> {
		let mut document = self.0.borrow_mut();
		let id = document.next_listener;
		let data = document.nodes.get_mut(target).ok_or_else(|| DomError::Listener {
			event_type: event_type.to_owned(),
			reason: format!("unknown target {}", target),
		})?;
		data.listeners.push(InstalledListener {
			id,
			event_type: event_type.into(),
			handler,
		});
		document.next_listener += 1;
		Ok(MemoryListener(id))
	}

	fn remove_event_listener(&self, target: &NodeKey, event_type: &str, listener: &MemoryListener) -> Result<(), DomError> {
		if let Some(data) = self.0.borrow_mut().nodes.get_mut(target) {
			data.listeners.retain(|installed| !(installed.id == listener.0 && &*installed.event_type == event_type));
		}
		Ok(())
	}
}
