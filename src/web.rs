//! A [`Dom`] backed by the browser's document, through [`web_sys`].
//!
//! Node keys are stored on the nodes themselves as an expando property, so [`NodeKey`]s survive
//! as long as the nodes do, regardless of how often they're wrapped.

use crate::{
	dom::{Dom, DomError, NativeHandler, NodeKey},
	value::Event,
};
use core::cell::Cell;
use js_sys::Reflect;
use std::rc::Rc;
use tracing::{error, trace};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

const KEY_PROPERTY: &str = "__vnodeDomKey";

#[derive(Clone)]
pub struct WebDom {
	document: web_sys::Document,
	next_key: Rc<Cell<u64>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebNode(web_sys::Node);

impl WebNode {
	#[must_use]
	pub fn node(&self) -> &web_sys::Node {
		&self.0
	}
}

impl From<web_sys::Node> for WebNode {
	fn from(node: web_sys::Node) -> Self {
		Self(node)
	}
}

impl From<web_sys::Element> for WebNode {
	fn from(element: web_sys::Element) -> Self {
		Self(element.into())
	}
}

/// Keeps an installed native listener's closure alive.
pub struct WebListener(Closure<dyn Fn(web_sys::Event)>);

fn describe(error: &JsValue) -> String {
	error.as_string().unwrap_or_else(|| format!("{:?}", error))
}

impl WebDom {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			next_key: Rc::default(),
		}
	}

	/// The current window's document, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		Some(Self::new(web_sys::window()?.document()?))
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	fn element<'a>(&self, node: &'a WebNode) -> Option<&'a web_sys::Element> {
		node.0.dyn_ref::<web_sys::Element>()
	}
}

impl Dom for WebDom {
	type Node = WebNode;
	type Listener = WebListener;

	#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
	fn key(&self, node: &WebNode) -> NodeKey {
		let property = JsValue::from_str(KEY_PROPERTY);
		if let Some(key) = Reflect::get(&node.0, &property).ok().and_then(|key| key.as_f64()) {
			return NodeKey(key as u64);
		}

		let key = self.next_key.get();
		self.next_key.set(key + 1);
		if let Err(error) = Reflect::set(&node.0, &property, &JsValue::from_f64(key as f64)) {
			error!("Failed to store node key {}: {}", key, describe(&error));
		}
		NodeKey(key)
	}

	fn create_element(&self, tag: &str) -> Result<WebNode, DomError> {
		self.document.create_element(tag).map(WebNode::from).map_err(|error| DomError::CreateElement {
			tag: tag.to_owned(),
			reason: describe(&error),
		})
	}

	fn create_text_node(&self, text: &str) -> WebNode {
		WebNode(self.document.create_text_node(text).into())
	}

	fn parent(&self, node: &WebNode) -> Option<WebNode> {
		node.0.parent_node().map(WebNode)
	}

	fn child_at(&self, parent: &WebNode, index: usize) -> Option<WebNode> {
		use core::convert::TryFrom;
		parent.0.child_nodes().item(u32::try_from(index).ok()?).map(WebNode)
	}

	fn child_count(&self, parent: &WebNode) -> usize {
		parent.0.child_nodes().length() as usize
	}

	fn append_child(&self, parent: &WebNode, child: &WebNode) -> Result<(), DomError> {
		parent.0.append_child(&child.0).map(drop).map_err(|error| DomError::Insert { reason: describe(&error) })
	}

	fn replace_child(&self, parent: &WebNode, new_child: &WebNode, old_child: &WebNode) -> Result<(), DomError> {
		parent
			.0
			.replace_child(&new_child.0, &old_child.0)
			.map(drop)
			.map_err(|error| DomError::Replace { reason: describe(&error) })
	}

	fn remove_child(&self, parent: &WebNode, child: &WebNode) -> Result<(), DomError> {
		parent.0.remove_child(&child.0).map(drop).map_err(|error| DomError::Remove { reason: describe(&error) })
	}

	fn tag_name(&self, node: &WebNode) -> Option<String> {
		self.element(node).map(web_sys::Element::tag_name)
	}

	fn text_data(&self, node: &WebNode) -> Option<String> {
		if node.0.node_type() == web_sys::Node::TEXT_NODE {
			node.0.node_value()
		} else {
			None
		}
	}

	fn attributes(&self, element: &WebNode) -> Vec<(String, String)> {
		let attributes = match self.element(element) {
			Some(element) => element.attributes(),
			None => return vec![],
		};
		(0..attributes.length())
			.filter_map(|i| attributes.item(i))
			.map(|attribute| (attribute.name(), attribute.value()))
			.collect()
	}

	fn get_attribute(&self, element: &WebNode, name: &str) -> Option<String> {
		self.element(element)?.get_attribute(name)
	}

	fn set_attribute(&self, element: &WebNode, name: &str, value: &str) -> Result<(), DomError> {
		let error = |reason: String| DomError::Attribute { name: name.to_owned(), reason };
		self.element(element)
			.ok_or_else(|| error("not an element".to_owned()))?
			.set_attribute(name, value)
			.map_err(|e| error(describe(&e)))
	}

	fn remove_attribute(&self, element: &WebNode, name: &str) -> Result<(), DomError> {
		let error = |reason: String| DomError::Attribute { name: name.to_owned(), reason };
		self.element(element)
			.ok_or_else(|| error("not an element".to_owned()))?
			.remove_attribute(name)
			.map_err(|e| error(describe(&e)))
	}

	fn set_property(&self, element: &WebNode, name: &str, value: bool) -> Result<(), DomError> {
		Reflect::set(&element.0, &JsValue::from_str(name), &JsValue::from_bool(value))
			.map(drop)
			.map_err(|error| DomError::Property {
				name: name.to_owned(),
				reason: describe(&error),
			})
	}

	fn set_style(&self, element: &WebNode, name: &str, value: &str) -> Result<(), DomError> {
		let error = |reason: String| DomError::Property {
			name: format!("style.{}", name),
			reason,
		};
		let style = Reflect::get(&element.0, &JsValue::from_str("style")).map_err(|e| error(describe(&e)))?;
		if !style.is_object() {
			return Err(error("no inline style".to_owned()));
		}
		Reflect::set(&style, &JsValue::from_str(name), &JsValue::from_str(value))
			.map(drop)
			.map_err(|e| error(describe(&e)))
	}

	fn add_event_listener(&self, target: &WebNode, event_type: &str, handler: NativeHandler<Self>) -> Result<WebListener, DomError> {
		let dom = self.clone();
		let closure = Closure::wrap(Box::new(move |native: web_sys::Event| {
			let target = match native.target().and_then(|target| target.dyn_into::<web_sys::Node>().ok()) {
				Some(target) => WebNode(target),
				None => {
					trace!("Ignoring event without node target.");
					return;
				}
			};
			let event = Event::new(native.type_(), dom.key(&target)).with_native(Rc::new(native));
			handler(&dom, &target, &event)
		}) as Box<dyn Fn(web_sys::Event)>);

		target
			.0
			.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())
			.map_err(|error| DomError::Listener {
				event_type: event_type.to_owned(),
				reason: describe(&error),
			})?;
		Ok(WebListener(closure))
	}

	fn remove_event_listener(&self, target: &WebNode, event_type: &str, listener: &WebListener) -> Result<(), DomError> {
		target
			.0
			.remove_event_listener_with_callback(event_type, listener.0.as_ref().unchecked_ref())
			.map_err(|error| DomError::Listener {
				event_type: event_type.to_owned(),
				reason: describe(&error),
			})
	}
}
