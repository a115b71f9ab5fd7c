//! Reads live subtrees back into [`Canonical`] trees.
//!
//! Only what's visible as markup is loaded: Attributes become string props (`class` as `className`),
//! while live properties, inline style objects and event handlers are not recoverable.

use crate::{
	dom::Dom,
	value::{Object, Value},
	vnode::{Canonical, CanonicalElement},
};
use std::rc::Rc;
use tracing::warn;

pub fn load_child_nodes<D: Dom>(dom: &D, parent: &D::Node) -> Vec<Canonical> {
	(0..dom.child_count(parent))
		.filter_map(|i| dom.child_at(parent, i))
		.filter_map(|child| load_node(dom, &child))
		.collect()
}

/// [`None`] for nodes that are neither elements nor text.
pub fn load_node<D: Dom>(dom: &D, node: &D::Node) -> Option<Canonical> {
	if let Some(tag_name) = dom.tag_name(node) {
		Some(Canonical::Element(Rc::new(load_element(dom, node, &tag_name))))
	} else if let Some(text) = dom.text_data(node) {
		Some(Canonical::Text(text.into()))
	} else {
		warn!("Unrecognised child node: {:?}", node);
		None
	}
}

fn load_element<D: Dom>(dom: &D, element: &D::Node, tag_name: &str) -> CanonicalElement {
	CanonicalElement {
		tag: tag_name.to_ascii_lowercase().into(),
		props: Rc::new(load_attributes(dom, element)),
		children: load_child_nodes(dom, element),
	}
}

pub fn load_attributes<D: Dom>(dom: &D, element: &D::Node) -> Object {
	dom.attributes(element)
		.into_iter()
		.map(|(name, value)| {
			let name: Rc<str> = if name == "class" { "className".into() } else { name.into() };
			(name, Value::from(value))
		})
		.collect()
}
