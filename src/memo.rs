//! Render caching for function components.

use crate::{
	equals::{deep_equals, shallow_equals, Equality},
	value::{Object, Value},
	vnode::{Component, Instances, Props, VNode},
};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

struct Rendered {
	props: Value,
	children: Value,
	node: VNode,
}

/// Splits off `children`, which [`create_vnode`](`crate::create_vnode`) passes as a fresh array on every call.
fn split_children(props: &Props) -> (Value, Value) {
	let mut rest = Object::clone(props);
	let children = rest.shift_remove("children").unwrap_or(Value::Null);
	(rest.into(), children)
}

/// Wraps `component` so that it returns its previous result unchanged (same identity)
/// while the props it receives stay `equals`-equal to the previous ones.
///
/// `children` is compared separately (also with `equals`), so that [`memo`] still hits when the same child nodes are passed again.
///
/// Each instance has its own cache. Like with [`component_with_hooks`](`crate::component_with_hooks`),
/// instances are told apart by their position in the tree. Reusing a cached render keeps the wrapped component's instance alive.
#[must_use]
pub fn memo_with(component: Component, equals: Equality) -> Component {
	let instances = Rc::new(RefCell::new(Instances::<RefCell<Option<Rendered>>>::new()));
	let name = component.name();
	let keep = {
		let instances = Rc::clone(&instances);
		let component = component.clone();
		move || {
			drop(instances.borrow_mut().claim());
			component.keep();
		}
	};
	Component::new(move |props: &Props| {
		let previous = instances.borrow_mut().claim();
		let (props_value, children) = split_children(props);
		if let Some(previous) = &*previous.borrow() {
			if equals(&previous.props, &props_value) && equals(&previous.children, &children) {
				trace!(component = name, "Props unchanged. Reusing previous render.");
				component.keep();
				return previous.node.clone();
			}
		}

		let node = component.call(props);
		*previous.borrow_mut() = Some(Rendered {
			props: props_value,
			children,
			node: node.clone(),
		});
		node
	})
	.with_keep(keep)
	.named(name)
}

/// [`memo_with`] using [`shallow_equals`].
#[must_use]
pub fn memo(component: Component) -> Component {
	memo_with(component, shallow_equals)
}

/// [`memo_with`] using [`deep_equals`].
#[must_use]
pub fn deep_memo(component: Component) -> Component {
	memo_with(component, deep_equals)
}
