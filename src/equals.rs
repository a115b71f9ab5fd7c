//! Structural comparisons used for prop and dependency change detection.
//!
//! Both functions are pure and total on acyclic input.

use crate::{
	value::Value,
	vnode::{Canonical, VNode},
};
use std::rc::Rc;

/// The comparison a memoization primitive uses to decide whether its inputs changed.
pub type Equality = fn(&Value, &Value) -> bool;

/// `Object.is` semantics: `NaN` equals itself, `+0` and `-0` differ.
pub(crate) fn same_number(a: f64, b: f64) -> bool {
	if a.is_nan() || b.is_nan() {
		a.is_nan() && b.is_nan()
	} else {
		a == b && a.is_sign_negative() == b.is_sign_negative()
	}
}

/// Reference/value identity, the base case of both equality functions.
///
/// Strings compare by content (they are primitives), compound values by allocation.
#[must_use]
pub fn is_identical(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Null, Value::Null) => true,
		(Value::Bool(a), Value::Bool(b)) => a == b,
		(Value::Number(a), Value::Number(b)) => same_number(*a, *b),
		(Value::String(a), Value::String(b)) => a == b,
		(Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
		(Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
		(Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
		(Value::Node(a), Value::Node(b)) => a.is_identical(b),
		_ => false,
	}
}

/// One level of structure: Same keys (or length), with identical values.
#[must_use]
pub fn shallow_equals(a: &Value, b: &Value) -> bool {
	if is_identical(a, b) {
		return true;
	}

	match (a, b) {
		(Value::Array(a), Value::Array(b)) => a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| is_identical(a, b)),
		(Value::Object(a), Value::Object(b)) => a.len() == b.len() && a.iter().all(|(key, a)| b.get(key).map_or(false, |b| is_identical(a, b))),
		_ => false,
	}
}

/// Like [`shallow_equals`], but recursing into arrays, objects and virtual nodes.
#[must_use]
pub fn deep_equals(a: &Value, b: &Value) -> bool {
	if is_identical(a, b) {
		return true;
	}

	match (a, b) {
		(Value::Array(a), Value::Array(b)) => a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| deep_equals(a, b)),
		(Value::Object(a), Value::Object(b)) => a.len() == b.len() && a.iter().all(|(key, a)| b.get(key).map_or(false, |b| deep_equals(a, b))),
		(Value::Node(a), Value::Node(b)) => deep_equals_vnode(a, b),
		_ => false,
	}
}

pub(crate) fn deep_equals_vnode(a: &VNode, b: &VNode) -> bool {
	match (a, b) {
		(VNode::Element(a), VNode::Element(b)) => {
			Rc::ptr_eq(a, b) || (a.tag == b.tag && deep_equals_props(&a.props, &b.props) && deep_equals_children(&a.children, &b.children))
		}
		(VNode::Component(a), VNode::Component(b)) => {
			Rc::ptr_eq(a, b) || (a.component == b.component && deep_equals_props(&a.props, &b.props) && deep_equals_children(&a.children, &b.children))
		}
		(VNode::Fragment(a), VNode::Fragment(b)) => deep_equals_children(a, b),
		(a, b) => a.is_identical(b),
	}
}

fn deep_equals_children(a: &[VNode], b: &[VNode]) -> bool {
	a.len() == b.len() && a.iter().zip(b).all(|(a, b)| deep_equals_vnode(a, b))
}

fn deep_equals_props(a: &Rc<crate::value::Object>, b: &Rc<crate::value::Object>) -> bool {
	Rc::ptr_eq(a, b) || (a.len() == b.len() && a.iter().all(|(key, a)| b.get(key).map_or(false, |b| deep_equals(a, b))))
}

pub(crate) fn deep_equals_canonical(a: &Canonical, b: &Canonical) -> bool {
	match (a, b) {
		(Canonical::Text(a), Canonical::Text(b)) => a == b,
		(Canonical::Element(a), Canonical::Element(b)) => {
			Rc::ptr_eq(a, b)
				|| (a.tag == b.tag
					&& deep_equals_props(&a.props, &b.props)
					&& a.children.len() == b.children.len()
					&& a.children.iter().zip(&b.children).all(|(a, b)| deep_equals_canonical(a, b)))
		}
		_ => false,
	}
}
