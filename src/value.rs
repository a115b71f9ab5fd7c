//! Dynamic prop values.
//!
//! Props, memo dependencies and component inputs are all [`Value`]s, so that [`shallow_equals`](`crate::equals::shallow_equals`)
//! and [`deep_equals`](`crate::equals::deep_equals`) can compare them without knowing their shape up front.
//!
//! Compound values ([`Value::Array`], [`Value::Object`], [`Value::Function`] and element/component [`Value::Node`]s)
//! are reference-counted and have an *identity*: Cloning one keeps it, constructing a new one doesn't.

use crate::{dom::NodeKey, vnode::VNode};
use core::{
	any::Any,
	fmt::{self, Debug, Display, Formatter},
	hash::{Hash, Hasher},
};
use indexmap::IndexMap;
use std::rc::Rc;

/// An ordered string-keyed map, like a plain JavaScript object.
pub type Object = IndexMap<Rc<str>, Value>;

#[derive(Clone)]
pub enum Value {
	/// `null` or `undefined`.
	Null,
	Bool(bool),
	Number(f64),
	String(Rc<str>),
	Array(Rc<[Value]>),
	Object(Rc<Object>),
	Function(Callback),
	/// A virtual node passed through props, most commonly in `children`.
	Node(VNode),
}

impl Value {
	#[must_use]
	pub fn array(values: impl IntoIterator<Item = Value>) -> Self {
		Self::Array(values.into_iter().collect())
	}

	#[must_use]
	pub fn object<K: Into<Rc<str>>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
		Self::Object(Rc::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()))
	}

	/// JavaScript truthiness.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Null => false,
			Value::Bool(b) => *b,
			Value::Number(n) => *n != 0.0 && !n.is_nan(),
			Value::String(s) => !s.is_empty(),
			Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Node(_) => true,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_f64(&self) -> Option<f64> {
		match *self {
			Value::Number(n) => Some(n),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_bool(&self) -> Option<bool> {
		match *self {
			Value::Bool(b) => Some(b),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_callback(&self) -> Option<&Callback> {
		match self {
			Value::Function(callback) => Some(callback),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_object(&self) -> Option<&Object> {
		match self {
			Value::Object(object) => Some(object),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_array(&self) -> Option<&[Value]> {
		match self {
			Value::Array(array) => Some(array),
			_ => None,
		}
	}
}

/// Formats a number the way JavaScript's `String(number)` does for the common cases.
pub(crate) fn format_number(n: f64) -> String {
	if n.is_nan() {
		"NaN".to_owned()
	} else if n.is_infinite() {
		(if n > 0.0 { "Infinity" } else { "-Infinity" }).to_owned()
	} else if n == 0.0 {
		// Includes `-0`.
		"0".to_owned()
	} else if n.fract() == 0.0 && n.abs() < 1e21 {
		#[allow(clippy::cast_possible_truncation)]
		let integer = n as i128;
		integer.to_string()
	} else {
		n.to_string()
	}
}

/// The attribute string representation, as `setAttribute` would stringify it.
impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("null"),
			Value::Bool(b) => Display::fmt(b, f),
			Value::Number(n) => f.write_str(&format_number(*n)),
			Value::String(s) => f.write_str(s),
			Value::Array(values) => {
				for (i, value) in values.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					if !matches!(value, Value::Null) {
						Display::fmt(value, f)?;
					}
				}
				Ok(())
			}
			Value::Object(_) => f.write_str("[object Object]"),
			Value::Function(_) => f.write_str("function"),
			Value::Node(_) => f.write_str("[object Object]"),
		}
	}
}

impl Debug for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("Null"),
			Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
			Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
			Value::String(s) => f.debug_tuple("String").field(s).finish(),
			Value::Array(values) => f.debug_list().entries(values.iter()).finish(),
			Value::Object(object) => f.debug_map().entries(object.iter()).finish(),
			Value::Function(callback) => Debug::fmt(callback, f),
			Value::Node(node) => f.debug_tuple("Node").field(node).finish(),
		}
	}
}

/// Structural equality ([`deep_equals`](`crate::equals::deep_equals`)).
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		crate::equals::deep_equals(self, other)
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Self::Number(n)
	}
}

macro_rules! from_lossless_number {
	($($t:ty),*$(,)?) => {$(
		impl From<$t> for Value {
			fn from(n: $t) -> Self {
				Self::Number(f64::from(n))
			}
		}
	)*};
}
from_lossless_number!(i8, i16, i32, u8, u16, u32, f32);

impl From<usize> for Value {
	#[allow(clippy::cast_precision_loss)]
	fn from(n: usize) -> Self {
		Self::Number(n as f64)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::String(s.into())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::String(s.into())
	}
}

impl From<Rc<str>> for Value {
	fn from(s: Rc<str>) -> Self {
		Self::String(s)
	}
}

impl From<Vec<Value>> for Value {
	fn from(values: Vec<Value>) -> Self {
		Self::Array(values.into())
	}
}

impl From<Object> for Value {
	fn from(object: Object) -> Self {
		Self::Object(Rc::new(object))
	}
}

impl From<Callback> for Value {
	fn from(callback: Callback) -> Self {
		Self::Function(callback)
	}
}

impl From<VNode> for Value {
	fn from(node: VNode) -> Self {
		Self::Node(node)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Null, Into::into)
	}
}

/// A reference-counted function with identity.
///
/// Two [`Callback`]s are equal iff they are clones of the same allocation,
/// which is what lets [`create_stable_callback`](`crate::hooks::Scope::create_stable_callback`) results pass through prop diffing unchanged.
pub struct Callback<A: ?Sized = Event>(Rc<dyn Fn(&A)>);

impl<A: ?Sized> Callback<A> {
	pub fn new(f: impl 'static + Fn(&A)) -> Self {
		Self(Rc::new(f))
	}

	pub fn call(&self, argument: &A) {
		(self.0)(argument)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}

	fn addr(&self) -> *const () {
		Rc::as_ptr(&self.0).cast::<()>()
	}
}

impl<A: ?Sized> Clone for Callback<A> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<A: ?Sized> PartialEq for Callback<A> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}
impl<A: ?Sized> Eq for Callback<A> {}

impl<A: ?Sized> Hash for Callback<A> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state)
	}
}

impl<A: ?Sized> Debug for Callback<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Callback({:p})", self.addr())
	}
}

impl<A: ?Sized, F: 'static + Fn(&A)> From<F> for Callback<A> {
	fn from(f: F) -> Self {
		Self::new(f)
	}
}

/// What delegated event handlers receive.
#[derive(Clone)]
pub struct Event {
	event_type: Rc<str>,
	target: NodeKey,
	current_target: NodeKey,
	native: Option<Rc<dyn Any>>,
}

impl Event {
	#[must_use]
	pub fn new(event_type: impl Into<Rc<str>>, target: NodeKey) -> Self {
		Self {
			event_type: event_type.into(),
			target,
			current_target: target,
			native: None,
		}
	}

	#[must_use]
	pub fn with_native(mut self, native: Rc<dyn Any>) -> Self {
		self.native = Some(native);
		self
	}

	#[must_use]
	pub(crate) fn at(&self, current_target: NodeKey) -> Self {
		Self { current_target, ..self.clone() }
	}

	#[must_use]
	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	/// The live node the event was originally dispatched to.
	#[must_use]
	pub fn target(&self) -> NodeKey {
		self.target
	}

	/// The live node whose handlers are currently running.
	#[must_use]
	pub fn current_target(&self) -> NodeKey {
		self.current_target
	}

	/// The host's own event object, if any (a `web_sys::Event` for [`WebDom`](`crate::web::WebDom`)).
	#[must_use]
	pub fn native<T: 'static>(&self) -> Option<&T> {
		self.native.as_deref()?.downcast_ref()
	}
}

impl Debug for Event {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("event_type", &self.event_type)
			.field("target", &self.target)
			.field("current_target", &self.current_target)
			.field("native", &self.native.is_some())
			.finish()
	}
}
