//! The virtual node model and its normalization into canonical trees.

use crate::{
	equals::{deep_equals_canonical, same_number},
	value::{format_number, Object, Value},
};
use core::{
	any::type_name,
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	ops::Deref,
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{trace_span, warn};

/// A description of a piece of UI, as produced by application code.
#[derive(Clone, Debug)]
pub enum VNode {
	/// `null`/`undefined`. Renders as nothing.
	Empty,
	/// Renders as nothing, but `true` counts as a child in [`create_vnode`].
	Bool(bool),
	Number(f64),
	Text(Rc<str>),
	Element(Rc<ElementNode>),
	Component(Rc<ComponentNode>),
	/// A nested child sequence. Flattened into the surrounding children.
	Fragment(Rc<[VNode]>),
}

#[derive(Debug)]
pub struct ElementNode {
	pub tag: Rc<str>,
	pub props: Rc<Object>,
	pub children: Vec<VNode>,
}

#[derive(Debug)]
pub struct ComponentNode {
	pub component: Component,
	pub props: Rc<Object>,
	pub children: Vec<VNode>,
}

impl ComponentNode {
	/// `{...props, children}`
	#[must_use]
	pub fn invocation_props(&self) -> Props {
		let mut props = Object::clone(&self.props);
		props.insert("children".into(), Value::array(self.children.iter().cloned().map(Value::Node)));
		Props(Rc::new(props))
	}
}

impl VNode {
	/// Reference/value identity.
	#[must_use]
	pub fn is_identical(&self, other: &Self) -> bool {
		match (self, other) {
			(VNode::Empty, VNode::Empty) => true,
			(VNode::Bool(a), VNode::Bool(b)) => a == b,
			(VNode::Number(a), VNode::Number(b)) => same_number(*a, *b),
			(VNode::Text(a), VNode::Text(b)) => a == b,
			(VNode::Element(a), VNode::Element(b)) => Rc::ptr_eq(a, b),
			(VNode::Component(a), VNode::Component(b)) => Rc::ptr_eq(a, b),
			(VNode::Fragment(a), VNode::Fragment(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}

	/// Whether [`create_vnode`] keeps this as a child: `0` or truthy.
	#[must_use]
	pub fn is_kept_child(&self) -> bool {
		match self {
			VNode::Empty | VNode::Bool(false) => false,
			VNode::Bool(true) | VNode::Element(_) | VNode::Component(_) | VNode::Fragment(_) => true,
			VNode::Number(n) => !n.is_nan(),
			VNode::Text(text) => !text.is_empty(),
		}
	}
}

impl From<&str> for VNode {
	fn from(text: &str) -> Self {
		Self::Text(text.into())
	}
}

impl From<String> for VNode {
	fn from(text: String) -> Self {
		Self::Text(text.into())
	}
}

impl From<Rc<str>> for VNode {
	fn from(text: Rc<str>) -> Self {
		Self::Text(text)
	}
}

impl From<f64> for VNode {
	fn from(n: f64) -> Self {
		Self::Number(n)
	}
}

impl From<i32> for VNode {
	fn from(n: i32) -> Self {
		Self::Number(n.into())
	}
}

impl From<u32> for VNode {
	fn from(n: u32) -> Self {
		Self::Number(n.into())
	}
}

impl From<bool> for VNode {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl<T: Into<VNode>> From<Option<T>> for VNode {
	fn from(node: Option<T>) -> Self {
		node.map_or(VNode::Empty, Into::into)
	}
}

impl From<Vec<VNode>> for VNode {
	fn from(nodes: Vec<VNode>) -> Self {
		Self::Fragment(nodes.into())
	}
}

/// The props a [`Component`] is invoked with: The node's props plus `children`.
#[derive(Clone, Debug)]
pub struct Props(Rc<Object>);

impl Props {
	#[must_use]
	pub fn new(props: Object) -> Self {
		Self(Rc::new(props))
	}

	/// The `children` prop, with anything that isn't a node skipped.
	#[must_use]
	pub fn children(&self) -> Vec<VNode> {
		match self.0.get("children") {
			Some(Value::Array(children)) => children
				.iter()
				.filter_map(|child| match child {
					Value::Node(node) => Some(node.clone()),
					_ => None,
				})
				.collect(),
			Some(Value::Node(node)) => vec![node.clone()],
			_ => vec![],
		}
	}

	#[must_use]
	pub fn to_value(&self) -> Value {
		Value::Object(Rc::clone(&self.0))
	}
}

impl Deref for Props {
	type Target = Object;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// A function component. Compares by identity.
#[derive(Clone)]
pub struct Component {
	render: Rc<dyn Fn(&Props) -> VNode>,
	/// Marks the instance at the current position as still rendered, without rendering it.
	keep: Option<Rc<dyn Fn()>>,
	name: &'static str,
}

impl Component {
	pub fn new<F: 'static + Fn(&Props) -> VNode>(render: F) -> Self {
		Self {
			render: Rc::new(render),
			keep: None,
			name: type_name::<F>(),
		}
	}

	pub(crate) fn with_keep(mut self, keep: impl 'static + Fn()) -> Self {
		self.keep = Some(Rc::new(keep));
		self
	}

	#[must_use]
	pub fn named(mut self, name: &'static str) -> Self {
		self.name = name;
		self
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	#[must_use]
	pub fn call(&self, props: &Props) -> VNode {
		(self.render)(props)
	}

	/// Used in place of [`Component::call`] when a cached render is reused, so that per-instance state survives.
	pub(crate) fn keep(&self) {
		if let Some(keep) = &self.keep {
			keep()
		}
	}
}

impl PartialEq for Component {
	fn eq(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.render).cast::<()>() == Rc::as_ptr(&other.render).cast::<()>()
	}
}

impl Debug for Component {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Component").field(&self.name).finish()
	}
}

/// What [`create_vnode`] builds: A host element or a component invocation.
#[derive(Clone, Debug)]
pub enum NodeType {
	Tag(Rc<str>),
	Component(Component),
}

impl From<&str> for NodeType {
	fn from(tag: &str) -> Self {
		Self::Tag(tag.into())
	}
}

impl From<Rc<str>> for NodeType {
	fn from(tag: Rc<str>) -> Self {
		Self::Tag(tag)
	}
}

impl From<Component> for NodeType {
	fn from(component: Component) -> Self {
		Self::Component(component)
	}
}

impl From<&Component> for NodeType {
	fn from(component: &Component) -> Self {
		Self::Component(component.clone())
	}
}

/// Builds an object literal for use as props.
///
/// ```
/// use vnode_dom::{props, Value};
///
/// let props = props! { "id" => "x", "checked" => true };
/// assert_eq!(props.get("id"), Some(&Value::from("x")));
/// ```
#[macro_export]
macro_rules! props {
	($($key:expr => $value:expr),*$(,)?) => {{
		#[allow(unused_mut)]
		let mut object = $crate::Object::new();
		$(object.insert(::std::rc::Rc::<str>::from($key), $crate::Value::from($value));)*
		object
	}};
}

/// Builds a virtual node.
///
/// `children` are flattened through [`VNode::Fragment`]s at any depth, and only `0` and truthy children are kept.
pub fn create_vnode(node_type: impl Into<NodeType>, props: Object, children: impl IntoIterator<Item = VNode>) -> VNode {
	fn flatten_into(children: impl IntoIterator<Item = VNode>, flat: &mut Vec<VNode>) {
		for child in children {
			match child {
				VNode::Fragment(nested) => flatten_into(nested.iter().cloned(), flat),
				child if child.is_kept_child() => flat.push(child),
				_ => (),
			}
		}
	}

	let mut flat = vec![];
	flatten_into(children, &mut flat);
	let props = Rc::new(props);
	match node_type.into() {
		NodeType::Tag(tag) => VNode::Element(Rc::new(ElementNode { tag, props, children: flat })),
		NodeType::Component(component) => VNode::Component(Rc::new(ComponentNode { component, props, children: flat })),
	}
}

/// A normalized virtual node: Only text and host elements remain.
///
/// The empty string stands in for [`VNode::Empty`] and booleans.
#[derive(Clone, Debug)]
pub enum Canonical {
	Text(Rc<str>),
	Element(Rc<CanonicalElement>),
}

#[derive(Debug)]
pub struct CanonicalElement {
	pub tag: Rc<str>,
	pub props: Rc<Object>,
	pub children: Vec<Canonical>,
}

impl Canonical {
	#[must_use]
	pub fn empty() -> Self {
		Self::Text("".into())
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		matches!(self, Canonical::Text(text) if text.is_empty())
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&CanonicalElement> {
		match self {
			Canonical::Element(element) => Some(element),
			Canonical::Text(_) => None,
		}
	}

	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Canonical::Text(text) => Some(text),
			Canonical::Element(_) => None,
		}
	}

	/// Turns this back into a (trivially normalizable) [`VNode`].
	#[must_use]
	pub fn to_vnode(&self) -> VNode {
		match self {
			Canonical::Text(text) => VNode::Text(Rc::clone(text)),
			Canonical::Element(element) => VNode::Element(Rc::new(ElementNode {
				tag: Rc::clone(&element.tag),
				props: Rc::clone(&element.props),
				children: element.children.iter().map(Canonical::to_vnode).collect(),
			})),
		}
	}
}

/// Structural. Props compare with [`deep_equals`](`crate::equals::deep_equals`).
impl PartialEq for Canonical {
	fn eq(&self, other: &Self) -> bool {
		deep_equals_canonical(self, other)
	}
}

#[derive(Default)]
struct Pass {
	/// Nesting depth of [`normalize_vnode`] calls.
	depth: usize,
	/// How many outermost [`normalize_vnode`] calls there were so far.
	generation: u64,
	/// Child indices from the pass's root to the node being normalized.
	path: Vec<usize>,
}

thread_local! {
	static PASS: RefCell<Pass> = RefCell::new(Pass::default());
}

struct PassGuard;

impl PassGuard {
	fn enter() -> Self {
		PASS.with(|pass| {
			let mut pass = pass.borrow_mut();
			if pass.depth == 0 {
				pass.generation += 1;
				pass.path.clear();
			}
			pass.depth += 1;
		});
		Self
	}
}

impl Drop for PassGuard {
	fn drop(&mut self) {
		PASS.with(|pass| {
			let mut pass = pass.borrow_mut();
			pass.depth = pass.depth.saturating_sub(1);
		});
	}
}

/// Marks normalization as descending into child `index` until dropped.
struct Position;

impl Position {
	fn enter(index: usize) -> Self {
		PASS.with(|pass| pass.borrow_mut().path.push(index));
		Self
	}
}

impl Drop for Position {
	fn drop(&mut self) {
		PASS.with(|pass| {
			pass.borrow_mut().path.pop();
		});
	}
}

/// Per-instance state of one component, keyed by where in the tree it's rendered.
pub(crate) struct Instances<T> {
	pass: Option<u64>,
	slots: HashMap<Vec<usize>, (Option<u64>, Rc<T>)>,
}

impl<T: Default> Instances<T> {
	pub(crate) fn new() -> Self {
		Self {
			pass: None,
			slots: HashMap::new(),
		}
	}

	/// The state of the instance being rendered now.
	///
	/// Once a new [`normalize_vnode`] pass renders this component, instances it didn't render
	/// during its previous pass are dropped. Outside of [`normalize_vnode`], there is only the root instance.
	pub(crate) fn claim(&mut self) -> Rc<T> {
		let (pass, path) = PASS.with(|pass| {
			let pass = pass.borrow();
			match pass.depth {
				0 => (None, Vec::new()),
				_ => (Some(pass.generation), pass.path.clone()),
			}
		});

		if pass.is_some() && pass != self.pass {
			let previous = self.pass;
			self.slots.retain(|_, (seen, _)| *seen == previous);
			self.pass = pass;
		}

		let seen = self.pass;
		let slot = self.slots.entry(path).or_insert_with(|| (seen, Rc::default()));
		slot.0 = seen;
		Rc::clone(&slot.1)
	}
}

/// Converts a virtual node into its canonical form, invoking components along the way.
///
/// Each outermost call is one render pass. Hooked and memoized components keep their state per position in the tree,
/// so a component rendered at the same position as during the previous pass sees the same state.
///
/// Panics raised by components propagate unchanged.
#[must_use]
pub fn normalize_vnode(node: &VNode) -> Canonical {
	let _pass = PassGuard::enter();
	match node {
		VNode::Empty | VNode::Bool(_) => Canonical::empty(),
		VNode::Number(n) => Canonical::Text(format_number(*n).into()),
		VNode::Text(text) => Canonical::Text(Rc::clone(text)),
		VNode::Element(element) => Canonical::Element(Rc::new(normalize_element(element))),
		VNode::Component(component) => {
			let rendered = render_component(component);
			let _position = Position::enter(0);
			normalize_vnode(&rendered)
		}
		VNode::Fragment(nodes) => {
			warn!("A fragment of {} node(s) can't be normalized on its own. Rendering nothing instead.", nodes.len());
			Canonical::empty()
		}
	}
}

fn render_component(node: &ComponentNode) -> VNode {
	let span = trace_span!("Rendering component", component = node.component.name());
	let _enter = span.enter();
	node.component.call(&node.invocation_props())
}

fn normalize_element(element: &ElementNode) -> CanonicalElement {
	let mut children = Vec::with_capacity(element.children.len());
	for (i, child) in element.children.iter().enumerate() {
		let _position = Position::enter(i);
		normalize_child_into(child, &mut children);
	}
	CanonicalElement {
		tag: Rc::clone(&element.tag),
		props: Rc::clone(&element.props),
		children,
	}
}

/// Like [`normalize_vnode`], but fragments (also when returned by components) splice into `children`.
fn normalize_child_into(child: &VNode, children: &mut Vec<Canonical>) {
	match child {
		VNode::Fragment(nodes) => {
			for (i, node) in nodes.iter().enumerate() {
				let _position = Position::enter(i);
				normalize_child_into(node, children)
			}
		}
		VNode::Component(component) => {
			let rendered = render_component(component);
			let _position = Position::enter(0);
			normalize_child_into(&rendered, children)
		}
		child => {
			let canonical = normalize_vnode(child);
			if !canonical.is_empty() {
				children.push(canonical)
			}
		}
	}
}
