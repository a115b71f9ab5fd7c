//! The live output tree, as far as the differ needs to see it.

use crate::value::Event;
use core::{
	fmt::{self, Debug, Display, Formatter},
	hash::Hash,
};
use std::{error::Error, rc::Rc};

/// A stable identifier for a live node, assigned by its [`Dom`].
///
/// Side tables (render history, event registry) are keyed by this rather than by the node itself,
/// so they never keep a node alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

impl Display for NodeKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// What a native listener calls with the document, the event's target node and the (not yet delegated) event.
///
/// The document is passed in rather than captured so that handlers stored inside it don't keep it alive.
pub type NativeHandler<D> = Rc<dyn Fn(&D, &<D as Dom>::Node, &Event)>;

/// A host-side failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
	CreateElement { tag: String, reason: String },
	Insert { reason: String },
	Replace { reason: String },
	Remove { reason: String },
	Attribute { name: String, reason: String },
	Property { name: String, reason: String },
	Listener { event_type: String, reason: String },
}

impl Display for DomError {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			DomError::CreateElement { tag, reason } => write!(f, "Failed to create <{}>: {}", tag, reason),
			DomError::Insert { reason } => write!(f, "Failed to insert node: {}", reason),
			DomError::Replace { reason } => write!(f, "Failed to replace node: {}", reason),
			DomError::Remove { reason } => write!(f, "Failed to remove node: {}", reason),
			DomError::Attribute { name, reason } => write!(f, "Failed to update attribute {:?}: {}", name, reason),
			DomError::Property { name, reason } => write!(f, "Failed to update property {:?}: {}", name, reason),
			DomError::Listener { event_type, reason } => write!(f, "Failed to update {:?} listener: {}", event_type, reason),
		}
	}
}

impl Error for DomError {}

/// A live document the [`Renderer`](`crate::diff::Renderer`) can patch.
///
/// Implementations are cheap-to-clone handles, and all methods take `&self`:
/// Native listeners hold a clone, and event handlers may re-render while an event is being dispatched.
pub trait Dom: Clone + 'static {
	type Node: Clone + Debug;
	/// Owns one installed native listener. Dropping it after [`Dom::remove_event_listener`] must be fine.
	type Listener;

	fn key(&self, node: &Self::Node) -> NodeKey;

	fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;
	fn create_text_node(&self, text: &str) -> Self::Node;

	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
	fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;
	fn child_count(&self, parent: &Self::Node) -> usize;

	fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;
	fn replace_child(&self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node) -> Result<(), DomError>;
	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

	/// Upper-case for HTML elements (`DIV`), [`None`] for non-elements.
	fn tag_name(&self, node: &Self::Node) -> Option<String>;
	/// [`None`] for non-text nodes.
	fn text_data(&self, node: &Self::Node) -> Option<String>;
	/// String attributes in document order.
	fn attributes(&self, element: &Self::Node) -> Vec<(String, String)>;

	fn get_attribute(&self, element: &Self::Node, name: &str) -> Option<String>;
	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;
	fn remove_attribute(&self, element: &Self::Node, name: &str) -> Result<(), DomError>;

	/// Sets a live (boolean) property like `checked` without touching attributes.
	fn set_property(&self, element: &Self::Node, name: &str, value: bool) -> Result<(), DomError>;
	/// Sets one inline style property. `name` uses the camelCase property spelling.
	fn set_style(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

	fn add_event_listener(&self, target: &Self::Node, event_type: &str, handler: NativeHandler<Self>) -> Result<Self::Listener, DomError>;
	fn remove_event_listener(&self, target: &Self::Node, event_type: &str, listener: &Self::Listener) -> Result<(), DomError>;
}
