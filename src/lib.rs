#![doc(html_root_url = "https://docs.rs/vnode-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod diff;
pub mod dom;
pub mod equals;
pub mod events;
pub mod hooks;
pub mod load;
pub mod memo;
pub mod memory;
pub mod observer;
pub mod value;
pub mod vnode;
pub mod web;

pub use diff::Renderer;
pub use dom::{Dom, DomError, NodeKey};
pub use equals::{deep_equals, is_identical, shallow_equals};
pub use hooks::{component_with_hooks, Hooks, Ref, Scope};
pub use memo::{deep_memo, memo, memo_with};
pub use memory::MemoryDom;
pub use observer::{Observer, Subscription};
pub use value::{Callback, Event, Object, Value};
pub use vnode::{create_vnode, normalize_vnode, Canonical, Component, Props, VNode};
pub use web::WebDom;
