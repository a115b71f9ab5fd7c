//! A minimal listener set, for stores that need to trigger re-renders.

use crate::value::Callback;
use core::cell::RefCell;
use indexmap::IndexSet;
use std::rc::{Rc, Weak};

#[derive(Clone, Default)]
pub struct Observer(Rc<RefCell<IndexSet<Callback<()>>>>);

/// Returned by [`Observer::subscribe`]. Dropping it does **not** unsubscribe.
#[must_use = "Dropping a `Subscription` keeps the listener subscribed. Call `.unsubscribe()` to remove it."]
pub struct Subscription {
	listeners: Weak<RefCell<IndexSet<Callback<()>>>>,
	listener: Callback<()>,
}

impl Observer {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Subscribing the same [`Callback`] twice only registers it once.
	pub fn subscribe(&self, listener: impl Into<Callback<()>>) -> Subscription {
		let listener = listener.into();
		self.0.borrow_mut().insert(listener.clone());
		Subscription {
			listeners: Rc::downgrade(&self.0),
			listener,
		}
	}

	/// Calls every listener, in subscription order.
	///
	/// Listeners subscribed or unsubscribed during this call take effect on the next one.
	pub fn notify(&self) {
		let listeners: Vec<_> = self.0.borrow().iter().cloned().collect();
		for listener in listeners {
			listener.call(&())
		}
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.borrow().is_empty()
	}
}

impl Subscription {
	pub fn unsubscribe(self) {
		if let Some(listeners) = self.listeners.upgrade() {
			listeners.borrow_mut().shift_remove(&self.listener);
		}
	}
}
