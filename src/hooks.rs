//! Per-instance memoization cells.
//!
//! A [`Hooks`] arena belongs to one component instance. Each [`Hooks::render`] pass hands out a [`Scope`]
//! whose primitives claim cells in call order, so **every pass must call the same primitives in the same order**.
//! Calling them conditionally or in a loop of varying length is a bug and panics.

use crate::{
	equals::{deep_equals, shallow_equals, Equality},
	value::{Callback, Value},
	vnode::{Component, Instances, Props, VNode},
};
use core::{
	any::{type_name, Any},
	cell::{self, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::trace;

/// A mutable cell with stable identity across render passes.
pub struct Ref<T>(Rc<RefCell<T>>);

impl<T> Ref<T> {
	#[must_use]
	pub fn new(value: T) -> Self {
		Self(Rc::new(RefCell::new(value)))
	}

	#[must_use]
	pub fn current(&self) -> T
	where
		T: Clone,
	{
		self.0.borrow().clone()
	}

	pub fn set(&self, value: T) {
		*self.0.borrow_mut() = value;
	}

	pub fn replace(&self, value: T) -> T {
		self.0.replace(value)
	}

	pub fn borrow(&self) -> cell::Ref<'_, T> {
		self.0.borrow()
	}

	pub fn borrow_mut(&self) -> cell::RefMut<'_, T> {
		self.0.borrow_mut()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl<T> Clone for Ref<T> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<T: Debug> Debug for Ref<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Ref").field(&self.0.borrow()).finish()
	}
}

struct MemoEntry<T> {
	value: T,
	dependencies: Value,
}

struct StableCell<A: ?Sized> {
	latest: Rc<RefCell<Rc<dyn Fn(&A)>>>,
	wrapper: Callback<A>,
}

/// The cell storage of one component instance.
#[derive(Default)]
pub struct Hooks {
	cells: Vec<Box<dyn Any>>,
	passes: u64,
}

impl Hooks {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs one render pass. The cursor starts at the first cell.
	///
	/// # Panics
	///
	/// If this pass claimed a different number of cells than the first one.
	pub fn render<R>(&mut self, pass: impl FnOnce(&mut Scope<'_>) -> R) -> R {
		let first_pass = self.passes == 0;
		let mut scope = Scope {
			cells: &mut self.cells,
			cursor: 0,
			first_pass,
		};
		let result = pass(&mut scope);
		let claimed = scope.cursor;
		if !first_pass && claimed != self.cells.len() {
			panic!(
				"Hook order changed: This render pass claimed {} cell(s), but the first one claimed {}.",
				claimed,
				self.cells.len()
			);
		}
		self.passes += 1;
		result
	}

	/// How many cells the first pass claimed.
	#[must_use]
	pub fn len(&self) -> usize {
		self.cells.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}
}

/// One render pass's view of a [`Hooks`] arena.
pub struct Scope<'a> {
	cells: &'a mut Vec<Box<dyn Any>>,
	cursor: usize,
	first_pass: bool,
}

impl<'a> Scope<'a> {
	fn cell<T: 'static>(&mut self, init: impl FnOnce() -> T) -> &mut T {
		let index = self.cursor;
		self.cursor += 1;
		if index == self.cells.len() {
			if !self.first_pass {
				panic!("Hook order changed: Cell {} was not claimed by the first render pass.", index);
			}
			self.cells.push(Box::new(init()));
		}
		match self.cells[index].downcast_mut::<T>() {
			Some(cell) => cell,
			None => panic!("Hook order changed: Cell {} doesn't hold a {}.", index, type_name::<T>()),
		}
	}

	/// A cell initialized with `initial` on the first pass. Later passes ignore `initial` and return the same cell.
	pub fn create_ref<T: 'static>(&mut self, initial: T) -> Ref<T> {
		self.cell(|| Ref::new(initial)).clone()
	}

	/// Returns the cached value while `dependencies` stay `equals`-equal to the previous ones,
	/// and otherwise recomputes it with `factory`.
	pub fn create_memo_with<T: 'static + Clone>(&mut self, factory: impl FnOnce() -> T, dependencies: &[Value], equals: Equality) -> T {
		let cell = self.create_ref(None::<MemoEntry<T>>);
		let dependencies = Value::array(dependencies.iter().cloned());

		if let Some(entry) = &*cell.borrow() {
			if equals(&entry.dependencies, &dependencies) {
				trace!("Memo hit.");
				return entry.value.clone();
			}
		}

		trace!("Memo miss. Recomputing.");
		let value = factory();
		cell.set(Some(MemoEntry {
			value: value.clone(),
			dependencies,
		}));
		value
	}

	/// [`Scope::create_memo_with`] using [`shallow_equals`].
	pub fn create_memo<T: 'static + Clone>(&mut self, factory: impl FnOnce() -> T, dependencies: &[Value]) -> T {
		self.create_memo_with(factory, dependencies, shallow_equals)
	}

	/// [`Scope::create_memo_with`] using [`deep_equals`].
	pub fn create_deep_memo<T: 'static + Clone>(&mut self, factory: impl FnOnce() -> T, dependencies: &[Value]) -> T {
		self.create_memo_with(factory, dependencies, deep_equals)
	}

	/// Keeps the first `callback` until `dependencies` change.
	pub fn create_callback<A: 'static + ?Sized>(&mut self, callback: impl 'static + Fn(&A), dependencies: &[Value]) -> Callback<A> {
		self.create_memo(move || Callback::new(callback), dependencies)
	}

	/// A [`Callback`] whose identity never changes, but which always runs the `callback` passed during the latest pass.
	pub fn create_stable_callback<A: 'static + ?Sized>(&mut self, callback: impl 'static + Fn(&A)) -> Callback<A> {
		let latest: Rc<dyn Fn(&A)> = Rc::new(callback);
		let cell = self.cell(|| {
			let current = Rc::new(RefCell::new(Rc::clone(&latest)));
			let delegate = Rc::clone(&current);
			StableCell {
				latest: current,
				wrapper: Callback::new(move |argument: &A| {
					let latest = Rc::clone(&*delegate.borrow());
					latest(argument)
				}),
			}
		});
		*cell.latest.borrow_mut() = latest;
		cell.wrapper.clone()
	}

	/// Wraps `selector` so that it returns its previous result (same identity) while the new one is shallow-equal to it.
	pub fn create_shallow_selector(&mut self, selector: impl Fn(&Value) -> Value) -> impl Fn(&Value) -> Value {
		let previous = self.create_ref(None::<Value>);
		move |state: &Value| {
			let result = selector(state);
			if let Some(cached) = &*previous.borrow() {
				if shallow_equals(cached, &result) {
					return cached.clone();
				}
			}
			previous.set(Some(result.clone()));
			result
		}
	}
}

/// A component with one [`Hooks`] arena per instance.
///
/// Instances are told apart by their position in the tree during a [`normalize_vnode`](`crate::normalize_vnode`) pass.
/// An instance that isn't rendered during a pass loses its arena, and so does one whose position changes.
pub fn component_with_hooks<F>(render: F) -> Component
where
	F: 'static + Fn(&mut Scope<'_>, &Props) -> VNode,
{
	let instances = Rc::new(RefCell::new(Instances::<RefCell<Hooks>>::new()));
	let kept = Rc::clone(&instances);
	Component::new(move |props: &Props| {
		let arena = instances.borrow_mut().claim();
		let mut hooks = arena.borrow_mut();
		hooks.render(|scope| render(scope, props))
	})
	.with_keep(move || drop(kept.borrow_mut().claim()))
	.named(type_name::<F>())
}
