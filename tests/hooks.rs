use std::{cell::Cell, rc::Rc};
use vnode_dom::{
	component_with_hooks, create_vnode, deep_memo, is_identical, memo, normalize_vnode, props, Callback, Canonical, Component, Hooks, Observer, Value, VNode,
};

#[test]
fn refs_keep_their_identity() {
	let mut hooks = Hooks::new();
	let first = hooks.render(|scope| scope.create_ref(0));
	first.set(5);

	let second = hooks.render(|scope| scope.create_ref(100));
	assert!(first.ptr_eq(&second));
	assert_eq!(second.current(), 5);
	assert_eq!(hooks.len(), 1);
}

#[test]
fn memo_recomputes_only_on_changed_dependencies() {
	let mut hooks = Hooks::new();
	let computed = Cell::new(0);
	let mut pass = |a: i32, b: &str| {
		hooks.render(|scope| {
			scope.create_memo(
				|| {
					computed.set(computed.get() + 1);
					format!("{}{}", a, b)
				},
				&[Value::from(a), Value::from(b)],
			)
		})
	};

	assert_eq!(pass(1, "x"), "1x");
	assert_eq!(pass(1, "x"), "1x");
	assert_eq!(computed.get(), 1);

	assert_eq!(pass(2, "x"), "2x");
	assert_eq!(pass(2, "y"), "2y");
	assert_eq!(computed.get(), 3);
}

#[test]
fn shallow_and_deep_memo_differ_on_fresh_objects() {
	let mut hooks = Hooks::new();
	let (shallow, deep) = (Cell::new(0), Cell::new(0));
	let mut pass = || {
		let options = Value::from(props! { "page" => 1 });
		hooks.render(|scope| {
			scope.create_memo(|| shallow.set(shallow.get() + 1), &[options.clone()]);
			scope.create_deep_memo(|| deep.set(deep.get() + 1), &[options]);
		})
	};

	pass();
	pass();
	pass();
	assert_eq!(shallow.get(), 3);
	assert_eq!(deep.get(), 1);
}

#[test]
fn callbacks_follow_their_dependencies() {
	let mut hooks = Hooks::new();
	let mut pass = |dependency: i32| {
		hooks.render(|scope| {
			scope.create_callback(
				move |_: &()| {
					let _ = dependency;
				},
				&[dependency.into()],
			)
		})
	};

	let first = pass(1);
	assert_eq!(first, pass(1));
	assert_ne!(first, pass(2));
}

#[test]
fn stable_callbacks_run_the_latest_closure() {
	let mut hooks = Hooks::new();
	let seen = Rc::new(Cell::new(0));
	let mut pass = |value: i32| {
		let seen = Rc::clone(&seen);
		hooks.render(|scope| scope.create_stable_callback(move |factor: &i32| seen.set(value * factor)))
	};

	let first = pass(1);
	let second = pass(2);
	assert_eq!(first, second);

	first.call(&10);
	assert_eq!(seen.get(), 20);
}

#[test]
#[should_panic(expected = "Hook order changed")]
fn fewer_cells_panic() {
	let mut hooks = Hooks::new();
	hooks.render(|scope| {
		scope.create_ref(1);
		scope.create_ref(2);
	});
	hooks.render(|scope| {
		scope.create_ref(1);
	});
}

#[test]
#[should_panic(expected = "Hook order changed")]
fn more_cells_panic() {
	let mut hooks = Hooks::new();
	hooks.render(|scope| {
		scope.create_ref(1);
	});
	hooks.render(|scope| {
		scope.create_ref(1);
		scope.create_ref(2);
	});
}

#[test]
#[should_panic(expected = "Hook order changed")]
fn reordered_cells_panic() {
	let mut hooks = Hooks::new();
	hooks.render(|scope| {
		scope.create_ref(1);
		scope.create_ref("a");
	});
	hooks.render(|scope| {
		scope.create_ref("a");
		scope.create_ref(1);
	});
}

#[test]
fn shallow_selectors_keep_equal_results() {
	let mut hooks = Hooks::new();
	let mut select = |state: &Value| {
		hooks.render(|scope| {
			let selector = scope.create_shallow_selector(|state: &Value| {
				let todos = state.as_object().and_then(|state| state.get("todos")).cloned();
				Value::from(props! { "todos" => todos })
			});
			selector(state)
		})
	};

	let todos = Value::array(vec![Value::from("a")]);
	let first = select(&Value::from(props! { "todos" => todos.clone(), "filter" => "all" }));
	let second = select(&Value::from(props! { "todos" => todos, "filter" => "done" }));
	assert!(is_identical(&first, &second));

	let third = select(&Value::from(props! { "todos" => Value::array(vec![Value::from("a")]) }));
	assert!(!is_identical(&first, &third));
}

#[test]
fn components_keep_state_across_renders() {
	let counter = component_with_hooks(|scope, props| {
		let renders = scope.create_ref(0);
		renders.set(renders.current() + 1);
		create_vnode("span", props! { "title" => props.get("title").cloned() }, vec![VNode::from(renders.current())])
	});

	let node = create_vnode(&counter, props! { "title" => "t" }, vec![]);
	let _ = normalize_vnode(&node);
	let canonical = normalize_vnode(&node);
	let span = canonical.as_element().unwrap();
	assert_eq!(span.children[0].as_text(), Some("2"));
}

fn span_texts(canonical: &Canonical) -> Vec<String> {
	canonical
		.as_element()
		.unwrap()
		.children
		.iter()
		.map(|span| span.as_element().unwrap().children[0].as_text().unwrap().to_owned())
		.collect()
}

#[test]
fn sibling_instances_have_their_own_state() {
	let counter = component_with_hooks(|scope, _| {
		let renders = scope.create_ref(0);
		renders.set(renders.current() + 1);
		create_vnode("span", props! {}, vec![VNode::from(renders.current())])
	});
	let list = |count: usize| create_vnode("div", props! {}, (0..count).map(|_| create_vnode(&counter, props! {}, vec![])).collect::<Vec<_>>());

	assert_eq!(span_texts(&normalize_vnode(&list(2))), vec!["1", "1"]);
	assert_eq!(span_texts(&normalize_vnode(&list(2))), vec!["2", "2"]);

	// The second instance goes away and comes back fresh.
	assert_eq!(span_texts(&normalize_vnode(&list(1))), vec!["3"]);
	assert_eq!(span_texts(&normalize_vnode(&list(2))), vec!["4", "1"]);
}

#[test]
fn memoized_siblings_cache_separately() {
	let renders = Rc::new(Cell::new(0));
	let item = {
		let renders = Rc::clone(&renders);
		memo(Component::new(move |props| {
			renders.set(renders.get() + 1);
			create_vnode("li", props! { "title" => props.get("label").cloned() }, vec![])
		}))
	};
	let list = |labels: &[&str]| create_vnode("ul", props! {}, labels.iter().map(|label| create_vnode(&item, props! { "label" => *label }, vec![])).collect::<Vec<_>>());

	let _ = normalize_vnode(&list(&["a", "b", "c"]));
	let _ = normalize_vnode(&list(&["a", "b", "c"]));
	assert_eq!(renders.get(), 3);

	let _ = normalize_vnode(&list(&["a", "x", "c"]));
	assert_eq!(renders.get(), 4);
}

#[test]
fn memoized_hooked_siblings_keep_their_own_state() {
	let counter = memo(component_with_hooks(|scope, _| {
		let renders = scope.create_ref(0);
		renders.set(renders.current() + 1);
		create_vnode("span", props! {}, vec![VNode::from(renders.current())])
	}));
	let list = |labels: &[&str]| create_vnode("div", props! {}, labels.iter().map(|label| create_vnode(&counter, props! { "label" => *label }, vec![])).collect::<Vec<_>>());

	assert_eq!(span_texts(&normalize_vnode(&list(&["a", "b"]))), vec!["1", "1"]);
	// Only the second instance renders again, with its own cells.
	assert_eq!(span_texts(&normalize_vnode(&list(&["a", "c"]))), vec!["1", "2"]);
	assert_eq!(span_texts(&normalize_vnode(&list(&["a", "d"]))), vec!["1", "3"]);

	// Reusing a cached render keeps the instance's cells alive.
	assert_eq!(span_texts(&normalize_vnode(&list(&["e", "d"]))), vec!["2", "3"]);
}

#[test]
fn memo_reuses_the_previous_render() {
	let renders = Rc::new(Cell::new(0));
	let label = {
		let renders = Rc::clone(&renders);
		memo(Component::new(move |props| {
			renders.set(renders.get() + 1);
			create_vnode("b", props! {}, props.children())
		}))
	};

	let render = |text: &str, child: &VNode| {
		let node = create_vnode(&label, props! { "text" => text }, vec![child.clone()]);
		let props = match &node {
			VNode::Component(component) => component.invocation_props(),
			_ => unreachable!(),
		};
		label.call(&props)
	};

	let child = VNode::from("x");
	let first = render("a", &child);
	let second = render("a", &child);
	assert!(first.is_identical(&second));
	assert_eq!(renders.get(), 1);

	let third = render("b", &child);
	assert!(!first.is_identical(&third));
	assert_eq!(renders.get(), 2);
}

#[test]
fn memo_misses_on_fresh_objects_but_deep_memo_hits() {
	let shallow_renders = Rc::new(Cell::new(0));
	let deep_renders = Rc::new(Cell::new(0));
	let counting = |renders: &Rc<Cell<i32>>| {
		let renders = Rc::clone(renders);
		Component::new(move |_| {
			renders.set(renders.get() + 1);
			VNode::Empty
		})
	};
	let shallow = memo(counting(&shallow_renders));
	let deep = deep_memo(counting(&deep_renders));

	for _ in 0..3 {
		let tree = create_vnode(
			"div",
			props! {},
			vec![
				create_vnode(&shallow, props! { "options" => props! { "page" => 1 } }, vec![]),
				create_vnode(&deep, props! { "options" => props! { "page" => 1 } }, vec![]),
			],
		);
		let _ = normalize_vnode(&tree);
	}
	assert_eq!(shallow_renders.get(), 3);
	assert_eq!(deep_renders.get(), 1);
}

#[test]
fn observers_notify_in_order() {
	let observer = Observer::new();
	let log = Rc::new(std::cell::RefCell::new(vec![]));
	let listener = |name: &'static str| {
		let log = Rc::clone(&log);
		Callback::new(move |_: &()| log.borrow_mut().push(name))
	};

	let a = listener("a");
	let _first = observer.subscribe(a.clone());
	let second = observer.subscribe(listener("b"));
	let _again = observer.subscribe(a);
	assert_eq!(observer.len(), 2);

	observer.notify();
	second.unsubscribe();
	observer.notify();
	assert_eq!(*log.borrow(), vec!["a", "b", "a"]);
}
