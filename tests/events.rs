use std::{cell::RefCell, rc::Rc};
use vnode_dom::{
	events::{EventManager, EventRegistry},
	Callback, Dom, Event, MemoryDom, NodeKey,
};

struct Tree {
	dom: MemoryDom,
	outside: NodeKey,
	root: NodeKey,
	parent: NodeKey,
	child: NodeKey,
	leaf: NodeKey,
}

fn tree() -> Tree {
	let dom = MemoryDom::new();
	let outside = dom.create_element("body").unwrap();
	let root = dom.create_element("div").unwrap();
	let parent = dom.create_element("ul").unwrap();
	let child = dom.create_element("li").unwrap();
	let leaf = dom.create_text_node("leaf");
	dom.append_child(&outside, &root).unwrap();
	dom.append_child(&root, &parent).unwrap();
	dom.append_child(&parent, &child).unwrap();
	dom.append_child(&child, &leaf).unwrap();
	Tree {
		dom,
		outside,
		root,
		parent,
		child,
		leaf,
	}
}

type Log = Rc<RefCell<Vec<(&'static str, NodeKey, NodeKey)>>>;

fn logger(log: &Log, name: &'static str) -> Callback {
	let log = Rc::clone(log);
	Callback::new(move |event: &Event| log.borrow_mut().push((name, event.target(), event.current_target())))
}

#[test]
fn bubbles_from_target_to_root() {
	let t = tree();
	let log = Log::default();
	let mut manager = EventManager::new(t.dom.clone());
	manager.add_event(&t.parent, "click", logger(&log, "parent"));
	manager.add_event(&t.child, "click", logger(&log, "child"));
	manager.setup_event_listeners(&t.root);

	t.dom.dispatch_event(&t.leaf, "click");
	assert_eq!(&*log.borrow(), &[("child", t.leaf, t.child), ("parent", t.leaf, t.parent)]);
}

#[test]
fn stops_at_the_root() {
	let t = tree();
	let log = Log::default();
	let mut manager = EventManager::new(t.dom.clone());
	manager.add_event(&t.root, "click", logger(&log, "root"));
	manager.add_event(&t.outside, "click", logger(&log, "outside"));
	manager.add_event(&t.child, "click", logger(&log, "child"));
	manager.setup_event_listeners(&t.root);

	t.dom.dispatch_event(&t.child, "click");
	assert_eq!(&*log.borrow(), &[("child", t.child, t.child)]);

	// Targets outside the root never reach its listener.
	t.dom.dispatch_event(&t.outside, "click");
	assert_eq!(log.borrow().len(), 1);
}

#[test]
fn only_matching_event_types_run() {
	let t = tree();
	let log = Log::default();
	let mut manager = EventManager::new(t.dom.clone());
	manager.add_event(&t.child, "click", logger(&log, "click"));
	manager.add_event(&t.child, "input", logger(&log, "input"));
	manager.setup_event_listeners(&t.root);

	t.dom.dispatch_event(&t.leaf, "input");
	assert_eq!(&*log.borrow(), &[("input", t.leaf, t.child)]);
	assert_eq!(manager.installed_count(), 2);
}

#[test]
fn handlers_run_in_registration_order() {
	let t = tree();
	let log = Log::default();
	let mut manager = EventManager::new(t.dom.clone());
	let first = logger(&log, "first");
	manager.add_event(&t.child, "click", first.clone());
	manager.add_event(&t.child, "click", logger(&log, "second"));
	manager.add_event(&t.child, "click", first);
	manager.setup_event_listeners(&t.root);

	assert_eq!(manager.registry().handler_count("click"), 2);
	assert_eq!(manager.registry().element_count("click"), 1);

	t.dom.dispatch_event(&t.child, "click");
	let names: Vec<_> = log.borrow().iter().map(|(name, _, _)| *name).collect();
	assert_eq!(names, vec!["first", "second"]);
}

#[test]
fn registry_adds_each_handler_once() {
	let mut registry = EventRegistry::new();
	let log = Log::default();
	let first = logger(&log, "first");
	let second = logger(&log, "second");

	assert!(registry.add(NodeKey(1), "click", first.clone()));
	assert!(!registry.add(NodeKey(1), "click", first.clone()));
	assert!(registry.add(NodeKey(1), "click", second.clone()));
	assert!(registry.add(NodeKey(2), "click", first.clone()));
	assert!(registry.add(NodeKey(1), "input", first.clone()));

	assert_eq!(registry.handlers("click", NodeKey(1)), vec![first.clone(), second]);
	assert_eq!(registry.element_count("click"), 2);
	assert_eq!(registry.handler_count("click"), 3);
	assert_eq!(registry.event_types().count(), 2);

	assert!(registry.remove(NodeKey(1), "click", &first));
	assert!(registry.add(NodeKey(1), "click", first));
	assert_eq!(registry.handler_count("click"), 3);
}

#[test]
fn setup_is_idempotent() {
	let t = tree();
	let log = Log::default();
	let mut manager = EventManager::new(t.dom.clone());
	manager.add_event(&t.child, "click", logger(&log, "child"));
	manager.setup_event_listeners(&t.root);
	manager.setup_event_listeners(&t.root);
	manager.setup_event_listeners(&t.root);

	assert_eq!(t.dom.listener_count(&t.root, "click"), 1);
	assert_eq!(t.dom.dispatch_event(&t.child, "click"), 1);
	assert_eq!(log.borrow().len(), 1);
}

#[test]
fn new_event_types_need_another_setup() {
	let t = tree();
	let log = Log::default();
	let mut manager = EventManager::new(t.dom.clone());
	manager.setup_event_listeners(&t.root);
	manager.add_event(&t.child, "click", logger(&log, "child"));

	t.dom.dispatch_event(&t.child, "click");
	assert!(log.borrow().is_empty());

	manager.setup_event_listeners(&t.root);
	t.dom.dispatch_event(&t.child, "click");
	assert_eq!(log.borrow().len(), 1);
}

#[test]
fn removing_unknown_handlers_is_a_no_op() {
	let t = tree();
	let log = Log::default();
	let manager = EventManager::new(t.dom.clone());
	let handler = logger(&log, "child");

	manager.remove_event(&t.child, "click", &handler);
	assert!(manager.registry().is_empty());

	manager.add_event(&t.child, "click", handler.clone());
	manager.remove_event(&t.child, "click", &logger(&log, "other"));
	manager.remove_event(&t.parent, "click", &handler);
	manager.remove_event(&t.child, "input", &handler);
	assert_eq!(manager.registry().len(), 1);

	manager.remove_event(&t.child, "click", &handler);
	manager.remove_event(&t.child, "click", &handler);
	assert!(manager.registry().is_empty());
	assert_eq!(manager.registry().element_count("click"), 0);
}

#[test]
fn handlers_may_unregister_during_dispatch() {
	let t = tree();
	let manager = Rc::new(RefCell::new(EventManager::new(t.dom.clone())));
	let calls = Rc::new(RefCell::new(0));

	let handler = Rc::new(RefCell::new(None::<Callback>));
	let callback = {
		let (manager, calls, handler, child) = (Rc::clone(&manager), Rc::clone(&calls), Rc::clone(&handler), t.child);
		Callback::new(move |_: &Event| {
			*calls.borrow_mut() += 1;
			if let Some(handler) = handler.borrow_mut().take() {
				manager.borrow().remove_event(&child, "click", &handler);
			}
		})
	};
	*handler.borrow_mut() = Some(callback.clone());
	manager.borrow().add_event(&t.child, "click", callback);
	manager.borrow_mut().setup_event_listeners(&t.root);

	t.dom.dispatch_event(&t.child, "click");
	t.dom.dispatch_event(&t.child, "click");
	assert_eq!(*calls.borrow(), 1);
}

#[test]
fn dropping_the_manager_removes_its_listeners() {
	let t = tree();
	let log = Log::default();
	let mut manager = EventManager::new(t.dom.clone());
	manager.add_event(&t.child, "click", logger(&log, "child"));
	manager.setup_event_listeners(&t.root);
	assert_eq!(t.dom.listener_count(&t.root, "click"), 1);

	drop(manager);
	assert_eq!(t.dom.listener_count(&t.root, "click"), 0);
	assert_eq!(t.dom.dispatch_event(&t.child, "click"), 0);
}
