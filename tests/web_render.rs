#![cfg(target_arch = "wasm32")]

use std::{cell::Cell, rc::Rc};
use vnode_dom::{create_vnode, props, web::WebNode, Callback, Dom, Event, Renderer, VNode, WebDom};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn setup() -> (WebDom, WebNode) {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}

	let dom = WebDom::from_window().unwrap();
	let body = dom.document().body().unwrap();
	let container = dom.create_element("div").unwrap();
	body.append_child(container.node()).unwrap();
	(dom, container)
}

#[wasm_bindgen_test]
fn create_and_patch() {
	let (dom, container) = setup();
	let mut renderer = Renderer::new(dom.clone());
	let view = |class: &str, text: &str| create_vnode("p", props! { "className" => class }, vec![VNode::from(text)]);

	renderer.render_element(&view("a", "Hello"), &container);
	let p = dom.child_at(&container, 0).unwrap();
	let element: &web_sys::Element = p.node().unchecked_ref();
	assert_eq!(element.outer_html(), r#"<p class="a">Hello</p>"#);

	renderer.render_element(&view("b", "Bye"), &container);
	assert_eq!(dom.child_at(&container, 0), Some(p.clone()));
	assert_eq!(element.outer_html(), r#"<p class="b">Bye</p>"#);
}

#[wasm_bindgen_test]
fn checked_is_a_property() {
	let (dom, container) = setup();
	let mut renderer = Renderer::new(dom.clone());
	renderer.render_element(&create_vnode("input", props! { "type" => "checkbox", "checked" => true }, vec![]), &container);

	let input = dom.child_at(&container, 0).unwrap();
	let checked = js_sys::Reflect::get(input.node(), &"checked".into()).unwrap();
	assert_eq!(checked.as_bool(), Some(true));
	assert_eq!(dom.get_attribute(&input, "checked"), None);
}

#[wasm_bindgen_test]
fn click() {
	let (dom, container) = setup();
	let mut renderer = Renderer::new(dom.clone());

	let clicks = Rc::new(Cell::new(0));
	let on_click = {
		let clicks = Rc::clone(&clicks);
		Callback::new(move |event: &Event| {
			assert!(event.native::<web_sys::Event>().is_some());
			clicks.set(clicks.get() + 1)
		})
	};

	renderer.render_element(
		&create_vnode("button", props! { "onClick" => on_click }, vec![VNode::from("Go")]),
		&container,
	);
	let button: HtmlElement = dom.child_at(&container, 0).unwrap().node().clone().dyn_into().unwrap();

	assert_eq!(clicks.get(), 0);
	button.click();
	assert_eq!(clicks.get(), 1);

	renderer.render_element(&create_vnode("button", props! {}, vec![VNode::from("Go")]), &container);
	button.click();
	assert_eq!(clicks.get(), 1);
}
