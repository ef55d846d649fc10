//! Browser tests: `wasm-pack test --headless --firefox packages/wasm`

#![cfg(target_arch = "wasm32")]

use tether_client::{
    materialize, Dom, Instruction, Mirror, NavigationBridge, NodeDescription, NodeKind,
    PatchApplier,
};
use tether_protocol::Batch;
use tether_wasm::{WebDom, WebHistory};
use wasm_bindgen_test::*;
use web_sys::Node;

wasm_bindgen_test_configure!(run_in_browser);

fn fresh_dom() -> WebDom {
    let document = web_sys::window().unwrap().document().unwrap();
    let body = document.body().unwrap();
    body.set_inner_html("");
    WebDom::new(document)
}

fn body(dom: &WebDom) -> Node {
    let root = dom.root();
    let html = dom
        .children(&root)
        .into_iter()
        .find(|n| dom.kind(n) == NodeKind::Element("html".into()))
        .unwrap();
    dom.children(&html)
        .into_iter()
        .find(|n| dom.kind(n) == NodeKind::Element("body".into()))
        .unwrap()
}

#[wasm_bindgen_test]
fn test_materialize_into_document() {
    let mut dom = fresh_dom();
    let description = NodeDescription::element("p")
        .with_attr("class", "note")
        .with_child(NodeDescription::text("hello"));

    let node = materialize(&mut dom, &description).unwrap();
    let target = body(&dom);
    dom.insert_before(&target, &node, None).unwrap();

    assert_eq!(dom.attribute(&node, "class").as_deref(), Some("note"));
    assert_eq!(dom.children(&node).len(), 1);
    assert_eq!(dom.parent(&node), Some(target));
}

#[wasm_bindgen_test]
fn test_mirror_root_child_is_html() {
    let dom = fresh_dom();
    let mirror = Mirror::snapshot(&dom);
    let first = mirror.resolve(&[0]).unwrap();
    assert_eq!(dom.kind(first.node()), NodeKind::Element("html".into()));
}

#[wasm_bindgen_test]
fn test_batch_applies_to_live_body() {
    let mut dom = fresh_dom();
    let window = web_sys::window().unwrap();
    let mut mirror = Mirror::snapshot(&dom);
    let history = WebHistory::new(window.history().unwrap(), window.location());
    let mut navigation = NavigationBridge::new(history);

    let target = body(&dom);
    let parent = mirror.locate(&dom, &target).unwrap();
    let batch = Batch::encode(&[
        Instruction::Create {
            parent: parent.clone(),
            index: 0,
            node: NodeDescription::element("input").with_attr("name", "q"),
        },
        Instruction::Set {
            target: parent.child(0),
            key: "value".to_string(),
            value: "typed".to_string(),
        },
    ])
    .unwrap();

    let summary = PatchApplier::new(&mut dom, &mut mirror, &mut navigation)
        .apply_batch(&batch)
        .unwrap();

    assert_eq!(summary.applied, 2);
    let input = mirror.resolve(&parent.child(0)).unwrap().node().clone();
    assert_eq!(dom.value(&input).as_deref(), Some("typed"));
    assert_eq!(dom.parent(&input), Some(target));
    assert!(mirror.matches(&dom));
}

#[wasm_bindgen_test]
fn test_history_location_is_path_only() {
    use tether_client::History;

    let window = web_sys::window().unwrap();
    let mut history = WebHistory::new(window.history().unwrap(), window.location());
    history.replace("/tether/test?x=1#top").unwrap();

    assert_eq!(history.location().unwrap(), "/tether/test?x=1#top");
}
