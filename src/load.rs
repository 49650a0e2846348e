//! Reads existing DOM content back into [`VNode`]s.
//!
//! Together with [`Reconciler::hydrate`](`crate::Reconciler::hydrate`), this lets a reconciler take over server-rendered markup.
//! Portal hosts (`<div data-portal="…">`) load as portals. Components can't be told apart from plain elements and load as such.

use crate::vnode::VNode;
use tracing::trace;
use wasm_bindgen::JsCast;
use web_sys::{Attr, Element, NamedNodeMap, Node, NodeList, Text};

/// Loads elements and text. Other nodes (comments, processing instructions) are skipped.
#[must_use]
pub fn load_child_nodes(child_nodes: &NodeList) -> Vec<VNode> {
	(0..child_nodes.length())
		.filter_map(|i| child_nodes.item(i))
		.filter_map(|child| load_node(&child))
		.collect()
}

#[must_use]
pub fn load_node(node: &Node) -> Option<VNode> {
	if let Some(element) = node.dyn_ref::<Element>() {
		Some(load_element(element))
	} else if let Some(text) = node.dyn_ref::<Text>() {
		Some(VNode::text(text.data()))
	} else {
		trace!("Skipping unrecognised child node: {:?}", node);
		None
	}
}

#[must_use]
pub fn load_element(element: &Element) -> VNode {
	let node: &Node = element.as_ref();
	let children = load_child_nodes(&node.child_nodes());

	if element.local_name() == "div" {
		if let Some(target) = element.get_attribute("data-portal") {
			return VNode::portal(target).with_children(children);
		}
	}

	load_attributes(&element.attributes())
		.into_iter()
		.fold(VNode::element(element.local_name()), |vnode, (name, value)| vnode.with_attribute(name, value))
		.with_children(children)
}

#[must_use]
pub fn load_attributes(attributes: &NamedNodeMap) -> Vec<(String, String)> {
	(0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| load_attribute(&attribute)).collect()
}

#[must_use]
pub fn load_attribute(attribute: &Attr) -> (String, String) {
	(attribute.local_name(), attribute.value())
}
