//! Output medium for the browser DOM.

use crate::medium::{NodeKind, OutputMedium};
use tracing::{error, instrument};
use wasm_bindgen::JsCast;

/// Renders into a [`web_sys::Document`].
///
/// Components become host elements named after the component, portals become `<div data-portal="…">` hosts.
/// Failing DOM calls are logged and skipped. An element that can't be created is replaced by a comment, so that sibling positions stay intact.
#[derive(Debug, Clone)]
pub struct DomMedium {
	document: web_sys::Document,
}

impl DomMedium {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self { document }
	}

	/// Uses the owner document of `element`, which then is typically used as output root.
	#[must_use]
	pub fn for_element(element: &web_sys::Element) -> Option<Self> {
		element.owner_document().map(Self::new)
	}

	#[instrument]
	fn create_element(&self, name: &str) -> web_sys::Node {
		match self.document.create_element(name) {
			Ok(element) => element.into(),
			Err(error) => {
				error!("Failed to create element <{}>: {:?}. Using a placeholder comment.", name, error);
				self.document.create_comment(name).into()
			}
		}
	}
}

impl OutputMedium for DomMedium {
	type Handle = web_sys::Node;

	fn create_node(&mut self, kind: NodeKind<'_>) -> web_sys::Node {
		match kind {
			NodeKind::Element { tag } => self.create_element(tag),
			NodeKind::Text => self.document.create_text_node("").into(),
			NodeKind::Component { name } => self.create_element(name),
			NodeKind::Portal { target } => {
				let host = self.create_element("div");
				self.set_attribute(&host, "data-portal", target);
				host
			}
		}
	}

	fn set_text(&mut self, node: &web_sys::Node, text: &str) {
		match node.dyn_ref::<web_sys::Text>() {
			Some(dom_text) => dom_text.set_data(text),
			None => error!("Expected to set data of `web_sys::Text` but found {:?}.", node),
		}
	}

	fn set_attribute(&mut self, node: &web_sys::Node, name: &str, value: &str) {
		match node.dyn_ref::<web_sys::Element>() {
			Some(element) => {
				if let Err(error) = element.set_attribute(name, value) {
					error!("Could not set attribute {:?}: {:?}", name, error)
				}
			}
			None => error!("Expected to set attribute {:?} on `web_sys::Element` but found {:?}.", name, node),
		}
	}

	fn remove_attribute(&mut self, node: &web_sys::Node, name: &str) {
		match node.dyn_ref::<web_sys::Element>() {
			Some(element) => {
				if let Err(error) = element.remove_attribute(name) {
					error!("Could not remove attribute {:?}: {:?}", name, error)
				}
			}
			None => error!("Expected to remove attribute {:?} from `web_sys::Element` but found {:?}.", name, node),
		}
	}

	fn insert_before(&mut self, parent: &web_sys::Node, node: &web_sys::Node, reference: Option<&web_sys::Node>) {
		if let Err(error) = parent.insert_before(node, reference) {
			error!("Failed to insert node: {:?}", error)
		}
	}

	fn remove(&mut self, parent: &web_sys::Node, node: &web_sys::Node) {
		if let Err(error) = parent.remove_child(node) {
			error!("Failed to remove the node: {:?}", error)
		}
	}

	fn parent(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	/// Elements and text only, like [`load_child_nodes`](`crate::load::load_child_nodes`).
	fn children(&self, parent: &web_sys::Node) -> Vec<web_sys::Node> {
		let child_nodes = parent.child_nodes();
		(0..child_nodes.length())
			.filter_map(|i| child_nodes.get(i))
			.filter(|child| child.dyn_ref::<web_sys::Element>().is_some() || child.dyn_ref::<web_sys::Text>().is_some())
			.collect()
	}

	fn text(&self, node: &web_sys::Node) -> Option<String> {
		node.dyn_ref::<web_sys::Text>().map(|text| text.data())
	}

	fn is_kind(&self, node: &web_sys::Node, kind: NodeKind<'_>) -> bool {
		if let NodeKind::Text = kind {
			return node.dyn_ref::<web_sys::Text>().is_some();
		}
		let element = match node.dyn_ref::<web_sys::Element>() {
			Some(element) => element,
			None => return false,
		};
		let portal = element.get_attribute("data-portal");
		// HTML documents lower-case element names on creation.
		match kind {
			NodeKind::Element { tag } | NodeKind::Component { name: tag } => portal.is_none() && element.local_name().eq_ignore_ascii_case(tag),
			NodeKind::Portal { target } => element.local_name() == "div" && portal.as_deref() == Some(target),
			NodeKind::Text => false,
		}
	}
}
