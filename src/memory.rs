//! An in-memory output medium.
//!
//! Useful as an off-screen buffer, and for observing exactly which mutations a pass performed.

use crate::medium::{NodeKind, OutputMedium};
use core::fmt::Write as _;
use std::collections::BTreeMap;
use tracing::{error, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryKind {
	/// The container created by [`MemoryTree::new`].
	Root,
	Element(String),
	Text,
	Component(String),
	Portal(String),
}

#[derive(Debug, Clone)]
pub struct MemoryNode {
	pub kind: MemoryKind,
	pub text: String,
	pub attributes: BTreeMap<String, String>,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
}

/// One call into the medium, as recorded in [`MemoryTree::log`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateNode { node: NodeId, kind: MemoryKind },
	SetText { node: NodeId, text: String },
	SetAttribute { node: NodeId, name: String, value: String },
	RemoveAttribute { node: NodeId, name: String },
	InsertBefore { parent: NodeId, node: NodeId, reference: Option<NodeId> },
	Remove { parent: NodeId, node: NodeId },
}

impl Mutation {
	#[must_use]
	pub fn is_create(&self) -> bool {
		matches!(self, Self::CreateNode { .. })
	}

	#[must_use]
	pub fn is_set_text(&self) -> bool {
		matches!(self, Self::SetText { .. })
	}

	#[must_use]
	pub fn is_insert(&self) -> bool {
		matches!(self, Self::InsertBefore { .. })
	}

	#[must_use]
	pub fn is_remove(&self) -> bool {
		matches!(self, Self::Remove { .. })
	}
}

/// Arena-backed output tree. Nodes are never freed; removed subtrees just become unreachable.
#[derive(Debug, Clone)]
pub struct MemoryTree {
	nodes: Vec<MemoryNode>,
	root: NodeId,
	log: Vec<Mutation>,
}

impl Default for MemoryTree {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryTree {
	#[must_use]
	pub fn new() -> Self {
		Self {
			nodes: vec![MemoryNode {
				kind: MemoryKind::Root,
				text: String::new(),
				attributes: BTreeMap::new(),
				parent: None,
				children: Vec::new(),
			}],
			root: NodeId(0),
			log: Vec::new(),
		}
	}

	#[must_use]
	pub fn root(&self) -> NodeId {
		self.root
	}

	#[must_use]
	pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
		self.nodes.get(id.0)
	}

	/// Every mutation since creation or the last [`take_log`](`MemoryTree::take_log`).
	#[must_use]
	pub fn log(&self) -> &[Mutation] {
		&self.log
	}

	pub fn take_log(&mut self) -> Vec<Mutation> {
		core::mem::take(&mut self.log)
	}

	#[must_use]
	pub fn count(&self, predicate: impl Fn(&Mutation) -> bool) -> usize {
		self.log.iter().filter(|mutation| predicate(mutation)).count()
	}

	/// Serializes the subtree below (not including) `id`.
	///
	/// Elements print like HTML with attributes in name order, components as `<Name>`, portals as `<#target>`.
	/// Text is printed verbatim.
	#[must_use]
	pub fn to_markup(&self, id: NodeId) -> String {
		let mut markup = String::new();
		if let Some(node) = self.node(id) {
			for &child in &node.children {
				self.write_markup(child, &mut markup);
			}
		}
		markup
	}

	fn write_markup(&self, id: NodeId, markup: &mut String) {
		let node = match self.node(id) {
			Some(node) => node,
			None => return,
		};
		let name = match &node.kind {
			MemoryKind::Text => return markup.push_str(&node.text),
			MemoryKind::Root => "#root".to_owned(),
			MemoryKind::Element(tag) => tag.clone(),
			MemoryKind::Component(name) => name.clone(),
			MemoryKind::Portal(target) => format!("#{}", target),
		};
		markup.push('<');
		markup.push_str(&name);
		for (attribute, value) in &node.attributes {
			let _ = write!(markup, " {}=\"{}\"", attribute, value);
		}
		markup.push('>');
		for &child in &node.children {
			self.write_markup(child, markup);
		}
		let _ = write!(markup, "</{}>", name);
	}

	fn node_mut(&mut self, id: NodeId) -> Option<&mut MemoryNode> {
		let node = self.nodes.get_mut(id.0);
		if node.is_none() {
			error!("Unknown node {:?}.", id);
		}
		node
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.nodes.get(node.0).and_then(|node| node.parent) {
			if let Some(parent) = self.node_mut(parent) {
				parent.children.retain(|&child| child != node);
			}
			if let Some(node) = self.node_mut(node) {
				node.parent = None;
			}
		}
	}
}

impl OutputMedium for MemoryTree {
	type Handle = NodeId;

	fn create_node(&mut self, kind: NodeKind<'_>) -> NodeId {
		let kind = match kind {
			NodeKind::Element { tag } => MemoryKind::Element(tag.to_owned()),
			NodeKind::Text => MemoryKind::Text,
			NodeKind::Component { name } => MemoryKind::Component(name.to_owned()),
			NodeKind::Portal { target } => MemoryKind::Portal(target.to_owned()),
		};
		let id = NodeId(self.nodes.len());
		self.nodes.push(MemoryNode {
			kind: kind.clone(),
			text: String::new(),
			attributes: BTreeMap::new(),
			parent: None,
			children: Vec::new(),
		});
		trace!(?id, ?kind, "Created node.");
		self.log.push(Mutation::CreateNode { node: id, kind });
		id
	}

	fn set_text(&mut self, node: &NodeId, text: &str) {
		if let Some(memory_node) = self.node_mut(*node) {
			memory_node.text = text.to_owned();
			self.log.push(Mutation::SetText { node: *node, text: text.to_owned() });
		}
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		if let Some(memory_node) = self.node_mut(*node) {
			memory_node.attributes.insert(name.to_owned(), value.to_owned());
			self.log.push(Mutation::SetAttribute {
				node: *node,
				name: name.to_owned(),
				value: value.to_owned(),
			});
		}
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		if let Some(memory_node) = self.node_mut(*node) {
			memory_node.attributes.remove(name);
			self.log.push(Mutation::RemoveAttribute { node: *node, name: name.to_owned() });
		}
	}

	fn insert_before(&mut self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) {
		if self.node(*parent).is_none() || self.node(*node).is_none() {
			return error!("Failed to insert {:?} into {:?}: Unknown node.", node, parent);
		}
		if parent == node {
			return error!("Failed to insert {:?} into itself.", node);
		}

		self.detach(*node);
		let siblings = &mut self.nodes[parent.0].children;
		let position = match reference {
			None => siblings.len(),
			Some(reference) => match siblings.iter().position(|child| child == reference) {
				Some(position) => position,
				None => {
					error!("Reference node {:?} is not a child of {:?}. Appending.", reference, parent);
					siblings.len()
				}
			},
		};
		siblings.insert(position, *node);
		self.nodes[node.0].parent = Some(*parent);
		self.log.push(Mutation::InsertBefore {
			parent: *parent,
			node: *node,
			reference: reference.copied(),
		});
	}

	fn remove(&mut self, parent: &NodeId, node: &NodeId) {
		if self.node(*node).map(|node| node.parent) != Some(Some(*parent)) {
			return error!("Failed to remove {:?}: Not a child of {:?}.", node, parent);
		}
		self.detach(*node);
		self.log.push(Mutation::Remove { parent: *parent, node: *node });
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.node(*node).and_then(|node| node.parent)
	}

	fn children(&self, parent: &NodeId) -> Vec<NodeId> {
		self.node(*parent).map(|node| node.children.clone()).unwrap_or_default()
	}

	fn text(&self, node: &NodeId) -> Option<String> {
		self.node(*node).filter(|node| node.kind == MemoryKind::Text).map(|node| node.text.clone())
	}

	fn is_kind(&self, node: &NodeId, kind: NodeKind<'_>) -> bool {
		match (self.node(*node).map(|node| &node.kind), kind) {
			(Some(MemoryKind::Element(t_1)), NodeKind::Element { tag: t_2 }) => t_1 == t_2,
			(Some(MemoryKind::Text), NodeKind::Text) => true,
			(Some(MemoryKind::Component(n_1)), NodeKind::Component { name: n_2 }) => n_1 == n_2,
			(Some(MemoryKind::Portal(t_1)), NodeKind::Portal { target: t_2 }) => t_1 == t_2,
			_ => false,
		}
	}
}
