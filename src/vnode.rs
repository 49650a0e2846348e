//! Immutable input trees.
//!
//! A [`VNode`] is the fully evaluated description of one output node. Whatever produced it
//! (templates, components, conditionals) has already run: the reconciler never interprets
//! anything beyond the payload, attributes, key and children stored here.

use core::fmt::{self, Display, Formatter};
use std::collections::BTreeMap;
use tracing::warn;

/// Attribute name to value mapping. Ordering is irrelevant for diffing, but a sorted map keeps
/// the emitted mutations deterministic.
pub type Attributes = BTreeMap<String, String>;

/// One node of a virtual tree.
///
/// Two snapshots of these (`previous` and `next`) are compared by the reconciler. Neither is ever
/// modified, so the caller can keep `next` around as the `previous` of the following pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VNode {
	Element {
		tag: String,
		key: Option<String>,
		attributes: Attributes,
		children: Vec<VNode>,
	},
	Text {
		text: String,
		key: Option<String>,
	},
	/// An already-rendered component. Its `children` are the component's output.
	Component {
		name: String,
		key: Option<String>,
		attributes: Attributes,
		children: Vec<VNode>,
	},
	/// Content mounted into a separate host container identified by `target`.
	Portal {
		target: String,
		key: Option<String>,
		children: Vec<VNode>,
	},
}

/// The discriminant of a [`VNode`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VNodeKind {
	Element,
	Text,
	Component,
	Portal,
}

impl Display for VNodeKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			VNodeKind::Element => "element",
			VNodeKind::Text => "text",
			VNodeKind::Component => "component",
			VNodeKind::Portal => "portal",
		})
	}
}

impl VNode {
	#[must_use]
	pub fn element(tag: impl Into<String>) -> Self {
		Self::Element {
			tag: tag.into(),
			key: None,
			attributes: Attributes::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text { text: text.into(), key: None }
	}

	#[must_use]
	pub fn component(name: impl Into<String>) -> Self {
		Self::Component {
			name: name.into(),
			key: None,
			attributes: Attributes::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn portal(target: impl Into<String>) -> Self {
		Self::Portal {
			target: target.into(),
			key: None,
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn with_key(mut self, new_key: impl Into<String>) -> Self {
		match &mut self {
			Self::Element { key, .. } | Self::Text { key, .. } | Self::Component { key, .. } | Self::Portal { key, .. } => *key = Some(new_key.into()),
		}
		self
	}

	/// Sets an attribute. Text and portal nodes carry no attributes, so this is ignored (with a warning) for them.
	#[must_use]
	pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		let kind = self.kind();
		let name: String = name.into();
		match &mut self {
			Self::Element { attributes, .. } | Self::Component { attributes, .. } => {
				attributes.insert(name, value.into());
			}
			Self::Text { .. } | Self::Portal { .. } => warn!("Ignoring attribute {:?} on {} node.", name, kind),
		}
		self
	}

	/// Appends a child. Text nodes can't have children, so this is ignored (with a warning) for them.
	#[must_use]
	pub fn with_child(mut self, child: VNode) -> Self {
		match &mut self {
			Self::Element { children, .. } | Self::Component { children, .. } | Self::Portal { children, .. } => children.push(child),
			Self::Text { .. } => warn!("Ignoring child of text node."),
		}
		self
	}

	#[must_use]
	pub fn with_children(self, children: impl IntoIterator<Item = VNode>) -> Self {
		children.into_iter().fold(self, Self::with_child)
	}

	#[must_use]
	pub fn kind(&self) -> VNodeKind {
		match self {
			Self::Element { .. } => VNodeKind::Element,
			Self::Text { .. } => VNodeKind::Text,
			Self::Component { .. } => VNodeKind::Component,
			Self::Portal { .. } => VNodeKind::Portal,
		}
	}

	#[must_use]
	pub fn key(&self) -> Option<&str> {
		match self {
			Self::Element { key, .. } | Self::Text { key, .. } | Self::Component { key, .. } | Self::Portal { key, .. } => key.as_deref(),
		}
	}

	/// The discriminating payload: tag, text, component name or portal target.
	#[must_use]
	pub fn payload(&self) -> &str {
		match self {
			Self::Element { tag, .. } => tag,
			Self::Text { text, .. } => text,
			Self::Component { name, .. } => name,
			Self::Portal { target, .. } => target,
		}
	}

	#[must_use]
	pub fn attributes(&self) -> Option<&Attributes> {
		match self {
			Self::Element { attributes, .. } | Self::Component { attributes, .. } => Some(attributes),
			Self::Text { .. } | Self::Portal { .. } => None,
		}
	}

	#[must_use]
	pub fn children(&self) -> &[VNode] {
		match self {
			Self::Element { children, .. } | Self::Component { children, .. } | Self::Portal { children, .. } => children,
			Self::Text { .. } => &[],
		}
	}

	/// Returns why this node can't be rendered, if it can't.
	///
	/// Text may be empty, but every other kind needs its payload to create an output node.
	#[must_use]
	pub fn malformation(&self) -> Option<&'static str> {
		match self {
			Self::Element { tag, .. } if tag.is_empty() => Some("element without tag"),
			Self::Component { name, .. } if name.is_empty() => Some("component without name"),
			Self::Portal { target, .. } if target.is_empty() => Some("portal without target"),
			Self::Element { .. } | Self::Text { .. } | Self::Component { .. } | Self::Portal { .. } => None,
		}
	}
}

/// Location of a node as child indices from the root, printed like `/0/3/1`. The root itself is `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VPath(Vec<usize>);

impl VPath {
	#[must_use]
	pub fn root() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn child(&self, index: usize) -> Self {
		let mut indices = self.0.clone();
		indices.push(index);
		Self(indices)
	}

	#[must_use]
	pub fn indices(&self) -> &[usize] {
		&self.0
	}
}

impl From<Vec<usize>> for VPath {
	fn from(indices: Vec<usize>) -> Self {
		Self(indices)
	}
}

impl Display for VPath {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if self.0.is_empty() {
			return f.write_str("/");
		}
		for index in &self.0 {
			write!(f, "/{}", index)?;
		}
		Ok(())
	}
}
