use core::fmt::Debug;

/// What to create in [`OutputMedium::create_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
	Element { tag: &'a str },
	/// Content is written with [`OutputMedium::set_text`] afterwards.
	Text,
	Component { name: &'a str },
	Portal { target: &'a str },
}

/// The mutable output tree, as seen by the finalizer.
///
/// Only the finalizer calls these, and only during a reconcile pass. The read accessors are used for
/// guards and fallbacks, never for matching.
///
/// Implementations should log and skip operations that fail in the underlying medium rather than panic:
/// the finalizer always leaves the tree structurally consistent from its own point of view.
pub trait OutputMedium {
	type Handle: Clone + PartialEq + Debug;

	fn create_node(&mut self, kind: NodeKind<'_>) -> Self::Handle;
	fn set_text(&mut self, node: &Self::Handle, text: &str);
	fn set_attribute(&mut self, node: &Self::Handle, name: &str, value: &str);
	fn remove_attribute(&mut self, node: &Self::Handle, name: &str);

	/// Inserts `node` into `parent` before `reference`, or at the end for [`None`].
	///
	/// If `node` is already attached somewhere, it is moved.
	fn insert_before(&mut self, parent: &Self::Handle, node: &Self::Handle, reference: Option<&Self::Handle>);
	fn remove(&mut self, parent: &Self::Handle, node: &Self::Handle);

	fn parent(&self, node: &Self::Handle) -> Option<Self::Handle>;
	/// The children of `parent` that could have been rendered from a VNode, in order.
	///
	/// Anything else the medium may contain (comments, for example) is left out.
	fn children(&self, parent: &Self::Handle) -> Vec<Self::Handle>;
	/// The content of `node` if it's a text node.
	fn text(&self, node: &Self::Handle) -> Option<String>;
	/// Whether `node` is what [`create_node`](`OutputMedium::create_node`) would have created for `kind`.
	fn is_kind(&self, node: &Self::Handle, kind: NodeKind<'_>) -> bool;
}
