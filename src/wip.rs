//! Work-in-progress bookkeeping for a single reconcile pass.
//!
//! The tree is an arena: nodes refer to each other by [`WipId`], parents are plain indices and
//! dropping the [`WipTree`] discards everything at once.

use crate::{
	error::Diagnostic,
	vnode::{VNode, VNodeKind, VPath},
};
use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WipId(usize);

impl WipId {
	#[must_use]
	pub fn index(self) -> usize {
		self.0
	}
}

bitflags! {
	/// Bookkeeping markers written by the build phase and the finalizer.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct WipFlags: u8 {
		/// No previous node was paired with this one.
		const IS_NEW = 1 << 0;
		/// The previous node has no counterpart in the next tree.
		const IS_DELETED = 1 << 1;
		/// Text or attributes have to be written.
		const NEEDS_UPDATE = 1 << 2;
		/// Reused, but not in its previous relative position.
		const MOVED = 1 << 3;
		/// At least one child was inserted, removed or moved.
		const CHILDREN_RESHAPED = 1 << 4;
		/// Placed into its parent during this pass. Guards against double insertion.
		const INSERTED = 1 << 5;
	}
}

bitflags! {
	/// What the change detector found for a node.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct ChangeSet: u8 {
		const INSERT = 1 << 0;
		const DELETE = 1 << 1;
		const TEXT = 1 << 2;
		const ATTRIBUTES = 1 << 3;
		const CHILDREN = 1 << 4;
		const MOVE = 1 << 5;
	}
}

/// Commit ordering hint derived from a [`ChangeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
	Low,
	Normal,
	High,
}

impl Priority {
	#[must_use]
	pub fn of(changes: ChangeSet) -> Self {
		if changes.intersects(ChangeSet::INSERT | ChangeSet::DELETE) {
			Self::High
		} else if changes.intersects(ChangeSet::TEXT | ChangeSet::ATTRIBUTES | ChangeSet::MOVE) {
			Self::Normal
		} else {
			Self::Low
		}
	}
}

/// Where the output node for a WIP comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputRef {
	/// A new output node has to be created.
	Unresolved,
	/// Reuse the output node that rendered the previous sibling at `previous_index`
	/// (counting every sibling, excluded or not).
	Carried { previous_index: usize },
}

/// Finalizer progress of a single WIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
	Pending,
	ResolvingOutputRef,
	Applied,
	Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributePatch<'v> {
	Set { name: &'v str, value: &'v str },
	Remove { name: &'v str },
}

#[derive(Debug)]
pub struct WorkInProgress<'v> {
	pub(crate) identity: WipId,
	pub(crate) kind: VNodeKind,
	pub(crate) vnode: Option<&'v VNode>,
	pub(crate) previous_vnode: Option<&'v VNode>,
	pub(crate) output_ref: OutputRef,
	pub(crate) parent: Option<WipId>,
	pub(crate) children: Vec<WipId>,
	pub(crate) deletions: Vec<WipId>,
	pub(crate) order_index: usize,
	/// Index in the unfiltered (next, or for deletions previous) children list.
	pub(crate) source_index: usize,
	pub(crate) path: VPath,
	pub(crate) flags: WipFlags,
	pub(crate) changes: ChangeSet,
	pub(crate) attribute_patch: Vec<AttributePatch<'v>>,
	pub(crate) state: CommitState,
}

impl<'v> WorkInProgress<'v> {
	pub(crate) fn new(kind: VNodeKind, path: VPath) -> Self {
		Self {
			identity: WipId(usize::MAX),
			kind,
			vnode: None,
			previous_vnode: None,
			output_ref: OutputRef::Unresolved,
			parent: None,
			children: Vec::new(),
			deletions: Vec::new(),
			order_index: 0,
			source_index: 0,
			path,
			flags: WipFlags::empty(),
			changes: ChangeSet::empty(),
			attribute_patch: Vec::new(),
			state: CommitState::Pending,
		}
	}

	#[must_use]
	pub fn identity(&self) -> WipId {
		self.identity
	}

	#[must_use]
	pub fn kind(&self) -> VNodeKind {
		self.kind
	}

	/// The next node this WIP represents. [`None`] for deletions.
	#[must_use]
	pub fn vnode(&self) -> Option<&'v VNode> {
		self.vnode
	}

	/// [`None`] means the node is new in this pass.
	#[must_use]
	pub fn previous_vnode(&self) -> Option<&'v VNode> {
		self.previous_vnode
	}

	#[must_use]
	pub fn output_ref(&self) -> OutputRef {
		self.output_ref
	}

	#[must_use]
	pub fn parent(&self) -> Option<WipId> {
		self.parent
	}

	/// Children in next-tree order.
	#[must_use]
	pub fn children(&self) -> &[WipId] {
		&self.children
	}

	/// Previous children without counterpart, in previous-tree order.
	#[must_use]
	pub fn deletions(&self) -> &[WipId] {
		&self.deletions
	}

	/// Position among the (non-excluded) next siblings. For deletions, the previous position.
	#[must_use]
	pub fn order_index(&self) -> usize {
		self.order_index
	}

	#[must_use]
	pub fn path(&self) -> &VPath {
		&self.path
	}

	#[must_use]
	pub fn flags(&self) -> WipFlags {
		self.flags
	}

	#[must_use]
	pub fn changes(&self) -> ChangeSet {
		self.changes
	}

	#[must_use]
	pub fn priority(&self) -> Priority {
		Priority::of(self.changes)
	}

	#[must_use]
	pub fn attribute_patch(&self) -> &[AttributePatch<'v>] {
		&self.attribute_patch
	}

	#[must_use]
	pub fn state(&self) -> CommitState {
		self.state
	}

	#[must_use]
	pub fn is_new(&self) -> bool {
		self.flags.contains(WipFlags::IS_NEW)
	}

	#[must_use]
	pub fn is_deleted(&self) -> bool {
		self.flags.contains(WipFlags::IS_DELETED)
	}

	#[must_use]
	pub fn needs_update(&self) -> bool {
		self.flags.contains(WipFlags::NEEDS_UPDATE)
	}
}

/// All WIPs of one pass.
///
/// The top level mirrors a children list with (at most) one entry on each side, so that replacing the root
/// is an ordinary delete + insert pair.
#[derive(Debug, Default)]
pub struct WipTree<'v> {
	nodes: Vec<WorkInProgress<'v>>,
	pub(crate) top: Vec<WipId>,
	pub(crate) top_deletions: Vec<WipId>,
	pub(crate) diagnostics: Vec<Diagnostic>,
}

impl<'v> WipTree<'v> {
	pub(crate) fn alloc(&mut self, mut wip: WorkInProgress<'v>) -> WipId {
		let id = WipId(self.nodes.len());
		wip.identity = id;
		self.nodes.push(wip);
		id
	}

	/// The WIP for the next root.
	#[must_use]
	pub fn root(&self) -> Option<WipId> {
		self.top.first().copied()
	}

	/// The WIP for a previous root that couldn't be reused, if any.
	#[must_use]
	pub fn replaced_root(&self) -> Option<WipId> {
		self.top_deletions.first().copied()
	}

	#[must_use]
	pub fn get(&self, id: WipId) -> &WorkInProgress<'v> {
		&self.nodes[id.0]
	}

	pub(crate) fn get_mut(&mut self, id: WipId) -> &mut WorkInProgress<'v> {
		&mut self.nodes[id.0]
	}

	pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut WorkInProgress<'v>> {
		self.nodes.iter_mut()
	}

	pub fn iter(&self) -> impl Iterator<Item = &WorkInProgress<'v>> {
		self.nodes.iter()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	#[must_use]
	pub fn diagnostics(&self) -> &[Diagnostic] {
		&self.diagnostics
	}

	/// Node ids in finalizer order: by [`Priority`] (highest first), then document order.
	///
	/// The synchronous finalizer commits in plain tree order. This is the order a time-sliced
	/// commit would pick whole subtrees in.
	#[must_use]
	pub fn commit_schedule(&self) -> Vec<WipId> {
		let mut document_order = Vec::with_capacity(self.nodes.len());
		let mut stack: Vec<WipId> = self.top_deletions.iter().chain(self.top.iter()).rev().copied().collect();
		while let Some(id) = stack.pop() {
			document_order.push(id);
			let wip = self.get(id);
			stack.extend(wip.deletions.iter().chain(wip.children.iter()).rev().copied());
		}
		// Stable, so document order survives within each priority.
		document_order.sort_by_key(|&id| core::cmp::Reverse(self.get(id).priority()));
		document_order
	}
}
