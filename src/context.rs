use crate::vnode::VNode;
use core::fmt::{self, Debug, Formatter};

/// Per-pass configuration, passed explicitly through all phases.
#[derive(Clone, Copy)]
pub struct ReconcileContext<'a> {
	/// Children matching this predicate are skipped by sibling matching as if they weren't there.
	///
	/// They are never created, moved or removed by the reconciler, so whatever owns them (overlays, decorations) keeps full control over them.
	pub exclude_predicate: Option<&'a dyn Fn(&VNode) -> bool>,

	/// Maximum nesting depth below the root. Deeper trees are rejected with [`BuildError::DepthLimit`](`crate::BuildError::DepthLimit`).
	pub depth_limit: usize,
}

impl<'a> ReconcileContext<'a> {
	pub const DEFAULT_DEPTH_LIMIT: usize = 512;

	#[must_use]
	pub fn new() -> Self {
		Self {
			exclude_predicate: None,
			depth_limit: Self::DEFAULT_DEPTH_LIMIT,
		}
	}

	#[must_use]
	pub fn with_exclude_predicate(mut self, exclude_predicate: &'a dyn Fn(&VNode) -> bool) -> Self {
		self.exclude_predicate = Some(exclude_predicate);
		self
	}

	#[must_use]
	pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}

	#[must_use]
	pub fn is_excluded(&self, vnode: &VNode) -> bool {
		self.exclude_predicate.map_or(false, |exclude| exclude(vnode))
	}
}

impl Default for ReconcileContext<'_> {
	fn default() -> Self {
		Self::new()
	}
}

impl Debug for ReconcileContext<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReconcileContext")
			.field("exclude_predicate", &self.exclude_predicate.map(|_| "<predicate>"))
			.field("depth_limit", &self.depth_limit)
			.finish()
	}
}
