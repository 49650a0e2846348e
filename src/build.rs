//! Build phase: pairs the previous and next trees into a [`WipTree`].
//!
//! Only VNodes are read here. The output medium isn't reachable from this module at all.

use crate::{
	children::{reconcile_children, ChildPlan},
	context::ReconcileContext,
	error::{BuildError, Diagnostic},
	vnode::{VNode, VPath},
	wip::{OutputRef, WipFlags, WipId, WipTree, WorkInProgress},
};
use core::slice;
use tracing::{instrument, level_filters::STATIC_MAX_LEVEL, trace, warn, Level};

/// Builds the work-in-progress tree for one pass.
///
/// # Errors
///
/// If any node that would be rendered is malformed, or the next tree is nested deeper than
/// [`ReconcileContext::depth_limit`].
#[instrument(skip_all)]
pub fn build<'v>(previous: Option<&'v VNode>, next: &'v VNode, context: &ReconcileContext<'_>) -> Result<WipTree<'v>, BuildError> {
	let mut builder = Builder { tree: WipTree::default(), context };

	// The roots are never excluded.
	let root_context = ReconcileContext { exclude_predicate: None, ..*context };
	let plan = reconcile_children(previous.map_or(&[][..], slice::from_ref), slice::from_ref(next), &root_context);
	let (top, top_deletions) = builder.build_level(None, &VPath::root(), plan, 0)?;

	let mut tree = builder.tree;
	tree.top = top;
	tree.top_deletions = top_deletions;
	trace!(wip_count = tree.len(), "Built WIP tree.");
	Ok(tree)
}

struct Builder<'v, 'c> {
	tree: WipTree<'v>,
	context: &'c ReconcileContext<'c>,
}

impl<'v> Builder<'v, '_> {
	/// Allocates WIPs for one planned children list and recurses into reused and new children.
	///
	/// `parent_path` is [`None`]-like (the root path) at the top level, where paths aren't extended.
	fn build_level(&mut self, parent: Option<WipId>, parent_path: &VPath, plan: ChildPlan<'v>, depth: usize) -> Result<(Vec<WipId>, Vec<WipId>), BuildError> {
		let path_of = |index: usize| if parent.is_some() { parent_path.child(index) } else { parent_path.clone() };

		for duplicate in &plan.duplicate_keys {
			let path = path_of(duplicate.next_index);
			if STATIC_MAX_LEVEL >= Level::WARN {
				warn!("Duplicate key {:?} at {}; matching it as unkeyed.", duplicate.key, path);
			}
			self.tree.diagnostics.push(Diagnostic::DuplicateKey { key: duplicate.key.to_owned(), path });
		}

		let mut deletions = Vec::with_capacity(plan.removed.len());
		for removed in &plan.removed {
			let mut wip = WorkInProgress::new(removed.vnode.kind(), path_of(removed.previous_index));
			wip.previous_vnode = Some(removed.vnode);
			wip.output_ref = OutputRef::Carried { previous_index: removed.previous_index };
			wip.parent = parent;
			wip.order_index = removed.slot;
			wip.source_index = removed.previous_index;
			wip.flags = WipFlags::IS_DELETED;
			deletions.push(self.tree.alloc(wip));
		}

		let reshaped = plan.reshaped();
		if let Some(parent) = parent {
			if reshaped {
				self.tree.get_mut(parent).flags |= WipFlags::CHILDREN_RESHAPED;
			}
		}

		let mut children = Vec::with_capacity(plan.children.len());
		for (order_index, planned) in plan.children.into_iter().enumerate() {
			let path = path_of(planned.next_index);
			if let Some(reason) = planned.next.malformation() {
				return Err(BuildError::Malformed {
					kind: planned.next.kind(),
					path,
					reason,
				});
			}
			if depth > self.context.depth_limit {
				return Err(BuildError::DepthLimit { limit: self.context.depth_limit, path });
			}

			let mut wip = WorkInProgress::new(planned.next.kind(), path.clone());
			wip.vnode = Some(planned.next);
			wip.parent = parent;
			wip.order_index = order_index;
			wip.source_index = planned.next_index;
			match planned.previous {
				Some(reused) => {
					wip.previous_vnode = Some(reused.vnode);
					wip.output_ref = OutputRef::Carried { previous_index: reused.previous_index };
					if planned.moved {
						wip.flags |= WipFlags::MOVED;
					}
				}
				None => wip.flags |= WipFlags::IS_NEW,
			}
			let id = self.tree.alloc(wip);

			let previous_children = planned.previous.map_or(&[][..], |reused| reused.vnode.children());
			let next_children = planned.next.children();
			if !previous_children.is_empty() || !next_children.is_empty() {
				let plan = reconcile_children(previous_children, next_children, self.context);
				let (grandchildren, grandchild_deletions) = self.build_level(Some(id), &path, plan, depth + 1)?;
				let wip = self.tree.get_mut(id);
				wip.children = grandchildren;
				wip.deletions = grandchild_deletions;
			}
			children.push(id);
		}

		Ok((children, deletions))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::wip::WipFlags;

	#[test]
	fn new_tree_is_all_new() {
		let next = VNode::element("ul").with_children(vec![VNode::element("li"), VNode::element("li")]);
		let tree = build(None, &next, &ReconcileContext::new()).unwrap();

		assert_eq!(tree.len(), 3);
		assert!(tree.iter().all(|wip| wip.flags().contains(WipFlags::IS_NEW)));
		assert_eq!(tree.replaced_root(), None);
		let root = tree.get(tree.root().unwrap());
		assert_eq!(root.children().len(), 2);
		assert_eq!(tree.get(root.children()[1]).order_index(), 1);
		assert_eq!(tree.get(root.children()[1]).path().to_string(), "/1");
	}

	#[test]
	fn malformed_node_names_its_path() {
		let next = VNode::element("div").with_child(VNode::element("p").with_child(VNode::component("")));
		let error = build(None, &next, &ReconcileContext::new()).unwrap_err();

		assert_eq!(error.to_string(), "malformed component node at /0/0: component without name");
	}

	#[test]
	fn depth_limit_is_enforced() {
		let next = VNode::element("a").with_child(VNode::element("b").with_child(VNode::text("c")));
		assert!(build(None, &next, &ReconcileContext::new().with_depth_limit(2)).is_ok());
		assert_eq!(
			build(None, &next, &ReconcileContext::new().with_depth_limit(1)).unwrap_err(),
			BuildError::DepthLimit { limit: 1, path: vec![0, 0].into() }
		);
	}
}
