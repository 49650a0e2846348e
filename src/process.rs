//! Process phase: classifies what changed for each WIP.
//!
//! Every WIP is classified from its own previous/next pair and the markers the build phase left
//! on it. Nothing outside the WIP being classified is written.

use crate::{
	vnode::{Attributes, VNode},
	wip::{AttributePatch, ChangeSet, WipFlags, WipTree, WorkInProgress},
};
use tracing::{instrument, trace};

#[instrument(skip_all, fields(wip_count = tree.len()))]
pub fn process(tree: &mut WipTree<'_>) {
	for wip in tree.nodes_mut() {
		classify(wip);
	}
}

fn classify(wip: &mut WorkInProgress<'_>) {
	if wip.flags.contains(WipFlags::IS_DELETED) {
		wip.changes = ChangeSet::DELETE;
		return;
	}

	let (previous, next) = match (wip.previous_vnode, wip.vnode) {
		(Some(previous), Some(next)) => (previous, next),
		(None, Some(_)) | (_, None) => {
			wip.changes = ChangeSet::INSERT;
			return;
		}
	};

	// The children reconciler only pairs same-kind, same-payload nodes (text aside).
	debug_assert_eq!(previous.kind(), next.kind());

	let mut changes = ChangeSet::empty();
	match (previous, next) {
		(VNode::Text { text: t_1, .. }, VNode::Text { text: t_2, .. }) => {
			if t_1 != t_2 {
				changes |= ChangeSet::TEXT;
			}
		}
		_ => {
			if let (Some(a_1), Some(a_2)) = (previous.attributes(), next.attributes()) {
				wip.attribute_patch = diff_attributes(a_1, a_2);
				if !wip.attribute_patch.is_empty() {
					changes |= ChangeSet::ATTRIBUTES;
				}
			}
		}
	}

	if wip.flags.contains(WipFlags::MOVED) {
		changes |= ChangeSet::MOVE;
	}
	if wip.flags.contains(WipFlags::CHILDREN_RESHAPED) {
		changes |= ChangeSet::CHILDREN;
	}
	if changes.intersects(ChangeSet::TEXT | ChangeSet::ATTRIBUTES) {
		wip.flags |= WipFlags::NEEDS_UPDATE;
	}

	if !changes.is_empty() {
		trace!(path = %wip.path, ?changes, "Classified.");
	}
	wip.changes = changes;
}

/// Per-key attribute diff. Removals come first, then additions and changed values.
pub(crate) fn diff_attributes<'v>(a_1: &'v Attributes, a_2: &'v Attributes) -> Vec<AttributePatch<'v>> {
	let removed = a_1.keys().filter(|name| !a_2.contains_key(*name)).map(|name| AttributePatch::Remove { name });
	let set = a_2
		.iter()
		.filter(|&(name, value)| a_1.get(name) != Some(value))
		.map(|(name, value)| AttributePatch::Set { name, value });
	removed.chain(set).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{build::build, context::ReconcileContext, wip::Priority};

	#[test]
	fn attribute_diff_is_per_key() {
		let a_1 = VNode::element("a").with_attribute("href", "/").with_attribute("title", "home").with_attribute("id", "x");
		let a_2 = VNode::element("a").with_attribute("href", "/about").with_attribute("id", "x").with_attribute("rel", "next");
		let patch = diff_attributes(a_1.attributes().unwrap(), a_2.attributes().unwrap());

		assert_eq!(
			patch,
			[
				AttributePatch::Remove { name: "title" },
				AttributePatch::Set { name: "href", value: "/about" },
				AttributePatch::Set { name: "rel", value: "next" },
			]
		);
	}

	#[test]
	fn changes_and_priorities() {
		let previous = VNode::element("p").with_children(vec![VNode::text("Hello"), VNode::element("b").with_key("k")]);
		let next = VNode::element("p").with_children(vec![VNode::text("World"), VNode::element("i")]);
		let mut tree = build(Some(&previous), &next, &ReconcileContext::new()).unwrap();
		process(&mut tree);

		let root = tree.get(tree.root().unwrap());
		assert_eq!(root.changes(), ChangeSet::CHILDREN);
		assert_eq!(root.priority(), Priority::Low);

		let text = tree.get(root.children()[0]);
		assert_eq!(text.changes(), ChangeSet::TEXT);
		assert!(text.needs_update());
		assert_eq!(text.priority(), Priority::Normal);

		let italic = tree.get(root.children()[1]);
		assert_eq!(italic.changes(), ChangeSet::INSERT);
		assert_eq!(italic.priority(), Priority::High);

		let bold = tree.get(root.deletions()[0]);
		assert_eq!(bold.changes(), ChangeSet::DELETE);

		let schedule = tree.commit_schedule();
		assert_eq!(schedule.len(), 4);
		assert_eq!(tree.get(schedule[0]).priority(), Priority::High);
		assert_eq!(tree.get(schedule[3]).priority(), Priority::Low);
	}
}
