//! Sibling matching.
//!
//! Previous and next children are paired by explicit key first, then by position among the
//! remaining unkeyed siblings. There is no content-based matching of any kind.

use crate::{context::ReconcileContext, vnode::VNode};
use hashbrown::{HashMap, HashSet};
use tracing::{instrument, trace};

/// A next child together with the previous sibling it reuses, if any.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlannedChild<'v> {
	pub next: &'v VNode,
	/// Index in the unfiltered next children list.
	pub next_index: usize,
	pub previous: Option<Reused<'v>>,
	pub moved: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Reused<'v> {
	pub vnode: &'v VNode,
	/// Index among the non-excluded previous siblings.
	pub slot: usize,
	/// Index in the unfiltered previous children list.
	pub previous_index: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RemovedChild<'v> {
	pub vnode: &'v VNode,
	pub slot: usize,
	/// Index in the unfiltered previous children list.
	pub previous_index: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct DuplicateKey<'v> {
	pub key: &'v str,
	pub next_index: usize,
}

#[derive(Debug, Default)]
pub(crate) struct ChildPlan<'v> {
	/// In next order. `order_index` is the position in this list.
	pub children: Vec<PlannedChild<'v>>,
	/// In previous order.
	pub removed: Vec<RemovedChild<'v>>,
	pub duplicate_keys: Vec<DuplicateKey<'v>>,
}

impl ChildPlan<'_> {
	/// Whether any child is inserted, removed or moved.
	pub fn reshaped(&self) -> bool {
		!self.removed.is_empty() || self.children.iter().any(|child| child.moved || child.previous.is_none())
	}
}

/// Whether `previous` may be updated in place to become `next`.
///
/// `previous_key` and `next_key` are the keys as used for matching, i.e. [`None`] for demoted duplicates.
pub(crate) fn is_same(previous: &VNode, previous_key: Option<&str>, next: &VNode, next_key: Option<&str>) -> bool {
	if (previous_key.is_some() || next_key.is_some()) && previous_key != next_key {
		return false;
	}
	match (previous, next) {
		(VNode::Text { .. }, VNode::Text { .. }) => true,
		(VNode::Element { tag: t_1, .. }, VNode::Element { tag: t_2, .. }) => t_1 == t_2,
		(VNode::Component { name: n_1, .. }, VNode::Component { name: n_2, .. }) => n_1 == n_2,
		(VNode::Portal { target: t_1, .. }, VNode::Portal { target: t_2, .. }) => t_1 == t_2,
		(VNode::Element { .. } | VNode::Text { .. } | VNode::Component { .. } | VNode::Portal { .. }, _) => false,
	}
}

/// Pairs `previous` with `next`.
///
/// Excluded children (per `context`) are dropped from both lists before matching. Reused children whose
/// previous slot is lower than one already placed are marked as moved, which is linear and never moves
/// a node twice, but isn't always minimal.
#[allow(clippy::too_many_lines)]
#[instrument(skip_all, fields(previous.len = previous.len(), next.len = next.len()))]
pub(crate) fn reconcile_children<'v>(previous: &'v [VNode], next: &'v [VNode], context: &ReconcileContext<'_>) -> ChildPlan<'v> {
	let previous: Vec<(usize, &'v VNode)> = previous.iter().enumerate().filter(|(_, vnode)| !context.is_excluded(vnode)).collect();
	let next: Vec<(usize, &'v VNode)> = next.iter().enumerate().filter(|(_, vnode)| !context.is_excluded(vnode)).collect();

	let mut plan = ChildPlan::default();

	// Keys as used for matching. Shadowed previous duplicates and repeated next keys become `None`.
	let mut previous_keys: Vec<Option<&'v str>> = previous.iter().map(|(_, vnode)| vnode.key()).collect();
	let mut next_keys: Vec<Option<&'v str>> = next.iter().map(|(_, vnode)| vnode.key()).collect();

	let mut keyed = HashMap::<&'v str, usize>::with_capacity(previous.len());
	for (slot, key) in previous_keys.clone().into_iter().enumerate() {
		if let Some(key) = key {
			if let Some(shadowed) = keyed.insert(key, slot) {
				// Already reported when that list was the next one.
				trace!(key, shadowed, slot, "Duplicate previous key; last occurrence wins.");
				previous_keys[shadowed] = None;
			}
		}
	}

	// As above, the last occurrence keeps its key. Every earlier one is reported and demoted.
	let mut seen = HashSet::<&'v str>::with_capacity(next.len());
	for (i, key) in next_keys.iter_mut().enumerate().rev() {
		if let Some(k) = *key {
			if !seen.insert(k) {
				plan.duplicate_keys.push(DuplicateKey { key: k, next_index: next[i].0 });
				*key = None;
			}
		}
	}
	plan.duplicate_keys.reverse();

	let mut pairing: Vec<Option<usize>> = vec![None; next.len()];

	// Keyed pass.
	for (i, key) in next_keys.iter().enumerate() {
		if let Some(key) = key {
			pairing[i] = keyed.remove(key);
		}
	}

	// Positional pass over whatever unkeyed previous children are left.
	let mut pool = previous_keys.iter().enumerate().filter(|(_, key)| key.is_none()).map(|(slot, _)| slot);
	for (i, key) in next_keys.iter().enumerate() {
		if key.is_none() {
			pairing[i] = pool.next();
		}
	}

	let mut consumed = vec![false; previous.len()];
	let mut highest_placed: Option<usize> = None;
	for (i, &(next_index, next_vnode)) in next.iter().enumerate() {
		let reused = pairing[i]
			.filter(|&slot| is_same(previous[slot].1, previous_keys[slot], next_vnode, next_keys[i]))
			.map(|slot| Reused {
				vnode: previous[slot].1,
				slot,
				previous_index: previous[slot].0,
			});

		let moved = match reused {
			Some(Reused { slot, .. }) => {
				consumed[slot] = true;
				match highest_placed {
					Some(highest) if slot < highest => true,
					_ => {
						highest_placed = Some(slot);
						false
					}
				}
			}
			None => false,
		};

		plan.children.push(PlannedChild {
			next: next_vnode,
			next_index,
			previous: reused,
			moved,
		});
	}

	plan.removed = previous
		.iter()
		.enumerate()
		.filter(|&(slot, _)| !consumed[slot])
		.map(|(slot, &(previous_index, vnode))| RemovedChild { vnode, slot, previous_index })
		.collect();

	plan
}
