//! Finalize phase: the only code that mutates the output medium.
//!
//! Each level is committed in three steps: resolve the output nodes of reused children, remove
//! deleted children, then create/update/move the children in ascending `order_index`, inserting
//! before the next sibling that stays in place.

use crate::{
	loggable,
	medium::{NodeKind, OutputMedium},
	result::ReconcileResult,
	vnode::{VNode, VNodeKind},
	wip::{AttributePatch, CommitState, OutputRef, WipFlags, WipId, WipTree},
	Diagnostic,
};
use core::mem;
use tracing::{debug, instrument, trace, trace_span, warn};

/// Output handles of the committed tree, shaped like the last committed VNodes.
///
/// This is how output references are carried from one pass to the next. Each level is indexed like the
/// unfiltered children list, with [`None`] where the reconciler rendered nothing (excluded children).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Mounted<H> {
	pub handle: H,
	pub children: Vec<Option<Mounted<H>>>,
}

pub(crate) fn mount<H>(level: &mut Vec<Option<Mounted<H>>>, index: usize, mounted: Mounted<H>) {
	if level.len() <= index {
		level.resize_with(index + 1, || None);
	}
	level[index] = Some(mounted);
}

/// Commits `tree` below `root`, returning what happened and the handles for the next pass.
#[instrument(skip_all, fields(wip_count = tree.len()))]
pub(crate) fn commit<M: OutputMedium>(medium: &mut M, root: &M::Handle, tree: &mut WipTree<'_>, mounted: Vec<Option<Mounted<M::Handle>>>) -> (ReconcileResult, Vec<Option<Mounted<M::Handle>>>) {
	let mut result = ReconcileResult::default();
	for wip in tree.iter() {
		result.by_priority.count(wip.priority());
	}
	result.diagnostics = mem::take(&mut tree.diagnostics);

	let top = tree.top.clone();
	let top_deletions = tree.top_deletions.clone();
	let mut finalizer = Finalizer { medium, tree, result };
	let mounted = finalizer.commit_level(root, &top, &top_deletions, mounted);
	(finalizer.result, mounted)
}

enum Resolution<H> {
	Carried(Mounted<H>),
	/// A text node found again through its parent's child list. Its position is unknown.
	Relocated(Mounted<H>),
	Missing,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Placement {
	Insert,
	Move,
}

struct Finalizer<'a, 'v, M: OutputMedium> {
	medium: &'a mut M,
	tree: &'a mut WipTree<'v>,
	result: ReconcileResult,
}

impl<'a, 'v, M: OutputMedium> Finalizer<'a, 'v, M> {
	fn commit_level(&mut self, parent: &M::Handle, children: &[WipId], deletions: &[WipId], mut carried: Vec<Option<Mounted<M::Handle>>>) -> Vec<Option<Mounted<M::Handle>>> {
		// Every handle taken out of `carried` or relocated, so the text fallback can't pick one twice.
		let mut claimed: Vec<M::Handle> = Vec::new();

		let mut resolved = Vec::with_capacity(children.len());
		for &id in children {
			let wip = self.tree.get_mut(id);
			debug_assert_eq!(wip.state, CommitState::Pending);
			wip.state = CommitState::ResolvingOutputRef;
			let output_ref = wip.output_ref;
			resolved.push(match output_ref {
				OutputRef::Unresolved => Resolution::Missing,
				OutputRef::Carried { previous_index } => self.resolve(parent, id, previous_index, &mut carried, &mut claimed),
			});
		}

		for &id in deletions {
			self.delete(parent, id, &mut carried, &mut claimed);
		}

		let orphaned = carried.iter().filter(|mounted| mounted.is_some()).count();
		if orphaned != 0 {
			warn!("{} output node(s) had no counterpart in the previous tree and were left alone.", orphaned);
		}

		// Reused children that keep their relative position are the insertion anchors.
		let mut anchors: Vec<Option<M::Handle>> = vec![None; children.len()];
		let mut next_anchor = None;
		for i in (0..children.len()).rev() {
			anchors[i] = next_anchor.clone();
			if let Resolution::Carried(mounted) = &resolved[i] {
				if !self.tree.get(children[i]).flags.contains(WipFlags::MOVED) {
					next_anchor = Some(mounted.handle.clone());
				}
			}
		}

		let mut level = Vec::with_capacity(children.len());
		for ((&id, resolution), anchor) in children.iter().zip(resolved).zip(anchors) {
			let mounted = match resolution {
				Resolution::Carried(mounted) => Some(self.apply_reused(parent, id, mounted, false, anchor.as_ref())),
				Resolution::Relocated(mounted) => Some(self.apply_reused(parent, id, mounted, true, anchor.as_ref())),
				Resolution::Missing => self.apply_new(parent, id, anchor.as_ref()),
			};
			if let Some(mounted) = mounted {
				mount(&mut level, self.tree.get(id).source_index, mounted);
			}
		}
		level
	}

	/// Finds the output node for a reused WIP.
	fn resolve(&mut self, parent: &M::Handle, id: WipId, previous_index: usize, carried: &mut [Option<Mounted<M::Handle>>], claimed: &mut Vec<M::Handle>) -> Resolution<M::Handle> {
		let wip = self.tree.get(id);
		let (kind, path, previous) = (wip.kind, wip.path.clone(), wip.previous_vnode);

		if let Some(mounted) = carried.get_mut(previous_index).and_then(Option::take) {
			claimed.push(mounted.handle.clone());
			if self.medium.parent(&mounted.handle).as_ref() == Some(parent) {
				return Resolution::Carried(mounted);
			}
			warn!("Output node of {} at {} was detached from its parent outside of reconciliation.", kind, path);
		}

		if let Some(VNode::Text { text, .. }) = previous {
			if let Some(handle) = self.relocate_text(parent, text, carried, claimed) {
				debug!("Relocated text node at {} by its previous content.", path);
				self.result.diagnostics.push(Diagnostic::TextRelocated { path });
				return Resolution::Relocated(Mounted { handle, children: Vec::new() });
			}
		}

		warn!("Could not resolve the output node of {} at {}. Recreating it.", kind, path);
		self.result.diagnostics.push(Diagnostic::ResolutionMiss { kind, path });
		self.tree.get_mut(id).flags |= WipFlags::IS_NEW;
		Resolution::Missing
	}

	/// Text nodes carry no identity in the output, so the only fallback is their content.
	fn relocate_text(&self, parent: &M::Handle, previous_text: &str, carried: &[Option<Mounted<M::Handle>>], claimed: &mut Vec<M::Handle>) -> Option<M::Handle> {
		let handle = self.medium.children(parent).into_iter().find(|handle| {
			!claimed.contains(handle) && !carried.iter().flatten().any(|mounted| &mounted.handle == handle) && self.medium.text(handle).as_deref() == Some(previous_text)
		})?;
		claimed.push(handle.clone());
		Some(handle)
	}

	fn delete(&mut self, parent: &M::Handle, id: WipId, carried: &mut [Option<Mounted<M::Handle>>], claimed: &mut Vec<M::Handle>) {
		let wip = self.tree.get(id);
		let (kind, path, previous, output_ref) = (wip.kind, wip.path.clone(), wip.previous_vnode, wip.output_ref);
		let span = trace_span!("Removing", %kind, %path);
		let _enter = span.enter();

		let mut handle = match output_ref {
			OutputRef::Carried { previous_index } => carried.get_mut(previous_index).and_then(Option::take).map(|mounted| mounted.handle),
			OutputRef::Unresolved => None,
		};
		if let Some(handle) = &handle {
			claimed.push(handle.clone());
		}
		if handle.is_none() {
			if let Some(VNode::Text { text, .. }) = previous {
				handle = self.relocate_text(parent, text, carried, claimed);
				if handle.is_some() {
					self.result.diagnostics.push(Diagnostic::TextRelocated { path: path.clone() });
				}
			}
		}

		match handle {
			Some(handle) if self.medium.parent(&handle).as_ref() == Some(parent) => {
				self.medium.remove(parent, &handle);
				self.result.deleted += 1;
			}
			Some(handle) => debug!("Removed output node {:?} was already detached.", handle),
			None => {
				warn!("Could not resolve the removed output node of {} at {}. Leaving the output as is.", kind, path);
				self.result.diagnostics.push(Diagnostic::ResolutionMiss { kind, path });
			}
		}
		self.tree.get_mut(id).state = CommitState::Deleted;
	}

	fn apply_reused(&mut self, parent: &M::Handle, id: WipId, mounted: Mounted<M::Handle>, relocated: bool, anchor: Option<&M::Handle>) -> Mounted<M::Handle> {
		let wip = self.tree.get_mut(id);
		let span = trace_span!("Updating", kind = %wip.kind, path = %wip.path);
		let _enter = span.enter();

		let Mounted { handle, children: mounted_children } = mounted;
		let vnode = wip.vnode;
		let flags = wip.flags;
		let attribute_patch = mem::take(&mut wip.attribute_patch);
		let children = wip.children.clone();
		let deletions = wip.deletions.clone();

		if flags.contains(WipFlags::NEEDS_UPDATE) {
			match vnode {
				Some(VNode::Text { text, .. }) => {
					trace!(text = loggable(text), "Setting text.");
					self.medium.set_text(&handle, text);
				}
				Some(VNode::Element { .. } | VNode::Component { .. } | VNode::Portal { .. }) | None => {
					for patch in attribute_patch {
						match patch {
							AttributePatch::Set { name, value } => self.medium.set_attribute(&handle, name, value),
							AttributePatch::Remove { name } => self.medium.remove_attribute(&handle, name),
						}
					}
				}
			}
			self.result.updated += 1;
		}

		// A relocated text node often hasn't actually moved.
		let in_place = relocated && !flags.contains(WipFlags::MOVED) && self.is_in_place(parent, &handle, anchor);
		if (relocated || flags.contains(WipFlags::MOVED)) && !in_place && self.place(parent, id, &handle, anchor, Placement::Move) {
			self.result.moved += 1;
		}

		let children = self.commit_level(&handle, &children, &deletions, mounted_children);
		self.tree.get_mut(id).state = CommitState::Applied;
		Mounted { handle, children }
	}

	fn apply_new(&mut self, parent: &M::Handle, id: WipId, anchor: Option<&M::Handle>) -> Option<Mounted<M::Handle>> {
		let wip = self.tree.get(id);
		let span = trace_span!("Creating", kind = %wip.kind, path = %wip.path);
		let _enter = span.enter();

		if wip.state == CommitState::Applied {
			warn!("WIP {:?} was already applied. Skipping.", id);
			return None;
		}
		let vnode = match wip.vnode {
			Some(vnode) => vnode,
			None => {
				warn!("WIP {:?} has nothing to create.", id);
				return None;
			}
		};
		let children = wip.children.clone();

		let handle = self.create(vnode);
		if self.place(parent, id, &handle, anchor, Placement::Insert) {
			self.result.inserted += 1;
		}

		// Nothing below a new node can be reused.
		let mut mounted_children = Vec::with_capacity(children.len());
		for child in children {
			self.tree.get_mut(child).state = CommitState::ResolvingOutputRef;
			if let Some(mounted) = self.apply_new(&handle, child, None) {
				mount(&mut mounted_children, self.tree.get(child).source_index, mounted);
			}
		}

		self.tree.get_mut(id).state = CommitState::Applied;
		Some(Mounted { handle, children: mounted_children })
	}

	fn create(&mut self, vnode: &VNode) -> M::Handle {
		let kind = match vnode {
			VNode::Element { tag, .. } => NodeKind::Element { tag },
			VNode::Text { .. } => NodeKind::Text,
			VNode::Component { name, .. } => NodeKind::Component { name },
			VNode::Portal { target, .. } => NodeKind::Portal { target },
		};
		let handle = self.medium.create_node(kind);

		if let VNode::Text { text, .. } = vnode {
			trace!(text = loggable(text), "Setting initial text.");
			self.medium.set_text(&handle, text);
		}
		for (name, value) in vnode.attributes().into_iter().flatten() {
			trace!(name = name.as_str(), value = loggable(value), "Setting initial attribute.");
			self.medium.set_attribute(&handle, name, value);
		}
		handle
	}

	/// Whether `handle` already sits in `parent` directly before `anchor` (or last, for [`None`]).
	fn is_in_place(&self, parent: &M::Handle, handle: &M::Handle, anchor: Option<&M::Handle>) -> bool {
		let siblings = self.medium.children(parent);
		siblings.iter().position(|sibling| sibling == handle).map_or(false, |i| siblings.get(i + 1) == anchor)
	}

	/// Inserts or moves `handle` into `parent`, at most once per WIP.
	///
	/// Returns whether the medium was called.
	fn place(&mut self, parent: &M::Handle, id: WipId, handle: &M::Handle, anchor: Option<&M::Handle>, placement: Placement) -> bool {
		let wip = self.tree.get_mut(id);
		if wip.flags.contains(WipFlags::INSERTED) {
			warn!("Output node of {} at {} was already placed in this pass. Skipping.", wip.kind, wip.path);
			return false;
		}
		wip.flags |= WipFlags::INSERTED;

		if placement == Placement::Insert && self.medium.parent(handle).as_ref() == Some(parent) {
			debug!("New output node {:?} is already attached to its parent.", handle);
			return false;
		}

		if wip.kind == VNodeKind::Text {
			trace!(?anchor, "Placing text node.");
		}
		self.medium.insert_before(parent, handle, anchor);
		true
	}
}
