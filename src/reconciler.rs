use crate::{
	build::build,
	commit::{commit, mount, Mounted},
	context::ReconcileContext,
	error::{Diagnostic, ReconcileError},
	medium::{NodeKind, OutputMedium},
	process::process,
	result::ReconcileResult,
	vnode::{VNode, VPath},
};
use core::{cell::Cell, mem, slice};
use tracing::{info, instrument, warn};

thread_local! {
	static COMMITTING: Cell<bool> = Cell::new(false);
}

/// Whether a reconcile pass is currently committing on this thread.
///
/// The flag is per thread, not per process: a commit only ever runs on the thread that called
/// [`Reconciler::reconcile`], and so do the output medium callbacks that could re-enter it.
/// Reconcilers on other threads (with their own output media) aren't affected.
#[must_use]
pub fn is_committing() -> bool {
	COMMITTING.with(Cell::get)
}

/// Holds the committing flag for as long as it lives, including during unwinding.
struct CommitGuard(());

impl CommitGuard {
	fn enter() -> Result<Self, ReconcileError> {
		COMMITTING.with(|committing| if committing.replace(true) { Err(ReconcileError::Reentrant) } else { Ok(Self(())) })
	}
}

impl Drop for CommitGuard {
	fn drop(&mut self) {
		COMMITTING.with(|committing| committing.set(false));
	}
}

/// Attached to a specific output root, this `struct` can be used to update the content rendered into it.
///
/// # Correct Use
///
/// Each call's `previous` must be the `next` of the call before it (or [`None`] for the first one).
/// The reconciler keeps the output handles of the last committed tree, and pairs them with `previous` by position.
/// If they disagree, affected nodes are recreated and [`Diagnostic::ResolutionMiss`] is reported.
#[derive(Debug)]
pub struct Reconciler<M: OutputMedium> {
	medium: M,
	root: M::Handle,
	mounted: Vec<Option<Mounted<M::Handle>>>,
}

impl<M: OutputMedium> Reconciler<M> {
	/// Creates a reconciler for an output root that the caller considers empty.
	#[must_use]
	pub fn new(medium: M, root: M::Handle) -> Self {
		Self { medium, root, mounted: Vec::new() }
	}

	#[must_use]
	pub fn root(&self) -> &M::Handle {
		&self.root
	}

	#[must_use]
	pub fn medium(&self) -> &M {
		&self.medium
	}

	/// Direct access to the output medium. Mutating the rendered nodes through this breaks the positional pairing of the next pass.
	pub fn medium_mut(&mut self) -> &mut M {
		&mut self.medium
	}

	#[must_use]
	pub fn into_medium(self) -> M {
		self.medium
	}

	/// Runs build, process and finalize for one pair of trees.
	///
	/// # Errors
	///
	/// [`ReconcileError::Build`] if `next` is malformed or too deep. The output is untouched in that case.
	///
	/// [`ReconcileError::Reentrant`] if another pass is committing on this thread,
	/// for example when an output medium callback calls back into a reconciler.
	#[instrument(skip_all)]
	pub fn reconcile(&mut self, previous: Option<&VNode>, next: &VNode, context: &ReconcileContext<'_>) -> Result<ReconcileResult, ReconcileError> {
		if is_committing() {
			warn!("Rejecting nested reconcile call.");
			return Err(ReconcileError::Reentrant);
		}

		let mut tree = build(previous, next, context)?;
		process(&mut tree);

		let _guard = CommitGuard::enter()?;
		let (result, mounted) = commit(&mut self.medium, &self.root, &mut tree, mem::take(&mut self.mounted));
		self.mounted = mounted;

		info!(
			inserted = result.inserted,
			updated = result.updated,
			moved = result.moved,
			deleted = result.deleted,
			diagnostics = result.diagnostics.len(),
			"Reconciled."
		);
		Ok(result)
	}

	/// Adopts output nodes that already render `previous` (for example server-rendered content),
	/// so that the next [`reconcile`](`Reconciler::reconcile`) reuses them.
	///
	/// Output children are paired with (non-excluded) VNodes by position. Elements, components and portals must
	/// match by tag, name or target, text nodes by content. At the first mismatch, the rest of that level is
	/// left unadopted and reported.
	#[instrument(skip_all)]
	pub fn hydrate(&mut self, previous: &VNode, context: &ReconcileContext<'_>) -> Vec<Diagnostic> {
		let mut diagnostics = Vec::new();
		let handles = self.medium.children(&self.root);
		let root_context = ReconcileContext { exclude_predicate: None, ..*context };
		self.mounted = adopt(&self.medium, &handles, slice::from_ref(previous), &VPath::root(), true, &root_context, &mut diagnostics);
		info!(adopted = self.mounted.iter().any(Option::is_some), diagnostics = diagnostics.len(), "Hydrated.");
		diagnostics
	}
}

fn adopt<M: OutputMedium>(
	medium: &M,
	handles: &[M::Handle],
	vnodes: &[VNode],
	parent_path: &VPath,
	is_top: bool,
	context: &ReconcileContext<'_>,
	diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Option<Mounted<M::Handle>>> {
	let mut mounted = Vec::new();
	let mut handles = handles.iter();
	for (index, vnode) in vnodes.iter().enumerate().filter(|(_, vnode)| !context.is_excluded(vnode)) {
		let path = if is_top { parent_path.clone() } else { parent_path.child(index) };
		let handle = match handles.next() {
			Some(handle) => handle,
			None => {
				warn!("Output ended before {} at {}.", vnode.kind(), path);
				diagnostics.push(Diagnostic::HydrationMismatch { path });
				break;
			}
		};

		let matches = match vnode {
			VNode::Text { text: expected, .. } => medium.text(handle).as_deref() == Some(expected.as_str()),
			VNode::Element { tag, .. } => medium.is_kind(handle, NodeKind::Element { tag }),
			VNode::Component { name, .. } => medium.is_kind(handle, NodeKind::Component { name }),
			VNode::Portal { target, .. } => medium.is_kind(handle, NodeKind::Portal { target }),
		};
		if !matches {
			warn!("Output node {:?} doesn't match {} at {}.", handle, vnode.kind(), path);
			diagnostics.push(Diagnostic::HydrationMismatch { path });
			break;
		}

		let children = adopt(medium, &medium.children(handle), vnode.children(), &path, false, context, diagnostics);
		mount(&mut mounted, index, Mounted { handle: handle.clone(), children });
	}
	mounted
}
