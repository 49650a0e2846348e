use crate::vnode::{VNodeKind, VPath};
use thiserror::Error;

/// Fatal problems found while building the work-in-progress tree.
///
/// Nothing has been written to the output medium when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
	#[error("malformed {kind} node at {path}: {reason}")]
	Malformed { kind: VNodeKind, path: VPath, reason: &'static str },

	#[error("depth limit of {limit} exceeded at {path}")]
	DepthLimit { limit: usize, path: VPath },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
	#[error(transparent)]
	Build(#[from] BuildError),

	/// Returned when `reconcile` is called (typically from an output medium callback) while another pass is committing on the same thread.
	#[error("reconcile was called while another reconcile pass was committing")]
	Reentrant,
}

/// A recoverable, unusual condition encountered during a pass.
///
/// These don't mean that the output is wrong. They're reported through [`ReconcileResult::diagnostics`](`crate::ReconcileResult::diagnostics`) and logged as warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
	/// A key appeared more than once in a children list. Later occurrences were matched as if unkeyed.
	DuplicateKey { key: String, path: VPath },

	/// A node's previous output node could not be found.
	/// Reused nodes are recreated in its place. Removals of it are skipped.
	ResolutionMiss { kind: VNodeKind, path: VPath },

	/// A text node without carried output reference was found again by its previous content.
	TextRelocated { path: VPath },

	/// Hydration stopped adopting output nodes at this path because the output didn't match.
	HydrationMismatch { path: VPath },
}
