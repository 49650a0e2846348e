#![doc(html_root_url = "https://docs.rs/vnode-reconciler/0.0.3")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! A staged virtual-tree reconciler.
//!
//! Each [`Reconciler::reconcile`] call runs three phases:
//!
//! 1. **Build** ([`build()`]) pairs the previous and next [`VNode`] trees into a [`WipTree`],
//!    matching siblings by key first and by position second.
//! 2. **Process** ([`process()`]) classifies each WIP's [`ChangeSet`] and with it its [`Priority`].
//! 3. **Finalize** applies the changes to an [`OutputMedium`], exactly once per node.
//!
//! Only the last phase touches the output. If the first one fails, nothing was written.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod build;
mod children;
mod commit;
mod context;
mod error;
mod medium;
mod process;
mod reconciler;
mod result;
mod vnode;
mod wip;

pub mod memory;

#[cfg(feature = "dom")]
pub mod dom;
#[cfg(feature = "dom")]
pub mod load;

pub use build::build;
pub use context::ReconcileContext;
pub use error::{BuildError, Diagnostic, ReconcileError};
pub use medium::{NodeKind, OutputMedium};
pub use process::process;
pub use reconciler::{is_committing, Reconciler};
pub use result::{PriorityCounts, ReconcileResult};
pub use vnode::{Attributes, VNode, VNodeKind, VPath};
pub use wip::{AttributePatch, ChangeSet, CommitState, OutputRef, Priority, WipFlags, WipId, WipTree, WorkInProgress};

/// Text and attribute values only show up in logs with the `dangerous-logging` feature.
pub(crate) fn loggable(value: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		value
	} else {
		"<redacted>"
	}
}
