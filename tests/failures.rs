use vnode_reconciler::{
	is_committing,
	memory::{MemoryTree, NodeId},
	BuildError, Diagnostic, NodeKind, OutputMedium, ReconcileContext, ReconcileError, ReconcileResult, Reconciler, VNode, VNodeKind,
};

use support_::{init_logging, markup, memory_reconciler};

#[test]
fn malformed_tree_leaves_output_untouched() {
	let mut reconciler = memory_reconciler();
	let context = ReconcileContext::new();
	let valid = VNode::element("div").with_child(VNode::text("kept"));
	reconciler.reconcile(None, &valid, &context).unwrap();
	reconciler.medium_mut().take_log();

	let malformed = VNode::element("div").with_children(vec![VNode::text("changed"), VNode::component("")]);
	assert_eq!(
		reconciler.reconcile(Some(&valid), &malformed, &context).unwrap_err(),
		ReconcileError::Build(BuildError::Malformed {
			kind: VNodeKind::Component,
			path: vec![1].into(),
			reason: "component without name",
		})
	);
	assert!(reconciler.medium().log().is_empty());
	assert_eq!(markup(&reconciler), "<div>kept</div>");

	// The failed pass didn't disturb the carried output references.
	let result = reconciler.reconcile(Some(&valid), &VNode::element("div").with_child(VNode::text("new")), &context).unwrap();
	assert_eq!((result.inserted, result.updated), (0, 1));
	assert_eq!(markup(&reconciler), "<div>new</div>");
}

#[test]
fn empty_portal_target_is_malformed() {
	let mut reconciler = memory_reconciler();
	let error = reconciler.reconcile(None, &VNode::portal(""), &ReconcileContext::new()).unwrap_err();
	assert!(matches!(error, ReconcileError::Build(BuildError::Malformed { kind: VNodeKind::Portal, .. })));
	assert!(reconciler.medium().log().is_empty());
}

#[test]
fn depth_limit() {
	let mut reconciler = memory_reconciler();
	let deep = (0..10).fold(VNode::text("leaf"), |child, _| VNode::element("div").with_child(child));

	let error = reconciler.reconcile(None, &deep, &ReconcileContext::new().with_depth_limit(4)).unwrap_err();
	assert!(matches!(error, ReconcileError::Build(BuildError::DepthLimit { limit: 4, .. })));
	assert!(reconciler.medium().log().is_empty());

	let result = reconciler.reconcile(None, &deep, &ReconcileContext::new()).unwrap();
	assert_eq!(result.inserted, 11);
}

/// Tries to start a second pass from inside the first one's commit.
struct Reentering {
	tree: MemoryTree,
	nested: Reconciler<MemoryTree>,
	outcome: Option<(bool, Result<ReconcileResult, ReconcileError>)>,
}

impl OutputMedium for Reentering {
	type Handle = NodeId;

	fn create_node(&mut self, kind: NodeKind<'_>) -> NodeId {
		self.tree.create_node(kind)
	}

	fn set_text(&mut self, node: &NodeId, text: &str) {
		self.tree.set_text(node, text)
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		self.tree.set_attribute(node, name, value)
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		self.tree.remove_attribute(node, name)
	}

	fn insert_before(&mut self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) {
		if self.outcome.is_none() {
			let nested = self.nested.reconcile(None, &VNode::text("nested"), &ReconcileContext::new());
			self.outcome = Some((is_committing(), nested));
		}
		self.tree.insert_before(parent, node, reference)
	}

	fn remove(&mut self, parent: &NodeId, node: &NodeId) {
		self.tree.remove(parent, node)
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.tree.parent(node)
	}

	fn children(&self, parent: &NodeId) -> Vec<NodeId> {
		self.tree.children(parent)
	}

	fn text(&self, node: &NodeId) -> Option<String> {
		self.tree.text(node)
	}

	fn is_kind(&self, node: &NodeId, kind: NodeKind<'_>) -> bool {
		self.tree.is_kind(node, kind)
	}
}

#[test]
fn nested_reconcile_is_rejected() {
	init_logging();
	let tree = MemoryTree::new();
	let root = tree.root();
	let medium = Reentering {
		tree,
		nested: memory_reconciler(),
		outcome: None,
	};
	let mut reconciler = Reconciler::new(medium, root);
	let context = ReconcileContext::new();

	let vdom = VNode::element("p").with_child(VNode::text("outer"));
	let result = reconciler.reconcile(None, &vdom, &context).unwrap();
	assert_eq!(result.inserted, 2);
	assert!(!is_committing());

	let (was_committing, nested) = reconciler.medium_mut().outcome.take().unwrap();
	assert!(was_committing);
	assert_eq!(nested.unwrap_err(), ReconcileError::Reentrant);
	assert!(reconciler.medium().nested.medium().log().is_empty());

	// Both work normally once nothing is committing.
	let next = VNode::element("p").with_child(VNode::text("again"));
	assert_eq!(reconciler.reconcile(Some(&vdom), &next, &context).unwrap().updated, 1);
	let nested = &mut reconciler.medium_mut().nested;
	assert_eq!(nested.reconcile(None, &VNode::text("nested"), &context).unwrap().inserted, 1);
	assert_eq!(markup(nested), "nested");
}

#[test]
fn other_threads_are_not_blocked() {
	struct Spawning {
		tree: MemoryTree,
		outcome: Option<(bool, bool)>,
	}

	impl OutputMedium for Spawning {
		type Handle = NodeId;

		fn create_node(&mut self, kind: NodeKind<'_>) -> NodeId {
			self.tree.create_node(kind)
		}

		fn set_text(&mut self, node: &NodeId, text: &str) {
			self.tree.set_text(node, text)
		}

		fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
			self.tree.set_attribute(node, name, value)
		}

		fn remove_attribute(&mut self, node: &NodeId, name: &str) {
			self.tree.remove_attribute(node, name)
		}

		fn insert_before(&mut self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) {
			if self.outcome.is_none() {
				let elsewhere = std::thread::spawn(|| {
					let mut reconciler = memory_reconciler();
					let committing = is_committing();
					(committing, reconciler.reconcile(None, &VNode::text("elsewhere"), &ReconcileContext::new()).is_ok())
				});
				self.outcome = elsewhere.join().ok();
			}
			self.tree.insert_before(parent, node, reference)
		}

		fn remove(&mut self, parent: &NodeId, node: &NodeId) {
			self.tree.remove(parent, node)
		}

		fn parent(&self, node: &NodeId) -> Option<NodeId> {
			self.tree.parent(node)
		}

		fn children(&self, parent: &NodeId) -> Vec<NodeId> {
			self.tree.children(parent)
		}

		fn text(&self, node: &NodeId) -> Option<String> {
			self.tree.text(node)
		}

		fn is_kind(&self, node: &NodeId, kind: NodeKind<'_>) -> bool {
			self.tree.is_kind(node, kind)
		}
	}

	init_logging();
	let tree = MemoryTree::new();
	let root = tree.root();
	let mut reconciler = Reconciler::new(Spawning { tree, outcome: None }, root);
	reconciler.reconcile(None, &VNode::text("here"), &ReconcileContext::new()).unwrap();

	assert_eq!(reconciler.medium().outcome, Some((false, true)));
}

#[test]
fn resolution_miss_recreates() {
	let mut reconciler = memory_reconciler();
	let context = ReconcileContext::new();
	reconciler.reconcile(None, &VNode::element("div").with_child(VNode::element("span")), &context).unwrap();

	// Claims an `<em>` that was never rendered.
	let claimed = VNode::element("div").with_children(vec![VNode::element("span"), VNode::element("em")]);
	let result = reconciler.reconcile(Some(&claimed), &claimed, &context).unwrap();

	assert_eq!(
		result.diagnostics,
		[Diagnostic::ResolutionMiss {
			kind: VNodeKind::Element,
			path: vec![1].into()
		}]
	);
	assert_eq!((result.inserted, result.deleted), (1, 0));
	assert_eq!(markup(&reconciler), "<div><span></span><em></em></div>");

	// Carried normally from here on.
	let result = reconciler.reconcile(Some(&claimed), &claimed, &context).unwrap();
	assert!(result.diagnostics.is_empty());
	assert!(!result.any_work());
}

#[test]
fn missing_removal_is_skipped() {
	let mut reconciler = memory_reconciler();
	let context = ReconcileContext::new();
	let rendered = VNode::element("div").with_child(VNode::element("span"));
	reconciler.reconcile(None, &rendered, &context).unwrap();
	reconciler.medium_mut().take_log();

	let claimed = VNode::element("div").with_children(vec![VNode::element("span"), VNode::element("em")]);
	let result = reconciler.reconcile(Some(&claimed), &rendered, &context).unwrap();

	assert_eq!(
		result.diagnostics,
		[Diagnostic::ResolutionMiss {
			kind: VNodeKind::Element,
			path: vec![1].into()
		}]
	);
	assert_eq!(result.deleted, 0);
	assert!(reconciler.medium().log().is_empty());
	assert_eq!(markup(&reconciler), "<div><span></span></div>");
}
