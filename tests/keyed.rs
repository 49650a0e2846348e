use vnode_reconciler::{
	memory::{MemoryKind, MemoryTree, Mutation, NodeId},
	ReconcileContext, Reconciler, VNode,
};

use support_::{markup, memory_reconciler};

fn list(keys: &[&str]) -> VNode {
	VNode::element("ul").with_children(keys.iter().map(|key| VNode::element("li").with_key(*key).with_child(VNode::text(*key))))
}

/// Renders `previous`, then reconciles to `next`, with a clean log in between.
fn rerender(previous: &VNode, next: &VNode) -> (Reconciler<MemoryTree>, Vec<NodeId>, vnode_reconciler::ReconcileResult) {
	let mut reconciler = memory_reconciler();
	let context = ReconcileContext::new();
	reconciler.reconcile(None, previous, &context).unwrap();
	let before = rendered_children(&reconciler);
	reconciler.medium_mut().take_log();

	let result = reconciler.reconcile(Some(previous), next, &context).unwrap();
	assert!(result.diagnostics.is_empty());
	(reconciler, before, result)
}

fn top(reconciler: &Reconciler<MemoryTree>) -> NodeId {
	let tree = reconciler.medium();
	tree.node(tree.root()).unwrap().children[0]
}

fn rendered_children(reconciler: &Reconciler<MemoryTree>) -> Vec<NodeId> {
	reconciler.medium().node(top(reconciler)).unwrap().children.clone()
}

#[test]
fn insert_in_the_middle() {
	let (reconciler, before, result) = rerender(&list(&["a", "c"]), &list(&["a", "b", "c"]));
	assert_eq!((result.inserted, result.moved, result.deleted), (2, 0, 0));

	let after = rendered_children(&reconciler);
	assert_eq!((after[0], after[2]), (before[0], before[1]));
	let ul = top(&reconciler);
	assert!(reconciler.medium().log().contains(&Mutation::InsertBefore {
		parent: ul,
		node: after[1],
		reference: Some(before[1]),
	}));
	assert_eq!(markup(&reconciler), "<ul><li>a</li><li>b</li><li>c</li></ul>");
}

#[test]
fn removal() {
	let (reconciler, before, result) = rerender(&list(&["a", "b", "c"]), &list(&["a", "c"]));
	assert_eq!((result.inserted, result.moved, result.deleted), (0, 0, 1));
	assert_eq!(
		reconciler.medium().log(),
		[Mutation::Remove {
			parent: top(&reconciler),
			node: before[1]
		}]
	);
	assert_eq!(rendered_children(&reconciler), [before[0], before[2]]);
}

#[test]
fn reversal() {
	let (reconciler, before, result) = rerender(&list(&["1", "2", "3", "4"]), &list(&["4", "3", "2", "1"]));
	assert_eq!((result.inserted, result.moved, result.deleted), (0, 3, 0));
	assert_eq!(reconciler.medium().count(Mutation::is_create), 0);

	let mut reversed = before;
	reversed.reverse();
	assert_eq!(rendered_children(&reconciler), reversed);
}

#[test]
fn keyed_and_unkeyed_siblings_swap() {
	let previous = VNode::element("ul").with_children(vec![VNode::element("li").with_key("a"), VNode::element("li")]);
	let next = VNode::element("ul").with_children(vec![VNode::element("li"), VNode::element("li").with_key("a")]);

	let (reconciler, before, result) = rerender(&previous, &next);
	assert_eq!((result.inserted, result.moved, result.deleted), (0, 1, 0));
	assert_eq!(rendered_children(&reconciler), [before[1], before[0]]);
}

#[test]
fn key_change_recreates() {
	let (reconciler, before, result) = rerender(&list(&["a"]), &list(&["b"]));
	assert_eq!((result.inserted, result.moved, result.deleted), (2, 0, 1));
	assert_ne!(rendered_children(&reconciler), before);
	assert_eq!(markup(&reconciler), "<ul><li>b</li></ul>");
}

#[test]
fn component_name_change_recreates() {
	let previous = VNode::element("main").with_child(VNode::component("Header"));
	let next = VNode::element("main").with_child(VNode::component("Footer"));

	let (reconciler, before, result) = rerender(&previous, &next);
	assert_eq!((result.inserted, result.updated, result.deleted), (1, 0, 1));
	assert_ne!(rendered_children(&reconciler), before);
	assert_eq!(markup(&reconciler), "<main><Footer></Footer></main>");
}

#[test]
fn portal_target_change_recreates() {
	let previous = VNode::element("main").with_child(VNode::portal("modal").with_child(VNode::text("hi")));
	let next = VNode::element("main").with_child(VNode::portal("toast").with_child(VNode::text("hi")));

	let (reconciler, _, result) = rerender(&previous, &next);
	assert_eq!((result.inserted, result.deleted), (2, 1));

	let portal = rendered_children(&reconciler)[0];
	assert_eq!(reconciler.medium().node(portal).unwrap().kind, MemoryKind::Portal("toast".to_owned()));
	assert_eq!(markup(&reconciler), "<main><#toast>hi</#toast></main>");
}

#[test]
fn component_attributes_are_patched() {
	let previous = VNode::element("main").with_child(VNode::component("Card").with_attribute("title", "x").with_attribute("old", "1"));
	let next = VNode::element("main").with_child(VNode::component("Card").with_attribute("title", "y").with_attribute("new", "2"));

	let (reconciler, before, result) = rerender(&previous, &next);
	assert_eq!((result.inserted, result.updated, result.deleted), (0, 1, 0));

	let card = before[0];
	assert_eq!(
		reconciler.medium().log(),
		[
			Mutation::RemoveAttribute {
				node: card,
				name: "old".to_owned()
			},
			Mutation::SetAttribute {
				node: card,
				name: "new".to_owned(),
				value: "2".to_owned()
			},
			Mutation::SetAttribute {
				node: card,
				name: "title".to_owned(),
				value: "y".to_owned()
			},
		]
	);
	assert_eq!(markup(&reconciler), "<main><Card new=\"2\" title=\"y\"></Card></main>");
}
