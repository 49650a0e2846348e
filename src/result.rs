use crate::{error::Diagnostic, wip::Priority};

/// What a reconcile pass did to the output medium.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileResult {
	/// Output nodes created and inserted, counting each node of a new subtree.
	pub inserted: usize,
	/// Output nodes whose text or attributes were written in place.
	pub updated: usize,
	/// Reused output nodes repositioned within their parent.
	pub moved: usize,
	/// Output subtrees removed. A removed subtree counts once.
	pub deleted: usize,
	/// Number of WIPs per priority, as classified before committing.
	pub by_priority: PriorityCounts,
	pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityCounts {
	pub high: usize,
	pub normal: usize,
	pub low: usize,
}

impl PriorityCounts {
	pub fn count(&mut self, priority: Priority) {
		match priority {
			Priority::High => self.high += 1,
			Priority::Normal => self.normal += 1,
			Priority::Low => self.low += 1,
		}
	}
}

impl ReconcileResult {
	/// Whether any mutation was applied.
	#[must_use]
	pub fn any_work(&self) -> bool {
		self.total() > 0
	}

	/// Total number of applied operations.
	#[must_use]
	pub fn total(&self) -> usize {
		self.inserted + self.updated + self.moved + self.deleted
	}

	pub fn merge(&mut self, other: &ReconcileResult) {
		self.inserted += other.inserted;
		self.updated += other.updated;
		self.moved += other.moved;
		self.deleted += other.deleted;
		self.by_priority.high += other.by_priority.high;
		self.by_priority.normal += other.by_priority.normal;
		self.by_priority.low += other.by_priority.low;
		self.diagnostics.extend(other.diagnostics.iter().cloned());
	}
}
