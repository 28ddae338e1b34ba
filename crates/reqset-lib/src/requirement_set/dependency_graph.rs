//! Owns every admitted requirement as a node, edges point from a requirement to its dependencies.

use petgraph::prelude::*;

use crate::requirement::Requirement;
use super::RequirementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeData {
	/// Position among all recorded edges, `petgraph` doesn't keep edges in insertion order.
	pub order: usize,
}

#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
	graph: StableDiGraph<Requirement, EdgeData>,
	next_edge: usize,
}

impl DependencyGraph {
	pub fn add_requirement(&mut self, requirement: Requirement) -> RequirementId {
		RequirementId(self.graph.add_node(requirement))
	}

	/// Records that `parent` depends on `dependency`.
	///
	/// Adding the same edge twice is allowed, it has no effect on install order.
	pub fn add_dependency(&mut self, parent: RequirementId, dependency: RequirementId) {
		log::trace!("Recording dependency {} -> {}", self.graph[parent.0].display_name(), self.graph[dependency.0].display_name());
		self.graph.add_edge(parent.0, dependency.0, EdgeData { order: self.next_edge });
		self.next_edge += 1;
	}

	/// Direct dependencies of `id` in the order they were recorded.
	pub fn dependencies(&self, id: RequirementId) -> Vec<RequirementId> {
		let mut edges: Vec<_> = self.graph.edges_directed(id.0, Outgoing)
			.map(|e| (e.weight().order, RequirementId(e.target())))
			.collect();
		edges.sort_by_key(|(order, _)| *order);
		edges.into_iter().map(|(_, target)| target).collect()
	}

	/// Requirements that depend on `id`, in no particular order.
	pub fn dependants(&self, id: RequirementId) -> Vec<RequirementId> {
		self.graph.neighbors_directed(id.0, Incoming).map(RequirementId).collect()
	}

	pub fn get(&self, id: RequirementId) -> Option<&Requirement> {
		self.graph.node_weight(id.0)
	}

	/// Removes a requirement and any edges touching it, other ids stay valid.
	pub fn remove(&mut self, id: RequirementId) -> Option<Requirement> {
		self.graph.remove_node(id.0)
	}
}

impl std::ops::Index<RequirementId> for DependencyGraph {
	type Output = Requirement;
	fn index(&self, index: RequirementId) -> &Self::Output {
		&self.graph[index.0]
	}
}

impl std::ops::IndexMut<RequirementId> for DependencyGraph {
	fn index_mut(&mut self, index: RequirementId) -> &mut Self::Output {
		&mut self.graph[index.0]
	}
}
