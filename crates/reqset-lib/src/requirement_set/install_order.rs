//! Linearizes the dependency graph into an installation order.
//!
//! The order is topological, dependencies are installed before the requirements needing them.
//! Cycles are broken at whichever member is reached first, no other guarantee is made about the
//! order inside a cycle.

use std::collections::HashSet;

use super::DependencyGraph;
use super::RequirementId;

/// Requirements that never need installing, either already present or only a constraint.
fn is_skipped(graph: &DependencyGraph, id: RequirementId) -> bool {
	let requirement = &graph[id];
	requirement.satisfied_by.is_some() || requirement.constraint
}

/// Depth first post-order walk starting from each of `roots` in turn.
///
/// Roots are visited in the order given, so user supplied requirements install in the order
/// they were added except where a dependency has to come earlier.
pub fn schedule(graph: &DependencyGraph, roots: impl IntoIterator<Item = RequirementId>) -> Vec<RequirementId> {
	let mut order = Vec::<RequirementId>::new();
	let mut visited = HashSet::<RequirementId>::new();
	let mut stack = Vec::<(RequirementId, std::vec::IntoIter<RequirementId>)>::new();

	for root in roots {
		if visited.contains(&root) || is_skipped(graph, root) { continue; }
		visited.insert(root);
		stack.push((root, graph.dependencies(root).into_iter()));

		loop {
			let Some((node, dependencies)) = stack.last_mut() else { break };
			let node = *node;

			match dependencies.next() {
				Some(dep) => {
					/* A dependency already on the stack is part of a cycle, leaving it there breaks the cycle */
					if visited.contains(&dep) || is_skipped(graph, dep) { continue; }
					visited.insert(dep);
					stack.push((dep, graph.dependencies(dep).into_iter()));
				},
				None => {
					stack.pop();
					order.push(node);
				},
			}
		}
	}

	order
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::requirement::{Requirement, InstalledDistribution};

	fn graph_with(names: &[&str]) -> (DependencyGraph, Vec<RequirementId>) {
		let mut g = DependencyGraph::default();
		let ids = names.iter().map(|n| g.add_requirement(Requirement::new(*n))).collect();
		(g, ids)
	}

	fn position(order: &[RequirementId], id: RequirementId) -> usize {
		order.iter().position(|i| *i == id).expect("requirement missing from order")
	}

	#[test] fn dependencies_come_first() {
		let (mut g, ids) = graph_with(&["app", "lib"]);
		g.add_dependency(ids[0], ids[1]);
		assert_eq!(schedule(&g, ids.clone()), [ids[1], ids[0]]);
	}

	#[test] fn shared_dependency_is_emitted_once() {
		let (mut g, ids) = graph_with(&["a", "b", "shared"]);
		g.add_dependency(ids[0], ids[2]);
		g.add_dependency(ids[1], ids[2]);
		g.add_dependency(ids[1], ids[2]);
		let order = schedule(&g, ids.clone());
		assert_eq!(order, [ids[2], ids[0], ids[1]]);
	}

	#[test] fn roots_keep_their_order_when_unrelated() {
		let (g, ids) = graph_with(&["z", "y", "x"]);
		assert_eq!(schedule(&g, ids.clone()), ids);
	}

	#[test] fn satisfied_requirement_is_skipped_even_when_depended_on() {
		let (mut g, ids) = graph_with(&["app", "present", "below"]);
		g[ids[1]].satisfied_by = Some(InstalledDistribution::new("present", "1.0"));
		g.add_dependency(ids[0], ids[1]);
		g.add_dependency(ids[1], ids[2]);
		/* `below` is only reachable through the skipped node but is still a root */
		assert_eq!(schedule(&g, ids.clone()), [ids[0], ids[2]]);
	}

	#[test] fn constraint_is_skipped() {
		let (mut g, ids) = graph_with(&["app", "bound"]);
		g[ids[1]].constraint = true;
		g.add_dependency(ids[0], ids[1]);
		assert_eq!(schedule(&g, ids.clone()), [ids[0]]);
	}

	#[test] fn cycle_terminates_with_each_member_once() {
		let (mut g, ids) = graph_with(&["a", "b", "c"]);
		g.add_dependency(ids[0], ids[1]);
		g.add_dependency(ids[1], ids[2]);
		g.add_dependency(ids[2], ids[0]);
		let order = schedule(&g, ids.clone());
		assert_eq!(order.len(), 3);
		assert_eq!(order.iter().collect::<HashSet<_>>().len(), 3);
		/* The walk enters at `a`, so the cycle is broken there */
		assert_eq!(order, [ids[2], ids[1], ids[0]]);
	}

	#[test] fn self_dependency_terminates() {
		let (mut g, ids) = graph_with(&["a"]);
		g.add_dependency(ids[0], ids[0]);
		assert_eq!(schedule(&g, ids.clone()), [ids[0]]);
	}

	#[test] fn dag_is_topologically_ordered() {
		/*
		app -> web -> http -> sockets
		app -> db  -> sockets
		cli -> http
		*/
		let (mut g, ids) = graph_with(&["app", "cli", "web", "db", "http", "sockets"]);
		let [app, cli, web, db, http, sockets] = [ids[0], ids[1], ids[2], ids[3], ids[4], ids[5]];
		g.add_dependency(app, web);
		g.add_dependency(app, db);
		g.add_dependency(web, http);
		g.add_dependency(http, sockets);
		g.add_dependency(db, sockets);
		g.add_dependency(cli, http);

		let order = schedule(&g, ids.clone());
		assert_eq!(order.len(), 6);
		for (parent, child) in [(app, web), (app, db), (web, http), (http, sockets), (db, sockets), (cli, http)] {
			assert!(position(&order, child) < position(&order, parent));
		}
	}
}
