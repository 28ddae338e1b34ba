use std::collections::HashSet;

use reqset::requirement::InstalledDistribution;
use reqset::{RequirementId, RequirementSet};
use reqset_test_utils::*;

/// Adds `name` under `parent`, returning its id.
fn add(set: &mut RequirementSet, name: &str, parent: Option<&str>) -> RequirementId {
	set.add_requirement(requirement(name), parent, &[])
		.unwrap_or_else(|e| panic!("failed to add {name}: {e}"))
		.id()
		.expect("requirement was filtered")
}

fn names(set: &RequirementSet, order: &[RequirementId]) -> Vec<String> {
	order.iter().map(|id| set.requirement(*id).unwrap().display_name().to_owned()).collect()
}

#[test]
fn dependencies_install_before_dependants() {
	init_logging();
	/*
	webapp -> framework -> templates -> markupsafe
	webapp -> orm -> driver
	framework -> markupsafe
	cli -> framework
	cli -> colors
	*/
	let mut set = RequirementSet::default();
	add(&mut set, "webapp", None);
	add(&mut set, "cli", None);
	add(&mut set, "framework", Some("webapp"));
	add(&mut set, "orm", Some("webapp"));
	add(&mut set, "templates", Some("framework"));
	add(&mut set, "markupsafe", Some("templates"));
	add(&mut set, "markupsafe", Some("framework"));
	add(&mut set, "driver", Some("orm"));
	add(&mut set, "framework", Some("cli"));
	add(&mut set, "colors", Some("cli"));

	let order = names(&set, &set.install_order());
	assert_eq!(order.len(), 8);
	assert_eq!(order.iter().collect::<HashSet<_>>().len(), 8);

	let position = |n: &str| order.iter().position(|o| o == n).unwrap();
	for (parent, child) in [
		("webapp", "framework"),
		("webapp", "orm"),
		("framework", "templates"),
		("templates", "markupsafe"),
		("framework", "markupsafe"),
		("orm", "driver"),
		("cli", "framework"),
		("cli", "colors"),
	] {
		assert!(position(child) < position(parent), "{child} should install before {parent}, got {order:?}");
	}
}

#[test]
fn user_requirements_keep_their_order() {
	let mut set = RequirementSet::default();
	add(&mut set, "first", None);
	add(&mut set, "second", None);
	add(&mut set, "third", None);
	add(&mut set, "helper", Some("second"));

	assert_eq!(names(&set, &set.install_order()), ["first", "helper", "second", "third"]);
}

#[test]
fn satisfied_and_constraints_are_left_out() {
	let mut set = RequirementSet::default();
	add(&mut set, "app", None);
	set.add_requirement(
		requirement("present").with_satisfied_by(InstalledDistribution::new("present", "2.0")),
		Some("app"),
		&[],
	).unwrap();
	set.add_requirement(requirement("bound<2").as_constraint(), None, &[]).unwrap();
	/* A dependency of an unpromoted constraint is still reachable from the graph */
	add(&mut set, "lib", Some("bound"));
	add(&mut set, "lib", Some("app"));

	let order = names(&set, &set.install_order());
	assert_eq!(order, ["lib", "app"]);
}

#[test]
fn promoted_constraint_is_installed() {
	let mut set = RequirementSet::default();
	set.add_requirement(requirement("bound<2").as_constraint(), None, &[]).unwrap();
	add(&mut set, "app", None);
	add(&mut set, "bound", Some("app"));

	assert_eq!(names(&set, &set.install_order()), ["bound", "app"]);
}

#[test]
fn cycle_terminates() {
	init_logging();
	let mut set = RequirementSet::default();
	add(&mut set, "A", None);
	add(&mut set, "B", Some("A"));
	add(&mut set, "C", Some("B"));
	add(&mut set, "A", Some("C"));

	let order = names(&set, &set.install_order());
	assert_eq!(order.len(), 3);
	assert_eq!(order.iter().collect::<HashSet<_>>().len(), 3);
	/* Entering through A breaks the cycle at A */
	assert_eq!(order, ["C", "B", "A"]);
}

#[test]
fn unnamed_requirements_are_scheduled_last() {
	let mut set = RequirementSet::default();
	let url = set.add_requirement(
		reqset::Requirement::unnamed(reqset::requirement::Link::new("https://git.example/tool.zip")),
		None,
		&[],
	).unwrap().id().unwrap();
	let named = add(&mut set, "named", None);

	assert_eq!(set.install_order(), [named, url]);
}
