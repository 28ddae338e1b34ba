//! The set of requirements to be installed.
//!
//! # Usage
//! 1. Create a [`RequirementSet`] with the [`RequirementSetOptions`] for this run.
//! 1. Add every user supplied requirement with [`RequirementSet::add_requirement()`] and no parent.
//! 1. Expand every id returned by [`Admission::to_scan()`], adding its dependencies with the expanded
//! requirement named as their parent, until nothing is left to scan.
//! 1. [`RequirementSet::install()`] to install everything in dependency order.
//! 1. [`RequirementSet::cleanup_files()`] to remove temporary sources of rejected requirements.

use crate::config::RequirementSetOptions;
use crate::requirement::Requirement;
use crate::Error;

mod requirements;
pub use requirements::Requirements;
mod dependency_graph;
use dependency_graph::DependencyGraph;
mod install_order;
mod install;

/// Handle to a requirement owned by a [`RequirementSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequirementId(petgraph::graph::NodeIndex);

/// What [`RequirementSet::add_requirement()`] did with a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
	/// The markers don't apply to this environment, the requirement was dropped.
	Filtered,
	/// First time this requirement was seen, it needs scanning for dependencies.
	Added(RequirementId),
	/// An existing constraint became a real requirement, it needs scanning since its extras may have grown.
	Promoted(RequirementId),
	/// Merged into an existing requirement which has already been scanned.
	Merged(RequirementId),
}

impl Admission {
	/// Requirements the caller still has to expand.
	pub fn to_scan(&self) -> Vec<RequirementId> {
		match self {
			Admission::Added(id) | Admission::Promoted(id) => vec![*id],
			Admission::Filtered | Admission::Merged(_) => vec![],
		}
	}

	/// The requirement now standing for the admitted one.
	pub fn id(&self) -> Option<RequirementId> {
		match self {
			Admission::Added(id) | Admission::Promoted(id) | Admission::Merged(id) => Some(*id),
			Admission::Filtered => None,
		}
	}
}

/// A requirement whose temporary source should be removed by [`RequirementSet::cleanup_files()`].
#[derive(Debug)]
enum CleanupEntry {
	Registered(RequirementId),
	/// Rejected or merged away, no longer part of the graph.
	Discarded(Requirement),
}

#[derive(Debug, Default)]
pub struct RequirementSet {
	options: RequirementSetOptions,
	requirements: Requirements,
	unnamed_requirements: Vec<RequirementId>,
	graph: DependencyGraph,
	reqs_to_cleanup: Vec<CleanupEntry>,
	successfully_installed: Vec<RequirementId>,
}

impl RequirementSet {
	pub fn new(options: RequirementSetOptions) -> Self {
		Self {
			options,
			..Default::default()
		}
	}

	pub fn options(&self) -> &RequirementSetOptions {
		&self.options
	}

	/// Adds `requirement` to the set.
	///
	/// # Arguments
	/// - `parent_name`: the requirement that needed this one, it must already be in the set.
	/// `None` means the requirement was supplied by the user.
	/// - `extras_requested`: extras used to evaluate the environment markers.
	///
	/// # Errors
	/// - [`Error::UnsupportedWheel`] when the requirement installs from a wheel not built for this platform.
	/// - [`Error::DoubleRequirement`] when two user supplied requirements disagree on the version.
	/// - [`Error::ConstraintConflict`] when a constraint would be installed from a path or url.
	/// - [`Error::NotFound`] when `parent_name` isn't in the set.
	///
	/// Apart from a constraint conflict marking the rejected requirement for cleanup, none of these
	/// leave the set modified.
	pub fn add_requirement(&mut self, mut requirement: Requirement, parent_name: Option<&str>, extras_requested: &[String]) -> crate::Result<Admission> {
		if !requirement.match_markers(extras_requested) {
			log::warn!(
				"Ignoring {}: markers '{}' don't match your environment",
				requirement.display_name(),
				requirement.markers.as_ref().map(|m| m.to_string()).unwrap_or_default(),
			);
			return Ok(Admission::Filtered);
		}

		/* Has to come after the marker check so irrelevant wheels are never rejected */
		if let Some(wheel) = requirement.wheel() {
			let wheel = wheel?;
			if !wheel.supported(self.options.supported_tags()) {
				return Err(Error::UnsupportedWheel(wheel.filename));
			}
		}

		requirement.use_user_site = self.options.use_user_site();
		requirement.target_dir = self.options.target_dir().map(ToOwned::to_owned);
		requirement.pycompile = self.options.pycompile();
		requirement.is_direct = parent_name.is_none();

		let Some(name) = requirement.name.clone() else {
			/* url or path requirement without a name */
			let id = self.graph.add_requirement(requirement);
			self.unnamed_requirements.push(id);
			return Ok(Admission::Added(id));
		};

		let parent = parent_name.map(|p| self.requirements.get(p)).transpose()?;
		let existing = self.check_double_requirement(&requirement, &name)?;

		let admission = match existing {
			None => {
				let id = self.graph.add_requirement(requirement);
				self.requirements.insert(name, id);
				Admission::Added(id)
			},
			Some(existing) => self.merge_into(existing, requirement, &name)?,
		};

		if let (Some(parent), Some(id)) = (parent, admission.id()) {
			self.graph.add_dependency(parent, id);
		}

		Ok(admission)
	}

	/// Finds the requirement already registered as `name`, rejecting `requirement` if both are
	/// user supplied and ask for different versions.
	fn check_double_requirement(&self, requirement: &Requirement, name: &str) -> crate::Result<Option<RequirementId>> {
		let Ok(existing) = self.requirements.get(name) else { return Ok(None) };
		let existing_req = &self.graph[existing];

		if requirement.is_direct
			&& !existing_req.constraint
			&& existing_req.extras == requirement.extras
			&& existing_req.specifier != requirement.specifier
		{
			return Err(Error::DoubleRequirement {
				given: requirement.to_string(),
				existing: existing_req.to_string(),
				name: name.to_owned(),
			});
		}

		Ok(Some(existing))
	}

	/// Folds a repeated `requirement` into `existing`, the repeat itself is dropped.
	fn merge_into(&mut self, existing: RequirementId, requirement: Requirement, name: &str) -> crate::Result<Admission> {
		let existing_req = &mut self.graph[existing];

		/* Assume there's no need to scan, we've already encountered this for scanning */
		if requirement.constraint || !existing_req.constraint {
			return Ok(Admission::Merged(existing));
		}

		if existing_req.link_conflicts_with(&requirement) {
			self.reqs_to_cleanup.push(CleanupEntry::Discarded(requirement));
			return Err(Error::ConstraintConflict(name.to_owned()));
		}

		existing_req.promote(&requirement);
		log::debug!("Setting {} extras to: {:?}", existing_req, existing_req.extras);
		Ok(Admission::Promoted(existing))
	}

	/// Names a requirement that was added without one, now that it has been unpacked.
	///
	/// It keeps whether it was user supplied or a dependency. If a requirement named `name` already
	/// exists the two are merged and the unnamed one is removed from the set, its temporary source is
	/// marked for cleanup.
	pub fn resolve_unnamed(&mut self, id: RequirementId, name: impl Into<String>) -> crate::Result<Admission> {
		let name = name.into();
		let position = self.unnamed_requirements.iter()
			.position(|u| *u == id)
			.ok_or_else(|| Error::NotFound(name.clone()))?;

		let mut named = self.graph[id].clone();
		named.name = Some(name.clone());
		let existing = self.check_double_requirement(&named, &name)?;

		self.unnamed_requirements.remove(position);
		match existing {
			None => {
				self.graph[id] = named;
				self.requirements.insert(name, id);
				Ok(Admission::Added(id))
			},
			Some(existing) => {
				self.graph.remove(id);
				log::trace!("Merging unnamed requirement into {}", name);
				let admission = self.merge_into(existing, named.clone(), &name)?;
				self.reqs_to_cleanup.push(CleanupEntry::Discarded(named));
				Ok(admission)
			},
		}
	}

	/// Does the set install `project_name`, constraints don't count.
	pub fn has_requirement(&self, project_name: &str) -> bool {
		let name = project_name.to_lowercase();
		[self.requirements.get_exact(&name), self.requirements.get_alias(&name)].into_iter()
			.flatten()
			.any(|id| !self.graph[id].constraint)
	}

	/// Is there anything to install at all.
	pub fn has_requirements(&self) -> bool {
		self.requirements.values().any(|id| !self.graph[id].constraint) || !self.unnamed_requirements.is_empty()
	}

	/// Checks the download directory, `false` when none was configured.
	pub fn is_download(&self) -> crate::Result<bool> {
		let Some(download_dir) = self.options.download_dir() else { return Ok(false) };
		if download_dir.exists() {
			Ok(true)
		} else {
			log::error!("Could not find download directory");
			Err(Error::DownloadDirectory(crate::display_path(download_dir)))
		}
	}

	pub fn get_requirement_id(&self, name: &str) -> crate::Result<RequirementId> {
		self.requirements.get(name)
	}

	/// Looks up a requirement by name ignoring case.
	pub fn get_requirement(&self, name: &str) -> crate::Result<&Requirement> {
		Ok(&self.graph[self.requirements.get(name)?])
	}

	/// `None` if `id` was removed by [`RequirementSet::resolve_unnamed()`].
	pub fn requirement(&self, id: RequirementId) -> Option<&Requirement> {
		self.graph.get(id)
	}

	pub fn requirements(&self) -> &Requirements {
		&self.requirements
	}

	pub fn unnamed_requirements(&self) -> &[RequirementId] {
		&self.unnamed_requirements
	}

	/// Dependencies recorded for `id`, in the order they were added.
	pub fn dependencies(&self, id: RequirementId) -> Vec<RequirementId> {
		self.graph.dependencies(id)
	}

	/// Requirements that recorded `id` as a dependency.
	pub fn dependants(&self, id: RequirementId) -> Vec<RequirementId> {
		self.graph.dependants(id)
	}

	/// Requirements installed by the last [`RequirementSet::install()`], even if it failed part way.
	pub fn successfully_installed(&self) -> &[RequirementId] {
		&self.successfully_installed
	}

	/// Requirements in the order they should be installed.
	///
	/// Already satisfied requirements and constraints are left out.
	pub fn install_order(&self) -> Vec<RequirementId> {
		let roots = self.requirements.values().chain(self.unnamed_requirements.iter().copied());
		install_order::schedule(&self.graph, roots)
	}

	/// Has the temporary source of `id` removed by [`RequirementSet::cleanup_files()`].
	pub fn mark_for_cleanup(&mut self, id: RequirementId) {
		self.reqs_to_cleanup.push(CleanupEntry::Registered(id));
	}

	/// Removes the temporary sources of everything marked for cleanup.
	pub fn cleanup_files(&mut self, installer: &mut dyn crate::installer::Installer) -> crate::Result<()> {
		log::debug!("Cleaning up...");
		for entry in &self.reqs_to_cleanup {
			let requirement = match entry {
				CleanupEntry::Registered(id) => match self.graph.get(*id) {
					Some(r) => r,
					None => continue,
				},
				CleanupEntry::Discarded(r) => r,
			};
			installer.remove_temporary_source(requirement).map_err(|source| Error::Cleanup {
				name: requirement.display_name().to_owned(),
				source,
			})?;
		}
		self.reqs_to_cleanup.clear();
		Ok(())
	}

	/// Debugging overview listing every named requirement.
	pub fn summary(&self) -> String {
		let mut reqs: Vec<&Requirement> = self.requirements.values().map(|id| &self.graph[id]).collect();
		reqs.sort_by_key(|r| r.display_name().to_lowercase());
		format!(
			"<RequirementSet object; {} requirement(s): {}>",
			reqs.len(),
			reqs.iter().map(|r| r.requirement_line()).collect::<Vec<_>>().join(", "),
		)
	}
}

/// User supplied requirements sorted by name.
impl std::fmt::Display for RequirementSet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut reqs: Vec<&Requirement> = self.requirements.values()
			.map(|id| &self.graph[id])
			.filter(|r| r.is_direct)
			.collect();
		reqs.sort_by_key(|r| r.display_name().to_lowercase());
		write!(f, "{}", reqs.iter().map(|r| r.requirement_line()).collect::<Vec<_>>().join(" "))
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::requirement::{Link, InstalledDistribution};

	fn add(set: &mut RequirementSet, req: &str, parent: Option<&str>) -> crate::Result<Admission> {
		set.add_requirement(Requirement::parse(req).unwrap(), parent, &[])
	}

	#[test] fn first_occurrence_is_scanned() {
		let mut set = RequirementSet::default();
		let admission = add(&mut set, "pkg==1.0", None).unwrap();
		assert!(matches!(admission, Admission::Added(_)));
		assert_eq!(admission.to_scan().len(), 1);
	}

	#[test] fn repeat_is_not_scanned() {
		let mut set = RequirementSet::default();
		add(&mut set, "app", None).unwrap();
		let first = add(&mut set, "pkg", Some("app")).unwrap();
		let second = add(&mut set, "pkg", Some("app")).unwrap();
		assert_eq!(second, Admission::Merged(first.id().unwrap()));
		assert!(second.to_scan().is_empty());
	}

	#[test] fn inherited_settings_are_copied() {
		let mut options = RequirementSetOptions::default();
		options.set_use_user_site(true);
		options.set_pycompile(false);
		options.set_target_dir(Some("/opt/target".into()));
		let mut set = RequirementSet::new(options);
		add(&mut set, "pkg", None).unwrap();
		let r = set.get_requirement("pkg").unwrap();
		assert!(r.use_user_site && !r.pycompile && r.is_direct);
		assert_eq!(r.target_dir.as_deref(), Some(std::path::Path::new("/opt/target")));
	}

	#[test] fn unknown_parent_is_not_found_and_set_is_untouched() {
		let mut set = RequirementSet::default();
		assert!(matches!(add(&mut set, "pkg", Some("ghost")), Err(Error::NotFound(_))));
		assert!(set.requirements().is_empty());
	}

	#[test] fn unsupported_wheel_is_rejected() {
		let mut set = RequirementSet::default();
		let req = Requirement::new("native").with_link(Link::new("https://host/native-1.0-cp311-cp311-win_amd64.whl"));
		assert!(matches!(set.add_requirement(req, None, &[]), Err(Error::UnsupportedWheel(f)) if f == "native-1.0-cp311-cp311-win_amd64.whl"));
		assert!(set.requirements().is_empty());
	}

	#[test] fn constraint_from_other_location_conflicts() {
		let mut set = RequirementSet::default();
		set.add_requirement(Requirement::new("pkg").as_constraint(), None, &[]).unwrap();
		let req = Requirement::new("pkg").with_link(Link::new("https://host/pkg-1.0.tar.gz"));
		assert!(matches!(set.add_requirement(req, None, &[]), Err(Error::ConstraintConflict(n)) if n == "pkg"));
		assert!(set.get_requirement("pkg").unwrap().constraint);
		assert_eq!(set.reqs_to_cleanup.len(), 1);
	}

	#[test] fn has_requirement_ignores_constraints() {
		let mut set = RequirementSet::default();
		set.add_requirement(Requirement::new("Bound").as_constraint(), None, &[]).unwrap();
		add(&mut set, "Real", None).unwrap();
		assert!(!set.has_requirement("bound"));
		assert!(set.has_requirement("REAL"));
		assert!(!set.has_requirement("missing"));
	}

	#[test] fn has_requirements_counts_unnamed() {
		let mut set = RequirementSet::default();
		set.add_requirement(Requirement::new("bound").as_constraint(), None, &[]).unwrap();
		assert!(!set.has_requirements());
		set.add_requirement(Requirement::unnamed(Link::new("./local/project")), None, &[]).unwrap();
		assert!(set.has_requirements());
	}

	#[test] fn display_lists_direct_requirements_sorted() {
		let mut set = RequirementSet::default();
		add(&mut set, "zeta>=2", None).unwrap();
		add(&mut set, "Alpha[x]", None).unwrap();
		add(&mut set, "dep", Some("zeta")).unwrap();
		assert_eq!(set.to_string(), "Alpha[x] zeta>=2");
		assert_eq!(set.summary(), "<RequirementSet object; 3 requirement(s): Alpha[x], dep, zeta>=2>");
	}

	#[test] fn is_download_without_directory() { assert!(!RequirementSet::default().is_download().unwrap()) }

	#[test] fn is_download_with_missing_directory() {
		let mut options = RequirementSetOptions::default();
		options.set_download_dir(Some("/definitely/not/here".into()));
		assert!(matches!(RequirementSet::new(options).is_download(), Err(Error::DownloadDirectory(_))));
	}

	#[test] fn satisfied_requirement_is_not_in_order() {
		let mut set = RequirementSet::default();
		set.add_requirement(Requirement::new("present").with_satisfied_by(InstalledDistribution::new("present", "1.0")), None, &[]).unwrap();
		add(&mut set, "missing", None).unwrap();
		let order = set.install_order();
		assert_eq!(order.len(), 1);
		assert_eq!(set.requirement(order[0]).unwrap().name.as_deref(), Some("missing"));
	}
}
