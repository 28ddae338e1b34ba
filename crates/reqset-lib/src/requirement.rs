//! A single request to have a package present in the target environment.
//!
//! Requirements are produced by the parsing and dependency discovery layers and handed to
//! [`crate::RequirementSet::add_requirement`] which takes ownership of them.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use pep440_rs::{Version, VersionSpecifier, VersionSpecifiers};
use pep508_rs::{MarkerTree, VerbatimUrl, VersionOrUrl};

pub mod wheel;

/// An environment marker, e.g. `python_version < "3.8"` or `extra == "socks"`.
///
/// Parsing and evaluating the marker grammar belongs to the caller, this crate only asks if it applies.
pub trait MarkerExpression: std::fmt::Debug + std::fmt::Display {
	/// Evaluates the marker against the current environment with `extra` bound to the given value.
	fn evaluate(&self, extra: &str) -> bool;
}

pub type Markers = Arc<dyn MarkerExpression>;

/// A set of PEP 440 version clauses such as `>=1.0,<2`.
///
/// Clauses are compared as a set so `<2,>=1.0` equals `>=1.0, <2`.
#[derive(Debug, Clone)]
pub struct Specifier(VersionSpecifiers);

impl Specifier {
	/// No version restriction at all.
	pub fn is_any(&self) -> bool {
		self.0.is_empty()
	}

	pub fn clauses(&self) -> impl Iterator<Item = &VersionSpecifier> {
		self.0.iter()
	}

	/// Does `version` fall inside every clause.
	pub fn contains(&self, version: &Version) -> bool {
		self.0.contains(version)
	}

	pub fn version_specifiers(&self) -> &VersionSpecifiers {
		&self.0
	}

	fn clause_set(&self) -> BTreeSet<String> {
		self.clauses().map(ToString::to_string).collect()
	}
}

impl Default for Specifier {
	fn default() -> Self {
		Self(std::iter::empty::<VersionSpecifier>().collect())
	}
}

impl PartialEq for Specifier {
	fn eq(&self, other: &Self) -> bool {
		self.clause_set() == other.clause_set()
	}
}

impl Eq for Specifier {}

impl From<VersionSpecifiers> for Specifier {
	fn from(value: VersionSpecifiers) -> Self {
		Self(value)
	}
}

impl FromStr for Specifier {
	type Err = crate::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.trim().is_empty() {
			return Ok(Self::default());
		}
		Ok(Self(VersionSpecifiers::from_str(s)?))
	}
}

impl std::fmt::Display for Specifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.clause_set().into_iter().collect::<Vec<_>>().join(","))
	}
}

/// Where the files for a requirement come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
	pub url: String,
}

impl Link {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}

	/// The path portion of the url, without scheme, host, query or fragment.
	pub fn path(&self) -> &str {
		let without_fragment = self.url.split(['#', '?']).next().unwrap_or_default();
		match without_fragment.split_once("://") {
			Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
			None => without_fragment,
		}
	}

	/// The final path segment.
	pub fn filename(&self) -> &str {
		self.path().rsplit('/').next().unwrap_or_default()
	}

	pub fn is_wheel(&self) -> bool {
		self.filename().ends_with(".whl")
	}
}

impl std::fmt::Display for Link {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.url)
	}
}

/// A distribution already present in the target environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstalledDistribution {
	pub name: String,
	pub version: String,
	pub location: Option<PathBuf>,
}

impl InstalledDistribution {
	pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			version: version.into(),
			location: None,
		}
	}

	pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
		self.location = Some(location.into());
		self
	}
}

impl std::fmt::Display for InstalledDistribution {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} {}", self.name, self.version)
	}
}

#[derive(Debug, Clone, Default)]
pub struct Requirement {
	/// `None` for url or path requirements whose name isn't known until they are unpacked.
	pub name: Option<String>,
	pub specifier: Specifier,
	pub extras: BTreeSet<String>,
	pub markers: Option<Markers>,
	pub link: Option<Link>,
	/// Only bounds what may be installed, isn't installed itself unless promoted.
	pub constraint: bool,
	/// Supplied by the user rather than discovered as a dependency.
	pub is_direct: bool,
	pub satisfied_by: Option<InstalledDistribution>,
	pub conflicts_with: Option<InstalledDistribution>,
	/// Display of the requirement that introduced this one, diagnostics only.
	pub comes_from: Option<String>,

	/* Copied from the set options at admission */
	pub target_dir: Option<PathBuf>,
	pub use_user_site: bool,
	pub pycompile: bool,

	/// `None` until an install was attempted.
	pub install_succeeded: Option<bool>,
}

impl Requirement {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			pycompile: true,
			..Default::default()
		}
	}

	/// A requirement known only by where it comes from.
	pub fn unnamed(link: Link) -> Self {
		Self {
			link: Some(link),
			pycompile: true,
			..Default::default()
		}
	}

	/// Parses a PEP 508 line such as `name[extra1,extra2]>=1.0` or `name @ url`.
	///
	/// Markers are not accepted here, the caller evaluates them and attaches them with
	/// [`Requirement::with_markers`].
	pub fn parse(s: &str) -> crate::Result<Self> {
		let parsed = pep508_rs::Requirement::<VerbatimUrl>::from_str(s)
			.map_err(|e| crate::Error::Parse(e.to_string()))?;
		if parsed.marker != MarkerTree::default() {
			return Err(crate::Error::Parse(format!("unexpected markers in requirement {s:?}")));
		}

		/* `PackageName` is normalized, keep the spelling that was given */
		let trimmed = s.trim_start();
		let name_len = trimmed
			.find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
			.unwrap_or(trimmed.len());

		let mut req = Requirement::new(&trimmed[..name_len]);
		req.extras = parsed.extras.iter().map(ToString::to_string).collect();
		match parsed.version_or_url {
			Some(VersionOrUrl::VersionSpecifier(specifiers)) => req.specifier = specifiers.into(),
			Some(VersionOrUrl::Url(url)) => req.link = Some(Link::new(url.to_string())),
			None => {},
		}
		Ok(req)
	}

	pub fn with_specifier(mut self, specifier: Specifier) -> Self {
		self.specifier = specifier;
		self
	}

	pub fn with_extras<S: Into<String>>(mut self, extras: impl IntoIterator<Item = S>) -> Self {
		self.extras = extras.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_markers(mut self, markers: Markers) -> Self {
		self.markers = Some(markers);
		self
	}

	pub fn with_link(mut self, link: Link) -> Self {
		self.link = Some(link);
		self
	}

	pub fn as_constraint(mut self) -> Self {
		self.constraint = true;
		self
	}

	pub fn with_satisfied_by(mut self, dist: InstalledDistribution) -> Self {
		self.satisfied_by = Some(dist);
		self
	}

	pub fn with_conflicts_with(mut self, dist: InstalledDistribution) -> Self {
		self.conflicts_with = Some(dist);
		self
	}

	pub fn with_comes_from(mut self, comes_from: impl Into<String>) -> Self {
		self.comes_from = Some(comes_from.into());
		self
	}

	/// Name used in log output, unnamed requirements fall back to their url.
	pub fn display_name(&self) -> &str {
		match (&self.name, &self.link) {
			(Some(name), _) => name.as_str(),
			(None, Some(link)) => link.url.as_str(),
			(None, None) => "<unnamed requirement>",
		}
	}

	/// Does this requirement apply to the environment for any of `extras_requested`.
	///
	/// With no extras requested the markers are evaluated with an empty extra.
	pub fn match_markers(&self, extras_requested: &[String]) -> bool {
		let Some(markers) = &self.markers else { return true };
		if extras_requested.is_empty() {
			markers.evaluate("")
		} else {
			extras_requested.iter().any(|extra| markers.evaluate(extra))
		}
	}

	/// The prebuilt wheel this requirement installs from, if any.
	pub fn wheel(&self) -> Option<crate::Result<wheel::Wheel>> {
		self.link.as_ref()
			.filter(|link| link.is_wheel())
			.map(|link| wheel::Wheel::new(link.filename()))
	}

	/// `name[extras]specifier; markers`, or the url for unnamed requirements.
	pub fn requirement_line(&self) -> String {
		let Some(name) = &self.name else { return self.display_name().to_owned() };
		let mut line = name.clone();
		if !self.extras.is_empty() {
			line.push_str(&format!("[{}]", self.extras.iter().cloned().collect::<Vec<_>>().join(",")));
		}
		line.push_str(&self.specifier.to_string());
		if let Some(markers) = &self.markers {
			line.push_str(&format!("; {markers}"));
		}
		line
	}

	/// Would promoting `self` with `incoming` redirect it to a different source location.
	pub fn link_conflicts_with(&self, incoming: &Requirement) -> bool {
		match (&incoming.link, &self.link) {
			(None, _) => false,
			(Some(_), None) => true,
			(Some(new), Some(existing)) => new.path() != existing.path(),
		}
	}

	/// Turns this constraint into a real requirement, taking the extras of `incoming` along.
	///
	/// Mutates in place, the caller owns `self` through the dependency graph so every parent
	/// edge sees the promoted requirement. Promotion never reverts `constraint` back to true.
	pub fn promote(&mut self, incoming: &Requirement) {
		self.constraint = false;
		self.extras.extend(incoming.extras.iter().cloned());
	}
}

impl std::fmt::Display for Requirement {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.requirement_line())?;
		if let (Some(_), Some(link)) = (&self.name, &self.link) {
			write!(f, " from {link}")?;
		}
		if let Some(comes_from) = &self.comes_from {
			write!(f, " (from {comes_from})")?;
		}
		Ok(())
	}
}
