//! Various helpers for testing
//!
//! Provides stand-ins for the collaborators a [`reqset::RequirementSet`] talks to, an installer that records
//! every call in a shared [`Journal`] and markers with a fixed outcome.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use reqset::error::BackendError;
use reqset::installer::{Installer, UninstalledPathSet};
use reqset::requirement::{MarkerExpression, Markers};
use reqset::Requirement;

/// Sets up `env_logger` for the test harness, safe to call more than once.
pub fn init_logging() {
	let _ = env_logger::builder().is_test(true).try_init();
}

/// Parses a requirement line, panicking on bad input.
pub fn requirement(line: &str) -> Requirement {
	Requirement::parse(line).unwrap_or_else(|e| panic!("bad requirement line {line:?}: {e}"))
}

#[derive(Debug, thiserror::Error)]
pub enum SimulatedError {
	#[error("simulated install failure for {0}")]
	Install(String),
	#[error("simulated uninstall failure for {0}")]
	Uninstall(String),
	#[error("simulated commit failure for {0}")]
	Commit(String),
	#[error("simulated rollback failure for {0}")]
	Rollback(String),
	#[error("simulated failure removing the source of {0}")]
	RemoveSource(String),
}

/// Something the [`RecordingInstaller`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	Install(String),
	Uninstall(String),
	Commit(String),
	Rollback(String),
	RemoveSource(String),
}

pub type Journal = Rc<RefCell<Vec<Event>>>;

/// Uninstalled files that only note what happened to them.
///
/// A failing commit or rollback leaves no [`Event`] behind.
pub struct RecordedPathSet {
	existing: String,
	journal: Journal,
	fail_commit: bool,
	fail_rollback: bool,
}

impl UninstalledPathSet for RecordedPathSet {
	fn commit(self: Box<Self>) -> Result<(), BackendError> {
		if self.fail_commit {
			return Err(SimulatedError::Commit(self.existing).into());
		}
		self.journal.borrow_mut().push(Event::Commit(self.existing.clone()));
		Ok(())
	}

	fn rollback(self: Box<Self>) -> Result<(), BackendError> {
		if self.fail_rollback {
			return Err(SimulatedError::Rollback(self.existing).into());
		}
		self.journal.borrow_mut().push(Event::Rollback(self.existing.clone()));
		Ok(())
	}
}

/// Installer that records calls and keeps each requirement's "unpacked source" in a temporary directory.
pub struct RecordingInstaller {
	journal: Journal,
	failing_installs: HashSet<String>,
	failing_uninstalls: HashSet<String>,
	failing_commits: HashSet<String>,
	failing_rollbacks: HashSet<String>,
	failing_removals: HashSet<String>,
	sources: tempfile::TempDir,
}

impl RecordingInstaller {
	pub fn new() -> std::io::Result<Self> {
		Ok(Self {
			journal: Default::default(),
			failing_installs: Default::default(),
			failing_uninstalls: Default::default(),
			failing_commits: Default::default(),
			failing_rollbacks: Default::default(),
			failing_removals: Default::default(),
			sources: tempfile::tempdir()?,
		})
	}

	/// Installing `name` will fail.
	pub fn fail_install(mut self, name: &str) -> Self {
		self.failing_installs.insert(name.to_owned());
		self
	}

	/// Uninstalling whatever `name` conflicts with will fail.
	pub fn fail_uninstall(mut self, name: &str) -> Self {
		self.failing_uninstalls.insert(name.to_owned());
		self
	}

	/// Committing the uninstall done for `name` will fail.
	pub fn fail_commit(mut self, name: &str) -> Self {
		self.failing_commits.insert(name.to_owned());
		self
	}

	/// Rolling back the uninstall done for `name` will fail.
	pub fn fail_rollback(mut self, name: &str) -> Self {
		self.failing_rollbacks.insert(name.to_owned());
		self
	}

	/// Removing the source of `name` will fail, the directory is left alone.
	pub fn fail_remove_source(mut self, name: &str) -> Self {
		self.failing_removals.insert(name.to_owned());
		self
	}

	pub fn journal(&self) -> Journal {
		self.journal.clone()
	}

	pub fn events(&self) -> Vec<Event> {
		self.journal.borrow().clone()
	}

	/// Names passed to [`Installer::install`] in call order.
	pub fn installed(&self) -> Vec<String> {
		self.journal.borrow().iter()
			.filter_map(|e| if let Event::Install(n) = e { Some(n.clone()) } else { None })
			.collect()
	}

	pub fn source_dir(&self, name: &str) -> PathBuf {
		self.sources.path().join(name)
	}

	/// Pretends `name` was unpacked, creating its source directory.
	pub fn unpack(&self, name: &str) -> std::io::Result<PathBuf> {
		let dir = self.source_dir(name);
		std::fs::create_dir_all(&dir)?;
		std::fs::write(dir.join("setup.py"), "")?;
		Ok(dir)
	}
}

impl Installer for RecordingInstaller {
	fn install(&mut self, requirement: &Requirement, _install_options: &[String], _global_options: &[String]) -> Result<(), BackendError> {
		let name = requirement.display_name().to_owned();
		log::trace!("Recording install of {}", name);
		self.journal.borrow_mut().push(Event::Install(name.clone()));
		if self.failing_installs.contains(&name) {
			return Err(SimulatedError::Install(name).into());
		}
		Ok(())
	}

	fn uninstall(&mut self, requirement: &Requirement, _auto_confirm: bool) -> Result<Box<dyn UninstalledPathSet>, BackendError> {
		let existing = requirement.conflicts_with.as_ref()
			.map(|d| d.to_string())
			.ok_or_else(|| SimulatedError::Uninstall(requirement.display_name().to_owned()))?;
		let name = requirement.display_name();
		if self.failing_uninstalls.contains(name) {
			return Err(SimulatedError::Uninstall(existing).into());
		}
		self.journal.borrow_mut().push(Event::Uninstall(existing.clone()));
		Ok(Box::new(RecordedPathSet {
			existing,
			journal: self.journal.clone(),
			fail_commit: self.failing_commits.contains(name),
			fail_rollback: self.failing_rollbacks.contains(name),
		}))
	}

	fn remove_temporary_source(&mut self, requirement: &Requirement) -> Result<(), BackendError> {
		let name = requirement.display_name().to_owned();
		if self.failing_removals.contains(&name) {
			return Err(SimulatedError::RemoveSource(name).into());
		}
		let dir = self.source_dir(&name);
		if dir.exists() {
			std::fs::remove_dir_all(dir)?;
		}
		self.journal.borrow_mut().push(Event::RemoveSource(name));
		Ok(())
	}
}

/// Marker that applies only when the given extra is requested, like `extra == "socks"`.
#[derive(Debug)]
pub struct ExtraMarker(pub String);

impl std::fmt::Display for ExtraMarker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "extra == \"{}\"", self.0)
	}
}

impl MarkerExpression for ExtraMarker {
	fn evaluate(&self, extra: &str) -> bool {
		extra == self.0
	}
}

pub fn extra_marker(extra: &str) -> Markers {
	Arc::new(ExtraMarker(extra.to_owned()))
}

/// Marker with a fixed outcome, e.g. `sys_platform == "win32"` evaluated elsewhere.
#[derive(Debug)]
pub struct FixedMarker {
	pub text: &'static str,
	pub applies: bool,
}

impl std::fmt::Display for FixedMarker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.text)
	}
}

impl MarkerExpression for FixedMarker {
	fn evaluate(&self, _extra: &str) -> bool {
		self.applies
	}
}

pub fn fixed_marker(text: &'static str, applies: bool) -> Markers {
	Arc::new(FixedMarker { text, applies })
}
