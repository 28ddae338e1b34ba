//! Interface to whatever actually puts files on disk.
//!
//! Fetching, unpacking and building all happen before a requirement reaches the [`crate::RequirementSet`],
//! an [`Installer`] is only asked to install, uninstall or clean up after a requirement that is ready.

use crate::error::BackendError;
use crate::requirement::{Requirement, InstalledDistribution};

pub trait Installer {
	fn install(&mut self, requirement: &Requirement, install_options: &[String], global_options: &[String]) -> Result<(), BackendError>;

	/// Removes `requirement.conflicts_with`, keeping enough around to put it back.
	fn uninstall(&mut self, requirement: &Requirement, auto_confirm: bool) -> Result<Box<dyn UninstalledPathSet>, BackendError>;

	/// Deletes the unpacked source of `requirement`.
	fn remove_temporary_source(&mut self, requirement: &Requirement) -> Result<(), BackendError>;
}

/// Files moved out of the way by [`Installer::uninstall`].
pub trait UninstalledPathSet {
	/// Makes the removal permanent.
	fn commit(self: Box<Self>) -> Result<(), BackendError>;
	/// Restores the removed files.
	fn rollback(self: Box<Self>) -> Result<(), BackendError>;
}

/// An uninstall waiting on the outcome of the install replacing it.
///
/// Consumed by either [`PendingUninstall::commit`] or [`PendingUninstall::rollback`], so exactly one is called.
pub struct PendingUninstall {
	existing: InstalledDistribution,
	paths: Box<dyn UninstalledPathSet>,
}

impl PendingUninstall {
	pub fn new(existing: InstalledDistribution, paths: Box<dyn UninstalledPathSet>) -> Self {
		Self { existing, paths }
	}

	pub fn existing(&self) -> &InstalledDistribution {
		&self.existing
	}

	pub fn commit(self) -> crate::Result<()> {
		log::trace!("Committing uninstall of {}", self.existing);
		let existing = self.existing;
		self.paths.commit().map_err(|source| crate::Error::UninstallFailed { existing: existing.to_string(), source })
	}

	pub fn rollback(self) -> crate::Result<()> {
		log::info!("Rolling back uninstall of {}", self.existing);
		let existing = self.existing;
		self.paths.rollback().map_err(|source| crate::Error::UninstallFailed { existing: existing.to_string(), source })
	}
}

impl std::fmt::Debug for PendingUninstall {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PendingUninstall").field("existing", &self.existing).finish_non_exhaustive()
	}
}
