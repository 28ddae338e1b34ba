//! Installs a finished [`RequirementSet`] one requirement at a time.

use super::{RequirementSet, RequirementId};
use crate::installer::{Installer, PendingUninstall};
use crate::Error;

impl RequirementSet {
	/// Installs everything in the set, dependencies first.
	///
	/// A requirement replacing an existing installation uninstalls it first, the uninstall is
	/// committed once the install succeeds and rolled back if it fails. A rollback that fails
	/// too is carried in [`Error::InstallFailed`]. The first failure stops
	/// the whole run, whatever was installed before it stays installed and is available from
	/// [`RequirementSet::successfully_installed()`].
	pub fn install(&mut self, installer: &mut dyn Installer, install_options: &[String], global_options: &[String]) -> crate::Result<Vec<RequirementId>> {
		let to_install = self.install_order();
		self.successfully_installed.clear();

		if !to_install.is_empty() {
			log::info!(
				"Installing collected packages: {}",
				to_install.iter().map(|id| self.graph[*id].display_name()).collect::<Vec<_>>().join(", "),
			);
		}

		for id in to_install {
			self.install_one(installer, id, install_options, global_options)?;
		}

		Ok(self.successfully_installed.clone())
	}

	fn install_one(&mut self, installer: &mut dyn Installer, id: RequirementId, install_options: &[String], global_options: &[String]) -> crate::Result<()> {
		let requirement = &self.graph[id];
		let name = requirement.display_name().to_owned();

		let pending = match &requirement.conflicts_with {
			Some(existing) => {
				log::info!("Found existing installation: {}", existing);
				let paths = installer.uninstall(requirement, true)
					.map_err(|source| Error::UninstallFailed { existing: existing.to_string(), source })?;
				Some(PendingUninstall::new(existing.clone(), paths))
			},
			None => None,
		};

		let outcome = installer.install(requirement, install_options, global_options);
		self.graph[id].install_succeeded = Some(outcome.is_ok());

		let result = match outcome {
			Ok(()) => {
				self.successfully_installed.push(id);
				pending.map_or(Ok(()), PendingUninstall::commit)
			},
			Err(source) => {
				/* Install didn't succeed, put back what it was replacing */
				let rollback = pending.and_then(|p| p.rollback().err()).map(|e| {
					log::error!("Failed to restore previous installation while installing {}: {}", name, e);
					Box::new(e)
				});
				Err(Error::InstallFailed { name: name.clone(), source, rollback })
			},
		};

		let cleanup = installer.remove_temporary_source(&self.graph[id])
			.map_err(|source| Error::Cleanup { name, source });

		result.and(cleanup)
	}
}
