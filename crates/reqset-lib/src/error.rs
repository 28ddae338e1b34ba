//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the install collaborators, see [`crate::installer::Installer`].
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("parsing error: {0}")]
	Parse(String),
	#[error("invalid version specifier: {0}")]
	Specifier(#[from] pep440_rs::VersionSpecifiersParseError),
	/// The requirement points at a prebuilt wheel that can't be installed on this platform.
	#[error("{0} is not a supported wheel on this platform.")]
	UnsupportedWheel(String),
	/// Two user supplied requirements ask for the same package with different specifiers.
	#[error("Double requirement given: {given} (already in {existing}, name={name:?})")]
	DoubleRequirement {
		given: String,
		existing: String,
		name: String,
	},
	/// A constraint was promoted by a requirement that installs from a path or url.
	#[error("Could not satisfy constraints for '{0}': installation from path or url cannot be constrained to a version")]
	ConstraintConflict(String),
	/// Lookup of a name that was never registered.
	///
	/// Seeing this means the caller broke the contract of [`crate::RequirementSet::add_requirement`],
	/// usually by naming a parent before adding it.
	#[error("No project with the name {0:?}")]
	NotFound(String),
	/// `rollback` is set when the installation being replaced couldn't be restored either.
	#[error("failed to install {name}: {source}{}", .rollback.as_ref().map(|e| format!(", restoring the previous installation also failed: {e}")).unwrap_or_default())]
	InstallFailed {
		name: String,
		#[source]
		source: BackendError,
		rollback: Option<Box<Error>>,
	},
	#[error("failed to uninstall existing installation {existing}: {source}")]
	UninstallFailed {
		existing: String,
		#[source]
		source: BackendError,
	},
	#[error("failed to remove temporary source of {name}: {source}")]
	Cleanup {
		name: String,
		#[source]
		source: BackendError,
	},
	#[error("Could not find or access download directory '{0}'")]
	DownloadDirectory(String),
}
