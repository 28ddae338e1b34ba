//! Set level options shared by every requirement admitted into a [`crate::RequirementSet`].

use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::requirement::wheel::Tag;

/// How eagerly already installed dependencies get upgraded.
///
/// Only read by this crate, the installer collaborator is the one that acts on it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpgradeStrategy {
	#[default] OnlyIfNeeded,
	Eager,
	ToSatisfyOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RequirementSetOptions {
	build_dir: Option<PathBuf>,
	src_dir: Option<PathBuf>,
	/// Where still packed archives get written. When `None` they are deleted after unpacking.
	download_dir: Option<PathBuf>,
	/// Where still packed wheels get written. Falls back to `download_dir`.
	wheel_download_dir: Option<PathBuf>,
	upgrade: bool,
	upgrade_strategy: UpgradeStrategy,
	ignore_installed: bool,
	ignore_dependencies: bool,
	force_reinstall: bool,
	use_user_site: bool,
	/// Set from `--target`
	target_dir: Option<PathBuf>,
	pycompile: bool,
	isolated: bool,
	require_hashes: bool,
	ignore_requires_python: bool,
	supported_tags: Vec<Tag>,
}

impl Default for RequirementSetOptions {
	fn default() -> Self {
		Self {
			build_dir: None,
			src_dir: None,
			download_dir: None,
			wheel_download_dir: None,
			upgrade: false,
			upgrade_strategy: UpgradeStrategy::default(),
			ignore_installed: false,
			ignore_dependencies: false,
			force_reinstall: false,
			use_user_site: false,
			target_dir: None,
			pycompile: true,
			isolated: false,
			require_hashes: false,
			ignore_requires_python: false,
			supported_tags: vec![Tag::new("py3", "none", "any")],
		}
	}
}

impl RequirementSetOptions {
	/// Reads options from a JSON file, missing keys take their default value.
	pub fn load_from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
		let path = path.as_ref();
		log::trace!("Loading requirement set options from {}", path.display());
		let data = std::fs::read_to_string(path)?;
		Ok(serde_json::from_str(&data)?)
	}

	pub fn save_to_file(&self, path: impl AsRef<Path>) -> crate::Result<()> {
		let data = serde_json::to_string_pretty(self)?;
		std::fs::write(path, data)?;
		Ok(())
	}

	pub fn build_dir(&self) -> Option<&Path> {
		self.build_dir.as_deref()
	}
	pub fn set_build_dir(&mut self, build_dir: Option<PathBuf>) {
		self.build_dir = build_dir;
	}

	pub fn src_dir(&self) -> Option<&Path> {
		self.src_dir.as_deref()
	}
	pub fn set_src_dir(&mut self, src_dir: Option<PathBuf>) {
		self.src_dir = src_dir;
	}

	pub fn download_dir(&self) -> Option<&Path> {
		self.download_dir.as_deref()
	}
	pub fn set_download_dir(&mut self, download_dir: Option<PathBuf>) {
		self.download_dir = download_dir;
	}

	/// Directory wheels are written to, `download_dir` when unset.
	pub fn wheel_download_dir(&self) -> Option<&Path> {
		self.wheel_download_dir.as_deref().or(self.download_dir.as_deref())
	}
	pub fn set_wheel_download_dir(&mut self, wheel_download_dir: Option<PathBuf>) {
		self.wheel_download_dir = wheel_download_dir;
	}

	pub fn upgrade(&self) -> bool {
		self.upgrade
	}
	pub fn set_upgrade(&mut self, upgrade: bool) {
		self.upgrade = upgrade;
	}

	pub fn upgrade_strategy(&self) -> UpgradeStrategy {
		self.upgrade_strategy
	}
	pub fn set_upgrade_strategy(&mut self, upgrade_strategy: UpgradeStrategy) {
		self.upgrade_strategy = upgrade_strategy;
	}

	pub fn ignore_installed(&self) -> bool {
		self.ignore_installed
	}
	pub fn set_ignore_installed(&mut self, ignore_installed: bool) {
		self.ignore_installed = ignore_installed;
	}

	pub fn ignore_dependencies(&self) -> bool {
		self.ignore_dependencies
	}
	pub fn set_ignore_dependencies(&mut self, ignore_dependencies: bool) {
		self.ignore_dependencies = ignore_dependencies;
	}

	pub fn force_reinstall(&self) -> bool {
		self.force_reinstall
	}
	pub fn set_force_reinstall(&mut self, force_reinstall: bool) {
		self.force_reinstall = force_reinstall;
	}

	pub fn use_user_site(&self) -> bool {
		self.use_user_site
	}
	pub fn set_use_user_site(&mut self, use_user_site: bool) {
		self.use_user_site = use_user_site;
	}

	pub fn target_dir(&self) -> Option<&Path> {
		self.target_dir.as_deref()
	}
	pub fn set_target_dir(&mut self, target_dir: Option<PathBuf>) {
		self.target_dir = target_dir;
	}

	pub fn pycompile(&self) -> bool {
		self.pycompile
	}
	pub fn set_pycompile(&mut self, pycompile: bool) {
		self.pycompile = pycompile;
	}

	pub fn isolated(&self) -> bool {
		self.isolated
	}
	pub fn set_isolated(&mut self, isolated: bool) {
		self.isolated = isolated;
	}

	pub fn require_hashes(&self) -> bool {
		self.require_hashes
	}
	pub fn set_require_hashes(&mut self, require_hashes: bool) {
		self.require_hashes = require_hashes;
	}

	pub fn ignore_requires_python(&self) -> bool {
		self.ignore_requires_python
	}
	pub fn set_ignore_requires_python(&mut self, ignore_requires_python: bool) {
		self.ignore_requires_python = ignore_requires_python;
	}

	/// Wheel tags installable on this platform, most preferred first.
	pub fn supported_tags(&self) -> &[Tag] {
		&self.supported_tags
	}
	pub fn set_supported_tags(&mut self, supported_tags: impl IntoIterator<Item = Tag>) {
		self.supported_tags = supported_tags.into_iter().collect();
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test] fn pycompile_defaults_to_true() { assert!(RequirementSetOptions::default().pycompile()) }
	#[test] fn wheel_download_dir_falls_back() {
		let mut options = RequirementSetOptions::default();
		options.set_download_dir(Some(PathBuf::from("/tmp/downloads")));
		assert_eq!(options.wheel_download_dir(), Some(Path::new("/tmp/downloads")));
	}
	#[test] fn missing_keys_use_defaults() {
		let options: RequirementSetOptions = serde_json::from_str(r#"{ "use-user-site": true, "upgrade-strategy": "eager" }"#).unwrap();
		assert!(options.use_user_site());
		assert!(options.pycompile());
		assert_eq!(options.upgrade_strategy(), UpgradeStrategy::Eager);
		assert_eq!(options.supported_tags(), &[Tag::new("py3", "none", "any")]);
	}
	#[test] fn supported_tags_read_as_strings() {
		let options: RequirementSetOptions = serde_json::from_str(r#"{ "supported-tags": ["cp311-cp311-manylinux_2_17_x86_64"] }"#).unwrap();
		assert_eq!(options.supported_tags(), &[Tag::new("cp311", "cp311", "manylinux_2_17_x86_64")]);
	}
	#[test] fn saved_options_load_back() {
		let path = std::env::temp_dir().join(format!("reqset-options-{}.json", std::process::id()));
		let mut options = RequirementSetOptions::default();
		options.set_target_dir(Some(PathBuf::from("/opt/target")));
		options.set_upgrade_strategy(UpgradeStrategy::ToSatisfyOnly);
		options.save_to_file(&path).unwrap();
		let loaded = RequirementSetOptions::load_from_file(&path).unwrap();
		std::fs::remove_file(&path).unwrap();
		assert_eq!(loaded.target_dir(), Some(Path::new("/opt/target")));
		assert_eq!(loaded.upgrade_strategy(), UpgradeStrategy::ToSatisfyOnly);
	}
	#[test] fn missing_file_is_io_error() { assert!(matches!(RequirementSetOptions::load_from_file("/definitely/not/here.json"), Err(crate::Error::IO(_)))) }
}
