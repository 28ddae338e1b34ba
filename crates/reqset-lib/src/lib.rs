pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::RequirementSetOptions;

pub mod requirement;
pub use requirement::Requirement;

pub mod requirement_set;
pub use requirement_set::RequirementSet;
pub use requirement_set::RequirementId;
pub use requirement_set::Admission;

pub mod installer;

/// Shows `path` relative to the working directory when it is inside it.
pub(crate) fn display_path(path: &std::path::Path) -> String {
	let relative = std::env::current_dir().ok()
		.and_then(|cwd| pathdiff::diff_paths(path, cwd))
		.filter(|p| path.is_absolute() && !p.starts_with(".."));

	match relative {
		Some(p) => format!(".{}{}", std::path::MAIN_SEPARATOR, p.display()),
		None => path.display().to_string(),
	}
}
