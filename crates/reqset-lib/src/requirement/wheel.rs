//! Wheel filename parsing and platform tag matching.
//!
//! A wheel filename has the form `{name}-{version}(-{build})?-{python}-{abi}-{platform}.whl`
//! where each of the last three components may hold several dot separated tags.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Deserialize};

fn wheel_file_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| {
		Regex::new(r"^(?P<name>[^\s-]+?)-(?P<ver>[^\s-]*?)(?:-(?P<build>\d[^-]*?))?-(?P<pyver>[^\s-]+?)-(?P<abi>[^\s-]+?)-(?P<plat>[^\s-]+?)\.whl$")
			.expect("wheel filename regex is valid")
	})
}

/// A single `python-abi-platform` compatibility tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag {
	pub interpreter: String,
	pub abi: String,
	pub platform: String,
}

impl Tag {
	pub fn new(interpreter: impl Into<String>, abi: impl Into<String>, platform: impl Into<String>) -> Self {
		Self {
			interpreter: interpreter.into(),
			abi: abi.into(),
			platform: platform.into(),
		}
	}
}

impl std::str::FromStr for Tag {
	type Err = crate::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.split('-').collect::<Vec<_>>().as_slice() {
			[interpreter, abi, platform] if !interpreter.is_empty() && !abi.is_empty() && !platform.is_empty() => {
				Ok(Tag::new(*interpreter, *abi, *platform))
			},
			_ => Err(crate::Error::Parse(format!("invalid compatibility tag {s:?}"))),
		}
	}
}

impl TryFrom<String> for Tag {
	type Error = crate::Error;
	fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<Tag> for String {
	fn from(value: Tag) -> Self { value.to_string() }
}

impl std::fmt::Display for Tag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wheel {
	pub filename: String,
	pub name: String,
	pub version: String,
	pub build: Option<String>,
	pub python_tags: Vec<String>,
	pub abi_tags: Vec<String>,
	pub platform_tags: Vec<String>,
}

impl Wheel {
	pub fn new(filename: &str) -> crate::Result<Self> {
		let captures = wheel_file_regex().captures(filename)
			.ok_or_else(|| crate::Error::Parse(format!("{filename} is not a valid wheel filename.")))?;

		let split = |group: &str| -> Vec<String> {
			captures[group].split('.').map(str::to_owned).collect()
		};

		Ok(Wheel {
			filename: filename.to_owned(),
			name: captures["name"].replace('_', "-"),
			/* `_` in the version means `-` */
			version: captures["ver"].replace('_', "-"),
			build: captures.name("build").map(|m| m.as_str().to_owned()),
			python_tags: split("pyver"),
			abi_tags: split("abi"),
			platform_tags: split("plat"),
		})
	}

	/// Every tag this wheel is compatible with.
	pub fn file_tags(&self) -> impl Iterator<Item = Tag> + '_ {
		self.python_tags.iter().flat_map(move |py| {
			self.abi_tags.iter().flat_map(move |abi| {
				self.platform_tags.iter().map(move |plat| Tag::new(py.as_str(), abi.as_str(), plat.as_str()))
			})
		})
	}

	/// Is this wheel installable with any of the `supported` tags.
	pub fn supported(&self, supported: &[Tag]) -> bool {
		self.file_tags().any(|t| supported.contains(&t))
	}
}
