//! Name keyed registry of requirements, kept in insertion order.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::RequirementId;

#[derive(Debug, Default, Clone)]
pub struct Requirements {
	entries: IndexMap<String, RequirementId>,
	/// Lowercase name -> registered name
	aliases: HashMap<String, String>,
}

impl Requirements {
	/// Registers `id` under `name` along with its lowercase alias.
	///
	/// Overwriting an existing name keeps its original position.
	pub fn insert(&mut self, name: String, id: RequirementId) {
		/* FIXME: what about other normalizations? E.g., _ vs. -? */
		let lower = name.to_lowercase();
		if lower != name {
			self.aliases.insert(lower, name.clone());
		}
		log::trace!("Registering requirement {}", name);
		self.entries.insert(name, id);
	}

	/// Looks `name` up as given, then lowercased, checking the alias table for each.
	pub fn get(&self, name: &str) -> crate::Result<RequirementId> {
		let lower = name.to_lowercase();
		/* Tail expression temporaries outlive `lower`, so bind first */
		let found = [name, lower.as_str()].into_iter()
			.find_map(|n| self.get_exact(n).or_else(|| self.get_alias(n)))
			.ok_or_else(|| crate::Error::NotFound(name.to_owned()));
		found
	}

	/// Only matches a name exactly as it was registered.
	pub fn get_exact(&self, name: &str) -> Option<RequirementId> {
		self.entries.get(name).copied()
	}

	/// Only matches through the lowercase alias table.
	pub fn get_alias(&self, alias: &str) -> Option<RequirementId> {
		self.aliases.get(alias).and_then(|name| self.get_exact(name))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn values(&self) -> impl Iterator<Item = RequirementId> + '_ {
		self.entries.values().copied()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
