use std::{
	collections::{HashMap, HashSet},
	fmt,
	path::Path,
};

use serde::{Deserialize, Serialize};

/// Hierarchical ticket classification, category → subcategory → item.
///
/// A level is present only when every preceding level is present; the
/// constructors drop anything after the first gap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPath {
	pub category: Option<String>,
	pub subcategory: Option<String>,
	pub item: Option<String>,
}
impl CategoryPath {
	pub fn new(
		category: Option<String>,
		subcategory: Option<String>,
		item: Option<String>,
	) -> Self {
		let category = non_empty(category);
		let subcategory = if category.is_some() { non_empty(subcategory) } else { None };
		let item = if subcategory.is_some() { non_empty(item) } else { None };

		Self { category, subcategory, item }
	}

	/// Builds a path from an ordered level list, as returned by the guidance
	/// model (`["Software", "Revit", "Crash"]`).
	pub fn from_levels(levels: &[Option<String>]) -> Self {
		let mut iter = levels.iter().cloned();

		Self::new(iter.next().flatten(), iter.next().flatten(), iter.next().flatten())
	}

	pub fn is_empty(&self) -> bool {
		self.category.is_none()
	}

	pub fn depth(&self) -> usize {
		[&self.category, &self.subcategory, &self.item].iter().filter(|l| l.is_some()).count()
	}

	/// Exact, case-insensitive path equality.
	pub fn matches(&self, other: &Self) -> bool {
		level_eq(&self.category, &other.category)
			&& level_eq(&self.subcategory, &other.subcategory)
			&& level_eq(&self.item, &other.item)
	}

	pub fn with_item(&self, item: String) -> Self {
		Self::new(self.category.clone(), self.subcategory.clone(), Some(item))
	}
}
impl fmt::Display for CategoryPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let levels: Vec<&str> = [&self.category, &self.subcategory, &self.item]
			.into_iter()
			.flatten()
			.map(String::as_str)
			.collect();

		if levels.is_empty() { write!(f, "Unknown") } else { write!(f, "{}", levels.join(" → ")) }
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn level_eq(a: &Option<String>, b: &Option<String>) -> bool {
	match (a, b) {
		(Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
		(None, None) => true,
		_ => false,
	}
}

/// Static category taxonomy, loaded once per process from a JSON file shaped
/// `{ "Category": { "Subcategory": ["Item", ...] } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
	tree: HashMap<String, HashMap<String, Vec<String>>>,
}
impl CategoryTree {
	pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
		serde_json::from_str(raw)
	}

	/// Missing or unparsable taxonomy files yield an empty tree; token
	/// detection then falls back to the built-in seed list.
	pub fn load(path: &Path) -> Self {
		std::fs::read_to_string(path)
			.ok()
			.and_then(|raw| Self::from_json_str(&raw).ok())
			.unwrap_or_default()
	}

	pub fn is_empty(&self) -> bool {
		self.tree.is_empty()
	}

	/// Every category, subcategory, and item name, lowercased. These are the
	/// high-signal tokens used for strict token filtering.
	pub fn known_tokens(&self) -> HashSet<String> {
		let mut tokens = HashSet::new();

		for (category, subs) in &self.tree {
			tokens.insert(category.to_lowercase());

			for (subcategory, items) in subs {
				tokens.insert(subcategory.to_lowercase());

				for item in items {
					tokens.insert(item.to_lowercase());
				}
			}
		}

		tokens
	}

	/// Item names available under a category/subcategory pair,
	/// case-insensitive on both keys.
	pub fn items_for(&self, category: &str, subcategory: &str) -> Option<&[String]> {
		let subs = self
			.tree
			.iter()
			.find(|(name, _)| name.eq_ignore_ascii_case(category))
			.map(|(_, subs)| subs)?;

		subs.iter()
			.find(|(name, _)| name.eq_ignore_ascii_case(subcategory))
			.map(|(_, items)| items.as_slice())
	}

	pub fn as_json(&self) -> serde_json::Value {
		serde_json::to_value(&self.tree).unwrap_or_default()
	}
}
