use std::{collections::BTreeSet, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{candidate::Candidate, category::CategoryPath, category::CategoryTree};

/// Words too generic to carry signal in ticket phrasing.
const STOPWORDS: &[&str] = &[
	"the", "and", "for", "with", "when", "this", "that", "from", "into", "have", "having", "cant",
	"can't", "cannot", "trying", "error", "issue", "problem", "access", "open", "opening", "launch",
	"launching", "login", "log", "fails", "failure", "failed", "please", "help",
];

/// Fallback product tokens used when the taxonomy file is absent.
const DEFAULT_TOKENS: &[&str] = &[
	"revit",
	"bluebeam",
	"teams",
	"outlook",
	"autocad",
	"photoshop",
	"sharepoint",
	"dynamo",
	"vpn",
	"onedrive",
	"microsoft",
];

fn word_re() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();

	RE.get_or_init(|| Regex::new(r"[A-Za-z0-9_]+").expect("word regex must compile"))
}

fn words_of(text: &str) -> impl Iterator<Item = String> + '_ {
	word_re().find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// High-signal tokens and metadata cues extracted from a query or seed
/// ticket, consumed by the strict filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
	pub raw_query: String,
	pub tokens: BTreeSet<String>,
	pub keywords: BTreeSet<String>,
	pub path: CategoryPath,
}
impl QueryIntent {
	pub fn has_category_path(&self) -> bool {
		!self.path.is_empty()
	}
}

/// How well one candidate aligns with the query intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSignals {
	pub token_match: bool,
	pub category_match: bool,
	pub keyword_hits: usize,
}

pub fn extract_query_intent(
	query: &str,
	seed_path: Option<&CategoryPath>,
	tree: &CategoryTree,
) -> QueryIntent {
	let words: Vec<String> = words_of(query).collect();
	let known = if tree.is_empty() {
		DEFAULT_TOKENS.iter().map(|t| t.to_string()).collect()
	} else {
		tree.known_tokens()
	};
	let mut tokens: BTreeSet<String> =
		words.iter().filter(|word| known.contains(word.as_str())).cloned().collect();
	let keywords: BTreeSet<String> = words
		.iter()
		.filter(|word| word.len() > 3 && !STOPWORDS.contains(&word.as_str()))
		.cloned()
		.collect();
	let path = seed_path.cloned().unwrap_or_default();

	// Seed category levels count as matched tokens so seeded searches keep
	// pulling tickets from the same product family.
	for level in [&path.category, &path.subcategory, &path.item].into_iter().flatten() {
		tokens.insert(level.to_lowercase());
	}

	QueryIntent { raw_query: query.to_string(), tokens, keywords, path }
}

/// Evaluates one candidate against the intent: token overlap with the
/// subject words or category levels, exact category-path alignment on the
/// levels the intent specifies, and keyword hits in the subject.
pub fn annotate_candidate(candidate: &Candidate, intent: &QueryIntent) -> ResultSignals {
	let subject_words: BTreeSet<String> = words_of(&candidate.meta.subject).collect();
	let meta = &candidate.meta;
	let meta_tokens: BTreeSet<String> = [&meta.category, &meta.subcategory, &meta.item]
		.into_iter()
		.flatten()
		.map(|v| v.trim().to_lowercase())
		.collect();
	let token_match = intent
		.tokens
		.iter()
		.any(|token| subject_words.contains(token) || meta_tokens.contains(token));
	let category_match = intent.has_category_path() && {
		let mut matched = level_matches(&intent.path.category, &meta.category);

		if intent.path.subcategory.is_some() {
			matched = matched && level_matches(&intent.path.subcategory, &meta.subcategory);
		}
		if intent.path.item.is_some() {
			matched = matched && level_matches(&intent.path.item, &meta.item);
		}

		matched
	};
	let keyword_hits =
		intent.keywords.iter().filter(|keyword| subject_words.contains(keyword.as_str())).count();

	ResultSignals { token_match, category_match, keyword_hits }
}

fn level_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
	match (wanted, actual) {
		(Some(wanted), Some(actual)) => wanted.trim().eq_ignore_ascii_case(actual.trim()),
		(None, _) => true,
		(Some(_), None) => false,
	}
}
