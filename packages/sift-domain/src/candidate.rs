use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::category::CategoryPath;

/// Ticket metadata carried in the vector index payload alongside each
/// embedded document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketMeta {
	#[serde(default)]
	pub subject: String,
	#[serde(default)]
	pub category: Option<String>,
	#[serde(default)]
	pub subcategory: Option<String>,
	#[serde(default)]
	pub item: Option<String>,
	#[serde(default)]
	pub agent_id: Option<u64>,
	#[serde(default)]
	pub group_id: Option<u64>,
	#[serde(default)]
	pub priority: Option<i64>,
	#[serde(default)]
	pub status: Option<i64>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
}

/// One nearest-neighbor hit. Immutable once produced by the retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub ticket_id: u64,
	pub distance: f32,
	pub meta: TicketMeta,
}
impl Candidate {
	pub fn category_path(&self) -> CategoryPath {
		CategoryPath::new(
			self.meta.category.clone(),
			self.meta.subcategory.clone(),
			self.meta.item.clone(),
		)
	}
}

/// Similarity band derived from distance. The bands partition
/// `[0, max_distance]`; every retained candidate belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
	MostSimilar,
	Similar,
	Related,
	Loose,
}
impl Bucket {
	/// Cut point `i` is `fraction_i * max_distance`; a distance on a cut
	/// point belongs to the nearer band.
	pub fn for_distance(
		distance: f32,
		max_distance: f32,
		bounds: &sift_config::BucketBounds,
	) -> Self {
		if distance <= bounds.most_similar * max_distance {
			Self::MostSimilar
		} else if distance <= bounds.similar * max_distance {
			Self::Similar
		} else if distance <= bounds.related * max_distance {
			Self::Related
		} else {
			Self::Loose
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::MostSimilar => "most_similar",
			Self::Similar => "similar",
			Self::Related => "related",
			Self::Loose => "loose",
		}
	}
}
