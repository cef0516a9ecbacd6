use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub helpdesk: Helpdesk,
	pub index: Index,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub gather: Gather,
	#[serde(default)]
	pub retry: Retry,
	#[serde(default)]
	pub taxonomy: Taxonomy,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

/// Ticketing REST API used for ticket detail and agent/group directory
/// lookups. The API key doubles as the basic-auth username.
#[derive(Debug, Deserialize)]
pub struct Helpdesk {
	pub api_base: String,
	pub api_key: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Index {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	#[serde(default = "default_index_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub summarizer: LlmProviderConfig,
	pub guidance: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub max_distance: f32,
	pub n_results: u32,
	pub buckets: BucketBounds,
}
impl Default for Search {
	fn default() -> Self {
		Self { max_distance: 0.55, n_results: 1_000, buckets: BucketBounds::default() }
	}
}

/// Similarity band cut points as fractions of `search.max_distance`, in
/// ascending order. Everything past `related` lands in the loose band.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct BucketBounds {
	pub most_similar: f32,
	pub similar: f32,
	pub related: f32,
}
impl Default for BucketBounds {
	fn default() -> Self {
		Self { most_similar: 0.3, similar: 0.6, related: 0.8 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Gather {
	pub concurrency: u32,
	pub max_similar_tickets: u32,
	pub note_char_limit: u32,
}
impl Default for Gather {
	fn default() -> Self {
		Self { concurrency: 5, max_similar_tickets: 5, note_char_limit: 600 }
	}
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Retry {
	pub max_attempts: u32,
	pub base_delay_ms: u64,
	pub max_delay_ms: u64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { max_attempts: 3, base_delay_ms: 500, max_delay_ms: 30_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Taxonomy {
	pub path: String,
}
impl Default for Taxonomy {
	fn default() -> Self {
		Self { path: "categories.json".to_string() }
	}
}

fn default_index_timeout_ms() -> u64 {
	10_000
}
