use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use sift_domain::{
	Bucket, Candidate, QueryIntent, ResultSignals,
	intent::{annotate_candidate, extract_query_intent},
};

use crate::{ServiceError, ServiceResult, SiftService, normalize::NormalizedQuery};

#[derive(Debug, Clone)]
pub enum QuerySource {
	FreeText(String),
	TicketSeed { ticket_id: u64, use_ai_summary: bool },
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
	pub query: QuerySource,
	pub max_distance: Option<f32>,
	pub n_results: Option<u32>,
	pub require_token_match: bool,
	pub same_category_only: bool,
}
impl SearchRequest {
	pub fn free_text(query: impl Into<String>) -> Self {
		Self {
			query: QuerySource::FreeText(query.into()),
			max_distance: None,
			n_results: None,
			require_token_match: false,
			same_category_only: false,
		}
	}

	pub fn ticket_seed(ticket_id: u64) -> Self {
		Self {
			query: QuerySource::TicketSeed { ticket_id, use_ai_summary: false },
			max_distance: None,
			n_results: None,
			require_token_match: false,
			same_category_only: false,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchItem {
	#[serde(flatten)]
	pub candidate: Candidate,
	pub bucket: Bucket,
	pub signals: ResultSignals,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub trace_id: Uuid,
	pub query_text: String,
	pub detected_tokens: Vec<String>,
	pub items: Vec<SearchItem>,
}

impl SiftService {
	/// Finds historical tickets similar to the query, nearest first.
	/// Ticket-seeded queries reuse the seed's category for intent cues.
	pub async fn search(&self, req: &SearchRequest) -> ServiceResult<SearchResponse> {
		let trace_id = Uuid::new_v4();

		if req.same_category_only
			&& matches!(req.query, QuerySource::FreeText(_))
		{
			return Err(ServiceError::InvalidRequest {
				message: "same_category_only requires a ticket-seeded query".to_string(),
			});
		}

		let max_distance = req.max_distance.unwrap_or(self.cfg.search.max_distance);

		if !max_distance.is_finite() || max_distance <= 0.0 {
			return Err(ServiceError::InvalidRequest {
				message: "max_distance must be a positive finite number".to_string(),
			});
		}

		let normalized = self.normalize_query(&req.query).await?;
		let intent =
			extract_query_intent(&normalized.text, normalized.seed_path.as_ref(), &self.taxonomy);
		let vector = self.embed_query(&normalized).await?;
		let n_results = u64::from(req.n_results.unwrap_or(self.cfg.search.n_results));
		let hits = self.providers.index.nearest(vector, n_results).await.map_err(|err| {
			ServiceError::IndexUnavailable { message: err.to_string() }
		})?;
		let candidates = rank_candidates(hits, max_distance);
		let items = self.annotate(candidates, &intent, req, max_distance);

		tracing::debug!(
			%trace_id,
			retained = items.len(),
			tokens = intent.tokens.len(),
			"search completed",
		);

		Ok(SearchResponse {
			trace_id,
			query_text: normalized.text,
			detected_tokens: intent.tokens.iter().cloned().collect(),
			items,
		})
	}

	async fn embed_query(&self, normalized: &NormalizedQuery) -> ServiceResult<Vec<f32>> {
		let texts = [normalized.text.clone()];
		let mut vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &texts)
			.await
			.map_err(|err| ServiceError::EmbeddingUnavailable { message: err.to_string() })?;

		let Some(vector) = vectors.pop() else {
			return Err(ServiceError::EmbeddingUnavailable {
				message: "embedding provider returned no vectors".to_string(),
			});
		};

		if vector.len() != self.cfg.index.vector_dim as usize {
			return Err(ServiceError::EmbeddingUnavailable {
				message: format!(
					"embedding dimension {} does not match index dimension {}",
					vector.len(),
					self.cfg.index.vector_dim,
				),
			});
		}

		Ok(vector)
	}

	fn annotate(
		&self,
		candidates: Vec<Candidate>,
		intent: &QueryIntent,
		req: &SearchRequest,
		max_distance: f32,
	) -> Vec<SearchItem> {
		candidates
			.into_iter()
			.filter_map(|candidate| {
				let signals = annotate_candidate(&candidate, intent);

				if req.require_token_match && !signals.token_match {
					return None;
				}
				if req.same_category_only && !signals.category_match {
					return None;
				}

				let bucket = Bucket::for_distance(
					candidate.distance,
					max_distance,
					&self.cfg.search.buckets,
				);

				Some(SearchItem { candidate, bucket, signals })
			})
			.collect()
	}
}

/// Threshold, dedupe, and order raw index hits. Duplicated ticket ids keep
/// their smallest distance; ties on distance break on ticket id so the
/// ordering is deterministic.
fn rank_candidates(hits: Vec<Candidate>, max_distance: f32) -> Vec<Candidate> {
	let mut best: HashMap<u64, Candidate> = HashMap::new();

	for candidate in hits {
		if candidate.distance > max_distance {
			continue;
		}
		match best.get(&candidate.ticket_id) {
			Some(existing) if existing.distance <= candidate.distance => {},
			_ => {
				best.insert(candidate.ticket_id, candidate);
			},
		}
	}

	let mut ranked: Vec<Candidate> = best.into_values().collect();

	ranked.sort_by(|a, b| {
		a.distance.total_cmp(&b.distance).then_with(|| a.ticket_id.cmp(&b.ticket_id))
	});

	ranked
}
