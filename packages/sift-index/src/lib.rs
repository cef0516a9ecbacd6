use std::{collections::HashMap, time::Duration};

use qdrant_client::qdrant::{
	PointId, Query, QueryPointsBuilder, ScoredPoint, Value, point_id::PointIdOptions,
	value::Kind,
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use sift_domain::{Candidate, TicketMeta};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Qdrant(#[from] qdrant_client::QdrantError),
	#[error("{message}")]
	Unavailable { message: String },
}

/// Vector index over embedded ticket documents. Points are stored with a
/// cosine-similarity score space; callers see distances.
pub struct QdrantIndex {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantIndex {
	pub fn new(cfg: &sift_config::Index) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url)
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Returns up to `n` nearest neighbors in ascending distance order.
	/// Points with no recoverable ticket id are dropped.
	pub async fn nearest(&self, vector: Vec<f32>, n: u64) -> Result<Vec<Candidate>> {
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(n);
		let response = self.client.query(search).await?;

		Ok(response.result.iter().filter_map(candidate_of_point).collect())
	}
}

fn candidate_of_point(point: &ScoredPoint) -> Option<Candidate> {
	let ticket_id = payload_u64(&point.payload, "ticket_id")
		.or_else(|| point.id.as_ref().and_then(point_id_num))?;

	Some(Candidate {
		ticket_id,
		// Cosine similarity scores map onto `[0, 2]` distances; rounding can
		// push a score past 1, so clamp at zero.
		distance: (1.0 - point.score).max(0.0),
		meta: meta_of_payload(&point.payload),
	})
}

fn meta_of_payload(payload: &HashMap<String, Value>) -> TicketMeta {
	TicketMeta {
		subject: payload_str(payload, "subject").unwrap_or_default(),
		category: payload_str(payload, "category"),
		subcategory: payload_str(payload, "subcategory")
			.or_else(|| payload_str(payload, "sub_category")),
		item: payload_str(payload, "item").or_else(|| payload_str(payload, "item_category")),
		agent_id: payload_u64(payload, "agent_id").or_else(|| payload_u64(payload, "responder_id")),
		group_id: payload_u64(payload, "group_id"),
		priority: payload_i64(payload, "priority"),
		status: payload_i64(payload, "status"),
		created_at: payload_str(payload, "created_at")
			.and_then(|raw| OffsetDateTime::parse(&raw, &Rfc3339).ok()),
	}
}

fn point_id_num(point_id: &PointId) -> Option<u64> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Num(id)) => Some(*id),
		_ => None,
	}
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::StringValue(text)) if !text.trim().is_empty() => Some(text.clone()),
		_ => None,
	}
}

fn payload_u64(payload: &HashMap<String, Value>, key: &str) -> Option<u64> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::IntegerValue(value)) => u64::try_from(*value).ok(),
		Some(Kind::DoubleValue(value)) => {
			if value.fract() == 0.0 && *value >= 0.0 {
				Some(*value as u64)
			} else {
				None
			}
		},
		Some(Kind::StringValue(text)) => text.parse().ok(),
		_ => None,
	}
}

fn payload_i64(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::IntegerValue(value)) => Some(*value),
		Some(Kind::DoubleValue(value)) => {
			if value.fract() == 0.0 {
				Some(*value as i64)
			} else {
				None
			}
		},
		_ => None,
	}
}
