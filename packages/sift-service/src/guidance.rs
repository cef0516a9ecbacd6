use serde_json::Value;
use uuid::Uuid;

use sift_domain::{
	Candidate, CategoryPath, CategoryTree, Confidence, Guidance, GuidanceOutcome,
	SupportingTicket, TicketContext,
};

use crate::{
	SearchRequest, SearchResponse, ServiceError, ServiceResult, SiftService,
	prompt::{self, GuidancePromptArgs},
};

/// Where the candidate set comes from. A caller that already ran a search
/// hands over its response and no re-embedding or index query happens.
#[derive(Debug, Clone)]
pub enum GuidanceSeed {
	Query(SearchRequest),
	Results(SearchResponse),
}

#[derive(Debug, Clone)]
pub struct GuidanceRequest {
	pub seed: GuidanceSeed,
}
impl GuidanceRequest {
	pub fn from_query(search: SearchRequest) -> Self {
		Self { seed: GuidanceSeed::Query(search) }
	}

	pub fn from_results(results: SearchResponse) -> Self {
		Self { seed: GuidanceSeed::Results(results) }
	}
}

#[derive(Debug, Clone)]
pub struct GuidanceResponse {
	pub trace_id: Uuid,
	pub query_text: String,
	pub outcome: GuidanceOutcome,
	pub contexts: Vec<TicketContext>,
}

impl SiftService {
	/// Searches for similar resolved tickets, enriches the leaders, and asks
	/// the guidance model for remediation steps grounded in them. A model
	/// reply that is not the expected JSON shape degrades to a raw-text
	/// fallback rather than an error; only the model call itself can fail.
	pub async fn generate_guidance(&self, req: &GuidanceRequest) -> ServiceResult<GuidanceResponse> {
		let search = match &req.seed {
			GuidanceSeed::Query(search) => self.search(search).await?,
			GuidanceSeed::Results(results) => results.clone(),
		};
		let candidates: Vec<Candidate> =
			search.items.iter().map(|item| item.candidate.clone()).collect();
		let contexts = self.gather_contexts(&candidates).await;

		if contexts.is_empty() {
			return Ok(GuidanceResponse {
				trace_id: search.trace_id,
				query_text: search.query_text,
				outcome: GuidanceOutcome::Structured(empty_result_guidance()),
				contexts,
			});
		}

		let messages = prompt::guidance_messages(&GuidancePromptArgs {
			query_text: &search.query_text,
			detected_tokens: &search.detected_tokens,
			contexts: &contexts,
			taxonomy: &self.taxonomy,
		});
		let content = self
			.providers
			.chat
			.complete(&self.cfg.providers.guidance, &messages)
			.await
			.map_err(|err| ServiceError::ModelCall { message: err.to_string() })?;
		let outcome = parse_guidance(&content, &contexts, &self.taxonomy);

		if outcome.is_fallback() {
			tracing::warn!(
				trace_id = %search.trace_id,
				"guidance reply was not valid JSON, returning raw text",
			);
		}

		Ok(GuidanceResponse {
			trace_id: search.trace_id,
			query_text: search.query_text,
			outcome,
			contexts,
		})
	}
}

fn empty_result_guidance() -> Guidance {
	Guidance {
		agent_markdown: "No similar historical tickets were found for this query.".to_string(),
		recommended_category: CategoryPath::default(),
		recommended_group: None,
		confidence: Confidence::Low,
		supporting_tickets: Vec::new(),
	}
}

fn parse_guidance(
	content: &str,
	contexts: &[TicketContext],
	taxonomy: &CategoryTree,
) -> GuidanceOutcome {
	let Some(obj) = parse_json_block(content) else {
		return GuidanceOutcome::RawFallback(Guidance::raw_fallback(content.to_string()));
	};
	let agent_markdown = obj
		.get("agent_response_markdown")
		.and_then(|v| v.as_str())
		.unwrap_or(content)
		.to_string();
	let recommended_group = obj
		.get("recommended_assignment_group")
		.and_then(|v| v.as_str())
		.map(str::trim)
		.filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("null"))
		.map(str::to_string);
	let confidence = obj
		.get("confidence")
		.and_then(|v| v.as_str())
		.map(Confidence::from_model_value)
		.unwrap_or_default();
	let supporting_tickets = supporting_of_value(obj.get("supporting_tickets"));
	let recommended_category = repair_category(
		category_of_value(obj.get("recommended_category_path")),
		&supporting_tickets,
		contexts,
		taxonomy,
	);

	GuidanceOutcome::Structured(Guidance {
		agent_markdown,
		recommended_category,
		recommended_group,
		confidence,
		supporting_tickets,
	})
}

/// Models occasionally wrap the JSON object in prose or code fences.
/// Recovery takes the widest `{ ... }` span and tries again.
fn parse_json_block(content: &str) -> Option<Value> {
	let direct: Option<Value> = serde_json::from_str(content).ok();

	direct.filter(Value::is_object).or_else(|| {
		let start = content.find('{')?;
		let end = content.rfind('}')?;

		if end <= start {
			return None;
		}

		serde_json::from_str(&content[start..=end]).ok().filter(Value::is_object)
	})
}

fn category_of_value(value: Option<&Value>) -> CategoryPath {
	match value {
		Some(Value::Array(levels)) => {
			let levels: Vec<Option<String>> =
				levels.iter().map(|level| level.as_str().map(str::to_string)).collect();

			CategoryPath::from_levels(&levels)
		},
		Some(Value::String(path)) => {
			let levels: Vec<Option<String>> = path
				.split(['>', '→'])
				.map(|level| Some(level.trim().to_string()))
				.collect();

			CategoryPath::from_levels(&levels)
		},
		_ => CategoryPath::default(),
	}
}

fn supporting_of_value(value: Option<&Value>) -> Vec<SupportingTicket> {
	let Some(Value::Array(entries)) = value else {
		return Vec::new();
	};

	entries
		.iter()
		.filter_map(|entry| match entry {
			Value::Object(fields) => {
				let ticket_id = fields.get("ticket_id").and_then(|v| v.as_u64())?;
				let rationale = fields
					.get("rationale")
					.and_then(|v| v.as_str())
					.unwrap_or_default()
					.to_string();

				Some(SupportingTicket { ticket_id, rationale })
			},
			Value::Number(id) => {
				id.as_u64().map(|ticket_id| SupportingTicket { ticket_id, rationale: String::new() })
			},
			_ => None,
		})
		.collect()
}

/// A two-level recommendation gets its item filled in with the most common
/// item among the supporting tickets, provided the taxonomy lists it under
/// that category pair. Ties and unknown items leave the path untouched.
fn repair_category(
	path: CategoryPath,
	supporting: &[SupportingTicket],
	contexts: &[TicketContext],
	taxonomy: &CategoryTree,
) -> CategoryPath {
	if path.depth() != 2 {
		return path;
	}

	let (Some(category), Some(subcategory)) = (&path.category, &path.subcategory) else {
		return path;
	};
	let Some(known_items) = taxonomy.items_for(category, subcategory) else {
		return path;
	};
	let referenced: Vec<&TicketContext> = if supporting.is_empty() {
		contexts.iter().collect()
	} else {
		contexts
			.iter()
			.filter(|context| supporting.iter().any(|s| s.ticket_id == context.ticket_id))
			.collect()
	};
	let votes: Vec<&str> = referenced
		.iter()
		.filter(|context| {
			context
				.path
				.category
				.as_deref()
				.is_some_and(|c| c.eq_ignore_ascii_case(category))
				&& context
					.path
					.subcategory
					.as_deref()
					.is_some_and(|s| s.eq_ignore_ascii_case(subcategory))
		})
		.filter_map(|context| context.path.item.as_deref())
		.collect();

	if votes.is_empty() {
		return path;
	}

	let mut tally: Vec<(&str, usize)> = Vec::new();

	for vote in &votes {
		match tally.iter_mut().find(|(item, _)| item.eq_ignore_ascii_case(vote)) {
			Some((_, count)) => *count += 1,
			None => tally.push((vote, 1)),
		}
	}

	tally.sort_by(|a, b| b.1.cmp(&a.1));

	let Some(&(leader, count)) = tally.first() else {
		return path;
	};

	// A tie at the top means no clear winner.
	if tally.get(1).is_some_and(|&(_, second)| second == count) {
		return path;
	}

	match known_items.iter().find(|item| item.eq_ignore_ascii_case(leader)) {
		Some(canonical) => path.with_item(canonical.clone()),
		None => path,
	}
}
