use serde::{Deserialize, Serialize};

use crate::category::CategoryPath;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
	#[default]
	Low,
	Medium,
	High,
}
impl Confidence {
	/// Models occasionally answer with prose ("medium - limited evidence").
	/// Anything that does not start with a known level coerces to `Low`.
	pub fn from_model_value(raw: &str) -> Self {
		let lowered = raw.trim().to_lowercase();

		if lowered.starts_with("high") {
			Self::High
		} else if lowered.starts_with("medium") {
			Self::Medium
		} else {
			Self::Low
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Low => "low",
			Self::Medium => "medium",
			Self::High => "high",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportingTicket {
	pub ticket_id: u64,
	pub rationale: String,
}

/// Structured recommendation produced by one synthesis call. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guidance {
	pub agent_markdown: String,
	pub recommended_category: CategoryPath,
	#[serde(default)]
	pub recommended_group: Option<String>,
	pub confidence: Confidence,
	#[serde(default)]
	pub supporting_tickets: Vec<SupportingTicket>,
}
impl Guidance {
	/// The degraded shape used when the model reply is not parseable JSON:
	/// the raw text is still worth surfacing to the agent.
	pub fn raw_fallback(raw_text: String) -> Self {
		Self {
			agent_markdown: raw_text,
			recommended_category: CategoryPath::default(),
			recommended_group: None,
			confidence: Confidence::Low,
			supporting_tickets: Vec::new(),
		}
	}
}

/// Synthesis result. The fallback path is part of the signature rather than
/// hidden control flow; callers can tell a parsed recommendation from a
/// best-effort raw reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuidanceOutcome {
	Structured(Guidance),
	RawFallback(Guidance),
}
impl GuidanceOutcome {
	pub fn guidance(&self) -> &Guidance {
		match self {
			Self::Structured(guidance) | Self::RawFallback(guidance) => guidance,
		}
	}

	pub fn is_fallback(&self) -> bool {
		matches!(self, Self::RawFallback(_))
	}
}
