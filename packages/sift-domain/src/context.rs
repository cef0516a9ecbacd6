use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::category::CategoryPath;

/// One conversation entry on a ticket. Private notes typically carry the
/// remediation steps the agent actually took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationNote {
	pub body: String,
	pub is_private: bool,
	#[serde(default)]
	pub author: Option<String>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
}

/// Full ticket payload as returned by the helpdesk API, before any cleaning
/// or truncation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketDetail {
	pub ticket_id: u64,
	pub subject: String,
	pub description: String,
	#[serde(default)]
	pub category: Option<String>,
	#[serde(default)]
	pub subcategory: Option<String>,
	#[serde(default)]
	pub item: Option<String>,
	#[serde(default)]
	pub group_id: Option<u64>,
	#[serde(default)]
	pub responder_id: Option<u64>,
	#[serde(default)]
	pub status: Option<i64>,
	#[serde(default)]
	pub priority: Option<i64>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default)]
	pub notes: Vec<ConversationNote>,
}
impl TicketDetail {
	pub fn category_path(&self) -> CategoryPath {
		CategoryPath::new(self.category.clone(), self.subcategory.clone(), self.item.clone())
	}
}

/// Enriched detail gathered for one similar ticket, fed to the guidance
/// model. `notes_incomplete` marks a degraded context built from search
/// metadata alone after the detail fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketContext {
	pub ticket_id: u64,
	pub subject: String,
	pub description: String,
	pub path: CategoryPath,
	#[serde(default)]
	pub group_id: Option<u64>,
	pub group_name: String,
	pub agent_name: String,
	pub distance: f32,
	#[serde(default)]
	pub notes: Vec<ConversationNote>,
	#[serde(default)]
	pub notes_incomplete: bool,
}
