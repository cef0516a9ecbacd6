use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use sift_domain::{ConversationNote, TicketDetail, text};

use crate::{Error, Result};

/// Fetches one ticket with its conversation thread.
pub async fn fetch_ticket(cfg: &sift_config::Helpdesk, ticket_id: u64) -> Result<TicketDetail> {
	let json = get_json(cfg, &format!("tickets/{ticket_id}?include=conversations")).await?;

	parse_ticket(ticket_id, json)
}

pub async fn fetch_agent_name(cfg: &sift_config::Helpdesk, agent_id: u64) -> Result<String> {
	let json = get_json(cfg, &format!("agents/{agent_id}")).await?;

	parse_agent_name(&json).ok_or_else(|| Error::InvalidResponse {
		message: format!("agent {agent_id} record has no usable name"),
	})
}

pub async fn fetch_group_name(cfg: &sift_config::Helpdesk, group_id: u64) -> Result<String> {
	let json = get_json(cfg, &format!("groups/{group_id}")).await?;

	json.get("group")
		.unwrap_or(&json)
		.get("name")
		.and_then(|v| v.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: format!("group {group_id} record has no name"),
		})
}

async fn get_json(cfg: &sift_config::Helpdesk, path: &str) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/{path}", cfg.api_base);
	// The helpdesk API authenticates with the key as the basic-auth user and
	// an arbitrary password.
	let res = client.get(url).basic_auth(&cfg.api_key, Some("X")).send().await?;
	let status = res.status();
	if !status.is_success() {
		return Err(Error::Http { status: status.as_u16() });
	}

	Ok(res.json().await?)
}

fn parse_ticket(ticket_id: u64, json: Value) -> Result<TicketDetail> {
	let ticket = json.get("ticket").unwrap_or(&json);
	let subject = str_field(ticket, "subject").unwrap_or_default();
	let description = match str_field(ticket, "description_text") {
		Some(plain) if !plain.trim().is_empty() => plain,
		_ => str_field(ticket, "description").map(|html| text::html_to_text(&html)).unwrap_or_default(),
	};
	let notes = ticket
		.get("conversations")
		.and_then(|v| v.as_array())
		.map(|items| items.iter().map(parse_note).collect())
		.unwrap_or_default();

	Ok(TicketDetail {
		ticket_id,
		subject,
		description,
		category: str_field(ticket, "category"),
		subcategory: str_field(ticket, "sub_category"),
		item: str_field(ticket, "item_category"),
		group_id: u64_field(ticket, "group_id"),
		responder_id: u64_field(ticket, "responder_id"),
		status: ticket.get("status").and_then(|v| v.as_i64()),
		priority: ticket.get("priority").and_then(|v| v.as_i64()),
		created_at: timestamp_field(ticket, "created_at"),
		notes,
	})
}

fn parse_note(item: &Value) -> ConversationNote {
	let body = match str_field(item, "body_text") {
		Some(plain) if !plain.trim().is_empty() => plain,
		_ => str_field(item, "body").map(|html| text::html_to_text(&html)).unwrap_or_default(),
	};

	ConversationNote {
		body,
		is_private: item.get("private").and_then(|v| v.as_bool()).unwrap_or(false),
		author: str_field(item, "user_name"),
		created_at: timestamp_field(item, "created_at"),
	}
}

fn parse_agent_name(json: &Value) -> Option<String> {
	let agent = json.get("agent").unwrap_or(json);

	full_name(agent)
		.or_else(|| str_field(agent, "name"))
		.or_else(|| agent.get("contact").and_then(|c| str_field(c, "name").or_else(|| full_name(c))))
}

fn full_name(record: &Value) -> Option<String> {
	let first = str_field(record, "first_name");
	let last = str_field(record, "last_name");
	let joined =
		[first, last].into_iter().flatten().collect::<Vec<_>>().join(" ").trim().to_string();

	if joined.is_empty() { None } else { Some(joined) }
}

fn str_field(record: &Value, key: &str) -> Option<String> {
	record
		.get(key)
		.and_then(|v| v.as_str())
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
}

fn u64_field(record: &Value, key: &str) -> Option<u64> {
	record.get(key).and_then(|v| v.as_u64())
}

fn timestamp_field(record: &Value, key: &str) -> Option<OffsetDateTime> {
	record
		.get(key)
		.and_then(|v| v.as_str())
		.and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
}
