use std::collections::BTreeSet;

use serde_json::{Value, json};

use sift_domain::{CategoryTree, TicketContext, TicketDetail};

const SUMMARIZER_SYSTEM: &str = "You summarize IT helpdesk tickets for similarity search. \
	Reply with one dense paragraph naming the affected product, the symptom, and any error \
	text. No preamble, no advice.";

const GUIDANCE_SYSTEM: &str = "You are an IT helpdesk triage assistant. Using the current \
	ticket and the resolved historical tickets provided as JSON, reply with a single JSON \
	object containing exactly these fields: \
	\"agent_response_markdown\" (markdown remediation steps for the assigned agent, citing \
	historical ticket ids), \
	\"recommended_category_path\" (array of category levels from the supplied taxonomy, \
	most general first), \
	\"recommended_assignment_group\" (one of the supplied assignment groups, or null), \
	\"confidence\" (\"low\", \"medium\", or \"high\"), and \
	\"supporting_tickets\" (array of objects with \"ticket_id\" and \"rationale\"). \
	Base every claim on the supplied tickets. Reply with JSON only.";

pub(crate) fn summarizer_messages(detail: &TicketDetail, description: &str) -> Vec<Value> {
	vec![
		json!({ "role": "system", "content": SUMMARIZER_SYSTEM }),
		json!({
			"role": "user",
			"content": format!("Subject: {}\n\n{description}", detail.subject),
		}),
	]
}

pub(crate) struct GuidancePromptArgs<'a> {
	pub query_text: &'a str,
	pub detected_tokens: &'a [String],
	pub contexts: &'a [TicketContext],
	pub taxonomy: &'a CategoryTree,
}

pub(crate) fn guidance_messages(args: &GuidancePromptArgs<'_>) -> Vec<Value> {
	let similar_tickets: Vec<Value> = args.contexts.iter().map(context_payload).collect();
	let assignment_groups: BTreeSet<&str> = args
		.contexts
		.iter()
		.map(|context| context.group_name.as_str())
		.filter(|name| !name.is_empty() && *name != "Unknown")
		.collect();
	let payload = json!({
		"current_ticket": args.query_text,
		"similar_tickets": similar_tickets,
		"detected_tokens": args.detected_tokens,
		"category_taxonomy": args.taxonomy.as_json(),
		"assignment_groups": assignment_groups.iter().collect::<Vec<_>>(),
	});

	vec![
		json!({ "role": "system", "content": GUIDANCE_SYSTEM }),
		json!({ "role": "user", "content": payload.to_string() }),
	]
}

fn context_payload(context: &TicketContext) -> Value {
	let notes: Vec<Value> = context
		.notes
		.iter()
		.map(|note| {
			json!({
				"body": note.body,
				"is_private": note.is_private,
				"author": note.author,
				"created_at": note.created_at.and_then(|ts| {
					ts.format(&time::format_description::well_known::Rfc3339).ok()
				}),
			})
		})
		.collect();

	json!({
		"ticket_id": context.ticket_id,
		"distance": context.distance,
		"subject": context.subject,
		"description": context.description,
		"category_path": context.path.to_string(),
		"assignment_group": context.group_name,
		"agent": context.agent_name,
		"notes": notes,
		"notes_incomplete": context.notes_incomplete,
	})
}
