//! Shared fixtures for service-level tests. Everything here is pure data;
//! no live backend is contacted.

use sift_config::{
	BucketBounds, Config, EmbeddingProviderConfig, Gather, Helpdesk, Index, LlmProviderConfig,
	Providers, Retry, Search, Service, Taxonomy,
};
use sift_domain::{
	Candidate, CategoryPath, CategoryTree, ConversationNote, TicketContext, TicketDetail,
	TicketMeta,
};

pub const SAMPLE_TAXONOMY_JSON: &str = r#"{
	"Software": {
		"Revit": ["Crash", "License", "Performance"],
		"Bluebeam": ["Crash", "License"],
		"Microsoft Office 365": ["Teams", "Outlook"]
	},
	"Network": {
		"VPN": ["Disconnect", "Setup"]
	}
}"#;

pub fn test_config() -> Config {
	Config {
		service: Service { log_level: "debug".to_string() },
		helpdesk: Helpdesk {
			api_base: "http://127.0.0.1:18080/api/v2".to_string(),
			api_key: "test-key".to_string(),
			timeout_ms: 1_000,
		},
		index: Index {
			url: "http://127.0.0.1:16334".to_string(),
			collection: "tickets_test".to_string(),
			vector_dim: 8,
			timeout_ms: 1_000,
		},
		providers: Providers {
			embedding: embedding_config(),
			summarizer: llm_config("summarizer-test"),
			guidance: llm_config("guidance-test"),
		},
		search: Search { max_distance: 0.55, n_results: 50, buckets: BucketBounds::default() },
		gather: Gather { concurrency: 2, max_similar_tickets: 5, note_char_limit: 600 },
		retry: Retry { max_attempts: 3, base_delay_ms: 1, max_delay_ms: 4 },
		taxonomy: Taxonomy { path: "categories.json".to_string() },
	}
}

fn embedding_config() -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "embedding-test".to_string(),
		api_base: "http://127.0.0.1:18081/v1".to_string(),
		api_key: "test-key".to_string(),
		path: "/embeddings".to_string(),
		model: "test-embedding".to_string(),
		dimensions: 8,
		timeout_ms: 1_000,
		default_headers: serde_json::Map::new(),
	}
}

fn llm_config(provider_id: &str) -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: provider_id.to_string(),
		api_base: "http://127.0.0.1:18082/v1".to_string(),
		api_key: "test-key".to_string(),
		path: "/chat/completions".to_string(),
		model: "test-chat".to_string(),
		temperature: 0.2,
		timeout_ms: 1_000,
		default_headers: serde_json::Map::new(),
	}
}

pub fn sample_taxonomy() -> CategoryTree {
	CategoryTree::from_json_str(SAMPLE_TAXONOMY_JSON).expect("sample taxonomy must parse")
}

pub fn candidate(ticket_id: u64, distance: f32) -> Candidate {
	Candidate {
		ticket_id,
		distance,
		meta: TicketMeta {
			subject: format!("Ticket {ticket_id}"),
			group_id: Some(21),
			agent_id: Some(7),
			..Default::default()
		},
	}
}

pub fn candidate_with_subject(ticket_id: u64, distance: f32, subject: &str) -> Candidate {
	let mut candidate = candidate(ticket_id, distance);
	candidate.meta.subject = subject.to_string();

	candidate
}

pub fn ticket_detail(ticket_id: u64) -> TicketDetail {
	TicketDetail {
		ticket_id,
		subject: format!("Ticket {ticket_id}"),
		description: "Revit crashes when opening the shared model.".to_string(),
		category: Some("Software".to_string()),
		subcategory: Some("Revit".to_string()),
		item: Some("Crash".to_string()),
		group_id: Some(21),
		responder_id: Some(7),
		status: Some(4),
		priority: Some(2),
		created_at: None,
		notes: vec![ConversationNote {
			body: "Cleared the local cache and the crash stopped.".to_string(),
			is_private: true,
			author: Some("Sam Torres".to_string()),
			created_at: None,
		}],
	}
}

pub fn ticket_context(ticket_id: u64, distance: f32, item: &str) -> TicketContext {
	TicketContext {
		ticket_id,
		subject: format!("Ticket {ticket_id}"),
		description: "Revit crashes when opening the shared model.".to_string(),
		path: CategoryPath::new(
			Some("Software".to_string()),
			Some("Revit".to_string()),
			Some(item.to_string()),
		),
		group_id: Some(21),
		group_name: "CAD Support".to_string(),
		agent_name: "Sam Torres".to_string(),
		distance,
		notes: Vec::new(),
		notes_incomplete: false,
	}
}
