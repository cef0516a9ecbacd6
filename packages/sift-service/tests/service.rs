mod common;

use std::sync::{Arc, atomic::Ordering};

use sift_domain::Bucket;
use sift_service::{PrincipalKind, SearchRequest, ServiceError};
use sift_testkit::{candidate, candidate_with_subject, ticket_detail};

use common::{
	FixedEmbedding, ScriptedChat, ScriptedDirectory, ScriptedIndex, ScriptedTickets,
	arc_providers, service_with,
};

fn default_directory() -> ScriptedDirectory {
	ScriptedDirectory::new([
		(PrincipalKind::Agent, 7, "Sam Torres"),
		(PrincipalKind::Group, 21, "CAD Support"),
	])
}

#[tokio::test]
async fn search_buckets_and_orders_candidates() {
	let index = ScriptedIndex::new(vec![
		candidate(9_999, 0.95),
		candidate(6_427, 0.45),
		candidate(4_295, 0.12),
	]);
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		index,
		Arc::new(ScriptedTickets::default()),
		Arc::new(default_directory()),
	));
	let mut req = SearchRequest::free_text("Revit crashes when opening the shared model");
	req.max_distance = Some(0.8);

	let response = service.search(&req).await.expect("search should succeed");
	let ids: Vec<u64> = response.items.iter().map(|item| item.candidate.ticket_id).collect();

	assert_eq!(ids, [4_295, 6_427]);
	assert_eq!(response.items[0].bucket, Bucket::MostSimilar);
	assert_eq!(response.items[1].bucket, Bucket::Similar);
	assert!(response.detected_tokens.contains(&"revit".to_string()));
}

#[tokio::test]
async fn duplicate_hits_collapse_to_their_best_distance() {
	let index = ScriptedIndex::new(vec![
		candidate(4_295, 0.40),
		candidate(4_295, 0.12),
		candidate(6_427, 0.45),
	]);
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		index,
		Arc::new(ScriptedTickets::default()),
		Arc::new(default_directory()),
	));
	let response = service
		.search(&SearchRequest::free_text("vpn keeps dropping"))
		.await
		.expect("search should succeed");

	assert_eq!(response.items.len(), 2);
	assert_eq!(response.items[0].candidate.ticket_id, 4_295);
	assert_eq!(response.items[0].candidate.distance, 0.12);
}

#[tokio::test]
async fn search_is_idempotent_for_a_fixed_index() {
	let hits = vec![candidate(3, 0.2), candidate(1, 0.2), candidate(2, 0.1)];
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		ScriptedIndex::new(hits),
		Arc::new(ScriptedTickets::default()),
		Arc::new(default_directory()),
	));
	let req = SearchRequest::free_text("outlook will not start");
	let first = service.search(&req).await.expect("first search");
	let second = service.search(&req).await.expect("second search");

	let order = |items: &[sift_service::SearchItem]| {
		items.iter().map(|item| item.candidate.ticket_id).collect::<Vec<_>>()
	};

	assert_eq!(order(&first.items), [2, 1, 3]);
	assert_eq!(order(&first.items), order(&second.items));
}

#[tokio::test]
async fn token_filter_can_empty_the_result_set_without_error() {
	let index = ScriptedIndex::new(vec![
		candidate_with_subject(1, 0.1, "Printer out of toner"),
		candidate_with_subject(2, 0.2, "New monitor request"),
	]);
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		index,
		Arc::new(ScriptedTickets::default()),
		Arc::new(default_directory()),
	));
	let mut req = SearchRequest::free_text("revit crash on open");
	req.require_token_match = true;

	let response = service.search(&req).await.expect("search should succeed");

	assert!(response.items.is_empty());
}

#[tokio::test]
async fn same_category_only_rejects_free_text_queries() {
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		ScriptedIndex::new(Vec::new()),
		Arc::new(ScriptedTickets::default()),
		Arc::new(default_directory()),
	));
	let mut req = SearchRequest::free_text("revit crash");
	req.same_category_only = true;

	let result = service.search(&req).await;

	assert!(matches!(result, Err(ServiceError::InvalidRequest { .. })));
}

#[tokio::test]
async fn embedding_dimension_mismatch_is_fatal() {
	let service = service_with(arc_providers(
		FixedEmbedding::new(4),
		ScriptedChat::silent(),
		ScriptedIndex::new(Vec::new()),
		Arc::new(ScriptedTickets::default()),
		Arc::new(default_directory()),
	));
	let result = service.search(&SearchRequest::free_text("revit crash")).await;

	assert!(matches!(result, Err(ServiceError::EmbeddingUnavailable { .. })));
}

#[tokio::test]
async fn index_outage_is_fatal() {
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		ScriptedIndex::failing(),
		Arc::new(ScriptedTickets::default()),
		Arc::new(default_directory()),
	));
	let result = service.search(&SearchRequest::free_text("revit crash")).await;

	assert!(matches!(result, Err(ServiceError::IndexUnavailable { .. })));
}

#[tokio::test]
async fn seeded_search_folds_the_seed_category_into_tokens() {
	let index = ScriptedIndex::new(vec![candidate_with_subject(2, 0.2, "Revit license error")]);
	let tickets = ScriptedTickets::new([ticket_detail(1)]);
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		index,
		Arc::new(tickets),
		Arc::new(default_directory()),
	));
	let response = service
		.search(&SearchRequest::ticket_seed(1))
		.await
		.expect("seeded search should succeed");

	assert!(response.detected_tokens.contains(&"revit".to_string()));
	assert!(response.query_text.starts_with("Ticket 1"));
	assert_eq!(response.items.len(), 1);
	assert!(response.items[0].signals.token_match);
}

#[tokio::test]
async fn gather_preserves_candidate_order_under_scrambled_completion() {
	let tickets = ScriptedTickets::new([ticket_detail(1), ticket_detail(2), ticket_detail(3)])
		.with_delay(1, 30)
		.with_delay(2, 1)
		.with_delay(3, 10);
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		ScriptedIndex::new(Vec::new()),
		Arc::new(tickets),
		Arc::new(default_directory()),
	));
	let candidates = [candidate(1, 0.1), candidate(2, 0.2), candidate(3, 0.3)];
	let contexts = service.gather_contexts(&candidates).await;
	let ids: Vec<u64> = contexts.iter().map(|context| context.ticket_id).collect();

	assert_eq!(ids, [1, 2, 3]);
	assert!(contexts.iter().all(|context| !context.notes_incomplete));
}

#[tokio::test]
async fn gather_concurrency_stays_under_the_configured_cap() {
	let tickets = Arc::new(
		ScriptedTickets::new((1..=5).map(ticket_detail))
			.with_delay(1, 20)
			.with_delay(2, 20)
			.with_delay(3, 20)
			.with_delay(4, 20)
			.with_delay(5, 20),
	);
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		ScriptedIndex::new(Vec::new()),
		tickets.clone(),
		Arc::new(default_directory()),
	));
	let candidates: Vec<_> = (1..=5).map(|id| candidate(id, 0.1)).collect();
	let contexts = service.gather_contexts(&candidates).await;

	assert_eq!(contexts.len(), 5);
	// test_config caps gather concurrency at 2.
	assert!(tickets.high_water.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn failed_enrichment_degrades_to_index_metadata() {
	let tickets = ScriptedTickets::new([ticket_detail(1)]).with_failure(2);
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		ScriptedIndex::new(Vec::new()),
		Arc::new(tickets),
		Arc::new(default_directory()),
	));
	let candidates =
		[candidate(1, 0.1), candidate_with_subject(2, 0.2, "Bluebeam license expired")];
	let contexts = service.gather_contexts(&candidates).await;

	assert_eq!(contexts.len(), 2);
	assert!(!contexts[0].notes_incomplete);
	assert!(contexts[1].notes_incomplete);
	assert_eq!(contexts[1].subject, "Bluebeam license expired");
	assert!(contexts[1].notes.is_empty());
}

#[tokio::test]
async fn missing_agent_and_group_use_sentinel_names() {
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		ScriptedIndex::new(Vec::new()),
		Arc::new(ScriptedTickets::default()),
		Arc::new(ScriptedDirectory::default()),
	));

	assert_eq!(service.resolve_name(PrincipalKind::Agent, None).await, "Unassigned");
	assert_eq!(service.resolve_name(PrincipalKind::Group, None).await, "Unknown");
}

#[tokio::test]
async fn resolved_names_are_cached_per_process() {
	let directory = Arc::new(default_directory());
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		ScriptedIndex::new(Vec::new()),
		Arc::new(ScriptedTickets::default()),
		directory.clone(),
	));

	for _ in 0..3 {
		assert_eq!(service.resolve_name(PrincipalKind::Agent, Some(7)).await, "Sam Torres");
	}

	assert_eq!(directory.calls.load(Ordering::SeqCst), 1);

	service.names().invalidate(PrincipalKind::Agent, 7);

	assert_eq!(service.resolve_name(PrincipalKind::Agent, Some(7)).await, "Sam Torres");
	assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_lookups_are_never_negatively_cached() {
	// Four throttles: the first resolve burns three attempts and reports the
	// sentinel, the second starts fresh and recovers on its second attempt.
	let directory = Arc::new(
		ScriptedDirectory::new([(PrincipalKind::Group, 21, "CAD Support")])
			.with_fail_first(PrincipalKind::Group, 21, 4),
	);
	let service = service_with(arc_providers(
		FixedEmbedding::new(8),
		ScriptedChat::silent(),
		ScriptedIndex::new(Vec::new()),
		Arc::new(ScriptedTickets::default()),
		directory.clone(),
	));

	assert_eq!(service.resolve_name(PrincipalKind::Group, Some(21)).await, "Unknown");
	assert_eq!(directory.calls.load(Ordering::SeqCst), 3);
	assert_eq!(service.resolve_name(PrincipalKind::Group, Some(21)).await, "CAD Support");
	assert_eq!(directory.calls.load(Ordering::SeqCst), 5);
}
