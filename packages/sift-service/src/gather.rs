use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use sift_domain::{Candidate, ConversationNote, TicketContext, TicketDetail, text};
use sift_providers::retry::{RetryPolicy, with_retry};

use crate::{PrincipalKind, SiftService};

impl SiftService {
	/// Enriches the leading candidates with full ticket context. Lookups
	/// run concurrently under the configured cap, and the output order
	/// always mirrors the input order regardless of completion order. A
	/// candidate whose ticket fetch fails degrades to index metadata
	/// instead of dropping out.
	pub async fn gather_contexts(&self, candidates: &[Candidate]) -> Vec<TicketContext> {
		let limit = self.cfg.gather.max_similar_tickets as usize;
		let selected = &candidates[..candidates.len().min(limit)];
		let semaphore = Arc::new(Semaphore::new(self.cfg.gather.concurrency as usize));
		let policy = RetryPolicy::from_config(&self.cfg.retry);
		let lookups = selected.iter().map(|candidate| {
			let semaphore = semaphore.clone();

			async move {
				// The semaphore lives for the whole gather, so acquisition
				// can only fail if it were closed, which never happens.
				let _permit = semaphore.acquire().await.ok();

				match self.fetch_context(candidate, policy).await {
					Ok(context) => context,
					Err(err) => {
						tracing::warn!(
							ticket_id = candidate.ticket_id,
							error = %err,
							"ticket enrichment failed, falling back to index metadata",
						);

						self.fallback_context(candidate).await
					},
				}
			}
		});

		join_all(lookups).await
	}

	async fn fetch_context(
		&self,
		candidate: &Candidate,
		policy: RetryPolicy,
	) -> sift_providers::Result<TicketContext> {
		let detail = with_retry(policy, || {
			self.providers.tickets.fetch_ticket(&self.cfg.helpdesk, candidate.ticket_id)
		})
		.await?;
		let agent_name = self.resolve_name(PrincipalKind::Agent, detail.responder_id).await;
		let group_name = self.resolve_name(PrincipalKind::Group, detail.group_id).await;
		let note_limit = self.cfg.gather.note_char_limit as usize;

		Ok(context_of_detail(candidate, detail, agent_name, group_name, note_limit))
	}

	/// Context assembled from the index payload alone. Marked incomplete so
	/// downstream consumers know the conversation thread is missing.
	async fn fallback_context(&self, candidate: &Candidate) -> TicketContext {
		let agent_name = self.resolve_name(PrincipalKind::Agent, candidate.meta.agent_id).await;
		let group_name = self.resolve_name(PrincipalKind::Group, candidate.meta.group_id).await;

		TicketContext {
			ticket_id: candidate.ticket_id,
			subject: candidate.meta.subject.clone(),
			description: String::new(),
			path: candidate.category_path(),
			group_id: candidate.meta.group_id,
			group_name,
			agent_name,
			distance: candidate.distance,
			notes: Vec::new(),
			notes_incomplete: true,
		}
	}
}

fn context_of_detail(
	candidate: &Candidate,
	detail: TicketDetail,
	agent_name: String,
	group_name: String,
	note_limit: usize,
) -> TicketContext {
	let path = detail.category_path();
	let notes = detail
		.notes
		.into_iter()
		.filter_map(|note| {
			let body = text::truncate_chars(&text::clean_description(&note.body), note_limit);

			if body.is_empty() {
				return None;
			}

			Some(ConversationNote { body, ..note })
		})
		.collect();

	TicketContext {
		ticket_id: detail.ticket_id,
		subject: detail.subject,
		description: text::clean_description(&detail.description),
		path,
		group_id: detail.group_id,
		group_name,
		agent_name,
		distance: candidate.distance,
		notes,
		notes_incomplete: false,
	}
}
