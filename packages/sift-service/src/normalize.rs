use sift_domain::{CategoryPath, TicketDetail, text};

use crate::{QuerySource, ServiceError, ServiceResult, SiftService, prompt};

/// Query text ready for embedding, with the seed ticket's category kept
/// around for intent extraction.
#[derive(Debug, Clone)]
pub struct NormalizedQuery {
	pub text: String,
	pub seed_path: Option<CategoryPath>,
}

impl SiftService {
	pub(crate) async fn normalize_query(
		&self,
		source: &QuerySource,
	) -> ServiceResult<NormalizedQuery> {
		match source {
			QuerySource::FreeText(raw) => {
				let text = text::normalize_ws(raw);

				if text.is_empty() {
					return Err(ServiceError::InvalidRequest {
						message: "query text must be non-empty".to_string(),
					});
				}

				Ok(NormalizedQuery { text, seed_path: None })
			},
			QuerySource::TicketSeed { ticket_id, use_ai_summary } => {
				let detail = self
					.providers
					.tickets
					.fetch_ticket(&self.cfg.helpdesk, *ticket_id)
					.await
					.map_err(|err| ServiceError::Helpdesk {
						message: format!("failed to fetch seed ticket {ticket_id}: {err}"),
					})?;
				let description = text::clean_description(&detail.description);
				let base = seed_text(&detail, &description);
				let text = if *use_ai_summary {
					match self.summarize_seed(&detail, &description).await {
						Ok(summary) => format!(
							"[Ticket {ticket_id}] {summary}\n\n---\n\nOriginal:\n{base}"
						),
						Err(err) => {
							tracing::warn!(
								ticket_id,
								error = %err,
								"seed summarization failed, using raw ticket text",
							);

							base
						},
					}
				} else {
					base
				};
				let path = detail.category_path();
				let seed_path = if path.is_empty() { None } else { Some(path) };

				Ok(NormalizedQuery { text, seed_path })
			},
		}
	}

	async fn summarize_seed(
		&self,
		detail: &TicketDetail,
		description: &str,
	) -> sift_providers::Result<String> {
		let messages = prompt::summarizer_messages(detail, description);

		self.providers.chat.complete(&self.cfg.providers.summarizer, &messages).await
	}
}

fn seed_text(detail: &TicketDetail, description: &str) -> String {
	if description.is_empty() {
		detail.subject.clone()
	} else {
		format!("{}\n\n{description}", detail.subject)
	}
}
