//! Scripted provider doubles shared by the service-level tests.
#![allow(dead_code)]

use std::{
	collections::{HashMap, HashSet},
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::Value;

use sift_config::{EmbeddingProviderConfig, Helpdesk, LlmProviderConfig};
use sift_domain::{Candidate, TicketDetail};
use sift_service::{
	BoxFuture, ChatProvider, DirectoryProvider, EmbeddingProvider, PrincipalKind, Providers,
	SiftService, TicketSource, VectorIndex,
};

pub fn service_with(providers: Providers) -> SiftService {
	SiftService::with_providers(
		sift_testkit::test_config(),
		providers,
		sift_testkit::sample_taxonomy(),
	)
}

pub fn arc_providers(
	embedding: Arc<FixedEmbedding>,
	chat: Arc<ScriptedChat>,
	index: Arc<ScriptedIndex>,
	tickets: Arc<ScriptedTickets>,
	directory: Arc<ScriptedDirectory>,
) -> Providers {
	Providers::new(embedding, chat, index, tickets, directory)
}

/// Embedding double returning one constant vector per input text.
pub struct FixedEmbedding {
	pub dim: usize,
	pub calls: AtomicUsize,
}
impl FixedEmbedding {
	pub fn new(dim: usize) -> Arc<Self> {
		Arc::new(Self { dim, calls: AtomicUsize::new(0) })
	}
}
impl EmbeddingProvider for FixedEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, sift_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Ok(texts.iter().map(|_| vec![0.1; self.dim]).collect())
		})
	}
}

/// Chat double replaying scripted replies in order.
pub struct ScriptedChat {
	replies: Mutex<Vec<sift_providers::Result<String>>>,
	pub calls: AtomicUsize,
}
impl ScriptedChat {
	pub fn new(replies: Vec<sift_providers::Result<String>>) -> Arc<Self> {
		Arc::new(Self { replies: Mutex::new(replies), calls: AtomicUsize::new(0) })
	}

	pub fn silent() -> Arc<Self> {
		Self::new(Vec::new())
	}
}
impl ChatProvider for ScriptedChat {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, sift_providers::Result<String>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let mut replies = self.replies.lock().unwrap_or_else(|err| err.into_inner());

			if replies.is_empty() {
				return Err(sift_providers::Error::InvalidResponse {
					message: "no scripted chat reply left".to_string(),
				});
			}

			replies.remove(0)
		})
	}
}

/// Index double returning a fixed hit list regardless of the query vector.
pub struct ScriptedIndex {
	pub hits: Vec<Candidate>,
	pub fail: bool,
	pub calls: AtomicUsize,
}
impl ScriptedIndex {
	pub fn new(hits: Vec<Candidate>) -> Arc<Self> {
		Arc::new(Self { hits, fail: false, calls: AtomicUsize::new(0) })
	}

	pub fn failing() -> Arc<Self> {
		Arc::new(Self { hits: Vec::new(), fail: true, calls: AtomicUsize::new(0) })
	}
}
impl VectorIndex for ScriptedIndex {
	fn nearest<'a>(
		&'a self,
		_vector: Vec<f32>,
		_n: u64,
	) -> BoxFuture<'a, sift_index::Result<Vec<Candidate>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if self.fail {
				return Err(sift_index::Error::Unavailable {
					message: "index offline".to_string(),
				});
			}

			Ok(self.hits.clone())
		})
	}
}

/// Ticket source double with per-ticket delays, scripted failures, and an
/// in-flight high-water mark for concurrency assertions.
#[derive(Default)]
pub struct ScriptedTickets {
	pub tickets: HashMap<u64, TicketDetail>,
	pub delays_ms: HashMap<u64, u64>,
	pub fail_ids: HashSet<u64>,
	pub calls: AtomicUsize,
	in_flight: AtomicUsize,
	pub high_water: AtomicUsize,
}
impl ScriptedTickets {
	pub fn new(tickets: impl IntoIterator<Item = TicketDetail>) -> Self {
		Self {
			tickets: tickets.into_iter().map(|detail| (detail.ticket_id, detail)).collect(),
			..Self::default()
		}
	}

	pub fn with_delay(mut self, ticket_id: u64, delay_ms: u64) -> Self {
		self.delays_ms.insert(ticket_id, delay_ms);

		self
	}

	pub fn with_failure(mut self, ticket_id: u64) -> Self {
		self.fail_ids.insert(ticket_id);

		self
	}
}
impl TicketSource for ScriptedTickets {
	fn fetch_ticket<'a>(
		&'a self,
		_cfg: &'a Helpdesk,
		ticket_id: u64,
	) -> BoxFuture<'a, sift_providers::Result<TicketDetail>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

			self.high_water.fetch_max(current, Ordering::SeqCst);

			if let Some(delay) = self.delays_ms.get(&ticket_id) {
				tokio::time::sleep(Duration::from_millis(*delay)).await;
			}

			let result = if self.fail_ids.contains(&ticket_id) {
				Err(sift_providers::Error::Http { status: 500 })
			} else {
				self.tickets
					.get(&ticket_id)
					.cloned()
					.ok_or(sift_providers::Error::Http { status: 404 })
			};

			self.in_flight.fetch_sub(1, Ordering::SeqCst);

			result
		})
	}
}

/// Directory double. `fail_first` failures are retryable throttles consumed
/// across calls, so tests can script "fails now, succeeds later" sequences.
#[derive(Default)]
pub struct ScriptedDirectory {
	pub names: HashMap<(PrincipalKind, u64), String>,
	fail_first: Mutex<HashMap<(PrincipalKind, u64), u32>>,
	pub calls: AtomicUsize,
}
impl ScriptedDirectory {
	pub fn new(names: impl IntoIterator<Item = (PrincipalKind, u64, &'static str)>) -> Self {
		Self {
			names: names
				.into_iter()
				.map(|(kind, id, name)| ((kind, id), name.to_string()))
				.collect(),
			..Self::default()
		}
	}

	pub fn with_fail_first(self, kind: PrincipalKind, id: u64, failures: u32) -> Self {
		{
			let mut fail_first =
				self.fail_first.lock().unwrap_or_else(|err| err.into_inner());

			fail_first.insert((kind, id), failures);
		}

		self
	}
}
impl DirectoryProvider for ScriptedDirectory {
	fn resolve_name<'a>(
		&'a self,
		_cfg: &'a Helpdesk,
		kind: PrincipalKind,
		id: u64,
	) -> BoxFuture<'a, sift_providers::Result<String>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			{
				let mut fail_first =
					self.fail_first.lock().unwrap_or_else(|err| err.into_inner());

				if let Some(remaining) = fail_first.get_mut(&(kind, id))
					&& *remaining > 0
				{
					*remaining -= 1;

					return Err(sift_providers::Error::Http { status: 429 });
				}
			}

			self.names
				.get(&(kind, id))
				.cloned()
				.ok_or(sift_providers::Error::Http { status: 404 })
		})
	}
}
