pub mod gather;
pub mod guidance;
pub mod names;
pub mod normalize;
pub mod prompt;
pub mod search;

use std::{path::Path, sync::Arc};

use serde_json::Value;

pub use guidance::{GuidanceRequest, GuidanceResponse, GuidanceSeed};
pub use names::{NameCache, PrincipalKind};
pub use search::{QuerySource, SearchItem, SearchRequest, SearchResponse};
pub use sift_providers::BoxFuture;

use sift_config::{Config, EmbeddingProviderConfig, Helpdesk, LlmProviderConfig};
use sift_domain::{Candidate, CategoryTree, TicketDetail};
use sift_index::QdrantIndex;
use sift_providers::{chat, embedding, helpdesk};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, sift_providers::Result<Vec<Vec<f32>>>>;
}

pub trait ChatProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, sift_providers::Result<String>>;
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn nearest<'a>(
		&'a self,
		vector: Vec<f32>,
		n: u64,
	) -> BoxFuture<'a, sift_index::Result<Vec<Candidate>>>;
}

pub trait TicketSource
where
	Self: Send + Sync,
{
	fn fetch_ticket<'a>(
		&'a self,
		cfg: &'a Helpdesk,
		ticket_id: u64,
	) -> BoxFuture<'a, sift_providers::Result<TicketDetail>>;
}

pub trait DirectoryProvider
where
	Self: Send + Sync,
{
	fn resolve_name<'a>(
		&'a self,
		cfg: &'a Helpdesk,
		kind: PrincipalKind,
		id: u64,
	) -> BoxFuture<'a, sift_providers::Result<String>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	EmbeddingUnavailable { message: String },
	IndexUnavailable { message: String },
	Helpdesk { message: String },
	ModelCall { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub chat: Arc<dyn ChatProvider>,
	pub index: Arc<dyn VectorIndex>,
	pub tickets: Arc<dyn TicketSource>,
	pub directory: Arc<dyn DirectoryProvider>,
}

/// Entry point for the retrieval and guidance pipeline. One instance is
/// shared across requests; the name cache is the only cross-request state.
pub struct SiftService {
	pub cfg: Config,
	pub providers: Providers,
	pub(crate) names: NameCache,
	pub(crate) taxonomy: CategoryTree,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::EmbeddingUnavailable { message } => {
				write!(f, "Embedding provider error: {message}")
			},
			Self::IndexUnavailable { message } => write!(f, "Vector index error: {message}"),
			Self::Helpdesk { message } => write!(f, "Helpdesk error: {message}"),
			Self::ModelCall { message } => write!(f, "Model call error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<sift_index::Error> for ServiceError {
	fn from(err: sift_index::Error) -> Self {
		Self::IndexUnavailable { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, sift_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl ChatProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, sift_providers::Result<String>> {
		Box::pin(chat::complete(cfg, messages))
	}
}

impl TicketSource for DefaultProviders {
	fn fetch_ticket<'a>(
		&'a self,
		cfg: &'a Helpdesk,
		ticket_id: u64,
	) -> BoxFuture<'a, sift_providers::Result<TicketDetail>> {
		Box::pin(helpdesk::fetch_ticket(cfg, ticket_id))
	}
}

impl DirectoryProvider for DefaultProviders {
	fn resolve_name<'a>(
		&'a self,
		cfg: &'a Helpdesk,
		kind: PrincipalKind,
		id: u64,
	) -> BoxFuture<'a, sift_providers::Result<String>> {
		match kind {
			PrincipalKind::Agent => Box::pin(helpdesk::fetch_agent_name(cfg, id)),
			PrincipalKind::Group => Box::pin(helpdesk::fetch_group_name(cfg, id)),
		}
	}
}

impl VectorIndex for QdrantIndex {
	fn nearest<'a>(
		&'a self,
		vector: Vec<f32>,
		n: u64,
	) -> BoxFuture<'a, sift_index::Result<Vec<Candidate>>> {
		Box::pin(QdrantIndex::nearest(self, vector, n))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		chat: Arc<dyn ChatProvider>,
		index: Arc<dyn VectorIndex>,
		tickets: Arc<dyn TicketSource>,
		directory: Arc<dyn DirectoryProvider>,
	) -> Self {
		Self { embedding, chat, index, tickets, directory }
	}

	pub fn from_config(cfg: &Config) -> ServiceResult<Self> {
		let index = QdrantIndex::new(&cfg.index)
			.map_err(|err| ServiceError::IndexUnavailable { message: err.to_string() })?;
		let provider = Arc::new(DefaultProviders);

		Ok(Self {
			embedding: provider.clone(),
			chat: provider.clone(),
			index: Arc::new(index),
			tickets: provider.clone(),
			directory: provider,
		})
	}
}

impl SiftService {
	pub fn new(cfg: Config) -> ServiceResult<Self> {
		let providers = Providers::from_config(&cfg)?;
		let taxonomy = CategoryTree::load(Path::new(&cfg.taxonomy.path));

		Ok(Self { cfg, providers, names: NameCache::new(), taxonomy })
	}

	pub fn with_providers(cfg: Config, providers: Providers, taxonomy: CategoryTree) -> Self {
		Self { cfg, providers, names: NameCache::new(), taxonomy }
	}

	pub fn names(&self) -> &NameCache {
		&self.names
	}
}
