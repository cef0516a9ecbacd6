use std::{
	collections::HashMap,
	sync::{Arc, RwLock},
};

use time::OffsetDateTime;

use sift_providers::retry::{RetryPolicy, with_retry};

use crate::SiftService;

/// Label used when a principal cannot be resolved.
const UNKNOWN: &str = "Unknown";
/// Label used when a ticket carries no agent at all.
const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrincipalKind {
	Agent,
	Group,
}
impl PrincipalKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Agent => "agent",
			Self::Group => "group",
		}
	}
}

#[derive(Clone, Debug)]
struct CacheEntry {
	name: String,
	#[allow(dead_code)]
	resolved_at: OffsetDateTime,
}

/// Directory names resolved once per process. Only successful lookups are
/// stored, so a transient failure never pins a sentinel value. Writes are
/// last-write-wins; concurrent resolvers may both hit the directory, which
/// is harmless.
#[derive(Clone, Default)]
pub struct NameCache {
	entries: Arc<RwLock<HashMap<(PrincipalKind, u64), CacheEntry>>>,
}
impl NameCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cached(&self, kind: PrincipalKind, id: u64) -> Option<String> {
		let entries = self.entries.read().unwrap_or_else(|err| err.into_inner());

		entries.get(&(kind, id)).map(|entry| entry.name.clone())
	}

	pub fn store(&self, kind: PrincipalKind, id: u64, name: String) {
		let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());

		entries
			.insert((kind, id), CacheEntry { name, resolved_at: OffsetDateTime::now_utc() });
	}

	pub fn invalidate(&self, kind: PrincipalKind, id: u64) {
		let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());

		entries.remove(&(kind, id));
	}

	pub fn clear(&self) {
		let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());

		entries.clear();
	}

	pub fn len(&self) -> usize {
		let entries = self.entries.read().unwrap_or_else(|err| err.into_inner());

		entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl SiftService {
	/// Resolves a principal to a display name, consulting the cache first.
	/// A missing agent id means the ticket was never assigned; a missing
	/// group id or an exhausted lookup both surface as [`UNKNOWN`].
	pub async fn resolve_name(&self, kind: PrincipalKind, id: Option<u64>) -> String {
		let Some(id) = id else {
			return match kind {
				PrincipalKind::Agent => UNASSIGNED.to_string(),
				PrincipalKind::Group => UNKNOWN.to_string(),
			};
		};

		if let Some(name) = self.names.cached(kind, id) {
			return name;
		}

		let policy = RetryPolicy::from_config(&self.cfg.retry);
		let lookup = with_retry(policy, || {
			self.providers.directory.resolve_name(&self.cfg.helpdesk, kind, id)
		})
		.await;

		match lookup {
			Ok(name) => {
				self.names.store(kind, id, name.clone());

				name
			},
			Err(err) => {
				tracing::warn!(
					kind = kind.as_str(),
					id,
					error = %err,
					"directory lookup failed, using sentinel name",
				);

				UNKNOWN.to_string()
			},
		}
	}
}
