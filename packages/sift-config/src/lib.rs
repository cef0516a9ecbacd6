mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	BucketBounds, Config, EmbeddingProviderConfig, Gather, Helpdesk, Index, LlmProviderConfig,
	Providers, Retry, Search, Service, Taxonomy,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.helpdesk.api_base.trim().is_empty() {
		return Err(Error::Validation { message: "helpdesk.api_base must be non-empty.".to_string() });
	}
	if cfg.helpdesk.api_key.trim().is_empty() {
		return Err(Error::Validation { message: "helpdesk.api_key must be non-empty.".to_string() });
	}
	if cfg.index.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "index.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.index.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match index.vector_dim.".to_string(),
		});
	}
	if !cfg.search.max_distance.is_finite() || cfg.search.max_distance <= 0.0 {
		return Err(Error::Validation {
			message: "search.max_distance must be a positive finite number.".to_string(),
		});
	}
	if cfg.search.n_results == 0 {
		return Err(Error::Validation {
			message: "search.n_results must be greater than zero.".to_string(),
		});
	}

	let bounds = &cfg.search.buckets;

	for (label, fraction) in [
		("most_similar", bounds.most_similar),
		("similar", bounds.similar),
		("related", bounds.related),
	] {
		if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
			return Err(Error::Validation {
				message: format!("search.buckets.{label} must be in the range (0.0, 1.0]."),
			});
		}
	}
	if bounds.most_similar >= bounds.similar || bounds.similar >= bounds.related {
		return Err(Error::Validation {
			message: "search.buckets cut points must be strictly ascending.".to_string(),
		});
	}

	if cfg.gather.concurrency == 0 {
		return Err(Error::Validation {
			message: "gather.concurrency must be greater than zero.".to_string(),
		});
	}
	if cfg.gather.max_similar_tickets == 0 {
		return Err(Error::Validation {
			message: "gather.max_similar_tickets must be greater than zero.".to_string(),
		});
	}
	if cfg.gather.note_char_limit == 0 {
		return Err(Error::Validation {
			message: "gather.note_char_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "retry.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.retry.base_delay_ms > cfg.retry.max_delay_ms {
		return Err(Error::Validation {
			message: "retry.base_delay_ms must not exceed retry.max_delay_ms.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("summarizer", &cfg.providers.summarizer.api_key),
		("guidance", &cfg.providers.guidance.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

/// Neighbor counts outside this window are clamped rather than rejected.
const N_RESULTS_MIN: u32 = 50;
const N_RESULTS_MAX: u32 = 2_000;

pub fn normalize(cfg: &mut Config) {
	cfg.search.n_results = cfg.search.n_results.clamp(N_RESULTS_MIN, N_RESULTS_MAX);

	if let Some(trimmed) = cfg.helpdesk.api_base.strip_suffix('/') {
		cfg.helpdesk.api_base = trimmed.to_string();
	}
	if let Some(trimmed) = cfg.providers.embedding.api_base.strip_suffix('/') {
		cfg.providers.embedding.api_base = trimmed.to_string();
	}
	if let Some(trimmed) = cfg.providers.summarizer.api_base.strip_suffix('/') {
		cfg.providers.summarizer.api_base = trimmed.to_string();
	}
	if let Some(trimmed) = cfg.providers.guidance.api_base.strip_suffix('/') {
		cfg.providers.guidance.api_base = trimmed.to_string();
	}
}
