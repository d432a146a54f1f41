mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Augmentation, Config, EmbeddingProviderConfig, Ingestion, KNOWN_SOURCE_IDS, Postgres, Providers,
	Qdrant, Quality, Retrieval, Service, SourceConfig, Storage,
};

use std::{collections::HashSet, fs, path::Path};

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
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.stage1_width == 0 {
		return Err(Error::Validation {
			message: "retrieval.stage1_width must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.stage2_width == 0 {
		return Err(Error::Validation {
			message: "retrieval.stage2_width must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.stage2_width > cfg.retrieval.stage1_width {
		return Err(Error::Validation {
			message: "retrieval.stage2_width must not exceed retrieval.stage1_width.".to_string(),
		});
	}
	if !cfg.retrieval.relevance_floor.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.relevance_floor must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.relevance_floor) {
		return Err(Error::Validation {
			message: "retrieval.relevance_floor must be within 0.0..=1.0.".to_string(),
		});
	}
	if cfg.quality.min_results == 0 {
		return Err(Error::Validation {
			message: "quality.min_results must be greater than zero.".to_string(),
		});
	}
	if !cfg.ingestion.embed_sample_rate.is_finite() {
		return Err(Error::Validation {
			message: "ingestion.embed_sample_rate must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.ingestion.embed_sample_rate) {
		return Err(Error::Validation {
			message: "ingestion.embed_sample_rate must be within 0.0..=1.0.".to_string(),
		});
	}
	if cfg.sources.is_empty() {
		return Err(Error::Validation { message: "sources must be non-empty.".to_string() });
	}

	let mut seen_ids = HashSet::new();

	for source in &cfg.sources {
		if !KNOWN_SOURCE_IDS.contains(&source.id.as_str()) {
			return Err(Error::Validation {
				message: format!(
					"sources.id {:?} must be one of arxiv, semantic_scholar, pubmed, or crossref.",
					source.id
				),
			});
		}
		if !seen_ids.insert(source.id.as_str()) {
			return Err(Error::Validation {
				message: format!("sources.id {:?} must be unique.", source.id),
			});
		}
		if source.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("sources.api_base must be non-empty for {:?}.", source.id),
			});
		}
		if source.request_cap == 0 {
			return Err(Error::Validation {
				message: format!("sources.request_cap must be greater than zero for {:?}.", source.id),
			});
		}
		if source.timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("sources.timeout_ms must be greater than zero for {:?}.", source.id),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	while cfg.providers.embedding.api_base.ends_with('/') {
		cfg.providers.embedding.api_base.pop();
	}

	for source in &mut cfg.sources {
		if source.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
			source.api_key = None;
		}
		if source.mailto.as_deref().map(|address| address.trim().is_empty()).unwrap_or(false) {
			source.mailto = None;
		}

		while source.api_base.ends_with('/') {
			source.api_base.pop();
		}
	}
}
