use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub retrieval: Retrieval,
	pub quality: Quality,
	pub ingestion: Ingestion,
	pub augmentation: Augmentation,
	/// Ordered by priority; the first entry is the primary adapter.
	pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	/// Keyword candidate pool size for the first stage of a staged query.
	pub stage1_width: u32,
	/// Final result count when the caller does not ask for a specific number.
	pub stage2_width: u32,
	/// Candidates scoring below this similarity are dropped from staged results.
	pub relevance_floor: f32,
	#[serde(default = "default_use_two_stage")]
	pub use_two_stage: bool,
}

#[derive(Debug, Deserialize)]
pub struct Quality {
	pub min_results: u32,
	pub min_recent_results: u32,
	pub recency_floor_year: i32,
}

#[derive(Debug, Deserialize)]
pub struct Ingestion {
	pub embed_min_year: i32,
	pub embed_sample_rate: f32,
}

#[derive(Debug, Deserialize)]
pub struct Augmentation {
	pub min_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
	pub id: String,
	pub api_base: String,
	pub request_cap: u32,
	pub timeout_ms: u64,
	/// Politeness pause between consecutive calls to the same host.
	#[serde(default)]
	pub min_interval_ms: u64,
	pub api_key: Option<String>,
	pub mailto: Option<String>,
}

pub const KNOWN_SOURCE_IDS: &[&str] = &["arxiv", "semantic_scholar", "pubmed", "crossref"];

fn default_use_two_stage() -> bool {
	true
}
