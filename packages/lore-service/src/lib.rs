pub mod admin;
pub mod augment;
pub mod ingest;
pub mod retrieve;
pub mod stats;

use std::{future::Future, pin::Pin, sync::Arc};

use color_eyre::eyre;

pub use admin::RebuildReport;
pub use augment::{AdapterPull, AugmentationSummary, ResearchRequest, ResearchResponse};
pub use ingest::{IngestRequest, IngestionReport};
use lore_config::{Config, EmbeddingProviderConfig, SourceConfig};
use lore_domain::NormalizedPaper;
use lore_sources::{arxiv, crossref, embedding, pubmed, semantic_scholar};
use lore_storage::{db::Db, qdrant::QdrantStore};
pub use stats::CorpusStats;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait SourceAdapter
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a SourceConfig,
		query: &'a str,
		max_results: u32,
		min_year: Option<i32>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<NormalizedPaper>>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	KeywordIndexUnavailable { message: String },
	SemanticIndexUnavailable { message: String },
	Embedding { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub sources: Arc<dyn SourceAdapter>,
}

pub struct LoreService {
	pub cfg: Config,
	pub db: Db,
	pub qdrant: QdrantStore,
	pub providers: Providers,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::KeywordIndexUnavailable { message } => {
				write!(f, "Keyword index unavailable: {message}")
			},
			Self::SemanticIndexUnavailable { message } => {
				write!(f, "Semantic index unavailable: {message}")
			},
			Self::Embedding { message } => write!(f, "Embedding provider error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<lore_storage::Error> for ServiceError {
	fn from(err: lore_storage::Error) -> Self {
		match err {
			lore_storage::Error::Sqlx(err) => {
				Self::KeywordIndexUnavailable { message: err.to_string() }
			},
			lore_storage::Error::Qdrant(err) => {
				Self::SemanticIndexUnavailable { message: err.to_string() }
			},
		}
	}
}

impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Embedding { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl SourceAdapter for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a SourceConfig,
		query: &'a str,
		max_results: u32,
		min_year: Option<i32>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<NormalizedPaper>>> {
		Box::pin(async move {
			match cfg.id.as_str() {
				"arxiv" => arxiv::search(cfg, query, max_results, min_year).await,
				"semantic_scholar" => {
					semantic_scholar::search(cfg, query, max_results, min_year).await
				},
				"pubmed" => pubmed::search(cfg, query, max_results, min_year).await,
				"crossref" => crossref::search(cfg, query, max_results, min_year).await,
				other => Err(eyre::eyre!("No adapter is registered for source id {other}.")),
			}
		})
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, sources: Arc<dyn SourceAdapter>) -> Self {
		Self { embedding, sources }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { embedding: provider.clone(), sources: provider }
	}
}

impl LoreService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Self {
		Self { cfg, db, qdrant, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, qdrant: QdrantStore, providers: Providers) -> Self {
		Self { cfg, db, qdrant, providers }
	}

	/// One provider call for the whole batch, checked against the configured
	/// dimension and the input count before anything touches an index.
	pub(crate) async fn embed_checked(&self, texts: &[String]) -> ServiceResult<Vec<Vec<f32>>> {
		let vectors = self.providers.embedding.embed(&self.cfg.providers.embedding, texts).await?;

		if vectors.len() != texts.len() {
			return Err(ServiceError::Embedding {
				message: "Embedding provider returned a mismatched vector count.".to_string(),
			});
		}

		let expected = self.cfg.storage.qdrant.vector_dim as usize;

		if vectors.iter().any(|vector| vector.len() != expected) {
			return Err(ServiceError::Embedding {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vectors)
	}

	pub(crate) async fn embed_topic(&self, topic: &str) -> ServiceResult<Vec<f32>> {
		let vectors = self.embed_checked(&[topic.to_string()]).await?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(ServiceError::Embedding {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		Ok(vector)
	}
}

pub(crate) fn embedding_text(title: &str, abstract_text: &str) -> String {
	format!("{title}. {abstract_text}")
}
