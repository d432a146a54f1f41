use serde::{Deserialize, Serialize};

/// Canonical, provider-independent record of one paper.
///
/// Written once at ingestion and never mutated afterwards; `id` is the sole
/// deduplication key across the whole corpus.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NormalizedPaper {
	pub id: String,
	pub title: String,
	pub authors: Vec<String>,
	pub year: Option<i32>,
	#[serde(rename = "abstract")]
	pub abstract_text: String,
	pub full_text_excerpt: String,
	pub venue: String,
	pub field: String,
	pub categories: Vec<String>,
	pub source: PaperSource,
	pub doi: Option<String>,
	pub url: Option<String>,
	pub embedding_eligible: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperSource {
	Arxiv,
	SemanticScholar,
	Pubmed,
	Crossref,
	Other,
}

impl PaperSource {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Arxiv => "arxiv",
			Self::SemanticScholar => "semantic_scholar",
			Self::Pubmed => "pubmed",
			Self::Crossref => "crossref",
			Self::Other => "other",
		}
	}

	pub fn from_label(label: &str) -> Self {
		match label {
			"arxiv" => Self::Arxiv,
			"semantic_scholar" => Self::SemanticScholar,
			"pubmed" => Self::Pubmed,
			"crossref" => Self::Crossref,
			_ => Self::Other,
		}
	}

	fn id_prefix(&self) -> &'static str {
		match self {
			Self::Arxiv => "arxiv",
			Self::SemanticScholar => "s2",
			Self::Pubmed => "pubmed",
			Self::Crossref => "crossref",
			Self::Other => "other",
		}
	}
}

/// Derives the corpus id from provenance. Deterministic: the same native id
/// from the same provider always yields the same id. DOIs contain `/`.
pub fn provenance_id(source: PaperSource, native_id: &str) -> String {
	format!("{}_{}", source.id_prefix(), native_id.replace('/', "_"))
}

/// Sorted, deduplicated category labels.
pub fn normalize_categories(mut categories: Vec<String>) -> Vec<String> {
	categories.sort();
	categories.dedup();

	categories
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOrigin {
	Keyword,
	Semantic,
}

/// A scored paper inside one retrieval pass. Scores are only comparable to
/// other scores from the same stage.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RetrievalCandidate {
	pub paper: NormalizedPaper,
	pub score: f32,
	pub stage_origin: StageOrigin,
}
