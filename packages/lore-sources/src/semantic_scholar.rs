use std::time::Duration;

use color_eyre::Result;
use reqwest::Client;
use serde::Deserialize;

use lore_config::SourceConfig;
use lore_domain::{NormalizedPaper, PaperSource, paper, provenance_id, taxonomy};

const SEARCH_FIELDS: &str =
	"paperId,title,abstract,year,publicationDate,authors,venue,externalIds,url,fieldsOfStudy";

#[derive(Debug, Deserialize)]
struct SearchResponse {
	#[serde(default)]
	data: Vec<PaperRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaperRecord {
	paper_id: Option<String>,
	title: Option<String>,
	#[serde(rename = "abstract")]
	abstract_text: Option<String>,
	year: Option<i32>,
	publication_date: Option<String>,
	#[serde(default)]
	authors: Vec<AuthorRecord>,
	venue: Option<String>,
	external_ids: Option<ExternalIds>,
	url: Option<String>,
	fields_of_study: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AuthorRecord {
	name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
	#[serde(rename = "DOI")]
	doi: Option<String>,
}

/// Queries the Semantic Scholar Graph API. The year floor is pushed down to
/// the server as an open-ended range; records without a title or an abstract
/// are dropped.
pub async fn search(
	cfg: &SourceConfig,
	query: &str,
	max_results: u32,
	min_year: Option<i32>,
) -> Result<Vec<NormalizedPaper>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/paper/search", cfg.api_base);
	let mut req = client.get(url).query(&[
		("query", query.to_string()),
		("limit", max_results.to_string()),
		("fields", SEARCH_FIELDS.to_string()),
	]);

	if let Some(floor) = min_year {
		req = req.query(&[("year", format!("{floor}-"))]);
	}
	if let Some(api_key) = cfg.api_key.as_deref() {
		req = req.header("x-api-key", api_key);
	}

	let res: SearchResponse = req.send().await?.error_for_status()?.json().await?;

	Ok(res.data.into_iter().filter_map(normalize).collect())
}

fn normalize(record: PaperRecord) -> Option<NormalizedPaper> {
	let native_id = record.paper_id?;
	let title = record.title.filter(|title| !title.trim().is_empty())?;
	let abstract_text = record.abstract_text.filter(|text| !text.trim().is_empty())?;
	let year = record.year.or_else(|| record.publication_date?.get(..4)?.parse().ok());
	let authors = record.authors.into_iter().filter_map(|author| author.name).collect();
	let venue = record
		.venue
		.filter(|venue| !venue.trim().is_empty())
		.unwrap_or_else(|| "Semantic Scholar".to_string());
	let fields = record.fields_of_study.unwrap_or_default();
	let field = fields
		.first()
		.map(|label| taxonomy::normalize_field_label(label))
		.unwrap_or_else(|| "general".to_string());
	let categories = paper::normalize_categories(
		fields.iter().map(|label| taxonomy::normalize_field_label(label)).collect(),
	);
	let url = record
		.url
		.unwrap_or_else(|| format!("https://www.semanticscholar.org/paper/{native_id}"));

	Some(NormalizedPaper {
		id: provenance_id(PaperSource::SemanticScholar, &native_id),
		title,
		authors,
		year,
		abstract_text: abstract_text.clone(),
		full_text_excerpt: abstract_text,
		venue,
		field,
		categories,
		source: PaperSource::SemanticScholar,
		doi: record.external_ids.and_then(|ids| ids.doi),
		url: Some(url),
		embedding_eligible: false,
	})
}
