use std::time::Duration;

use color_eyre::Result;
use reqwest::{Client, header::USER_AGENT};
use serde::Deserialize;

use crate::xml;
use lore_config::SourceConfig;
use lore_domain::{NormalizedPaper, PaperSource, paper, provenance_id, taxonomy};

#[derive(Debug, Deserialize)]
struct WorksResponse {
	message: WorksMessage,
}

#[derive(Debug, Deserialize)]
struct WorksMessage {
	#[serde(default)]
	items: Vec<WorkItem>,
}

#[derive(Debug, Deserialize)]
struct WorkItem {
	#[serde(rename = "DOI")]
	doi: Option<String>,
	#[serde(default)]
	title: Vec<String>,
	#[serde(rename = "abstract")]
	abstract_text: Option<String>,
	#[serde(default)]
	author: Vec<WorkAuthor>,
	#[serde(rename = "published-print")]
	published_print: Option<WorkDate>,
	#[serde(rename = "published-online")]
	published_online: Option<WorkDate>,
	created: Option<WorkDate>,
	#[serde(rename = "container-title", default)]
	container_title: Vec<String>,
	#[serde(default)]
	subject: Vec<String>,
	#[serde(rename = "URL")]
	url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkAuthor {
	given: Option<String>,
	family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkDate {
	#[serde(rename = "date-parts", default)]
	date_parts: Vec<Vec<Option<i32>>>,
}

impl WorkDate {
	fn year(&self) -> Option<i32> {
		self.date_parts.first()?.first().copied().flatten()
	}
}

/// Queries the Crossref works API, restricted to journal articles. Crossref
/// serves large result windows slowly, so the row count is capped at 20 per
/// call regardless of what the caller asked for.
pub async fn search(
	cfg: &SourceConfig,
	query: &str,
	max_results: u32,
	min_year: Option<i32>,
) -> Result<Vec<NormalizedPaper>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let mut filter = "type:journal-article".to_string();

	if let Some(floor) = min_year {
		filter.push_str(&format!(",from-pub-date:{floor}-01-01"));
	}

	let rows = max_results.min(20).to_string();
	let res: WorksResponse = client
		.get(&cfg.api_base)
		.header(USER_AGENT, user_agent(cfg))
		.query(&[
			("query", query),
			("rows", rows.as_str()),
			("sort", "relevance"),
			("filter", filter.as_str()),
		])
		.send()
		.await?
		.error_for_status()?
		.json()
		.await?;

	Ok(res.message.items.into_iter().filter_map(normalize).collect())
}

// Crossref routes polite-pool traffic by contact info in the user agent.
fn user_agent(cfg: &SourceConfig) -> String {
	let base = concat!("lore/", env!("CARGO_PKG_VERSION"));

	match cfg.mailto.as_deref() {
		Some(mailto) => format!("{base} (mailto:{mailto})"),
		None => base.to_string(),
	}
}

fn normalize(item: WorkItem) -> Option<NormalizedPaper> {
	let doi = item.doi?;
	let title = item.title.into_iter().next().filter(|title| !title.trim().is_empty())?;
	let title = xml::collapse_whitespace(&title);
	// Crossref abstracts carry JATS markup.
	let abstract_text = item
		.abstract_text
		.map(|text| xml::strip_tags(&text))
		.filter(|text| !text.is_empty())
		.unwrap_or_else(|| title.clone());
	let year = item
		.published_print
		.as_ref()
		.and_then(WorkDate::year)
		.or_else(|| item.published_online.as_ref().and_then(WorkDate::year))
		.or_else(|| item.created.as_ref().and_then(WorkDate::year));
	let authors = item
		.author
		.into_iter()
		.filter_map(|author| match (author.given, author.family) {
			(Some(given), Some(family)) => Some(format!("{given} {family}")),
			(None, Some(family)) => Some(family),
			(Some(given), None) => Some(given),
			(None, None) => None,
		})
		.collect();
	let venue = item
		.container_title
		.into_iter()
		.next()
		.filter(|venue| !venue.trim().is_empty())
		.unwrap_or_else(|| "Crossref".to_string());
	let field = item
		.subject
		.first()
		.map(|label| taxonomy::normalize_field_label(label))
		.unwrap_or_else(|| "general".to_string());
	let categories = paper::normalize_categories(
		item.subject.iter().map(|label| taxonomy::normalize_field_label(label)).collect(),
	);
	let url = item.url.unwrap_or_else(|| format!("https://doi.org/{doi}"));

	Some(NormalizedPaper {
		id: provenance_id(PaperSource::Crossref, &doi),
		title,
		authors,
		year,
		abstract_text: abstract_text.clone(),
		full_text_excerpt: abstract_text,
		venue,
		field,
		categories,
		source: PaperSource::Crossref,
		doi: Some(doi),
		url: Some(url),
		embedding_eligible: false,
	})
}
