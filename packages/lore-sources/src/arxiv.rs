use std::time::Duration;

use color_eyre::Result;
use reqwest::Client;

use crate::xml;
use lore_config::SourceConfig;
use lore_domain::{NormalizedPaper, PaperSource, paper, provenance_id, taxonomy};

/// Queries the arXiv Atom API and normalizes every parseable feed entry.
///
/// arXiv has no server-side year filter, so `min_year` is applied here; an
/// entry without a usable publication year is dropped when a floor is set.
pub async fn search(
	cfg: &SourceConfig,
	query: &str,
	max_results: u32,
	min_year: Option<i32>,
) -> Result<Vec<NormalizedPaper>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/query", cfg.api_base);
	let res = client
		.get(url)
		.query(&[
			("search_query", format!("all:{query}")),
			("start", "0".to_string()),
			("max_results", max_results.to_string()),
		])
		.send()
		.await?;
	let feed = res.error_for_status()?.text().await?;

	Ok(parse_feed(&feed, min_year))
}

fn parse_feed(feed: &str, min_year: Option<i32>) -> Vec<NormalizedPaper> {
	let mut papers = Vec::new();

	for entry in xml::blocks(feed, "entry") {
		let Some(paper) = parse_entry(entry) else {
			tracing::debug!("Skipping an arXiv entry with missing fields.");

			continue;
		};

		if let Some(floor) = min_year
			&& paper.year.is_none_or(|year| year < floor)
		{
			continue;
		}

		papers.push(paper);
	}

	papers
}

fn parse_entry(entry: &str) -> Option<NormalizedPaper> {
	let entry_url = xml::tag_text(entry, "id")?;
	// Old-style identifiers such as `cond-mat/0001001` keep their archive
	// segment; `provenance_id` sanitizes the slash.
	let native_id =
		entry_url.rsplit_once("/abs/").map(|(_, id)| id).unwrap_or(&entry_url).to_string();
	let title = xml::tag_text(entry, "title").filter(|title| !title.is_empty())?;
	let abstract_text = xml::tag_text(entry, "summary").filter(|summary| !summary.is_empty())?;
	let year =
		xml::tag_text(entry, "published").and_then(|published| published.get(..4)?.parse().ok());
	let categories = paper::normalize_categories(xml::attr_values(entry, "category", "term"));
	let primary = xml::attr_value(entry, "arxiv:primary_category", "term")
		.or_else(|| categories.first().cloned())
		.unwrap_or_default();

	Some(NormalizedPaper {
		id: provenance_id(PaperSource::Arxiv, &native_id),
		title,
		authors: xml::tag_texts(entry, "name"),
		year,
		abstract_text: abstract_text.clone(),
		full_text_excerpt: abstract_text,
		venue: "arXiv".to_string(),
		field: taxonomy::field_for_category(&primary).to_string(),
		categories,
		source: PaperSource::Arxiv,
		doi: None,
		url: Some(entry_url),
		embedding_eligible: false,
	})
}
