// std
use std::time::Duration;
// crates.io
use color_eyre::Result;
use regex::Regex;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
// self
use crate::xml;
use lore_config::SourceConfig;
use lore_domain::{NormalizedPaper, PaperSource, provenance_id};

#[derive(Debug, Deserialize)]
struct EsearchResponse {
	esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
	#[serde(default)]
	idlist: Vec<String>,
}

/// Two-step E-utilities search: `esearch` for PMIDs, then `efetch` for the
/// article XML. NCBI asks clients to pace consecutive calls, so the fetch
/// waits `min_interval_ms` after the id lookup.
pub async fn search(
	cfg: &SourceConfig,
	query: &str,
	max_results: u32,
	min_year: Option<i32>,
) -> Result<Vec<NormalizedPaper>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let term = search_term(query, min_year);
	let retmax = max_results.to_string();
	let req = etiquette_params(
		client.get(format!("{}/esearch.fcgi", cfg.api_base)).query(&[
			("db", "pubmed"),
			("term", term.as_str()),
			("retmax", retmax.as_str()),
			("retmode", "json"),
			("sort", "relevance"),
		]),
		cfg,
	);
	let found = req.send().await?.error_for_status()?.json::<EsearchResponse>().await?;
	let ids = found.esearchresult.idlist;

	if ids.is_empty() {
		return Ok(Vec::new());
	}
	if cfg.min_interval_ms > 0 {
		tokio::time::sleep(Duration::from_millis(cfg.min_interval_ms)).await;
	}

	let id_list = ids.join(",");
	let req = etiquette_params(
		client.get(format!("{}/efetch.fcgi", cfg.api_base)).query(&[
			("db", "pubmed"),
			("id", id_list.as_str()),
			("retmode", "xml"),
		]),
		cfg,
	);
	let body = req.send().await?.error_for_status()?.text().await?;

	Ok(parse_articles(&body))
}

fn search_term(query: &str, min_year: Option<i32>) -> String {
	match min_year {
		Some(floor) => format!("{query} AND {floor}[PDAT]:3000[PDAT]"),
		None => query.to_string(),
	}
}

fn etiquette_params(mut req: RequestBuilder, cfg: &SourceConfig) -> RequestBuilder {
	if let Some(api_key) = cfg.api_key.as_deref() {
		req = req.query(&[("api_key", api_key)]);
	}
	if let Some(mailto) = cfg.mailto.as_deref() {
		req = req.query(&[("tool", "lore"), ("email", mailto)]);
	}

	req
}

fn parse_articles(body: &str) -> Vec<NormalizedPaper> {
	let mut papers = Vec::new();

	for article in xml::blocks(body, "PubmedArticle") {
		let Some(paper) = parse_article(article) else {
			tracing::debug!("Skipping a PubMed article with missing fields.");

			continue;
		};

		papers.push(paper);
	}

	papers
}

fn parse_article(article: &str) -> Option<NormalizedPaper> {
	let pmid = xml::tag_text(article, "PMID")?;
	let title = xml::tag_text(article, "ArticleTitle").filter(|title| !title.is_empty())?;
	// Structured abstracts arrive as one AbstractText element per section.
	let abstract_parts = xml::tag_texts(article, "AbstractText");
	let abstract_text =
		if abstract_parts.is_empty() { title.clone() } else { abstract_parts.join(" ") };
	let year = xml::first_block(article, "PubDate")
		.and_then(|pub_date| xml::tag_text(pub_date, "Year"))
		.and_then(|year| year.parse().ok());
	let venue = xml::first_block(article, "Journal")
		.and_then(|journal| xml::tag_text(journal, "Title"))
		.filter(|venue| !venue.is_empty())
		.unwrap_or_else(|| "PubMed".to_string());
	let authors = xml::blocks(article, "Author")
		.into_iter()
		.filter_map(|author| {
			match (xml::tag_text(author, "ForeName"), xml::tag_text(author, "LastName")) {
				(Some(fore_name), Some(last_name)) => Some(format!("{fore_name} {last_name}")),
				(None, Some(last_name)) => Some(last_name),
				_ => None,
			}
		})
		.collect();

	Some(NormalizedPaper {
		id: provenance_id(PaperSource::Pubmed, &pmid),
		title,
		authors,
		year,
		abstract_text: abstract_text.clone(),
		full_text_excerpt: abstract_text,
		venue,
		field: "biomedical".to_string(),
		categories: Vec::new(),
		source: PaperSource::Pubmed,
		doi: doi_from_ids(article),
		url: Some(format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/")),
		embedding_eligible: false,
	})
}

fn doi_from_ids(article: &str) -> Option<String> {
	let pattern = Regex::new(r#"<ArticleId[^>]*IdType="doi"[^>]*>([^<]+)</ArticleId>"#).ok()?;

	Some(pattern.captures(article)?.get(1)?.as_str().trim().to_string())
}
