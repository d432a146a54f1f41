pub mod arxiv;
pub mod crossref;
pub mod embedding;
pub mod pubmed;
pub mod semantic_scholar;

mod xml;

use color_eyre::{Result, eyre};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

/// Bearer auth plus any configured extra headers. Non-string header values
/// are rejected rather than silently dropped.
pub fn auth_headers(api_key: &str, extra: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::with_capacity(extra.len() + 1);

	headers.insert(AUTHORIZATION, HeaderValue::try_from(format!("Bearer {api_key}"))?);

	for (name, value) in extra {
		let text =
			value.as_str().ok_or_else(|| eyre::eyre!("Header {name:?} must be a string."))?;

		headers.insert(HeaderName::try_from(name.as_str())?, HeaderValue::try_from(text)?);
	}

	Ok(headers)
}
