use std::time::Duration;

use color_eyre::Result;
use reqwest::Client;
use serde::Deserialize;

use lore_config::EmbeddingProviderConfig;

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	#[serde(default)]
	data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
	index: usize,
	embedding: Vec<f32>,
}

/// One batched call against an OpenAI-compatible embeddings endpoint.
/// Vectors are returned in input order no matter how the provider orders
/// its response items.
pub async fn embed(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let response: EmbeddingResponse = res.error_for_status()?.json().await?;

	Ok(order_vectors(response))
}

fn order_vectors(response: EmbeddingResponse) -> Vec<Vec<f32>> {
	let mut items = response.data;
	items.sort_by_key(|item| item.index);

	items.into_iter().map(|item| item.embedding).collect()
}
