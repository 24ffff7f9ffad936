use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::{Client, header::HeaderMap};
use serde::Deserialize;

use ccdr_config::EmbeddingProviderConfig;

/// Client for an OpenAI-compatible `/embeddings` endpoint.
///
/// The HTTP client and headers are built once and reused for every call.
pub struct HttpEmbedder {
	client: Client,
	url: String,
	headers: HeaderMap,
	model: String,
	dimensions: u32,
}
impl HttpEmbedder {
	pub fn new(cfg: &EmbeddingProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			client,
			url: format!("{}{}", cfg.api_base, cfg.path),
			headers: crate::auth_headers(&cfg.api_key, &cfg.default_headers)?,
			model: cfg.model.clone(),
			dimensions: cfg.dimensions,
		})
	}

	pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let body = serde_json::json!({
			"model": self.model,
			"input": texts,
			"dimensions": self.dimensions,
		});
		let res =
			self.client.post(&self.url).headers(self.headers.clone()).json(&body).send().await?;
		let response: EmbeddingResponse = res.error_for_status()?.json().await?;

		into_vectors(response, texts.len(), self.dimensions as usize)
	}
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
	index: Option<usize>,
	embedding: Vec<f32>,
}

fn into_vectors(
	response: EmbeddingResponse,
	expected: usize,
	dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
	if response.data.len() != expected {
		return Err(eyre::eyre!(
			"Embedding response returned {} vectors for {expected} inputs.",
			response.data.len()
		));
	}

	let mut indexed: Vec<(usize, Vec<f32>)> = response
		.data
		.into_iter()
		.enumerate()
		.map(|(position, item)| (item.index.unwrap_or(position), item.embedding))
		.collect();

	if let Some((_, vec)) = indexed.iter().find(|(_, vec)| vec.len() != dimensions) {
		return Err(eyre::eyre!(
			"Embedding vector has {} dimensions, expected {dimensions}.",
			vec.len()
		));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
