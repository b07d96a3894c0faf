//! Embedding-based semantic search over the verse corpus.
//!
//! Verse embeddings are computed offline and loaded at startup; only the
//! query is embedded live, then matched brute-force by cosine similarity.
//! At corpus scale (hundreds of vectors) a linear scan is faster than any
//! index would pay for.

use sarathi_core::{resolve::SemanticIndex, verse::VerseId};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One precomputed corpus vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerseEmbedding {
  pub id:     VerseId,
  pub vector: Vec<f32>,
}

/// Settings for the embedding service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
  pub api_key:  Option<String>,
  pub endpoint: String,
  pub model:    String,
}

impl Default for EmbeddingConfig {
  fn default() -> Self {
    Self {
      api_key:  None,
      endpoint: "https://api.cohere.ai/v1".into(),
      model:    "embed-multilingual-v3.0".into(),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
  texts:      [&'a str; 1],
  model:      &'a str,
  input_type: &'static str,
  truncate:   &'static str,
}

#[derive(Deserialize)]
struct EmbedResponse {
  embeddings: Vec<Vec<f32>>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Query-side embedding client plus the in-memory corpus vectors.
#[derive(Clone)]
pub struct SemanticClient {
  client:     reqwest::Client,
  config:     EmbeddingConfig,
  embeddings: std::sync::Arc<Vec<VerseEmbedding>>,
}

impl SemanticClient {
  pub fn new(
    config: EmbeddingConfig,
    embeddings: Vec<VerseEmbedding>,
  ) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(std::time::Duration::from_secs(10))
      .build()?;
    Ok(Self {
      client,
      config,
      embeddings: std::sync::Arc::new(embeddings),
    })
  }

  async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
    let api_key = self.config.api_key.as_deref().ok_or(Error::NoApiKey)?;

    let request = EmbedRequest {
      texts:      [query],
      model:      &self.config.model,
      input_type: "search_query",
      truncate:   "END",
    };

    let resp = self
      .client
      .post(format!(
        "{}/embed",
        self.config.endpoint.trim_end_matches('/')
      ))
      .bearer_auth(api_key)
      .json(&request)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Upstream {
        status:  status.as_u16(),
        message: resp.text().await.unwrap_or_default(),
      });
    }

    let body: EmbedResponse = resp.json().await?;
    body
      .embeddings
      .into_iter()
      .next()
      .ok_or(Error::MalformedResponse("embeddings"))
  }

  /// Ids of the `limit` nearest corpus vectors by cosine similarity.
  fn nearest(&self, query_vec: &[f32], limit: usize) -> Vec<VerseId> {
    let mut scored: Vec<(VerseId, f32)> = self
      .embeddings
      .iter()
      .map(|e| (e.id, cosine(query_vec, &e.vector)))
      .collect();
    scored
      .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(limit).map(|(id, _)| id).collect()
  }
}

impl SemanticIndex for SemanticClient {
  async fn search(&self, query: &str, limit: usize) -> Vec<VerseId> {
    if self.embeddings.is_empty() {
      return Vec::new();
    }
    match self.embed_query(query).await {
      Ok(vec) => self.nearest(&vec, limit),
      Err(e) => {
        tracing::warn!(error = %e, "semantic search unavailable");
        Vec::new()
      }
    }
  }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() || a.is_empty() {
    return 0.0;
  }
  let mut dot = 0.0f32;
  let mut norm_a = 0.0f32;
  let mut norm_b = 0.0f32;
  for (x, y) in a.iter().zip(b) {
    dot += x * y;
    norm_a += x * x;
    norm_b += y * y;
  }
  if norm_a == 0.0 || norm_b == 0.0 {
    return 0.0;
  }
  dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cosine_of_identical_vectors_is_one() {
    let v = [0.5, -1.0, 2.0];
    assert!((cosine(&v, &v) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn cosine_handles_degenerate_inputs() {
    assert_eq!(cosine(&[], &[]), 0.0);
    assert_eq!(cosine(&[1.0], &[1.0, 2.0]), 0.0);
    assert_eq!(cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
  }

  #[test]
  fn nearest_ranks_by_similarity() {
    let client = SemanticClient::new(
      EmbeddingConfig::default(),
      vec![
        VerseEmbedding { id: VerseId::new(1, 1), vector: vec![1.0, 0.0] },
        VerseEmbedding { id: VerseId::new(2, 47), vector: vec![0.0, 1.0] },
        VerseEmbedding { id: VerseId::new(6, 5), vector: vec![0.7, 0.7] },
      ],
    )
    .unwrap();

    let ids = client.nearest(&[0.0, 1.0], 2);
    assert_eq!(ids, vec![VerseId::new(2, 47), VerseId::new(6, 5)]);
  }

  #[tokio::test]
  async fn search_without_key_returns_empty() {
    let client = SemanticClient::new(
      EmbeddingConfig::default(),
      vec![VerseEmbedding { id: VerseId::new(1, 1), vector: vec![1.0] }],
    )
    .unwrap();
    assert!(client.search("कर्म", 3).await.is_empty());
  }
}
