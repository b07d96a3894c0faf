//! JSON REST API for Sarathi.
//!
//! Exposes an axum [`Router`] backed by the resolver and the precomputed
//! interpretation cache. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", sarathi_api::api_router(ctx))
//! ```

pub mod ask;
pub mod error;
pub mod health;
pub mod verses;

use std::sync::Arc;

use axum::{Router, routing::get};
use sarathi_core::{
  interpretation::InterpretationCache, resolve::Resolver,
  resolve::SemanticIndex,
};

pub use error::ApiError;

/// Default number of verses returned per question.
pub const DEFAULT_RESULTS: usize = 3;

/// Shared read-only state behind every API handler.
pub struct ApiContext<I> {
  pub resolver: Arc<Resolver<I>>,
  pub cache:    Arc<InterpretationCache>,
}

impl<I> Clone for ApiContext<I> {
  fn clone(&self) -> Self {
    Self {
      resolver: Arc::clone(&self.resolver),
      cache:    Arc::clone(&self.cache),
    }
  }
}

/// Build a fully-materialised API router for the given context.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<I>(ctx: ApiContext<I>) -> Router<()>
where
  I: SemanticIndex + 'static,
{
  Router::new()
    .route("/ask", get(ask::handler::<I>))
    .route("/verses/{id}", get(verses::handler::<I>))
    .route("/health", get(health::handler))
    .with_state(ctx)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use sarathi_core::{
    corpus::Corpus,
    resolve::NoSemantic,
    topics::{QueryTopics, TopicIndex, TopicTable},
    verse::{Verse, VerseId},
  };
  use serde_json::Value;
  use tower::ServiceExt as _;

  fn ctx() -> ApiContext<NoSemantic> {
    let verses = vec![Verse {
      id:         VerseId::new(2, 47),
      sanskrit:   "कर्मण्येवाधिकारस्ते मा फलेषु कदाचन".to_owned(),
      meaning:    "कर्म करो, फल की चिंता मत करो".to_owned(),
      commentary: None,
      tags:       vec!["karma".to_owned()],
    }];
    let corpus = Arc::new(Corpus::new(verses, HashMap::new()).unwrap());
    let resolver = Arc::new(Resolver::new(
      corpus,
      TopicTable::default(),
      QueryTopics::builtin(),
      TopicIndex::default(),
      None,
    ));
    ApiContext {
      resolver,
      cache: Arc::new(InterpretationCache::default()),
    }
  }

  async fn get_json(uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = api_router(ctx()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn ask_without_query_is_400() {
    let (status, body) = get_json("/ask").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("?q="));
  }

  #[tokio::test]
  async fn ask_always_resolves_to_some_verse() {
    let (status, body) = get_json("/ask?q=karma").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shlokas"][0]["shloka_id"], "2.47");
    assert_eq!(body["query"], "karma");
  }

  #[tokio::test]
  async fn verse_lookup_returns_full_record() {
    let (status, body) = get_json("/verses/2.47").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shloka_id"], "2.47");
    assert_eq!(body["tags"][0], "karma");
  }

  #[tokio::test]
  async fn unknown_verse_is_404() {
    let (status, _) = get_json("/verses/9.99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn malformed_verse_id_is_400() {
    let (status, _) = get_json("/verses/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn health_reports_ok() {
    let (status, body) = get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }
}
