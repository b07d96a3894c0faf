//! Handler for `GET /ask`.

use axum::{
  Json,
  extract::{Query, State},
};
use sarathi_core::resolve::SemanticIndex;
use serde::{Deserialize, Serialize};

use crate::{ApiContext, DEFAULT_RESULTS, error::ApiError};

/// Meanings in API responses are capped at this many characters.
const MEANING_CAP_CHARS: usize = 500;

#[derive(Debug, Deserialize, Default)]
pub struct AskParams {
  pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskVerse {
  pub shloka_id:     String,
  pub sanskrit:      String,
  pub hindi_meaning: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
  pub query:          String,
  pub shlokas:        Vec<AskVerse>,
  pub interpretation: String,
}

/// `GET /ask?q=<question>`
pub async fn handler<I>(
  State(ctx): State<ApiContext<I>>,
  Query(params): Query<AskParams>,
) -> Result<Json<AskResponse>, ApiError>
where
  I: SemanticIndex,
{
  let query = params.q.unwrap_or_default();
  if query.trim().is_empty() {
    return Err(ApiError::BadRequest(
      "please provide ?q=your question".into(),
    ));
  }

  let verses = ctx.resolver.resolve(&query, DEFAULT_RESULTS).await;

  let interpretation = verses
    .first()
    .and_then(|v| ctx.cache.get(&v.id))
    .unwrap_or_default()
    .to_owned();

  let shlokas = verses
    .into_iter()
    .map(|v| AskVerse {
      shloka_id:     v.id.to_string(),
      sanskrit:      v.sanskrit,
      hindi_meaning: v.meaning.chars().take(MEANING_CAP_CHARS).collect(),
    })
    .collect();

  Ok(Json(AskResponse { query, shlokas, interpretation }))
}
