//! Handler for `GET /verses/{id}`.

use axum::{
  Json,
  extract::{Path, State},
};
use sarathi_core::{resolve::SemanticIndex, verse::VerseId};
use serde::Serialize;

use crate::{ApiContext, error::ApiError};

#[derive(Debug, Serialize)]
pub struct VerseResponse {
  pub shloka_id:     String,
  pub sanskrit:      String,
  pub hindi_meaning: String,
  pub tags:          Vec<String>,
}

/// `GET /verses/{id}` where `id` is `chapter.number`, e.g. `2.47`.
pub async fn handler<I>(
  State(ctx): State<ApiContext<I>>,
  Path(id): Path<String>,
) -> Result<Json<VerseResponse>, ApiError>
where
  I: SemanticIndex,
{
  let id: VerseId = id
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("invalid verse id: {id:?}")))?;

  let verse = ctx
    .resolver
    .corpus()
    .get(&id)
    .ok_or_else(|| ApiError::NotFound(format!("verse {id} not found")))?;

  Ok(Json(VerseResponse {
    shloka_id:     verse.id.to_string(),
    sanskrit:      verse.sanskrit.clone(),
    hindi_meaning: verse.meaning.clone(),
    tags:          verse.tags.clone(),
  }))
}
