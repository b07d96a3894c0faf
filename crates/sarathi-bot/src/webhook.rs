//! Inbound webhook: update wire types, deduplication, and dispatch.
//!
//! The transport retries undelivered updates, so the handler must be
//! idempotent-ish: recent update ids are remembered and duplicates dropped.
//! Whatever happens inside, the response is `200 {"ok": true}`; returning
//! an error would only trigger another retry of the same update.

use axum::{Json, extract::State};
use sarathi_core::{resolve::SemanticIndex, store::GuidanceStore};
use sarathi_gateway::chat::ChatApi;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, handlers};

/// How many recent update ids the dedup window remembers.
pub const DEDUP_WINDOW: usize = 100;

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Update {
  pub update_id:      Option<i64>,
  pub message:        Option<Message>,
  pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
  pub chat:  Chat,
  pub text:  Option<String>,
  pub voice: Option<Voice>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
  pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Voice {
  pub file_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
  pub id:      String,
  pub data:    Option<String>,
  pub message: Option<Message>,
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// `POST /webhook`
pub async fn handler<S, C, I>(
  State(state): State<AppState<S, C, I>>,
  Json(update): Json<Update>,
) -> Json<Value>
where
  S: GuidanceStore + 'static,
  C: ChatApi + 'static,
  I: SemanticIndex + 'static,
{
  if let Some(update_id) = update.update_id
    && is_duplicate(&state, update_id)
  {
    tracing::info!(update_id, "skipping duplicate update");
    return Json(json!({ "ok": true }));
  }

  if let Err(e) = dispatch(&state, update).await {
    tracing::error!(error = %e, "webhook processing failed");
  }

  Json(json!({ "ok": true }))
}

/// Record `update_id` in the recent window; true if already present.
fn is_duplicate<S, C, I>(state: &AppState<S, C, I>, update_id: i64) -> bool {
  // A poisoned lock still holds a usable window; keep answering.
  let mut seen = state
    .seen_updates
    .lock()
    .unwrap_or_else(|e| e.into_inner());
  if seen.contains(&update_id) {
    return true;
  }
  if seen.len() >= DEDUP_WINDOW {
    seen.pop_front();
  }
  seen.push_back(update_id);
  false
}

async fn dispatch<S, C, I>(
  state: &AppState<S, C, I>,
  update: Update,
) -> crate::error::Result<()>
where
  S: GuidanceStore + 'static,
  C: ChatApi + 'static,
  I: SemanticIndex + 'static,
{
  if let Some(callback) = update.callback_query {
    return handlers::handle_callback(state, callback).await;
  }

  let Some(message) = update.message else {
    return Ok(());
  };
  let chat_id = message.chat.id.to_string();

  if let Some(voice) = message.voice {
    return handlers::handle_voice(state, &chat_id, &voice).await;
  }

  if let Some(text) = message.text {
    let text = text.trim();
    if text.starts_with('/') {
      return handlers::handle_command(state, &chat_id, text).await;
    }
    return handlers::handle_text(state, &chat_id, text).await;
  }

  Ok(())
}
