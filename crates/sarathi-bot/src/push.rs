//! Daily journey push: the batch endpoint and the shared step renderer.

use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use sarathi_core::{
  journey::JourneyView,
  resolve::{Resolver, SemanticIndex},
  store::{EventKind, GuidanceStore},
};
use sarathi_gateway::{
  chat::{ChatApi, Keyboard},
  interpret::InterpretationGateway,
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, auth, format};

/// Render the journey step at `position`: message text plus the
/// advance keyboard (absent on the final verse and past the end).
pub async fn render_journey<I>(
  resolver: &Resolver<I>,
  gateway: &InterpretationGateway,
  position: usize,
) -> (String, Option<Keyboard>)
where
  I: SemanticIndex,
{
  let corpus = resolver.corpus();
  let Some(view) = JourneyView::at(corpus, position) else {
    return (format::journey_complete(), None);
  };

  let interpretation = match gateway.cached(view.verse) {
    Some(cached) => cached.to_owned(),
    None => gateway.daily_interpret(view.verse).await.unwrap_or_default(),
  };

  let message = format::format_journey_verse(&view, &interpretation);
  let keyboard = (!view.is_final).then(format::journey_next_keyboard);
  (message, keyboard)
}

/// Push the current journey step to every active subscriber, advancing
/// each journey only after a successful delivery. Returns (sent, failed).
pub async fn run_daily_push<S, C, I>(state: &AppState<S, C, I>) -> (u64, u64)
where
  S: GuidanceStore,
  C: ChatApi,
  I: SemanticIndex,
{
  let subscribers = match state.store.active_journeys().await {
    Ok(subscribers) => subscribers,
    Err(e) => {
      tracing::error!(error = %e, "subscriber listing failed");
      return (0, 0);
    }
  };

  let corpus = state.resolver.corpus();
  let last = corpus.last_position();
  let (mut sent, mut failed) = (0, 0);

  for sub in subscribers {
    if sub.position >= corpus.len() {
      continue;
    }

    let (message, keyboard) =
      render_journey(&state.resolver, &state.gateway, sub.position).await;
    match state
      .chat
      .send_message(&sub.user_id, &message, keyboard.as_ref())
      .await
    {
      Ok(()) => {
        if let Err(e) = state.store.advance_journey(&sub.user_id, last).await {
          tracing::error!(user = %sub.user_id, error = %e, "journey advance failed");
        }
        sent += 1;
      }
      Err(e) => {
        tracing::warn!(user = %sub.user_id, error = %e, "push delivery failed");
        if let Err(e) =
          state.store.log_event(&sub.user_id, EventKind::ApiFailure).await
        {
          tracing::warn!(error = %e, "event log failed");
        }
        failed += 1;
      }
    }
  }

  tracing::info!(sent, failed, "daily push complete");
  (sent, failed)
}

#[derive(Debug, Deserialize)]
pub struct PushParams {
  pub secret: Option<String>,
}

/// `POST /daily-push`
pub async fn handler<S, C, I>(
  State(state): State<AppState<S, C, I>>,
  headers: HeaderMap,
  Query(params): Query<PushParams>,
) -> Response
where
  S: GuidanceStore + 'static,
  C: ChatApi + 'static,
  I: SemanticIndex + 'static,
{
  let presented = auth::presented_secret(&headers, params.secret.as_deref());
  if !auth::verify_push_secret(presented, state.config.push_secret_hash.as_deref())
  {
    return (
      StatusCode::UNAUTHORIZED,
      Json(json!({ "error": "unauthorized" })),
    )
      .into_response();
  }

  let (sent, failed) = run_daily_push(&state).await;
  Json(json!({ "sent": sent, "failed": failed })).into_response()
}
