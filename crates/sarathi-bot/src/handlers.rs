//! Bot interaction logic: commands, free-text questions, callback buttons,
//! and voice notes.

use chrono::{Duration, Utc};
use sarathi_core::{
  guardrail::{self, RATE_LIMIT, RATE_WINDOW_SECS, Rejection},
  resolve::SemanticIndex,
  store::{EventKind, GuidanceStore},
  verse::{Verse, VerseId},
};
use sarathi_gateway::chat::ChatApi;

use crate::{
  AppState,
  error::{Error, Result},
  format,
  push,
  webhook::{CallbackQuery, Voice},
};

/// Verses answered per question.
const ANSWER_RESULTS: usize = 3;

// ─── Commands ────────────────────────────────────────────────────────────────

pub async fn handle_command<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
  text: &str,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
  I: SemanticIndex,
{
  // "/start@BotName arg" → "/start"
  let cmd = text
    .split_whitespace()
    .next()
    .unwrap_or_default()
    .split('@')
    .next()
    .unwrap_or_default()
    .to_lowercase();

  log_event(state, chat_id, EventKind::Command).await;

  match cmd.as_str() {
    "/start" => {
      state.store.subscribe(chat_id).await.map_err(Error::store)?;
      send(state, chat_id, &format::welcome(), None).await
    }
    "/help" => send(state, chat_id, &format::help_text(), None).await,
    "/topic" => show_topic_menu(state, chat_id).await,
    "/daily" => show_journey_step(state, chat_id).await,
    "/amrit" => {
      let (text, keyboard) = format::amrit_menu();
      send(state, chat_id, &text, Some(&keyboard)).await
    }
    "/stats" => show_stats(state, chat_id).await,
    _ => send(state, chat_id, &format::help_text(), None).await,
  }
}

async fn show_topic_menu<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
{
  state
    .store
    .set_context(chat_id, Some(sarathi_core::session::SessionContext::TopicMenu))
    .await
    .map_err(Error::store)?;
  let (text, keyboard) = format::topic_keyboard();
  send(state, chat_id, &text, Some(&keyboard)).await
}

async fn show_journey_step<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
  I: SemanticIndex,
{
  let _ = state.chat.send_typing(chat_id).await;
  let position = state
    .store
    .journey_position(chat_id)
    .await
    .map_err(Error::store)?;
  let (message, keyboard) =
    push::render_journey(&state.resolver, &state.gateway, position).await;
  send(state, chat_id, &message, keyboard.as_ref()).await
}

async fn show_stats<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
{
  if state.config.admin_user_id.as_deref() != Some(chat_id) {
    return send(state, chat_id, &format::help_text(), None).await;
  }

  let stats = state.store.daily_stats(1).await.map_err(Error::store)?;
  let date = (Utc::now() - Duration::days(1)).format("%d %b %Y").to_string();
  send(state, chat_id, &format::stats_message(&date, &stats), None).await
}

// ─── Free text ───────────────────────────────────────────────────────────────

pub async fn handle_text<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
  text: &str,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
  I: SemanticIndex,
{
  let clean = match guardrail::screen(&state.policy, text) {
    Ok(clean) => clean,
    Err(Rejection::TooShort) => {
      return send(state, chat_id, &format::invalid_msg(), None).await;
    }
    Err(Rejection::Blocked(reason)) => {
      return send(state, chat_id, &format::blocked_msg(reason), None).await;
    }
    Err(Rejection::RateLimited) => unreachable!("screen is stateless"),
  };

  let allowed = state
    .store
    .check_rate_limit(chat_id, RATE_LIMIT, RATE_WINDOW_SECS)
    .await
    .map_err(Error::store)?;
  if !allowed {
    return send(state, chat_id, &format::rate_limit_msg(), None).await;
  }

  match clean.to_lowercase().as_str() {
    "hi" | "hello" | "नमस्ते" | "हेलो" | "start" => {
      state.store.subscribe(chat_id).await.map_err(Error::store)?;
      send(state, chat_id, &format::welcome(), None).await
    }
    "help" | "मदद" | "सहायता" => {
      send(state, chat_id, &format::help_text(), None).await
    }
    "topic" | "topics" | "विषय" | "विषयों" => show_topic_menu(state, chat_id).await,
    "daily" | "आज का श्लोक" | "प्रेरणा" | "aaj" | "आज" => {
      show_journey_step(state, chat_id).await
    }
    "अमृत" | "amrit" | "प्रसिद्ध" | "famous" => {
      let (text, keyboard) = format::amrit_menu();
      send(state, chat_id, &text, Some(&keyboard)).await
    }
    "और" | "more" | "aur" | "next" => handle_more(state, chat_id).await,
    "रोकें" | "stop" | "unsubscribe" | "रुकें" => {
      state.store.unsubscribe(chat_id).await.map_err(Error::store)?;
      send(state, chat_id, &format::unsubscribed_msg(), None).await
    }
    _ => process_question(state, chat_id, &clean).await,
  }
}

/// Answer a question: resolve verses, remember them, interpret, reply.
pub async fn process_question<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
  query: &str,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
  I: SemanticIndex,
{
  state
    .store
    .set_context(chat_id, None)
    .await
    .map_err(Error::store)?;
  log_event(state, chat_id, EventKind::Message).await;
  let _ = state.chat.send_typing(chat_id).await;

  let verses = state.resolver.resolve(query, ANSWER_RESULTS).await;
  let ids: Vec<VerseId> = verses.iter().map(|v| v.id).collect();
  state
    .store
    .save_session(chat_id, query, &ids, None)
    .await
    .map_err(Error::store)?;

  let Some(first) = verses.first() else {
    return send(state, chat_id, &format::no_results_msg(), None).await;
  };

  let interpretation = interpret_or_cached(state, query, &verses).await;
  let mut response = format::format_verse(first, &interpretation);
  if verses.len() > 1 {
    response.push_str("\n\n");
    response.push_str(format::more_hint());
  }
  send(state, chat_id, &response, None).await
}

/// "और": the next related verse for the last question.
async fn handle_more<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
  I: SemanticIndex,
{
  let session = state.store.session(chat_id).await.map_err(Error::store)?;
  if session.last_query.is_empty() {
    return send(state, chat_id, &format::more_without_question_msg(), None)
      .await;
  }

  let Some(verse) = state
    .resolver
    .resolve_more(&session.last_query, &session.last_shlokas)
    .await
  else {
    return send(state, chat_id, &format::more_exhausted_msg(), None).await;
  };

  let mut shown = session.last_shlokas;
  shown.push(verse.id);
  state
    .store
    .save_session(chat_id, &session.last_query, &shown, None)
    .await
    .map_err(Error::store)?;

  let interpretation = state.gateway.cached(&verse).unwrap_or_default().to_owned();
  send(state, chat_id, &format::format_verse(&verse, &interpretation), None)
    .await
}

// ─── Callbacks ───────────────────────────────────────────────────────────────

pub async fn handle_callback<S, C, I>(
  state: &AppState<S, C, I>,
  callback: CallbackQuery,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
  I: SemanticIndex,
{
  let Some(chat_id) = callback.message.map(|m| m.chat.id.to_string()) else {
    return Ok(());
  };
  let _ = state.chat.answer_callback(&callback.id, None).await;
  log_event(state, &chat_id, EventKind::Callback).await;

  let data = callback.data.unwrap_or_default();

  if data == "journey:next" {
    tracing::info!(user = %chat_id, "journey advance");
    let _ = state.chat.send_typing(&chat_id).await;
    let last = state.resolver.corpus().last_position();
    let position = state
      .store
      .advance_journey(&chat_id, last)
      .await
      .map_err(Error::store)?;
    let (message, keyboard) =
      push::render_journey(&state.resolver, &state.gateway, position).await;
    return send(state, &chat_id, &message, keyboard.as_ref()).await;
  }

  if data == "amrit:back" {
    let (text, keyboard) = format::amrit_menu();
    return send(state, &chat_id, &text, Some(&keyboard)).await;
  }

  if let Some(id) = data.strip_prefix("amrit:") {
    return show_amrit_verse(state, &chat_id, id).await;
  }

  if let Some(topic_id) = data.strip_prefix("topic:") {
    return answer_topic(state, &chat_id, topic_id).await;
  }

  Ok(())
}

async fn show_amrit_verse<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
  id: &str,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
  I: SemanticIndex,
{
  let verse = id
    .parse::<VerseId>()
    .ok()
    .and_then(|id| state.resolver.corpus().get(&id));
  let Some(verse) = verse else {
    return send(state, chat_id, &format::verse_not_found_msg(), None).await;
  };

  tracing::info!(user = %chat_id, verse = %verse.id, "amrit verse");
  let _ = state.chat.send_typing(chat_id).await;
  let interpretation = state.gateway.cached(verse).unwrap_or_default();
  let response = format::format_verse(verse, interpretation);
  send(state, chat_id, &response, Some(&format::amrit_back_keyboard())).await
}

/// Topic-menu tap: instant curated lookup, no live search needed.
async fn answer_topic<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
  topic_id: &str,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
  I: SemanticIndex,
{
  let Some((_, label)) =
    format::TOPIC_MENU.iter().find(|(id, _)| *id == topic_id)
  else {
    return Ok(());
  };

  tracing::info!(user = %chat_id, topic = topic_id, "topic selected");
  state
    .store
    .set_context(chat_id, None)
    .await
    .map_err(Error::store)?;
  state
    .store
    .bump_topic_affinity(chat_id, topic_id)
    .await
    .map_err(Error::store)?;

  let corpus = state.resolver.corpus();
  let verses: Vec<Verse> = match state.resolver.curated().get(topic_id) {
    Some(topic) => topic
      .best
      .iter()
      .filter_map(|id| corpus.get(id).cloned())
      .take(ANSWER_RESULTS)
      .collect(),
    None => state.resolver.resolve(label, ANSWER_RESULTS).await,
  };

  let ids: Vec<VerseId> = verses.iter().map(|v| v.id).collect();
  state
    .store
    .save_session(chat_id, label, &ids, None)
    .await
    .map_err(Error::store)?;

  let Some(first) = verses.first() else {
    return send(state, chat_id, &format::no_results_msg(), None).await;
  };

  let _ = state.chat.send_typing(chat_id).await;
  let interpretation = interpret_or_cached(state, label, &verses).await;
  let mut response = format::format_verse(first, &interpretation);
  if verses.len() > 1 {
    response.push_str("\n\n");
    response.push_str(format::more_hint());
  }
  send(state, chat_id, &response, None).await
}

// ─── Voice ───────────────────────────────────────────────────────────────────

pub async fn handle_voice<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
  voice: &Voice,
) -> Result<()>
where
  S: GuidanceStore,
  C: ChatApi,
  I: SemanticIndex,
{
  let allowed = state
    .store
    .check_rate_limit(chat_id, RATE_LIMIT, RATE_WINDOW_SECS)
    .await
    .map_err(Error::store)?;
  if !allowed {
    return send(state, chat_id, &format::rate_limit_msg(), None).await;
  }

  send(state, chat_id, &format::voice_listening_msg(), None).await?;

  let file_path = match state.chat.get_file(&voice.file_id).await {
    Ok(path) => path,
    Err(e) => {
      tracing::warn!(error = %e, "voice file lookup failed");
      return send(state, chat_id, &format::voice_failed_msg(), None).await;
    }
  };
  let audio = match state.chat.download_file(&file_path).await {
    Ok(audio) => audio,
    Err(e) => {
      tracing::warn!(error = %e, "voice download failed");
      return send(state, chat_id, &format::voice_failed_msg(), None).await;
    }
  };

  let Some(transcript) = state.gateway.transcribe(&audio).await else {
    return send(state, chat_id, &format::voice_unclear_msg(), None).await;
  };

  send(state, chat_id, &format::voice_heard_msg(&transcript), None).await?;
  process_question(state, chat_id, &transcript).await
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Live interpretation first, precomputed cache as fallback.
async fn interpret_or_cached<S, C, I>(
  state: &AppState<S, C, I>,
  query: &str,
  verses: &[Verse],
) -> String
where
  I: SemanticIndex,
{
  if let Some(live) = state.gateway.interpret(query, verses).await {
    return live;
  }
  verses
    .first()
    .and_then(|v| state.gateway.cached(v))
    .unwrap_or_default()
    .to_owned()
}

async fn send<S, C, I>(
  state: &AppState<S, C, I>,
  chat_id: &str,
  text: &str,
  keyboard: Option<&sarathi_gateway::chat::Keyboard>,
) -> Result<()>
where
  C: ChatApi,
{
  state.chat.send_message(chat_id, text, keyboard).await?;
  Ok(())
}

/// Best-effort analytics append; a failed write never breaks the reply.
async fn log_event<S, C, I>(
  state: &AppState<S, C, I>,
  user_id: &str,
  kind: EventKind,
) where
  S: GuidanceStore,
{
  if let Err(e) = state.store.log_event(user_id, kind).await {
    tracing::warn!(error = %e, "event log failed");
  }
}
