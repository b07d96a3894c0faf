//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 UTC strings, so string comparison in
//! SQL matches time comparison. Verse-id lists and topic-count maps are
//! stored as compact JSON.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sarathi_core::{
  session::{Session, SessionContext},
  verse::VerseId,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Verse-id lists ──────────────────────────────────────────────────────────

pub fn encode_verse_ids(ids: &[VerseId]) -> Result<String> {
  Ok(serde_json::to_string(ids)?)
}

pub fn decode_verse_ids(s: &str) -> Result<Vec<VerseId>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Topic counters ──────────────────────────────────────────────────────────

pub fn encode_topic_counts(counts: &HashMap<String, u32>) -> Result<String> {
  Ok(serde_json::to_string(counts)?)
}

pub fn decode_topic_counts(s: &str) -> Result<HashMap<String, u32>> {
  Ok(serde_json::from_str(s)?)
}

// ─── SessionContext ──────────────────────────────────────────────────────────

pub fn encode_context(ctx: Option<SessionContext>) -> Option<&'static str> {
  ctx.map(|c| match c {
    SessionContext::TopicMenu => "topic_menu",
  })
}

pub fn decode_context(s: Option<&str>) -> Result<Option<SessionContext>> {
  match s {
    None => Ok(None),
    Some("topic_menu") => Ok(Some(SessionContext::TopicMenu)),
    Some(other) => Err(Error::UnknownContext(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub user_id:      String,
  pub last_query:   String,
  pub last_shlokas: String,
  pub context:      Option<String>,
  pub top_topics:   String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      user_id:      self.user_id,
      last_query:   self.last_query,
      last_shlokas: decode_verse_ids(&self.last_shlokas)?,
      context:      decode_context(self.context.as_deref())?,
      top_topics:   decode_topic_counts(&self.top_topics)?,
    })
  }
}
