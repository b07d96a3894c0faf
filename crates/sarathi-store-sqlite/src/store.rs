//! [`SqliteStore`], the SQLite implementation of [`GuidanceStore`].

use std::path::Path;

use chrono::{Duration, Utc};
use rusqlite::OptionalExtension as _;

use sarathi_core::{
  journey,
  session::{Session, SessionContext},
  store::{DailyStats, EventKind, GuidanceStore, SubscriberJourney},
  verse::VerseId,
};

use crate::{
  Error, Result,
  encode::{
    RawSession, decode_topic_counts, encode_context, encode_dt,
    encode_topic_counts, encode_verse_ids,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Sarathi guidance store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Housekeeping: drop rate-limit rows older than twice the window.
  pub async fn prune_messages(&self, window_secs: i64) -> Result<usize> {
    let cutoff = encode_dt(Utc::now() - Duration::seconds(window_secs * 2));
    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM messages WHERE sent_at < ?1",
          rusqlite::params![cutoff],
        )?;
        Ok(n)
      })
      .await?;
    Ok(deleted)
  }
}

// ─── GuidanceStore impl ──────────────────────────────────────────────────────

impl GuidanceStore for SqliteStore {
  type Error = Error;

  // ── Sessions ──────────────────────────────────────────────────────────

  async fn session(&self, user_id: &str) -> Result<Session> {
    let user = user_id.to_owned();
    let now = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            "SELECT user_id, last_query, last_shlokas, context, top_topics
             FROM sessions WHERE user_id = ?1",
            rusqlite::params![user],
            |r| {
              Ok(RawSession {
                user_id:      r.get(0)?,
                last_query:   r.get(1)?,
                last_shlokas: r.get(2)?,
                context:      r.get(3)?,
                top_topics:   r.get(4)?,
              })
            },
          )
          .optional()?;

        if let Some(raw) = existing {
          return Ok(raw);
        }

        conn.execute(
          "INSERT INTO sessions (user_id, created_at, updated_at)
           VALUES (?1, ?2, ?2)",
          rusqlite::params![user, now],
        )?;
        Ok(RawSession {
          user_id:      user,
          last_query:   String::new(),
          last_shlokas: "[]".to_owned(),
          context:      None,
          top_topics:   "{}".to_owned(),
        })
      })
      .await?;

    raw.into_session()
  }

  async fn save_session(
    &self,
    user_id: &str,
    query: &str,
    shlokas: &[VerseId],
    context: Option<SessionContext>,
  ) -> Result<()> {
    let user = user_id.to_owned();
    let query = query.to_owned();
    let shlokas_str = encode_verse_ids(shlokas)?;
    let context_str = encode_context(context);
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions
             (user_id, last_query, last_shlokas, context, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)
           ON CONFLICT(user_id) DO UPDATE SET
             last_query   = excluded.last_query,
             last_shlokas = excluded.last_shlokas,
             context      = excluded.context,
             updated_at   = excluded.updated_at",
          rusqlite::params![user, query, shlokas_str, context_str, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_context(
    &self,
    user_id: &str,
    context: Option<SessionContext>,
  ) -> Result<()> {
    let user = user_id.to_owned();
    let context_str = encode_context(context);
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        // Upsert so a context can be set before the first question.
        conn.execute(
          "INSERT INTO sessions (user_id, context, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?3)
           ON CONFLICT(user_id) DO UPDATE SET
             context    = excluded.context,
             updated_at = excluded.updated_at",
          rusqlite::params![user, context_str, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn bump_topic_affinity(&self, user_id: &str, topic: &str) -> Result<()> {
    // Read-modify-write runs inside a single call, so it is serialised with
    // all other access on the connection's worker thread.
    let user = user_id.to_owned();
    let topic = topic.to_owned();
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let counts_str: Option<String> = conn
          .query_row(
            "SELECT top_topics FROM sessions WHERE user_id = ?1",
            rusqlite::params![user],
            |r| r.get(0),
          )
          .optional()?;

        let mut counts = counts_str
          .as_deref()
          .and_then(|s| decode_topic_counts(s).ok())
          .unwrap_or_default();
        *counts.entry(topic).or_insert(0) += 1;
        let counts_str = encode_topic_counts(&counts)
          .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        conn.execute(
          "INSERT INTO sessions (user_id, top_topics, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?3)
           ON CONFLICT(user_id) DO UPDATE SET
             top_topics = excluded.top_topics,
             updated_at = excluded.updated_at",
          rusqlite::params![user, counts_str, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Subscriptions & journey ───────────────────────────────────────────

  async fn subscribe(&self, user_id: &str) -> Result<()> {
    let user = user_id.to_owned();
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscribers (user_id, active, created_at)
           VALUES (?1, 1, ?2)
           ON CONFLICT(user_id) DO UPDATE SET active = 1",
          rusqlite::params![user, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn unsubscribe(&self, user_id: &str) -> Result<()> {
    let user = user_id.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE subscribers SET active = 0 WHERE user_id = ?1",
          rusqlite::params![user],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn journey_position(&self, user_id: &str) -> Result<usize> {
    let user = user_id.to_owned();
    let pos: Option<i64> = self
      .conn
      .call(move |conn| {
        let pos = conn
          .query_row(
            "SELECT journey_position FROM subscribers WHERE user_id = ?1",
            rusqlite::params![user],
            |r| r.get(0),
          )
          .optional()?;
        Ok(pos)
      })
      .await?;
    Ok(pos.unwrap_or(0).max(0) as usize)
  }

  async fn advance_journey(&self, user_id: &str, last: usize) -> Result<usize> {
    let user = user_id.to_owned();
    let now = encode_dt(Utc::now());

    let new_pos: i64 = self
      .conn
      .call(move |conn| {
        let current: i64 = conn
          .query_row(
            "SELECT journey_position FROM subscribers WHERE user_id = ?1",
            rusqlite::params![user],
            |r| r.get(0),
          )
          .optional()?
          .unwrap_or(0);

        let new_pos = journey::advance(current.max(0) as usize, last) as i64;
        conn.execute(
          "INSERT INTO subscribers (user_id, active, journey_position, created_at)
           VALUES (?1, 1, ?2, ?3)
           ON CONFLICT(user_id) DO UPDATE SET
             active           = 1,
             journey_position = ?2",
          rusqlite::params![user, new_pos, now],
        )?;
        Ok(new_pos)
      })
      .await?;
    Ok(new_pos.max(0) as usize)
  }

  async fn active_journeys(&self) -> Result<Vec<SubscriberJourney>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, journey_position FROM subscribers WHERE active = 1",
        )?;
        let rows = stmt
          .query_map([], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?))
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(user_id, pos)| SubscriberJourney {
          user_id,
          position: pos.max(0) as usize,
        })
        .collect(),
    )
  }

  // ── Rate limiting ─────────────────────────────────────────────────────

  async fn check_rate_limit(
    &self,
    user_id: &str,
    limit: u32,
    window_secs: i64,
  ) -> Result<bool> {
    let user = user_id.to_owned();
    let now = Utc::now();
    let cutoff = encode_dt(now - Duration::seconds(window_secs));
    let now = encode_dt(now);

    let allowed = self
      .conn
      .call(move |conn| {
        let count: i64 = conn.query_row(
          "SELECT COUNT(*) FROM messages WHERE user_id = ?1 AND sent_at > ?2",
          rusqlite::params![user, cutoff],
          |r| r.get(0),
        )?;

        if count >= i64::from(limit) {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO messages (user_id, sent_at) VALUES (?1, ?2)",
          rusqlite::params![user, now],
        )?;
        Ok(true)
      })
      .await?;
    Ok(allowed)
  }

  // ── Analytics ─────────────────────────────────────────────────────────

  async fn log_event(&self, user_id: &str, kind: EventKind) -> Result<()> {
    let user = user_id.to_owned();
    let kind = kind.as_str();
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (user_id, kind, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![user, kind, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn daily_stats(&self, days_back: u32) -> Result<DailyStats> {
    let day = Utc::now()
      .date_naive()
      .and_hms_opt(0, 0, 0)
      .unwrap_or_default()
      .and_utc()
      - Duration::days(i64::from(days_back));
    let start = encode_dt(day);
    let end = encode_dt(day + Duration::days(1));

    let stats = self
      .conn
      .call(move |conn| {
        let count = |sql: &str| -> rusqlite::Result<i64> {
          conn.query_row(sql, rusqlite::params![start, end], |r| r.get(0))
        };

        let active_users = count(
          "SELECT COUNT(DISTINCT user_id) FROM messages
           WHERE sent_at >= ?1 AND sent_at < ?2",
        )?;
        let new_users = count(
          "SELECT COUNT(*) FROM sessions
           WHERE created_at >= ?1 AND created_at < ?2",
        )?;
        let messages = count(
          "SELECT COUNT(*) FROM messages
           WHERE sent_at >= ?1 AND sent_at < ?2",
        )?;
        let api_failures = count(
          "SELECT COUNT(*) FROM events
           WHERE kind = 'api_failure' AND created_at >= ?1 AND created_at < ?2",
        )?;
        let active_subscribers: i64 = conn.query_row(
          "SELECT COUNT(*) FROM subscribers WHERE active = 1",
          [],
          |r| r.get(0),
        )?;

        Ok(DailyStats {
          active_users:       active_users.max(0) as u64,
          new_users:          new_users.max(0) as u64,
          messages:           messages.max(0) as u64,
          active_subscribers: active_subscribers.max(0) as u64,
          api_failures:       api_failures.max(0) as u64,
        })
      })
      .await?;
    Ok(stats)
  }
}
