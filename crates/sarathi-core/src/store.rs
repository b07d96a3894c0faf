//! The `GuidanceStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `sarathi-store-sqlite`).
//! Higher layers (`sarathi-bot`, `sarathi-api`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::session::{Session, SessionContext};
use crate::verse::VerseId;

// ─── Supporting types ────────────────────────────────────────────────────────

/// One active subscriber with their journey position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberJourney {
  pub user_id:  String,
  pub position: usize,
}

/// Analytics event categories recorded per interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
  Message,
  Command,
  Callback,
  ApiFailure,
}

impl EventKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Message => "message",
      Self::Command => "command",
      Self::Callback => "callback",
      Self::ApiFailure => "api_failure",
    }
  }
}

/// One UTC day's usage counters, for the admin stats command.
///
/// `active_users` and `messages` are derived from the rate-limit accounting
/// table, which doubles as the accepted-message log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyStats {
  pub active_users:       u64,
  pub new_users:          u64,
  pub messages:           u64,
  /// All-time count, not windowed by day.
  pub active_subscribers: u64,
  pub api_failures:       u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the persistent user-state backend: sessions,
/// subscriptions with journey positions, rate-limit accounting, and
/// analytics events.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait GuidanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Fetch the user's session, creating an empty one on first contact.
  fn session<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + 'a;

  /// Overwrite the recency fields after an answered question.
  fn save_session<'a>(
    &'a self,
    user_id: &'a str,
    query: &'a str,
    shlokas: &'a [VerseId],
    context: Option<SessionContext>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Set or clear the pending interaction context without touching the
  /// recency fields.
  fn set_context<'a>(
    &'a self,
    user_id: &'a str,
    context: Option<SessionContext>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Increment the user's affinity counter for a topic.
  fn bump_topic_affinity<'a>(
    &'a self,
    user_id: &'a str,
    topic: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Subscriptions & journey ───────────────────────────────────────────

  /// Mark the user as an active subscriber, preserving any existing journey
  /// position.
  fn subscribe<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Deactivate the subscription. The journey position is kept so a
  /// re-subscribe resumes where the user left off.
  fn unsubscribe<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Current journey position; 0 for unknown users.
  fn journey_position<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Advance the journey by one step, saturating at `last`. Upserts the
  /// subscriber row as active. Returns the new position.
  fn advance_journey<'a>(
    &'a self,
    user_id: &'a str,
    last: usize,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// All active subscribers with their journey positions.
  fn active_journeys(
    &self,
  ) -> impl Future<Output = Result<Vec<SubscriberJourney>, Self::Error>> + Send + '_;

  // ── Rate limiting ─────────────────────────────────────────────────────

  /// Count-then-record rate limiting: returns `true` and records the
  /// message when the user is under `limit` messages within the trailing
  /// `window_secs`; returns `false` (recording nothing) when at or over.
  fn check_rate_limit<'a>(
    &'a self,
    user_id: &'a str,
    limit: u32,
    window_secs: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Analytics ─────────────────────────────────────────────────────────

  /// Append one analytics event.
  fn log_event<'a>(
    &'a self,
    user_id: &'a str,
    kind: EventKind,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Usage counters for the UTC day `days_back` days ago (0 = today,
  /// 1 = yesterday).
  fn daily_stats(
    &self,
    days_back: u32,
  ) -> impl Future<Output = Result<DailyStats, Self::Error>> + Send + '_;
}
