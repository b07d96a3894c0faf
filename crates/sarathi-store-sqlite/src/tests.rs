//! Integration tests for `SqliteStore` against an in-memory database.

use sarathi_core::{
  session::SessionContext,
  store::{EventKind, GuidanceStore},
  verse::VerseId,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_contact_creates_empty_session() {
  let s = store().await;

  let session = s.session("u1").await.unwrap();
  assert_eq!(session.user_id, "u1");
  assert!(session.last_query.is_empty());
  assert!(session.last_shlokas.is_empty());
  assert!(session.context.is_none());
  assert!(session.top_topics.is_empty());
}

#[tokio::test]
async fn save_session_round_trips_recency_fields() {
  let s = store().await;

  let shown = [VerseId::new(2, 47), VerseId::new(3, 35)];
  s.save_session("u1", "कर्म क्या है", &shown, None)
    .await
    .unwrap();

  let session = s.session("u1").await.unwrap();
  assert_eq!(session.last_query, "कर्म क्या है");
  assert_eq!(session.last_shlokas, shown);
  assert!(session.context.is_none());
}

#[tokio::test]
async fn save_session_overwrites_previous_answer() {
  let s = store().await;

  s.save_session("u1", "पहला", &[VerseId::new(1, 1)], None)
    .await
    .unwrap();
  s.save_session("u1", "दूसरा", &[VerseId::new(2, 14)], None)
    .await
    .unwrap();

  let session = s.session("u1").await.unwrap();
  assert_eq!(session.last_query, "दूसरा");
  assert_eq!(session.last_shlokas, [VerseId::new(2, 14)]);
}

#[tokio::test]
async fn context_set_and_cleared_independently() {
  let s = store().await;

  s.set_context("u1", Some(SessionContext::TopicMenu))
    .await
    .unwrap();
  let session = s.session("u1").await.unwrap();
  assert_eq!(session.context, Some(SessionContext::TopicMenu));

  s.set_context("u1", None).await.unwrap();
  let session = s.session("u1").await.unwrap();
  assert!(session.context.is_none());
}

#[tokio::test]
async fn topic_affinity_accumulates() {
  let s = store().await;

  s.bump_topic_affinity("u1", "krodh").await.unwrap();
  s.bump_topic_affinity("u1", "krodh").await.unwrap();
  s.bump_topic_affinity("u1", "dukh").await.unwrap();

  let session = s.session("u1").await.unwrap();
  assert_eq!(session.top_topics.get("krodh"), Some(&2));
  assert_eq!(session.top_topics.get("dukh"), Some(&1));
  assert_eq!(session.favourite_topics()[0], "krodh");
}

// ─── Subscriptions & journey ─────────────────────────────────────────────────

#[tokio::test]
async fn new_user_starts_at_position_zero() {
  let s = store().await;
  assert_eq!(s.journey_position("u1").await.unwrap(), 0);
}

#[tokio::test]
async fn advance_journey_steps_and_saturates() {
  let s = store().await;

  assert_eq!(s.advance_journey("u1", 2).await.unwrap(), 1);
  assert_eq!(s.advance_journey("u1", 2).await.unwrap(), 2);
  // Saturates at the last position; never wraps.
  assert_eq!(s.advance_journey("u1", 2).await.unwrap(), 2);
  assert_eq!(s.journey_position("u1").await.unwrap(), 2);
}

#[tokio::test]
async fn unsubscribe_preserves_journey_position() {
  let s = store().await;

  s.advance_journey("u1", 10).await.unwrap();
  s.advance_journey("u1", 10).await.unwrap();
  s.unsubscribe("u1").await.unwrap();

  assert!(s.active_journeys().await.unwrap().is_empty());
  assert_eq!(s.journey_position("u1").await.unwrap(), 2);

  s.subscribe("u1").await.unwrap();
  let journeys = s.active_journeys().await.unwrap();
  assert_eq!(journeys.len(), 1);
  assert_eq!(journeys[0].position, 2);
}

#[tokio::test]
async fn active_journeys_lists_only_active() {
  let s = store().await;

  s.subscribe("u1").await.unwrap();
  s.subscribe("u2").await.unwrap();
  s.unsubscribe("u2").await.unwrap();

  let journeys = s.active_journeys().await.unwrap();
  assert_eq!(journeys.len(), 1);
  assert_eq!(journeys[0].user_id, "u1");
  assert_eq!(journeys[0].position, 0);
}

// ─── Rate limiting ───────────────────────────────────────────────────────────

#[tokio::test]
async fn rate_limit_blocks_at_threshold() {
  let s = store().await;

  for _ in 0..5 {
    assert!(s.check_rate_limit("u1", 5, 3600).await.unwrap());
  }
  assert!(!s.check_rate_limit("u1", 5, 3600).await.unwrap());
  // A blocked attempt records nothing, so the verdict is stable.
  assert!(!s.check_rate_limit("u1", 5, 3600).await.unwrap());
}

#[tokio::test]
async fn rate_limit_is_per_user() {
  let s = store().await;

  assert!(s.check_rate_limit("u1", 1, 3600).await.unwrap());
  assert!(!s.check_rate_limit("u1", 1, 3600).await.unwrap());
  assert!(s.check_rate_limit("u2", 1, 3600).await.unwrap());
}

#[tokio::test]
async fn prune_removes_only_stale_rows() {
  let s = store().await;

  s.check_rate_limit("u1", 5, 3600).await.unwrap();
  // Fresh rows survive a prune scoped to the same window.
  assert_eq!(s.prune_messages(3600).await.unwrap(), 0);
  // A negative window makes everything stale.
  assert_eq!(s.prune_messages(-1).await.unwrap(), 1);
}

// ─── Analytics ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn daily_stats_counts_todays_activity() {
  let s = store().await;

  s.session("u1").await.unwrap();
  s.session("u2").await.unwrap();
  // Accepted messages double as the usage log.
  s.check_rate_limit("u1", 20, 3600).await.unwrap();
  s.check_rate_limit("u1", 20, 3600).await.unwrap();
  s.check_rate_limit("u2", 20, 3600).await.unwrap();
  s.log_event("u2", EventKind::ApiFailure).await.unwrap();
  s.subscribe("u1").await.unwrap();

  let stats = s.daily_stats(0).await.unwrap();
  assert_eq!(stats.active_users, 2);
  assert_eq!(stats.new_users, 2);
  assert_eq!(stats.messages, 3);
  assert_eq!(stats.active_subscribers, 1);
  assert_eq!(stats.api_failures, 1);
}

#[tokio::test]
async fn stats_windows_do_not_bleed_across_days() {
  let s = store().await;

  s.check_rate_limit("u1", 20, 3600).await.unwrap();
  s.subscribe("u1").await.unwrap();

  let yesterday = s.daily_stats(1).await.unwrap();
  assert_eq!(yesterday.active_users, 0);
  assert_eq!(yesterday.messages, 0);
  // Subscriber count is all-time, not windowed.
  assert_eq!(yesterday.active_subscribers, 1);
}

#[tokio::test]
async fn empty_store_has_zero_stats() {
  let s = store().await;
  assert_eq!(s.daily_stats(0).await.unwrap(), Default::default());
}
