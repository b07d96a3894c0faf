//! Per-user conversational session state.
//!
//! A session is a single row of recency state, overwritten on every answered
//! question. It exists so follow-ups ("और भेजें") and topic-menu taps can be
//! interpreted without the user repeating themselves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::verse::VerseId;

/// Marker describing what the last outbound message asked of the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionContext {
  /// The topic menu was just shown; the next tap selects a topic.
  TopicMenu,
}

/// One user's session: the last answered query, the verses already shown for
/// it, the pending interaction context, and lifetime topic-affinity counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub user_id:      String,
  pub last_query:   String,
  pub last_shlokas: Vec<VerseId>,
  pub context:      Option<SessionContext>,
  /// topic id → times engaged, for personalisation.
  pub top_topics:   HashMap<String, u32>,
}

impl Session {
  /// The state a user has before their first question.
  pub fn empty(user_id: &str) -> Self {
    Self {
      user_id:      user_id.to_owned(),
      last_query:   String::new(),
      last_shlokas: Vec::new(),
      context:      None,
      top_topics:   HashMap::new(),
    }
  }

  /// Topic ids by descending affinity, ties broken alphabetically.
  pub fn favourite_topics(&self) -> Vec<&str> {
    let mut topics: Vec<_> = self.top_topics.iter().collect();
    topics.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    topics.into_iter().map(|(t, _)| t.as_str()).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_session_has_no_history() {
    let s = Session::empty("u1");
    assert_eq!(s.user_id, "u1");
    assert!(s.last_query.is_empty());
    assert!(s.last_shlokas.is_empty());
    assert!(s.context.is_none());
    assert!(s.top_topics.is_empty());
  }

  #[test]
  fn favourite_topics_ordered_by_count_then_name() {
    let mut s = Session::empty("u1");
    s.top_topics.insert("krodh".to_owned(), 2);
    s.top_topics.insert("dukh".to_owned(), 5);
    s.top_topics.insert("bhay".to_owned(), 2);
    assert_eq!(s.favourite_topics(), vec!["dukh", "bhay", "krodh"]);
  }
}
