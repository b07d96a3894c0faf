//! Inbound guardrail chain: sanitize, validate, content-filter.
//!
//! Rate limiting is the final link in the chain but needs persistence, so it
//! lives behind [`crate::store::GuidanceStore::check_rate_limit`]; the
//! shared limit constants are defined here.

use serde::{Deserialize, Serialize};

/// Hard cap on inbound message length, in characters.
pub const MAX_INPUT_CHARS: usize = 500;

/// Minimum trimmed length for a message to be answerable.
pub const MIN_INPUT_CHARS: usize = 2;

/// Messages allowed per user per rate window.
pub const RATE_LIMIT: u32 = 20;

/// Rate window length in seconds.
pub const RATE_WINDOW_SECS: i64 = 3600;

/// Truncate to [`MAX_INPUT_CHARS`] and collapse all whitespace runs to
/// single spaces. Character-based, so multi-byte scripts are never split.
pub fn sanitize(message: &str) -> String {
  let truncated: String = message.chars().take(MAX_INPUT_CHARS).collect();
  truncated.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True iff the sanitized message is long enough to answer.
pub fn is_valid(message: &str) -> bool {
  message.trim().chars().count() >= MIN_INPUT_CHARS
}

// ─── Content filter ──────────────────────────────────────────────────────────

/// Why the content filter rejected a message. Checked in declaration order;
/// a message matching several categories reports the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
  Profanity,
  Manipulation,
  OffTopic,
}

/// Substring-based content policy over the lowercased message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentPolicy {
  #[serde(default)]
  pub profanity:    Vec<String>,
  #[serde(default)]
  pub manipulation: Vec<String>,
  #[serde(default)]
  pub offtopic:     Vec<String>,
}

impl ContentPolicy {
  /// First matching block category, or `None` when the message is clean.
  pub fn check(&self, message: &str) -> Option<BlockReason> {
    let lower = message.to_lowercase();
    let hit = |list: &[String]| list.iter().any(|w| lower.contains(w.as_str()));
    if hit(&self.profanity) {
      Some(BlockReason::Profanity)
    } else if hit(&self.manipulation) {
      Some(BlockReason::Manipulation)
    } else if hit(&self.offtopic) {
      Some(BlockReason::OffTopic)
    } else {
      None
    }
  }

  /// Built-in Hindi/Hinglish/English deny lists.
  pub fn builtin() -> Self {
    fn owned(words: &[&str]) -> Vec<String> {
      words.iter().map(|w| (*w).to_owned()).collect()
    }

    Self {
      profanity:    owned(&[
        "भड़वा", "रंडी", "चूतिया", "मादरचोद", "बहनचोद", "गांड", "लौड़ा",
        "भोसड़ी", "fuck", "shit", "ass", "bitch", "bastard", "dick", "pussy",
      ]),
      manipulation: owned(&[
        "ignore previous",
        "forget instructions",
        "you are now",
        "act as",
        "pretend to be",
        "bypass",
        "ignore all",
        "disregard",
        "new persona",
        "jailbreak",
        "dan mode",
        "developer mode",
        "ignore safety",
      ]),
      offtopic:     owned(&[
        "modi", "rahul", "bjp", "congress", "election", "vote", "pakistan",
        "muslim", "hindu", "christian", "sex", "porn", "nude", "xxx",
      ]),
    }
  }
}

// ─── Chain verdict ───────────────────────────────────────────────────────────

/// Why the guardrail chain rejected a message. [`Rejection::RateLimited`] is
/// produced by the caller after consulting the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
  TooShort,
  Blocked(BlockReason),
  RateLimited,
}

/// Run the stateless links of the chain: sanitize, then validate, then
/// content-filter. Returns the sanitized message on success.
pub fn screen(
  policy: &ContentPolicy,
  message: &str,
) -> Result<String, Rejection> {
  let clean = sanitize(message);
  if !is_valid(&clean) {
    return Err(Rejection::TooShort);
  }
  if let Some(reason) = policy.check(&clean) {
    return Err(Rejection::Blocked(reason));
  }
  Ok(clean)
}
