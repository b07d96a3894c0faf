//! Error types for `sarathi-core`.

use thiserror::Error;

use crate::verse::VerseId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid verse id: {0:?}")]
  InvalidVerseId(String),

  #[error("duplicate verse id in corpus: {0}")]
  DuplicateVerse(VerseId),

  #[error("chapter {0} is not a contiguous run in corpus order")]
  ChapterOrder(u16),

  #[error("topic {topic:?} references unknown verse {id}")]
  DanglingTopicVerse { topic: String, id: VerseId },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
