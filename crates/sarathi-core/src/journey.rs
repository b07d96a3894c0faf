//! The sequential reading journey over the canonical verse order.
//!
//! A subscriber's journey is a single position counter; everything shown for
//! a step (verse, chapter, progress, milestone) is derived from the corpus.
//! The position saturates at the last verse and never wraps.

use std::sync::Arc;

use crate::{
  corpus::{ChapterInfo, Corpus},
  verse::Verse,
};

/// Everything needed to render one journey step.
#[derive(Debug, Clone)]
pub struct JourneyView<'a> {
  pub verse:        &'a Verse,
  pub position:     usize,
  pub total:        usize,
  pub chapter:      &'a ChapterInfo,
  /// Set when this step closes its chapter: the upcoming chapter, if any.
  pub next_chapter: Option<&'a ChapterInfo>,
  /// True at the final verse of the whole corpus.
  pub is_final:     bool,
}

impl<'a> JourneyView<'a> {
  /// Resolve the journey step at `position`. `None` when the position is at
  /// or past the end of the corpus (journey complete) or the corpus is
  /// empty.
  pub fn at(corpus: &'a Arc<Corpus>, position: usize) -> Option<Self> {
    let verse = corpus.by_position(position)?;
    let chapter = corpus.chapter_info(position)?;
    let next_chapter = if corpus.is_chapter_boundary(position) {
      corpus.chapter_info(position + 1)
    } else {
      None
    };
    Some(Self {
      verse,
      position,
      total: corpus.len(),
      chapter,
      next_chapter,
      is_final: position == corpus.last_position(),
    })
  }

  /// Human progress counter, 1-based.
  pub fn step(&self) -> usize { self.position + 1 }
}

/// The next position after a step: advance by one, saturating at `last`.
pub fn advance(position: usize, last: usize) -> usize {
  (position + 1).min(last)
}
