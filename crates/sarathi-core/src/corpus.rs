//! The corpus store: read-only, in-memory structures over the fixed verse
//! dataset, loaded once at process start.
//!
//! The flattened verse sequence is the canonical reading ("journey") order.
//! Chapters are derived as contiguous `(first, last)` position ranges that
//! partition the sequence with no gaps.

use std::collections::HashMap;

use crate::{
  Error, Result,
  verse::{Verse, VerseId},
};

// ─── Chapter ─────────────────────────────────────────────────────────────────

/// A chapter's derived range over the flattened verse sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterInfo {
  pub number: u16,
  pub name:   String,
  /// First position of the chapter in canonical order (inclusive).
  pub first:  usize,
  /// Last position of the chapter in canonical order (inclusive).
  pub last:   usize,
}

// ─── Data repair ─────────────────────────────────────────────────────────────

/// Phrases marking a meaning as a placeholder left by grouped-verse
/// translations, where one translation covers several consecutive verses.
const PLACEHOLDER_PHRASES: &[&str] = &["did not comment", "no commentary"];

/// Meanings shorter than this (after trimming) are treated as placeholders.
const PLACEHOLDER_MIN_CHARS: usize = 5;

/// A donor meaning must be longer than this to be copied.
const DONOR_MIN_CHARS: usize = 10;

/// Neighbour offsets searched for a donor, in priority order.
const DONOR_OFFSETS: &[isize] = &[1, 2, 3, -1, -2];

fn is_placeholder(meaning: &str) -> bool {
  let lower = meaning.to_lowercase();
  PLACEHOLDER_PHRASES.iter().any(|p| lower.contains(p))
    || meaning.trim().chars().count() < PLACEHOLDER_MIN_CHARS
}

fn is_donor(meaning: &str) -> bool {
  !meaning.is_empty()
    && !meaning.to_lowercase().contains("comment")
    && meaning.chars().count() > DONOR_MIN_CHARS
}

/// Heal placeholder meanings by copying from a nearby verse in the same
/// translation group. Placeholders with no donor in the offset window are
/// left as-is.
fn repair_grouped_meanings(verses: &mut [Verse]) {
  for i in 0..verses.len() {
    if !is_placeholder(&verses[i].meaning) {
      continue;
    }
    for offset in DONOR_OFFSETS {
      let Some(donor_idx) = i.checked_add_signed(*offset) else {
        continue;
      };
      if donor_idx >= verses.len() {
        continue;
      }
      if is_donor(&verses[donor_idx].meaning) {
        verses[i].meaning = verses[donor_idx].meaning.clone();
        verses[i].commentary = verses[donor_idx].commentary.clone();
        break;
      }
    }
  }
}

// ─── Corpus ──────────────────────────────────────────────────────────────────

/// Immutable verse corpus in canonical order, with id and chapter lookups.
///
/// Constructed once at startup and shared behind an `Arc`; every operation
/// afterwards is a pure read.
pub struct Corpus {
  verses:   Vec<Verse>,
  by_id:    HashMap<VerseId, usize>,
  chapters: Vec<ChapterInfo>,
}

impl Corpus {
  /// Build a corpus from verses in canonical order plus a chapter-number →
  /// display-name table. Applies the grouped-translation repair pass, then
  /// derives chapter ranges.
  ///
  /// Errors on duplicate verse ids and on chapters that are not a single
  /// contiguous run.
  pub fn new(
    mut verses: Vec<Verse>,
    chapter_names: HashMap<u16, String>,
  ) -> Result<Self> {
    repair_grouped_meanings(&mut verses);

    let mut by_id = HashMap::with_capacity(verses.len());
    for (pos, verse) in verses.iter().enumerate() {
      if by_id.insert(verse.id, pos).is_some() {
        return Err(Error::DuplicateVerse(verse.id));
      }
    }

    let mut chapters: Vec<ChapterInfo> = Vec::new();
    for (pos, verse) in verses.iter().enumerate() {
      match chapters.last_mut() {
        Some(ch) if ch.number == verse.id.chapter => ch.last = pos,
        _ => {
          if chapters.iter().any(|c| c.number == verse.id.chapter) {
            return Err(Error::ChapterOrder(verse.id.chapter));
          }
          chapters.push(ChapterInfo {
            number: verse.id.chapter,
            name:   chapter_names
              .get(&verse.id.chapter)
              .cloned()
              .unwrap_or_default(),
            first:  pos,
            last:   pos,
          });
        }
      }
    }

    Ok(Self { verses, by_id, chapters })
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub fn get(&self, id: &VerseId) -> Option<&Verse> {
    self.by_id.get(id).map(|&pos| &self.verses[pos])
  }

  pub fn contains(&self, id: &VerseId) -> bool { self.by_id.contains_key(id) }

  /// Verse at a canonical-order position.
  pub fn by_position(&self, pos: usize) -> Option<&Verse> {
    self.verses.get(pos)
  }

  pub fn position_of(&self, id: &VerseId) -> Option<usize> {
    self.by_id.get(id).copied()
  }

  pub fn len(&self) -> usize { self.verses.len() }

  pub fn is_empty(&self) -> bool { self.verses.is_empty() }

  /// The terminal journey position (`len - 1`); 0 for an empty corpus.
  pub fn last_position(&self) -> usize { self.len().saturating_sub(1) }

  /// Chapter containing the given position.
  pub fn chapter_info(&self, pos: usize) -> Option<&ChapterInfo> {
    self
      .chapters
      .iter()
      .find(|ch| pos >= ch.first && pos <= ch.last)
  }

  /// True iff `pos` is the last position of its chapter.
  pub fn is_chapter_boundary(&self, pos: usize) -> bool {
    self.chapter_info(pos).is_some_and(|ch| pos == ch.last)
  }
}
