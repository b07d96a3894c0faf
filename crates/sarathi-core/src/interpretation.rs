//! Precomputed interpretations and the three-section response contract.
//!
//! An interpretation is a single string of exactly three parts separated by
//! [`SECTION_SEPARATOR`]: a short key-term gloss, a one/two-sentence
//! plain-language paraphrase, and contextual guidance (or a reflective
//! prompt, for the verse-of-the-day variant).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::verse::VerseId;

/// Separator token between the three interpretation sections.
pub const SECTION_SEPARATOR: &str = "[SECTION]";

/// Number of sections a well-formed interpretation carries.
pub const SECTION_COUNT: usize = 3;

/// Split an interpretation into trimmed sections. Empty input yields no
/// sections.
pub fn split_sections(text: &str) -> Vec<&str> {
  if text.trim().is_empty() {
    return Vec::new();
  }
  text.split(SECTION_SEPARATOR).map(str::trim).collect()
}

/// True iff `text` carries the full three-section shape.
pub fn is_well_formed(text: &str) -> bool {
  split_sections(text).len() >= SECTION_COUNT
}

/// Read-only cache of precomputed interpretations keyed by verse id, loaded
/// once at startup and shared process-wide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterpretationCache {
  entries: HashMap<VerseId, String>,
}

impl InterpretationCache {
  pub fn new(entries: HashMap<VerseId, String>) -> Self { Self { entries } }

  pub fn get(&self, id: &VerseId) -> Option<&str> {
    self.entries.get(id).map(String::as_str)
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
