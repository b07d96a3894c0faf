//! Verse types, the atomic unit of content.
//!
//! A verse is immutable for the life of the process. All meaningful text
//! (source, translated meaning, commentary) is attached here; topical
//! structure lives in [`crate::topics`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, de, ser};

use crate::Error;

/// Composite verse identity `(chapter, number)`, serialised as
/// `"chapter.number"`, e.g. `"2.47"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerseId {
  pub chapter: u16,
  pub number:  u16,
}

impl VerseId {
  pub const fn new(chapter: u16, number: u16) -> Self { Self { chapter, number } }
}

impl fmt::Display for VerseId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.chapter, self.number)
  }
}

impl FromStr for VerseId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (chapter, number) = s
      .split_once('.')
      .ok_or_else(|| Error::InvalidVerseId(s.to_owned()))?;
    let chapter: u16 = chapter
      .parse()
      .map_err(|_| Error::InvalidVerseId(s.to_owned()))?;
    let number: u16 = number
      .parse()
      .map_err(|_| Error::InvalidVerseId(s.to_owned()))?;
    if chapter == 0 || number == 0 {
      return Err(Error::InvalidVerseId(s.to_owned()));
    }
    Ok(Self { chapter, number })
  }
}

impl ser::Serialize for VerseId {
  fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> de::Deserialize<'de> for VerseId {
  fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(de::Error::custom)
  }
}

/// A single verse with its source text, translated meaning, optional extended
/// commentary, and ingestion-time topic tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verse {
  pub id:         VerseId,
  /// Original-language text; never modified at runtime.
  pub sanskrit:   String,
  /// Plain-language translated meaning.
  pub meaning:    String,
  #[serde(default)]
  pub commentary: Option<String>,
  #[serde(default)]
  pub tags:       Vec<String>,
}
