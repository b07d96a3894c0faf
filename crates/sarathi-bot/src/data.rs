//! Startup loading of the bundled JSON datasets.
//!
//! Only the verse corpus is mandatory; every other file degrades gracefully
//! to an empty dataset so a minimal deployment still answers questions.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use sarathi_core::{
  interpretation::InterpretationCache,
  topics::{TopicIndex, TopicTable},
  verse::Verse,
};
use sarathi_gateway::semantic::VerseEmbedding;
use serde::de::DeserializeOwned;

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
  let raw = fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw)
    .with_context(|| format!("parsing {}", path.display()))
}

fn load_json_or_default<T: DeserializeOwned + Default>(
  path: &Path,
) -> Result<T> {
  if !path.exists() {
    tracing::info!(path = %path.display(), "optional dataset missing, using empty");
    return Ok(T::default());
  }
  load_json(path)
}

/// Verses in canonical order. Required.
pub fn load_verses(data_dir: &Path) -> Result<Vec<Verse>> {
  load_json(&data_dir.join("verses.json"))
}

/// Chapter-number → display-name table.
pub fn load_chapter_names(data_dir: &Path) -> Result<HashMap<u16, String>> {
  load_json_or_default(&data_dir.join("chapters.json"))
}

/// Hand-curated topic table with per-topic best verses.
pub fn load_topics(data_dir: &Path) -> Result<TopicTable> {
  load_json_or_default(&data_dir.join("topics.json"))
}

/// Broad keyword → verse-list index, the pre-universal tier.
pub fn load_topic_index(data_dir: &Path) -> Result<TopicIndex> {
  load_json_or_default(&data_dir.join("topic_index.json"))
}

/// Precomputed per-verse interpretations.
pub fn load_interpretations(data_dir: &Path) -> Result<InterpretationCache> {
  load_json_or_default(&data_dir.join("interpretations.json"))
}

/// Precomputed verse embedding vectors for the semantic tier.
pub fn load_embeddings(data_dir: &Path) -> Result<Vec<VerseEmbedding>> {
  load_json_or_default(&data_dir.join("embeddings.json"))
}
