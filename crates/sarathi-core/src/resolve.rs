//! The relevance resolver: the tiered pipeline turning an unstructured,
//! multilingual query into a ranked, bounded, deduplicated verse list.
//!
//! Tiers, each attempted only when the previous produced zero results:
//! semantic vector search → curated-topic keyword match → scored inverted
//! index → universal fallback. Degradation is deterministic: a missing or
//! failing semantic backend simply yields the next tier.

use std::{collections::HashMap, sync::Arc};

use crate::{
  corpus::Corpus,
  topics::{QueryTopics, TopicIndex, TopicTable},
  verse::{Verse, VerseId},
};

// ─── Semantic capability ─────────────────────────────────────────────────────

/// Nearest-neighbour lookup against an external embedding/vector service.
///
/// Implementations must swallow their own transport failures and return an
/// empty list; the resolver treats empty as "fall through", with no retry.
pub trait SemanticIndex: Send + Sync {
  fn search<'a>(
    &'a self,
    query: &'a str,
    limit: usize,
  ) -> impl Future<Output = Vec<VerseId>> + Send + 'a;
}

/// Capability placeholder for deployments without a semantic backend.
/// Never constructed; used only to name the type of an absent index.
#[derive(Debug, Clone, Copy)]
pub struct NoSemantic;

impl SemanticIndex for NoSemantic {
  async fn search(&self, _query: &str, _limit: usize) -> Vec<VerseId> {
    Vec::new()
  }
}

// ─── Universal fallback ──────────────────────────────────────────────────────

/// Hand-picked well-known verses returned when no tier matches. The list is
/// intersected with the corpus, so it degrades safely on partial datasets.
pub const UNIVERSAL_FALLBACK: [VerseId; 5] = [
  VerseId::new(2, 47),
  VerseId::new(2, 14),
  VerseId::new(6, 5),
  VerseId::new(18, 66),
  VerseId::new(2, 22),
];

/// Pool size used when re-resolving for a "show me another" follow-up.
pub const MORE_POOL: usize = 5;

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Tiered query → verse resolver over a fixed corpus.
///
/// Deterministic for a fixed corpus and fixed external-service behaviour.
pub struct Resolver<I = NoSemantic> {
  corpus:    Arc<Corpus>,
  curated:   TopicTable,
  detection: QueryTopics,
  index:     TopicIndex,
  semantic:  Option<I>,
}

impl<I: SemanticIndex> Resolver<I> {
  pub fn new(
    corpus: Arc<Corpus>,
    curated: TopicTable,
    detection: QueryTopics,
    index: TopicIndex,
    semantic: Option<I>,
  ) -> Self {
    Self { corpus, curated, detection, index, semantic }
  }

  pub fn corpus(&self) -> &Arc<Corpus> { &self.corpus }

  pub fn curated(&self) -> &TopicTable { &self.curated }

  /// Resolve `query` to at most `max_results` verses, deduplicated by id.
  ///
  /// Never fails: a query that matches nothing (including one that is empty
  /// after sanitization) falls through to the universal tier.
  pub async fn resolve(&self, query: &str, max_results: usize) -> Vec<Verse> {
    if max_results == 0 {
      return Vec::new();
    }

    let verses = self.semantic_tier(query, max_results).await;
    if !verses.is_empty() {
      return verses;
    }

    let verses = self.curated_tier(query, max_results);
    if !verses.is_empty() {
      return verses;
    }

    let verses = self.index_tier(query, max_results);
    if !verses.is_empty() {
      return verses;
    }

    self.universal_tier(max_results)
  }

  /// "Show me another": re-resolve with a wider pool and return the first
  /// verse not already shown. `None` means the topic is exhausted.
  pub async fn resolve_more(
    &self,
    query: &str,
    shown: &[VerseId],
  ) -> Option<Verse> {
    self
      .resolve(query, MORE_POOL.max(shown.len() + 1))
      .await
      .into_iter()
      .find(|v| !shown.contains(&v.id))
  }

  // ── Tier 1: semantic ──────────────────────────────────────────────────

  async fn semantic_tier(&self, query: &str, max_results: usize) -> Vec<Verse> {
    let Some(semantic) = &self.semantic else {
      return Vec::new();
    };
    let ids = semantic.search(query, max_results).await;
    // Drop ids the index knows but the corpus does not (index/corpus drift).
    ids
      .into_iter()
      .filter_map(|id| self.corpus.get(&id).cloned())
      .collect()
  }

  // ── Tier 2: curated topics ────────────────────────────────────────────

  fn curated_tier(&self, query: &str, max_results: usize) -> Vec<Verse> {
    let query_lower = query.to_lowercase();
    let mut matched: Vec<Verse> = Vec::new();

    'topics: for topic in self.curated.iter() {
      let hit = topic
        .keywords
        .iter()
        .any(|kw| query_lower.contains(&kw.to_lowercase()));
      if !hit {
        continue;
      }
      for id in &topic.best {
        if matched.iter().any(|v| v.id == *id) {
          continue;
        }
        if let Some(verse) = self.corpus.get(id) {
          matched.push(verse.clone());
          if matched.len() >= max_results {
            break 'topics;
          }
        }
      }
    }

    matched
  }

  // ── Tier 3: keyword index ─────────────────────────────────────────────

  fn index_tier(&self, query: &str, max_results: usize) -> Vec<Verse> {
    let topics = self.detection.detect(query);
    if topics.is_empty() {
      return Vec::new();
    }

    // Aggregate +1 per topic occurrence; first-seen order is the stable
    // tie-break for equal scores.
    let mut scores: HashMap<VerseId, u32> = HashMap::new();
    let mut order: Vec<VerseId> = Vec::new();
    for topic in topics {
      let Some(ids) = self.index.get(topic) else {
        continue;
      };
      for id in ids {
        let entry = scores.entry(*id).or_insert(0);
        if *entry == 0 {
          order.push(*id);
        }
        *entry += 1;
      }
    }

    order.sort_by_key(|id| std::cmp::Reverse(scores[id]));
    order
      .into_iter()
      .filter_map(|id| self.corpus.get(&id).cloned())
      .take(max_results)
      .collect()
  }

  // ── Tier 4: universal fallback ────────────────────────────────────────

  fn universal_tier(&self, max_results: usize) -> Vec<Verse> {
    UNIVERSAL_FALLBACK
      .iter()
      .filter_map(|id| self.corpus.get(id).cloned())
      .take(max_results)
      .collect()
  }
}
