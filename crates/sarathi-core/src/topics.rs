//! Topic tables: the bridge between free-text queries and curated verse
//! sets.
//!
//! Two independent keyword tables exist by design: the curated table
//! ([`TopicTable`]) carries hand-picked best-lists with narrow trigger
//! keywords, while the detection table ([`QueryTopics`]) carries broader
//! query-side synonyms feeding the inverted index. Their keyword sets and
//! topic-name spaces overlap only partially; unifying them would be a
//! behaviour change, not a cleanup.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, corpus::Corpus, verse::VerseId};

// ─── Curated topics ──────────────────────────────────────────────────────────

/// A named category with hand-picked verses, ordered by relevance, and the
/// trigger keywords that select it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratedTopic {
  pub id:       String,
  /// Display label shown on the topic menu.
  pub label:    String,
  #[serde(default)]
  pub keywords: Vec<String>,
  /// Curated best-list, in priority order.
  #[serde(default)]
  pub best:     Vec<VerseId>,
}

/// Ordered curated-topic table; order is the tier-2 scan order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicTable {
  topics: Vec<CuratedTopic>,
}

impl TopicTable {
  pub fn new(topics: Vec<CuratedTopic>) -> Self { Self { topics } }

  pub fn get(&self, id: &str) -> Option<&CuratedTopic> {
    self.topics.iter().find(|t| t.id == id)
  }

  pub fn iter(&self) -> impl Iterator<Item = &CuratedTopic> {
    self.topics.iter()
  }

  pub fn len(&self) -> usize { self.topics.len() }

  pub fn is_empty(&self) -> bool { self.topics.is_empty() }

  /// Referential-integrity check: every curated best-list id must exist in
  /// the corpus. Run once at startup.
  pub fn validate(&self, corpus: &Corpus) -> Result<()> {
    for topic in &self.topics {
      for id in &topic.best {
        if !corpus.contains(id) {
          return Err(Error::DanglingTopicVerse {
            topic: topic.id.clone(),
            id:    *id,
          });
        }
      }
    }
    Ok(())
  }
}

// ─── Detection table ─────────────────────────────────────────────────────────

/// One detection entry: a topic label with its query-side synonyms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicKeywords {
  pub topic:    String,
  pub keywords: Vec<String>,
}

/// Broad keyword → topic detection table used by the keyword-index tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryTopics {
  entries: Vec<TopicKeywords>,
}

impl QueryTopics {
  pub fn new(entries: Vec<TopicKeywords>) -> Self { Self { entries } }

  /// Topics whose keywords substring-match the query, case-insensitively.
  /// One hit per topic is enough; table order is preserved.
  pub fn detect(&self, query: &str) -> Vec<&str> {
    let query_lower = query.to_lowercase();
    self
      .entries
      .iter()
      .filter(|e| {
        e.keywords
          .iter()
          .any(|kw| query_lower.contains(&kw.to_lowercase()))
      })
      .map(|e| e.topic.as_str())
      .collect()
  }

  /// The built-in Hindi/English/Hinglish detection table.
  pub fn builtin() -> Self {
    fn entry(topic: &str, keywords: &[&str]) -> TopicKeywords {
      TopicKeywords {
        topic:    topic.to_owned(),
        keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
      }
    }

    Self::new(vec![
      entry("karma", &["काम", "कर्म", "करना", "कर्तव्य", "जिम्मेदारी", "duty", "work", "action"]),
      entry("dharma", &["धर्म", "सही", "गलत", "न्याय", "right", "wrong", "ethics"]),
      entry("bhakti", &["भक्ति", "प्रार्थना", "पूजा", "भगवान", "ईश्वर", "prayer", "god", "devotion"]),
      entry("gyan", &["ज्ञान", "समझ", "सीखना", "knowledge", "wisdom", "understanding"]),
      entry("atma", &["आत्मा", "soul", "spirit", "self"]),
      entry("mrityu", &["मृत्यु", "मौत", "death", "dying", "मरना"]),
      entry("krodh", &["गुस्सा", "क्रोध", "anger", "angry", "irritation"]),
      entry("bhay", &["डर", "भय", "घबराहट", "चिंता", "fear", "anxiety", "worried", "scared"]),
      entry("shanti", &["शांति", "peace", "calm", "peaceful"]),
      entry("dukh", &["दुख", "तकलीफ", "परेशानी", "sad", "unhappy", "suffering", "pain", "problem"]),
      entry("sukh", &["खुशी", "सुख", "happy", "happiness", "joy"]),
      entry("moha", &["लगाव", "मोह", "attachment", "obsession"]),
      entry("tyag", &["त्याग", "छोड़ना", "let go", "renounce", "sacrifice"]),
      entry("man", &["मन", "सोच", "विचार", "mind", "thoughts", "thinking"]),
      entry("parivar", &["परिवार", "घर", "बच्चे", "पति", "पत्नी", "माता", "पिता", "family", "parents", "children"]),
      entry("shraddha", &["विश्वास", "भरोसा", "faith", "trust", "believe"]),
      entry("dhyan", &["ध्यान", "meditation", "focus", "concentrate"]),
    ])
  }
}

// ─── Inverted index ──────────────────────────────────────────────────────────

/// One inverted-index entry: a topic with the verses tagged under it, in
/// index-insertion order (the tie-break order for equal scores).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicVerses {
  pub topic:  String,
  pub verses: Vec<VerseId>,
}

/// Topic → verse-id inverted index, built offline from verse tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicIndex {
  entries: Vec<TopicVerses>,
}

impl TopicIndex {
  pub fn new(entries: Vec<TopicVerses>) -> Self { Self { entries } }

  pub fn get(&self, topic: &str) -> Option<&[VerseId]> {
    self
      .entries
      .iter()
      .find(|e| e.topic == topic)
      .map(|e| e.verses.as_slice())
  }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::corpus::tests::small_corpus;

  #[test]
  fn detect_matches_hindi_and_english_keywords() {
    let table = QueryTopics::builtin();
    assert_eq!(table.detect("मुझे गुस्सा आता है"), vec!["krodh"]);
    assert_eq!(table.detect("I feel ANGER rising"), vec!["krodh"]);
    assert!(table.detect("xyzzy").is_empty());
  }

  #[test]
  fn detect_reports_each_topic_once_in_table_order() {
    let table = QueryTopics::builtin();
    let detected = table.detect("कर्म और धर्म में गुस्सा");
    assert_eq!(detected, vec!["karma", "dharma", "krodh"]);
  }

  #[test]
  fn validate_rejects_dangling_best_list() {
    let corpus = small_corpus();
    let table = TopicTable::new(vec![CuratedTopic {
      id:       "krodh".to_owned(),
      label:    "गुस्सा".to_owned(),
      keywords: vec!["गुस्सा".to_owned()],
      best:     vec![VerseId::new(9, 9)],
    }]);
    assert!(matches!(
      table.validate(&corpus),
      Err(Error::DanglingTopicVerse { .. })
    ));
  }

  #[test]
  fn validate_accepts_known_ids() {
    let corpus = small_corpus();
    let table = TopicTable::new(vec![CuratedTopic {
      id:       "krodh".to_owned(),
      label:    "गुस्सा".to_owned(),
      keywords: vec!["गुस्सा".to_owned()],
      best:     vec![VerseId::new(1, 1), VerseId::new(2, 2)],
    }]);
    assert!(table.validate(&corpus).is_ok());
  }
}
