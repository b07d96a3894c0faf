//! LLM interpretation gateway: precomputed cache first, live generation as a
//! best-effort follow-up.
//!
//! Live calls go to the Gemini `generateContent` REST endpoint. All public
//! entry points return `Option<String>` and never propagate upstream
//! failures; the caller falls back to the verse's own meaning.

use std::{sync::Arc, time::Duration};

use base64::Engine as _;
use sarathi_core::{
  interpretation::{InterpretationCache, SECTION_SEPARATOR, is_well_formed},
  verse::Verse,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Token budget for a contextual (question-driven) interpretation.
const CONTEXTUAL_MAX_TOKENS: u32 = 1000;

/// Token budget for the shorter daily-push interpretation.
const DAILY_MAX_TOKENS: u32 = 500;

const TEMPERATURE: f32 = 0.7;

/// Commentary excerpts in prompts are capped at this many characters.
const COMMENTARY_EXCERPT_CHARS: usize = 1500;

/// Settings for the interpretation gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InterpretConfig {
  /// Upstream API key; `None` disables live generation entirely.
  pub api_key:      Option<String>,
  pub endpoint:     String,
  /// Models tried in order until one answers.
  pub models:       Vec<String>,
  pub timeout_secs: u64,
}

impl Default for InterpretConfig {
  fn default() -> Self {
    Self {
      api_key:      None,
      endpoint:     "https://generativelanguage.googleapis.com/v1beta".into(),
      models:       vec!["gemini-2.0-flash".into(), "gemini-2.5-flash".into()],
      timeout_secs: 15,
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
  contents:          Vec<Content>,
  generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
  parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
  Text(String),
  #[serde(rename_all = "camelCase")]
  InlineData { mime_type: String, data: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  max_output_tokens: u32,
  temperature:       f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
  content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
  #[serde(default)]
  text: String,
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// Interpretation source with a precomputed cache in front of live
/// generation.
///
/// Cheap to clone; the HTTP client and cache are reference-counted.
#[derive(Clone)]
pub struct InterpretationGateway {
  client: reqwest::Client,
  config: InterpretConfig,
  cache:  Arc<InterpretationCache>,
}

impl InterpretationGateway {
  pub fn new(
    config: InterpretConfig,
    cache: Arc<InterpretationCache>,
  ) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config, cache })
  }

  /// Instant lookup into the precomputed cache. No network.
  pub fn cached(&self, verse: &Verse) -> Option<&str> {
    self.cache.get(&verse.id)
  }

  /// Live contextual interpretation for an answered question. Best-effort:
  /// `None` on any upstream problem or when no key is configured. Output
  /// missing its sections is salvaged rather than discarded.
  pub async fn interpret(
    &self,
    query: &str,
    verses: &[Verse],
  ) -> Option<String> {
    if verses.is_empty() {
      return None;
    }
    let prompt = contextual_prompt(query, verses);
    match self.generate(&prompt, CONTEXTUAL_MAX_TOKENS).await {
      Ok(text) if is_well_formed(&text) => Some(text),
      Ok(partial) => {
        tracing::warn!("contextual interpretation missing sections, salvaging");
        Some(self.salvage(&partial, &verses[0]))
      }
      Err(e) => {
        tracing::warn!(error = %e, "contextual interpretation failed");
        None
      }
    }
  }

  /// Rebuild a three-section answer from malformed model output. A cached
  /// interpretation for the verse wins, provided it carries all three
  /// sections itself; otherwise the verse's stored meaning becomes the
  /// middle section and the partial output the guidance.
  fn salvage(&self, partial: &str, verse: &Verse) -> String {
    if let Some(cached) = self.cache.get(&verse.id)
      && is_well_formed(cached)
    {
      return cached.to_owned();
    }
    let sep = SECTION_SEPARATOR;
    format!("{sep} {meaning} {sep} {partial}", meaning = verse.meaning)
  }

  /// Live short interpretation for the daily push, used when the cache has
  /// no entry for the verse.
  pub async fn daily_interpret(&self, verse: &Verse) -> Option<String> {
    let prompt = daily_prompt(verse);
    match self.generate(&prompt, DAILY_MAX_TOKENS).await {
      Ok(text) => Some(text),
      Err(e) => {
        tracing::warn!(verse = %verse.id, error = %e, "daily interpretation failed");
        None
      }
    }
  }

  /// Transcribe a voice note (OGG/Opus) to text via the multimodal model.
  pub async fn transcribe(&self, audio: &[u8]) -> Option<String> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(audio);
    let request = GenerateRequest {
      contents:          vec![Content {
        parts: vec![
          Part::Text(
            "Transcribe this audio to text. The speaker is likely speaking \
             Hindi or Hinglish. Return ONLY the transcription, nothing else."
              .into(),
          ),
          Part::InlineData {
            mime_type: "audio/ogg".into(),
            data:      encoded,
          },
        ],
      }],
      generation_config: GenerationConfig {
        max_output_tokens: DAILY_MAX_TOKENS,
        temperature:       0.0,
      },
    };

    match self.generate_request(&request).await {
      Ok(text) => Some(text),
      Err(e) => {
        tracing::warn!(error = %e, "voice transcription failed");
        None
      }
    }
  }

  async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
    let request = GenerateRequest {
      contents:          vec![Content {
        parts: vec![Part::Text(prompt.to_owned())],
      }],
      generation_config: GenerationConfig {
        max_output_tokens: max_tokens,
        temperature:       TEMPERATURE,
      },
    };
    self.generate_request(&request).await
  }

  /// Try each configured model in order; first non-empty answer wins.
  async fn generate_request(&self, request: &GenerateRequest) -> Result<String> {
    let api_key = self.config.api_key.as_deref().ok_or(Error::NoApiKey)?;

    let mut last_err = Error::MalformedResponse("no models configured");
    for model in &self.config.models {
      let url = format!(
        "{}/models/{}:generateContent",
        self.config.endpoint.trim_end_matches('/'),
        model,
      );
      match self.call_model(&url, api_key, request).await {
        Ok(text) if !text.is_empty() => return Ok(text),
        Ok(_) => last_err = Error::MalformedResponse("empty candidate text"),
        Err(e) => {
          tracing::debug!(model, error = %e, "model attempt failed");
          last_err = e;
        }
      }
    }
    Err(last_err)
  }

  async fn call_model(
    &self,
    url: &str,
    api_key: &str,
    request: &GenerateRequest,
  ) -> Result<String> {
    let resp = self
      .client
      .post(url)
      .header("x-goog-api-key", api_key)
      .json(request)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Upstream {
        status:  status.as_u16(),
        message: resp.text().await.unwrap_or_default(),
      });
    }

    let body: GenerateResponse = resp.json().await?;
    let text = body
      .candidates
      .first()
      .ok_or(Error::MalformedResponse("candidates"))?
      .content
      .parts
      .iter()
      .map(|p| p.text.as_str())
      .collect::<String>();
    Ok(text.trim().to_owned())
  }
}

// ─── Prompts ─────────────────────────────────────────────────────────────────

fn verse_context(verse: &Verse) -> String {
  let mut ctx = format!("--- श्रीमद्भगवद्गीता {} ---\n", verse.id);
  ctx.push_str(&format!("संस्कृत: {}\n", verse.sanskrit));
  ctx.push_str(&format!("अर्थ (Meaning): {}\n", verse.meaning));
  if let Some(commentary) = &verse.commentary {
    let excerpt: String =
      commentary.chars().take(COMMENTARY_EXCERPT_CHARS).collect();
    ctx.push_str(&format!("व्याख्या (Detailed Commentary): {excerpt}...\n"));
  }
  ctx
}

fn contextual_prompt(query: &str, verses: &[Verse]) -> String {
  let context: String =
    verses.iter().map(|v| verse_context(v) + "\n").collect();
  let sep = SECTION_SEPARATOR;

  format!(
    "आप श्रीमद्भगवद्गीता के एक अत्यंत सौम्य, गंभीर और सम्मानजनक मार्गदर्शक \
     हैं। आपकी भाषा सरल है, लेकिन उसमें मर्यादा और ठहराव है।\n\n\
     एक व्यक्ति ने आपसे यह प्रश्न पूछा है:\n\"{query}\"\n\n\
     उनके समाधान के लिए गीता के ये सूत्र उपलब्ध हैं:\n{context}\n\
     पहले श्लोक पर आधारित उत्तर तीन भागों में लिखें, हर भाग के बीच \
     {sep} लिखें:\n\
     1. शब्दार्थ: मुख्य संस्कृत शब्दों का अर्थ, एक पंक्ति में।\n\
     2. भावार्थ: श्लोक का सार सरल बोलचाल की हिंदी में, 1-2 पंक्तियाँ।\n\
     3. मार्गदर्शन: प्रश्न से जोड़कर व्यक्तिगत मार्गदर्शन, 3-4 पंक्तियाँ। \
     बात की शुरुआत सम्मान के साथ करें और अंत में एक गहरा विचार दें।\n\n\
     निर्देश:\n\
     - संबोधन: \"प्रिय आत्मन्\"। हमेशा \"आप\" का प्रयोग करें।\n\
     - टोन: गंभीर, शांत और गरिमापूर्ण। Hinglish से बचें।\n\
     - बिल्कुल न लिखें: श्लोक संख्या, या कोई हेडिंग।"
  )
}

fn daily_prompt(verse: &Verse) -> String {
  let context = verse_context(verse);
  let sep = SECTION_SEPARATOR;
  format!(
    "आप श्रीमद्भगवद्गीता के एक अत्यंत सौम्य, गंभीर और सम्मानजनक मार्गदर्शक \
     हैं। आज के दिन के लिए आपको एक प्रेरणादायक विचार साझा करना है।\n\n\
     आज का श्लोक यह है:\n{context}\n\
     उत्तर तीन भागों में लिखें, हर भाग के बीच {sep} लिखें:\n\
     1. शब्दार्थ: मुख्य संस्कृत शब्दों का अर्थ, एक पंक्ति में।\n\
     2. भावार्थ: श्लोक का सार सरल हिंदी में, 1-2 पंक्तियाँ।\n\
     3. मार्गदर्शन: एक ऐसा विचार जिसे वे पूरे दिन अपने साथ रख सकें, \
     2-3 पंक्तियाँ।\n\n\
     निर्देश:\n\
     - संबोधन: \"प्रिय आत्मन्\"\n\
     - टोन: गंभीर, शांत और प्रेरक।\n\
     - बिल्कुल न लिखें: श्लोक संख्या, या कोई हेडिंग।"
  )
}
