//! Outbound Hindi message templates, forward-friendly.
//!
//! Every user-facing string lives here so the handlers stay logic-only.

use sarathi_core::{
  guardrail::BlockReason,
  interpretation::split_sections,
  journey::JourneyView,
  store::DailyStats,
  verse::Verse,
};
use sarathi_gateway::chat::{Button, Keyboard};

/// Five-topic quick menu shown by `/topic`: `(topic id, button label)`.
pub const TOPIC_MENU: &[(&str, &str)] = &[
  ("chinta", "मुझे चिंता/डर लगता है"),
  ("krodh", "मुझे गुस्सा आता है"),
  ("kartavya", "मुझे समझ नहीं आता क्या करूं"),
  ("dukh", "मैं बीमार हूं / कोई खो दिया"),
  ("akela", "मैं अकेला महसूस करता हूं"),
];

/// The ten most iconic verses, shown by `/amrit`: `(verse id, incipit)`.
pub const AMRIT_SHLOKAS: &[(&str, &str)] = &[
  ("2.47", "कर्मण्येवाधिकारस्ते"),
  ("4.7", "यदा यदा ही धर्मस्य"),
  ("2.20", "न जायते म्रियते वा"),
  ("9.22", "अनन्याश्चिन्तयन्तो माम्"),
  ("18.66", "सर्वधर्मान्परित्यज्य"),
  ("2.14", "मात्रास्पर्शास्तु कौन्तेय"),
  ("3.21", "यद्यदाचरति श्रेष्ठः"),
  ("6.5", "उद्धरेदात्मनात्मानम्"),
  ("11.32", "कालोऽस्मि लोकक्षयकृत्"),
  ("2.3", "क्लैब्यं मा स्म गमः पार्थ"),
];

const SIGNATURE: &str = "— गीता सारथी 🙏";

/// Split an interpretation into its three sections, tolerating missing
/// parts.
fn parse_interpretation(interpretation: &str) -> (String, String, String) {
  let parts = split_sections(interpretation);
  let get = |i: usize| parts.get(i).map(|s| (*s).to_owned()).unwrap_or_default();
  (get(0), get(1), get(2))
}

/// One verse with its interpretation woven in. A missing paraphrase falls
/// back to the verse's stored meaning, so the message is never bare
/// Sanskrit.
pub fn format_verse(verse: &Verse, interpretation: &str) -> String {
  let (shabdarth, bhavarth, guidance) = parse_interpretation(interpretation);

  let mut parts = vec![
    format!("📿 गीता {}", verse.id),
    String::new(),
    verse.sanskrit.clone(),
  ];

  if !shabdarth.is_empty() {
    parts.push(String::new());
    parts.push(format!("📖 {shabdarth}"));
  }

  parts.push(String::new());
  if bhavarth.is_empty() {
    parts.push(verse.meaning.clone());
  } else {
    parts.push(bhavarth);
  }

  if !guidance.is_empty() {
    parts.push(String::new());
    parts.push(format!("💭 {guidance}"));
  }

  parts.push(String::new());
  parts.push(SIGNATURE.to_owned());
  parts.join("\n")
}

/// Hint appended when more related verses are available.
pub fn more_hint() -> &'static str {
  "👉 'और' भेजें अगला श्लोक देखने के लिए"
}

pub fn welcome() -> String {
  "🙏 नमस्ते! गीता सारथी में आपका स्वागत है।\n\n\
   मैं भगवद्गीता के ज्ञान से आपके जीवन के प्रश्नों का उत्तर देता हूं।\n\n\
   📝 आप पूछ सकते हैं:\n\
   • \"मुझे गुस्सा बहुत आता है\"\n\
   • \"जीवन में शांति कैसे मिले?\"\n\
   • \"कर्म क्या है?\"\n\n\
   📚 विषय देखने के लिए /topic भेजें\n\
   🌅 आज का श्लोक: /daily\n\n\
   अपना प्रश्न हिंदी या English में पूछें... 🙏"
    .to_owned()
}

pub fn help_text() -> String {
  "🙏 गीता सारथी - सहायता\n\n\
   📝 आप क्या कर सकते हैं:\n\n\
   • कोई भी प्रश्न पूछें\n  \
   \"मुझे गुस्सा आता है\"\n  \
   \"मन शांत कैसे करें\"\n\n\
   • /topic या विषय — विषयों की सूची\n\
   • /daily या प्रेरणा — आज का श्लोक\n\
   • /amrit — प्रसिद्ध श्लोक\n\
   • और — अगला संबंधित श्लोक\n\
   • रोकें — दैनिक श्लोक बंद करें\n\n\
   — गीता सारथी 🙏"
    .to_owned()
}

/// Topic menu text + one button per topic.
pub fn topic_keyboard() -> (String, Keyboard) {
  let text = "📚 अपना विषय चुनें:\n\nनीचे बटन दबाएं 👇".to_owned();
  let keyboard = TOPIC_MENU
    .iter()
    .map(|(id, label)| vec![Button::new(label, &format!("topic:{id}"))])
    .collect();
  (text, keyboard)
}

/// Iconic-verse menu, two buttons per row.
pub fn amrit_menu() -> (String, Keyboard) {
  let text =
    "✨ अमृत श्लोक — गीता के सबसे प्रसिद्ध श्लोक\n\nकोई एक चुनें 👇".to_owned();
  let keyboard = AMRIT_SHLOKAS
    .chunks(2)
    .map(|pair| {
      pair
        .iter()
        .map(|(id, incipit)| {
          Button::new(&format!("{incipit} ({id})"), &format!("amrit:{id}"))
        })
        .collect()
    })
    .collect();
  (text, keyboard)
}

/// An iconic verse with a back-to-menu button.
pub fn amrit_back_keyboard() -> Keyboard {
  vec![vec![Button::new("← अमृत श्लोक", "amrit:back")]]
}

// ─── Journey ─────────────────────────────────────────────────────────────────

pub fn journey_next_keyboard() -> Keyboard {
  vec![vec![Button::new("अगला श्लोक →", "journey:next")]]
}

/// One journey step: progress header plus the verse itself.
pub fn format_journey_verse(view: &JourneyView<'_>, interpretation: &str) -> String {
  let mut message = format!(
    "🌅 गीता यात्रा — श्लोक {}/{}\n📖 अध्याय {} · {}\n\n",
    view.step(),
    view.total,
    view.chapter.number,
    view.chapter.name,
  );
  message.push_str(&format_verse(view.verse, interpretation));

  if let Some(next) = view.next_chapter {
    message.push_str(&format!(
      "\n\n🎉 अध्याय {} '{}' पूर्ण हुआ!\n\
       आपने {}/{} श्लोक पढ़ लिए हैं।\n\
       कल से अध्याय {} '{}' शुरू होगा। 🙏",
      view.chapter.number,
      view.chapter.name,
      view.step(),
      view.total,
      next.number,
      next.name,
    ));
  }
  message
}

pub fn journey_complete() -> String {
  "🎊 बधाई हो! आपने सम्पूर्ण श्रीमद्भगवद्गीता की यात्रा पूरी कर ली है।\n\n\
   यह ज्ञान अब आपके जीवन का प्रकाश बने। 🙏\n\n\
   कोई भी प्रश्न पूछते रहें, मैं सदैव आपके साथ हूं।"
    .to_owned()
}

// ─── Guardrails ──────────────────────────────────────────────────────────────

pub fn rate_limit_msg() -> String {
  "🙏 कृपया थोड़ा रुकें। आप बहुत तेज़ी से संदेश भेज रहे हैं।\n\n\
   कुछ देर बाद फिर प्रयास करें।"
    .to_owned()
}

pub fn blocked_msg(reason: BlockReason) -> String {
  match reason {
    BlockReason::Profanity => {
      "🙏 आपके मन में कुछ कठिन भाव हैं। क्या मैं गीता का मार्गदर्शन दूं?\n\n\
       कृपया अपना प्रश्न अलग शब्दों में पूछें।"
    }
    BlockReason::Manipulation => {
      "🙏 मैं केवल गीता के ज्ञान से उत्तर देता हूं।\n\n\
       कृपया जीवन से जुड़ा प्रश्न पूछें।"
    }
    BlockReason::OffTopic => {
      "🙏 कृपया गीता से संबंधित प्रश्न पूछें।\n\n\
       जैसे: मन की शांति, कर्म, भय, क्रोध आदि।"
    }
  }
  .to_owned()
}

pub fn invalid_msg() -> String {
  "🙏 कृपया अपना प्रश्न लिखें।\n\nमदद के लिए /help भेजें।".to_owned()
}

// ─── Misc ────────────────────────────────────────────────────────────────────

pub fn unsubscribed_msg() -> String {
  "🙏 आपको अब रोज़ाना श्लोक नहीं मिलेगा।\n\n\
   दोबारा शुरू करने के लिए /start भेजें।"
    .to_owned()
}

pub fn no_results_msg() -> String {
  "क्षमा करें, इस विषय पर कोई उपयुक्त श्लोक नहीं मिला। \
   कृपया अलग शब्दों में पूछें।"
    .to_owned()
}

pub fn more_without_question_msg() -> String {
  "🙏 पहले कोई प्रश्न पूछें, फिर 'और' भेजें अगला श्लोक देखने के लिए।"
    .to_owned()
}

pub fn more_exhausted_msg() -> String {
  "🙏 इस विषय पर और श्लोक उपलब्ध नहीं हैं।\n\n\
   नया प्रश्न पूछें या /topic भेजें।"
    .to_owned()
}

pub fn voice_listening_msg() -> String {
  "🎙️ आपकी आवाज़ सुन रहा हूं...".to_owned()
}

pub fn voice_heard_msg(transcript: &str) -> String {
  format!("🎙️ आपने कहा: \"{transcript}\"")
}

pub fn voice_failed_msg() -> String {
  "🙏 आवाज़ प्रोसेस नहीं हो पाई। कृपया लिखकर भेजें।".to_owned()
}

pub fn voice_unclear_msg() -> String {
  "🙏 आवाज़ समझ नहीं आई। कृपया दोबारा बोलें या लिखकर भेजें।".to_owned()
}

pub fn verse_not_found_msg() -> String {
  "श्लोक नहीं मिला।".to_owned()
}

pub fn stats_message(date: &str, stats: &DailyStats) -> String {
  format!(
    "📊 गीता सारथी Stats — {date}\n\n\
     👥 DAU yesterday: {}\n\
     🆕 New users: {}\n\
     💬 Messages: {}\n\
     📨 Active subscribers: {}\n\
     ❌ API failures: {}",
    stats.active_users,
    stats.new_users,
    stats.messages,
    stats.active_subscribers,
    stats.api_failures,
  )
}

#[cfg(test)]
mod tests {
  use sarathi_core::verse::VerseId;

  use super::*;

  fn verse() -> Verse {
    Verse {
      id:         VerseId::new(2, 47),
      sanskrit:   "कर्मण्येवाधिकारस्ते मा फलेषु कदाचन".into(),
      meaning:    "कर्म करो, फल की चिंता मत करो".into(),
      commentary: None,
      tags:       vec![],
    }
  }

  #[test]
  fn three_section_interpretation_renders_all_parts() {
    let text = format_verse(
      &verse(),
      "कर्म = कार्य [SECTION] अपना काम करते रहें [SECTION] फल की चिंता छोड़ें",
    );
    assert!(text.contains("📖 कर्म = कार्य"));
    assert!(text.contains("अपना काम करते रहें"));
    assert!(text.contains("💭 फल की चिंता छोड़ें"));
    // Paraphrase replaces the stored meaning.
    assert!(!text.contains("कर्म करो, फल की चिंता मत करो"));
  }

  #[test]
  fn missing_interpretation_falls_back_to_meaning() {
    let text = format_verse(&verse(), "");
    assert!(text.contains("कर्म करो, फल की चिंता मत करो"));
    assert!(!text.contains("📖"));
    assert!(!text.contains("💭"));
  }

  #[test]
  fn single_section_output_keeps_meaning_as_paraphrase() {
    // A malformed (unsectioned) interpretation becomes the gloss; the
    // stored meaning still backs the paraphrase slot.
    let text = format_verse(&verse(), "सिर्फ एक हिस्सा");
    assert!(text.contains("📖 सिर्फ एक हिस्सा"));
    assert!(text.contains("कर्म करो, फल की चिंता मत करो"));
  }

  #[test]
  fn topic_keyboard_has_one_button_per_topic() {
    let (_, keyboard) = topic_keyboard();
    assert_eq!(keyboard.len(), TOPIC_MENU.len());
    assert_eq!(keyboard[0][0].callback_data, "topic:chinta");
  }

  #[test]
  fn amrit_menu_covers_all_ten_verses() {
    let (_, keyboard) = amrit_menu();
    let buttons: usize = keyboard.iter().map(Vec::len).sum();
    assert_eq!(buttons, AMRIT_SHLOKAS.len());
    assert!(
      keyboard
        .iter()
        .flatten()
        .all(|b| b.callback_data.starts_with("amrit:"))
    );
  }
}
