//! Chat platform API: the `ChatApi` trait plus the Telegram Bot API client.
//!
//! The webhook handlers and the daily push depend on the trait, not the
//! concrete client, so transports can be driven by a mock in tests.

use std::future::Future;

use serde::Serialize;
use serde_json::json;

use crate::{Error, Result};

/// One inline keyboard button.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Button {
  pub text:          String,
  pub callback_data: String,
}

impl Button {
  pub fn new(text: &str, callback_data: &str) -> Self {
    Self {
      text:          text.to_owned(),
      callback_data: callback_data.to_owned(),
    }
  }
}

/// Rows of inline buttons attached under a message.
pub type Keyboard = Vec<Vec<Button>>;

/// Outbound chat platform operations.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait ChatApi: Send + Sync {
  /// Send a text message, optionally with an inline keyboard. An `Err`
  /// means the platform did not confirm delivery.
  fn send_message<'a>(
    &'a self,
    chat_id: &'a str,
    text: &'a str,
    keyboard: Option<&'a Keyboard>,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Acknowledge a callback query so the client stops its spinner.
  fn answer_callback<'a>(
    &'a self,
    callback_id: &'a str,
    text: Option<&'a str>,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Show the "typing…" indicator.
  fn send_typing<'a>(
    &'a self,
    chat_id: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Resolve a platform file id to a downloadable file path.
  fn get_file<'a>(
    &'a self,
    file_id: &'a str,
  ) -> impl Future<Output = Result<String>> + Send + 'a;

  /// Download file content by the path from [`ChatApi::get_file`].
  fn download_file<'a>(
    &'a self,
    file_path: &'a str,
  ) -> impl Future<Output = Result<Vec<u8>>> + Send + 'a;
}

// ─── Telegram ────────────────────────────────────────────────────────────────

/// Telegram Bot API client.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct TelegramClient {
  client: reqwest::Client,
  base:   String,
  token:  String,
}

impl TelegramClient {
  pub fn new(token: &str) -> Result<Self> {
    Self::with_base(token, "https://api.telegram.org")
  }

  pub fn with_base(token: &str, base: &str) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(std::time::Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      base: base.trim_end_matches('/').to_owned(),
      token: token.to_owned(),
    })
  }

  fn method_url(&self, method: &str) -> String {
    format!("{}/bot{}/{}", self.base, self.token, method)
  }

  async fn call(
    &self,
    method: &str,
    payload: &serde_json::Value,
  ) -> Result<serde_json::Value> {
    let resp = self
      .client
      .post(self.method_url(method))
      .json(payload)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Upstream {
        status:  status.as_u16(),
        message: resp.text().await.unwrap_or_default(),
      });
    }

    let body: serde_json::Value = resp.json().await?;
    if body.get("ok").and_then(serde_json::Value::as_bool) != Some(true) {
      return Err(Error::Upstream {
        status:  status.as_u16(),
        message: body.to_string(),
      });
    }
    Ok(body)
  }
}

impl ChatApi for TelegramClient {
  async fn send_message(
    &self,
    chat_id: &str,
    text: &str,
    keyboard: Option<&Keyboard>,
  ) -> Result<()> {
    let mut payload = json!({ "chat_id": chat_id, "text": text });
    if let Some(keyboard) = keyboard {
      payload["reply_markup"] = json!({ "inline_keyboard": keyboard });
    }
    self.call("sendMessage", &payload).await?;
    Ok(())
  }

  async fn answer_callback(
    &self,
    callback_id: &str,
    text: Option<&str>,
  ) -> Result<()> {
    let mut payload = json!({ "callback_query_id": callback_id });
    if let Some(text) = text {
      payload["text"] = json!(text);
    }
    self.call("answerCallbackQuery", &payload).await?;
    Ok(())
  }

  async fn send_typing(&self, chat_id: &str) -> Result<()> {
    self
      .call(
        "sendChatAction",
        &json!({ "chat_id": chat_id, "action": "typing" }),
      )
      .await?;
    Ok(())
  }

  async fn get_file(&self, file_id: &str) -> Result<String> {
    let body = self
      .call("getFile", &json!({ "file_id": file_id }))
      .await?;
    body
      .pointer("/result/file_path")
      .and_then(serde_json::Value::as_str)
      .map(str::to_owned)
      .ok_or(Error::MalformedResponse("result.file_path"))
  }

  async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
    let url = format!("{}/file/bot{}/{}", self.base, self.token, file_path);
    let resp = self.client.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Upstream {
        status:  status.as_u16(),
        message: String::new(),
      });
    }
    Ok(resp.bytes().await?.to_vec())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keyboard_serialises_to_inline_markup() {
    let keyboard: Keyboard =
      vec![vec![Button::new("अगला श्लोक →", "journey:next")]];
    let markup = json!({ "inline_keyboard": keyboard });
    assert_eq!(
      markup["inline_keyboard"][0][0]["callback_data"],
      "journey:next"
    );
  }

  #[test]
  fn urls_embed_token_and_method() {
    let client = TelegramClient::with_base("TOKEN", "https://example.com/").unwrap();
    assert_eq!(
      client.method_url("sendMessage"),
      "https://example.com/botTOKEN/sendMessage"
    );
  }
}
