//! Error type for `sarathi-gateway`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("upstream returned {status}: {message}")]
  Upstream { status: u16, message: String },

  #[error("no api key configured")]
  NoApiKey,

  #[error("upstream response missing expected field: {0}")]
  MalformedResponse(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
