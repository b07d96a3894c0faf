//! Error type for the server crate.
//!
//! Webhook processing catches this at the boundary and acknowledges the
//! transport regardless; only the push endpoint surfaces HTTP errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("chat platform error: {0}")]
  Chat(#[from] sarathi_gateway::Error),
}

impl Error {
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
