//! External-service gateways: LLM interpretation, embedding-based semantic
//! search, and the chat platform API.
//!
//! Everything here degrades rather than fails: a gateway that cannot reach
//! its upstream returns `None` or an empty result and logs, so the serving
//! path never depends on third-party availability.

#![allow(async_fn_in_trait)]

pub mod chat;
pub mod error;
pub mod interpret;
pub mod semantic;

pub use error::{Error, Result};
