// src/notify/mod.rs
pub mod slack;

pub use slack::SlackNotifier;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat endpoint returned status {0}")]
    Status(StatusCode),
    #[error("chat endpoint rejected message: {0}")]
    Api(String),
}

/// Outbound message sink. One call per digest, no batching or retry; the
/// scheduler logs failures and moves on.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), DispatchError>;
}
