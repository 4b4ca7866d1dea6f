// src/notify/slack.rs
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use super::{DispatchError, Notifier};

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

pub struct SlackNotifier {
    api_token: String,
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(api_token: String) -> Self {
        Self {
            api_token,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Point at a different Web API root (tests, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

/// Slack answers 200 even for failures; the verdict is the `ok` field.
#[derive(Deserialize)]
struct SlackReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), DispatchError> {
        let url = format!("{}/chat.postMessage", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({ "channel": channel, "text": text });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status));
        }

        let reply: SlackReply = response.json().await?;
        if !reply.ok {
            return Err(DispatchError::Api(
                reply.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        Ok(())
    }
}
