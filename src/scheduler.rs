// src/scheduler.rs
//! Drives the two feed loops, forever. Each loop owns its interval, its
//! token manager, and its failures; nothing one loop does can delay or
//! stop the other.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use tokio::time;

use crate::auth::TokenManager;
use crate::config::NotifierConfig;
use crate::feed::Feed;
use crate::notify::Notifier;

pub struct Scheduler {
    config: NotifierConfig,
    notifier: Arc<dyn Notifier>,
}

impl Scheduler {
    pub fn new(config: NotifierConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    /// Runs indefinitely. Each feed gets its own token manager, so the two
    /// loops share no mutable state at all.
    pub async fn run(self) -> Result<()> {
        crate::metrics::ensure_metrics_described();

        let register = spawn_feed_loop(
            Feed::registrations(&self.config),
            TokenManager::from_config(&self.config),
            self.config.register_interval,
            self.notifier.clone(),
            self.config.slack_channel.clone(),
        );
        let pending = spawn_feed_loop(
            Feed::pending_approvals(&self.config),
            TokenManager::from_config(&self.config),
            self.config.pending_interval,
            self.notifier.clone(),
            self.config.slack_channel.clone(),
        );

        // Loops only ever end on panic; surface whichever goes first.
        tokio::select! {
            res = register => {
                if let Err(e) = res {
                    tracing::error!(error = ?e, "registrations loop ended");
                }
            }
            res = pending => {
                if let Err(e) = res {
                    tracing::error!(error = ?e, "pending-approvals loop ended");
                }
            }
        }
        Ok(())
    }
}

/// Spawns one fixed-interval poll loop: fetch, dispatch-if-present, sleep.
/// The first tick fires immediately. Every failure kind is logged, counted,
/// and collapsed into a skipped cycle.
pub fn spawn_feed_loop(
    feed: Feed,
    tokens: TokenManager,
    interval: Duration,
    notifier: Arc<dyn Notifier>,
    channel: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        tracing::info!(
            feed = feed.name(),
            interval_secs = interval.as_secs(),
            "feed loop started"
        );

        loop {
            ticker.tick().await;
            counter!("poll_runs_total", "feed" => feed.name()).increment(1);
            gauge!("poll_last_run_ts", "feed" => feed.name())
                .set(Utc::now().timestamp() as f64);

            match feed.fetch_digest(&tokens).await {
                Ok(Some(digest)) => {
                    let text = digest.render();
                    match notifier.post_message(&channel, &text).await {
                        Ok(()) => {
                            counter!("digests_sent_total", "feed" => feed.name()).increment(1);
                            tracing::info!(
                                feed = feed.name(),
                                lines = digest.lines.len(),
                                "digest sent"
                            );
                        }
                        Err(e) => {
                            // Best effort: the next cycle re-reports whatever
                            // upstream still returns.
                            counter!("dispatch_errors_total", "feed" => feed.name()).increment(1);
                            tracing::error!(feed = feed.name(), error = %e, "dispatch failed");
                        }
                    }
                }
                Ok(None) => {
                    tracing::debug!(feed = feed.name(), "nothing to report");
                }
                Err(e) => {
                    counter!("poll_errors_total", "feed" => feed.name(), "kind" => e.kind())
                        .increment(1);
                    tracing::warn!(feed = feed.name(), kind = e.kind(), error = %e, "poll failed");
                }
            }
        }
    })
}
