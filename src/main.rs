//! Keycloak user-lifecycle notifier — binary entrypoint.
//! Loads configuration, wires the Slack notifier, and runs the two poll
//! loops until the process is killed.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use keycloak_notifier::config::NotifierConfig;
use keycloak_notifier::notify::SlackNotifier;
use keycloak_notifier::scheduler::Scheduler;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("keycloak_notifier=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    // Missing configuration aborts here, before any loop starts.
    let config = NotifierConfig::from_env()?;

    if let Some(addr) = config.metrics_addr {
        keycloak_notifier::metrics::install_exporter(addr)?;
        tracing::info!(%addr, "prometheus exporter listening");
    }

    tracing::info!(
        register_interval_secs = config.register_interval.as_secs(),
        pending_interval_secs = config.pending_interval.as_secs(),
        realm = %config.keycloak_realm,
        channel = %config.slack_channel,
        "starting keycloak notifier"
    );

    let notifier = Arc::new(SlackNotifier::new(config.slack_api_token.clone()));
    Scheduler::new(config, notifier).run().await
}
