// src/config.rs
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

/// Runtime configuration, read once at startup. Every Keycloak/Slack
/// coordinate is required; a missing variable aborts startup with its name.
#[derive(Clone, Debug)]
pub struct NotifierConfig {
    pub register_interval: Duration,
    pub pending_interval: Duration,
    pub keycloak_url: String,
    pub keycloak_realm: String,
    pub keycloak_role: String,
    pub keycloak_client_id: String,
    pub keycloak_client_secret: String,
    pub slack_channel: String,
    pub slack_api_token: String,
    /// Optional Prometheus exporter listen address.
    pub metrics_addr: Option<SocketAddr>,
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self> {
        let keycloak_url = require("KEYCLOAK_URL")?;
        let metrics_addr = match env::var("METRICS_ADDR") {
            Ok(raw) => Some(
                raw.parse()
                    .context("METRICS_ADDR must be a socket address (host:port)")?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            register_interval: interval_from_env("REGISTER_INTERVAL")?,
            pending_interval: interval_from_env("PENDING_INTERVAL")?,
            keycloak_url: keycloak_url.trim_end_matches('/').to_string(),
            keycloak_realm: require("KEYCLOAK_REALM")?,
            keycloak_role: require("KEYCLOAK_ROLE")?,
            keycloak_client_id: require("KEYCLOAK_CLIENT_ID")?,
            keycloak_client_secret: require("KEYCLOAK_CLIENT_SECRET")?,
            slack_channel: require("SLACK_CHANNEL")?,
            slack_api_token: require("SLACK_API_TOKEN")?,
            metrics_addr,
        })
    }

    /// OpenID Connect token endpoint for the client-credentials grant.
    pub fn token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.keycloak_url, self.keycloak_realm
        )
    }

    /// Admin events endpoint (feed A queries it with `type=REGISTER`).
    pub fn events_url(&self) -> String {
        format!(
            "{}/admin/realms/{}/events",
            self.keycloak_url, self.keycloak_realm
        )
    }

    /// Admin role-membership endpoint (feed B, users holding the role).
    pub fn role_users_url(&self) -> String {
        format!(
            "{}/admin/realms/{}/roles/{}/users",
            self.keycloak_url, self.keycloak_realm, self.keycloak_role
        )
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).map_err(|_| anyhow!("missing required env var {name}"))
}

fn interval_from_env(name: &str) -> Result<Duration> {
    let raw = require(name)?;
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{name} must be an integer number of seconds"))?;
    if secs == 0 {
        bail!("{name} must be positive");
    }
    Ok(Duration::from_secs(secs))
}
