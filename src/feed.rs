// src/feed.rs
//! Parameterized event feed: one implementation serves both the
//! registration-events and role-membership endpoints, differing only in
//! URL, query, record shape, and digest header.

use chrono::Utc;
use metrics::counter;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::auth::{AuthError, TokenManager};
use crate::config::NotifierConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },
    #[error("malformed payload from {url}: {source}")]
    Payload {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Classified outcome of one poll attempt. The scheduler logs the kind and
/// skips the cycle; no variant ever escalates past the loop body.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl PollError {
    /// Stable label for logs and the `poll_errors_total` counter.
    pub fn kind(&self) -> &'static str {
        match self {
            PollError::Auth(_) => "auth",
            PollError::Fetch(FetchError::Network { .. }) => "network",
            PollError::Fetch(FetchError::Status { .. }) => "status",
            PollError::Fetch(FetchError::Payload { .. }) => "payload",
        }
    }
}

/// Normalized per-user event, alive only for one digest-building pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserEventRecord {
    pub username: String,
    pub email: String,
    /// Millisecond epoch of the underlying event.
    pub occurred_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Digest {
    pub header: String,
    pub lines: Vec<String>,
}

impl Digest {
    /// Header followed by one line per record, newline-joined.
    pub fn render(&self) -> String {
        let mut out = self.header.clone();
        for line in &self.lines {
            out.push('\n');
            out.push_str(line);
        }
        out
    }
}

/// The two upstream JSON shapes, mapped to `UserEventRecord`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordShape {
    /// Admin event objects: ms timestamp under `time`, identity nested
    /// under `details`.
    RegistrationEvent,
    /// Flat user objects with `createdTimestamp`.
    RoleMember,
}

#[derive(Deserialize)]
struct RegistrationEvent {
    time: i64,
    details: EventDetails,
}

#[derive(Deserialize)]
struct EventDetails {
    username: String,
    email: String,
}

#[derive(Deserialize)]
struct RoleMember {
    username: String,
    email: String,
    #[serde(rename = "createdTimestamp")]
    created_timestamp: i64,
}

impl RecordShape {
    pub fn parse(self, body: &str) -> Result<Vec<UserEventRecord>, serde_json::Error> {
        match self {
            RecordShape::RegistrationEvent => {
                let raw: Vec<RegistrationEvent> = serde_json::from_str(body)?;
                Ok(raw
                    .into_iter()
                    .map(|ev| UserEventRecord {
                        username: ev.details.username,
                        email: ev.details.email,
                        occurred_at_ms: ev.time,
                    })
                    .collect())
            }
            RecordShape::RoleMember => {
                let raw: Vec<RoleMember> = serde_json::from_str(body)?;
                Ok(raw
                    .into_iter()
                    .map(|u| UserEventRecord {
                        username: u.username,
                        email: u.email,
                        occurred_at_ms: u.created_timestamp,
                    })
                    .collect())
            }
        }
    }
}

pub fn elapsed_hours(now_ms: i64, occurred_at_ms: i64) -> f64 {
    (now_ms - occurred_at_ms) as f64 / 3_600_000.0
}

/// Builds the digest for one cycle, in upstream order. Zero records means
/// nothing to report: an empty digest is never constructed.
pub fn build_digest(header: &str, now_ms: i64, records: &[UserEventRecord]) -> Option<Digest> {
    if records.is_empty() {
        return None;
    }
    let lines = records
        .iter()
        .map(|r| {
            format!(
                "- {} {} (since {:.2} hrs)",
                r.username,
                r.email,
                elapsed_hours(now_ms, r.occurred_at_ms)
            )
        })
        .collect();
    Some(Digest {
        header: header.to_string(),
        lines,
    })
}

pub struct Feed {
    name: &'static str,
    header: &'static str,
    url: String,
    query: Vec<(&'static str, &'static str)>,
    shape: RecordShape,
    http: Client,
}

impl Feed {
    /// Feed A: self-registration events from the admin events endpoint.
    pub fn registrations(config: &NotifierConfig) -> Self {
        Self {
            name: "registrations",
            header: "New users",
            url: config.events_url(),
            query: vec![("type", "REGISTER")],
            shape: RecordShape::RegistrationEvent,
            http: Client::new(),
        }
    }

    /// Feed B: members of the approval role.
    pub fn pending_approvals(config: &NotifierConfig) -> Self {
        Self {
            name: "pending-approvals",
            header: "Users pending approval",
            url: config.role_users_url(),
            query: Vec::new(),
            shape: RecordShape::RoleMember,
            http: Client::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// One poll: token, authenticated GET, parse, digest. `Ok(None)` means
    /// nothing to report; every failure comes back classified.
    pub async fn fetch_digest(
        &self,
        tokens: &TokenManager,
    ) -> Result<Option<Digest>, PollError> {
        let token = tokens.access_token().await?;

        let response = self
            .http
            .get(&self.url)
            .query(&self.query)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // Stale or revoked token; next cycle reacquires.
            tokens.invalidate();
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Network {
                url: self.url.clone(),
                source,
            })?;
        let records = self
            .shape
            .parse(&body)
            .map_err(|source| FetchError::Payload {
                url: self.url.clone(),
                source,
            })?;

        tracing::info!(feed = self.name, count = records.len(), "poll fetched");
        counter!("poll_events_total", "feed" => self.name).increment(records.len() as u64);

        Ok(build_digest(
            self.header,
            Utc::now().timestamp_millis(),
            &records,
        ))
    }
}
