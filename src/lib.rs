// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod auth;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod notify;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::auth::{AuthError, Credential, TokenManager};
pub use crate::config::NotifierConfig;
pub use crate::feed::{build_digest, Digest, Feed, FetchError, PollError, UserEventRecord};
pub use crate::notify::{DispatchError, Notifier, SlackNotifier};
pub use crate::scheduler::{spawn_feed_loop, Scheduler};
