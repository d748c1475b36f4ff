//! Time-limited single-value cache for the line index.
//!
//! The cache holds at most one snapshot together with the time it was built.
//! Callers pass the current time in, so expiry is a pure function of
//! `(built_at, now, ttl)`.

use std::future::Future;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use wikisift_shared::{Result, WikiSiftError};

/// Upper bound for the TTL (about a century); keeps the delta representable.
const MAX_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug)]
struct Entry<T> {
    value: T,
    built_at: DateTime<Utc>,
    /// Last rebuild attempt, successful or not; expiry counts from here.
    checked_at: DateTime<Utc>,
}

/// A cache cell whose value is rebuilt lazily once it is older than the TTL.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: TimeDelta,
    entry: Option<Entry<T>>,
}

impl<T> TtlCache<T> {
    /// Create an empty cache with the given time-to-live in seconds.
    pub fn new(ttl_secs: u64) -> Self {
        let secs = i64::try_from(ttl_secs).unwrap_or(MAX_TTL_SECS).min(MAX_TTL_SECS);
        Self {
            ttl: TimeDelta::seconds(secs),
            entry: None,
        }
    }

    /// Whether a snapshot exists and has not expired at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| now.signed_duration_since(entry.checked_at) < self.ttl)
    }

    /// When the current snapshot was built, if any.
    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.entry.as_ref().map(|entry| entry.built_at)
    }

    /// Drop the snapshot so the next access rebuilds.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Return the cached value, rebuilding it first if it is missing or expired.
    ///
    /// The previous snapshot stays in place until `rebuild` succeeds. When a
    /// rebuild fails and an older snapshot exists, that snapshot is served for
    /// another full TTL window before the next attempt.
    pub async fn get_or_rebuild<F, Fut>(&mut self, now: DateTime<Utc>, rebuild: F) -> Result<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.is_fresh(now) {
            debug!(previous = ?self.built_at(), "cache expired, rebuilding");
            match rebuild().await {
                Ok(value) => {
                    self.entry = Some(Entry {
                        value,
                        built_at: now,
                        checked_at: now,
                    });
                }
                Err(e) => {
                    if let Some(entry) = self.entry.as_mut() {
                        warn!(error = %e, "rebuild failed, serving previous snapshot");
                        entry.checked_at = now;
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        match &self.entry {
            Some(entry) => Ok(&entry.value),
            None => Err(WikiSiftError::validation("cache holds no snapshot")),
        }
    }
}
