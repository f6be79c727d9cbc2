//! Requester identity, allow-listing, and per-requester throttling.
//!
//! [`AccessGuard`] sits in front of the analytics pipeline at the HTTP
//! boundary. It keeps a bounded map of the last time each requester asked
//! a question, protected by a [`tokio::sync::Mutex`]. The core pipeline
//! never sees it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Opaque identity of whoever asks a question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(String);

impl RequesterId {
    /// Identity used when the caller does not name itself.
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Creates a requester id from any string-like value. Surrounding
    /// whitespace is trimmed; an empty value becomes [`Self::ANONYMOUS`].
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            Self(Self::ANONYMOUS.to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decision returned by [`AccessGuard::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The question may proceed.
    Allowed,
    /// The requester is not on the allow-list.
    Forbidden,
    /// The requester asked again too soon.
    Throttled {
        /// Time left until the requester may ask again.
        retry_after: Duration,
    },
}

/// Allow-list plus a bounded "last question at" cache keyed by requester.
///
/// An empty allow-list admits everyone. When the cache is full, stale
/// entries (older than the interval) are purged first; if it is still
/// full, the least recently seen requester is evicted.
#[derive(Debug)]
pub struct AccessGuard {
    allow_list: HashSet<RequesterId>,
    min_interval: Duration,
    capacity: usize,
    last_seen: Mutex<HashMap<RequesterId, Instant>>,
}

impl AccessGuard {
    /// Creates a guard.
    ///
    /// A zero `min_interval` disables throttling. `capacity` is clamped to
    /// at least one entry.
    #[must_use]
    pub fn new(
        allow_list: impl IntoIterator<Item = RequesterId>,
        min_interval: Duration,
        capacity: usize,
    ) -> Self {
        Self {
            allow_list: allow_list.into_iter().collect(),
            min_interval,
            capacity: capacity.max(1),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// A guard that admits everyone without throttling.
    #[must_use]
    pub fn open() -> Self {
        Self::new(Vec::new(), Duration::ZERO, 1)
    }

    /// Returns `true` if the requester passes the allow-list.
    #[must_use]
    pub fn is_allowed(&self, requester: &RequesterId) -> bool {
        self.allow_list.is_empty() || self.allow_list.contains(requester)
    }

    /// Checks the allow-list and records the question if it is admitted.
    pub async fn admit(&self, requester: &RequesterId) -> Admission {
        if !self.is_allowed(requester) {
            return Admission::Forbidden;
        }
        if self.min_interval.is_zero() {
            return Admission::Allowed;
        }

        let now = Instant::now();
        let mut map = self.last_seen.lock().await;

        if let Some(last) = map.get(requester) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < self.min_interval {
                return Admission::Throttled {
                    retry_after: self.min_interval.saturating_sub(elapsed),
                };
            }
        }

        if !map.contains_key(requester) && map.len() >= self.capacity {
            let interval = self.min_interval;
            map.retain(|_, seen| now.saturating_duration_since(*seen) < interval);
            if map.len() >= self.capacity {
                let oldest = map
                    .iter()
                    .min_by_key(|(_, seen)| **seen)
                    .map(|(id, _)| id.clone());
                if let Some(oldest) = oldest {
                    map.remove(&oldest);
                }
            }
        }

        map.insert(requester.clone(), now);
        Admission::Allowed
    }
}
