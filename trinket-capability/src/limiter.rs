//! Deduplicated and rate-limited warnings.
//!
//! Replaces process-wide "already logged" sets with an injected service.
//! Callers build a key, ask the limiter, and log only when it says so.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use trinket_types::OwnerId;

/// Default minimum interval between two rate-limited warnings for one key.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct WarnLimiter {
    interval: Duration,
    once: Mutex<HashSet<String>>,
    limited: Mutex<HashMap<String, Instant>>,
}

impl WarnLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            once: Mutex::new(HashSet::new()),
            limited: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true the first time `key` is seen.
    pub fn warn_once(&self, key: &str) -> bool {
        let mut once = self.once.lock();
        if once.contains(key) {
            return false;
        }
        once.insert(key.to_string());
        true
    }

    /// Returns true if `key` has not been reported within the interval.
    pub fn warn_limited(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut limited = self.limited.lock();
        match limited.get_mut(key) {
            Some(last) if now.duration_since(*last) < self.interval => false,
            Some(last) => {
                *last = now;
                true
            }
            None => {
                limited.insert(key.to_string(), now);
                true
            }
        }
    }

    /// Forgets every key scoped to `owner` (keys starting with `"<owner>:"`).
    pub fn clear_owner(&self, owner: OwnerId) {
        let prefix = format!("{owner}:");
        self.once.lock().retain(|key| !key.starts_with(&prefix));
        self.limited.lock().retain(|key, _| !key.starts_with(&prefix));
    }

    /// Number of distinct keys currently remembered.
    pub fn len(&self) -> usize {
        self.once.lock().len() + self.limited.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for WarnLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}
