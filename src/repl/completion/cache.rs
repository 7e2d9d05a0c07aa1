//! Short-lived cache for flag-value suggestions
//!
//! Value-completion callbacks may query an external system, so their answer
//! is kept for a short interval while the user types the value. The slot is
//! keyed by the flag: switching to another flag is always a miss.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::tree::FlagKey;

use super::engine::Suggestion;

/// Interval used when neither the configuration nor the command overrides it
pub const DEFAULT_CACHE_INTERVAL: Duration = Duration::from_millis(500);

/// Reserved duration flag that overrides the interval for a command
pub const CACHE_INTERVAL_FLAG: &str = "cache-interval";

/// Last computed value suggestions
struct CacheEntry {
    /// Flag the suggestions belong to
    flag: FlagKey,
    /// Unfiltered candidates
    suggestions: Vec<Suggestion>,
    /// When the candidates were computed
    computed_at: Instant,
}

/// Single-slot suggestion cache
pub struct SuggestionCache {
    /// Cached entry, if any
    entry: Option<CacheEntry>,
    /// Time-to-live for the entry
    interval: Duration,
}

impl SuggestionCache {
    /// Create an empty cache
    ///
    /// # Arguments
    /// * `interval` - How long a computed list is reused
    pub fn new(interval: Duration) -> Self {
        Self {
            entry: None,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Check if the cached entry can answer a request for `flag` at `now`
    pub fn is_valid(&self, flag: &FlagKey, now: Instant, interval: Duration) -> bool {
        self.entry.as_ref().is_some_and(|entry| {
            entry.flag == *flag && now.saturating_duration_since(entry.computed_at) < interval
        })
    }

    /// Return the cached list for `flag`, or compute and store a new one
    ///
    /// # Arguments
    /// * `flag` - Flag whose values are requested
    /// * `now` - Time of the request
    /// * `interval` - Effective time-to-live for this request
    /// * `compute` - Produces the candidates on a miss
    pub fn get_or_compute<F>(
        &mut self,
        flag: &FlagKey,
        now: Instant,
        interval: Duration,
        compute: F,
    ) -> Vec<Suggestion>
    where
        F: FnOnce() -> Vec<Suggestion>,
    {
        if self.is_valid(flag, now, interval)
            && let Some(entry) = &self.entry
        {
            trace!("Value cache hit for --{}", flag.name);
            return entry.suggestions.clone();
        }

        trace!("Value cache miss for --{}", flag.name);
        let suggestions = compute();
        self.update(flag.clone(), suggestions.clone(), now);
        suggestions
    }

    /// Update the cache
    pub fn update(&mut self, flag: FlagKey, suggestions: Vec<Suggestion>, now: Instant) {
        self.entry = Some(CacheEntry {
            flag,
            suggestions,
            computed_at: now,
        });
    }
}

impl Default for SuggestionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_INTERVAL)
    }
}
