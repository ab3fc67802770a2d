//! Utterance deduplication
//!
//! Streaming chat output tends to repeat itself: a sentence is emitted, then
//! emitted again once formatting settles, sometimes as a superset. The
//! deduplicator decides whether a candidate line has effectively been said
//! already in the current conversation.

use crate::config::Config;
use crate::utils::fuzzy::{char_len, contains_either, normalize_text, similarity};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

/// A previously accepted utterance
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub text: String,
    pub normalized: String,
}

/// Bounded history of accepted utterances, oldest first.
///
/// Once `capacity` is exceeded the oldest entries are evicted in one go,
/// keeping only the most recent `retain`.
#[derive(Debug, Clone)]
pub struct UtteranceHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    retain: usize,
}

impl Default for UtteranceHistory {
    fn default() -> Self {
        Self::new(100, 50)
    }
}

impl UtteranceHistory {
    pub fn new(capacity: usize, retain: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            retain: retain.clamp(1, capacity),
        }
    }

    pub fn push(&mut self, text: &str) {
        self.entries.push_back(HistoryEntry {
            text: text.to_string(),
            normalized: normalize_text(text),
        });

        if self.entries.len() > self.capacity {
            let evict = self.entries.len() - self.retain;
            self.entries.drain(..evict);
            debug!("🧹 Evicted {} history entries", evict);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn contains_normalized(&self, text: &str) -> bool {
        let normalized = normalize_text(text);
        self.entries.iter().any(|e| e.normalized == normalized)
    }
}

/// Why a candidate was suppressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateReason {
    Exact,
    Normalized,
    Substring,
    Similar,
}

/// Decides whether a candidate utterance repeats something in history
#[derive(Debug, Clone)]
pub struct UtteranceDeduplicator {
    /// Minimum normalized length for substring/similarity matching
    min_chars: usize,
    similarity_threshold: Option<f64>,
}

impl Default for UtteranceDeduplicator {
    fn default() -> Self {
        Self::new(10, None)
    }
}

impl UtteranceDeduplicator {
    pub fn new(min_chars: usize, similarity_threshold: Option<f64>) -> Self {
        Self {
            min_chars,
            similarity_threshold,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.near_duplicate_min_chars, config.similarity_threshold)
    }

    /// Returns the first matching reason, checked from strictest to loosest
    pub fn check(&self, candidate: &str, history: &UtteranceHistory) -> Option<DuplicateReason> {
        if history.iter().any(|e| e.text == candidate) {
            return Some(DuplicateReason::Exact);
        }

        let normalized = normalize_text(candidate);
        if history.iter().any(|e| e.normalized == normalized) {
            return Some(DuplicateReason::Normalized);
        }

        let long_entries = history
            .iter()
            .filter(|e| char_len(&e.normalized) > self.min_chars);

        for entry in long_entries {
            if contains_either(&normalized, &entry.normalized, self.min_chars) {
                return Some(DuplicateReason::Substring);
            }

            if let Some(threshold) = self.similarity_threshold {
                if char_len(&normalized) >= self.min_chars
                    && similarity(&normalized, &entry.normalized) >= threshold
                {
                    return Some(DuplicateReason::Similar);
                }
            }
        }

        None
    }

    pub fn should_suppress(&self, candidate: &str, history: &UtteranceHistory) -> bool {
        self.check(candidate, history).is_some()
    }
}
