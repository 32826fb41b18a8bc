//! Two sorted views over the sparse `token_id -> seconds` timing function.

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeEntry {
    pub token_id: usize,
    pub seconds: f64,
}

/// Rebuilt from scratch for every synthesis result.
///
/// `by_token` serves click seeks, `by_time` serves per-frame playback lookups.
/// Both hold exactly the same pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeIndex {
    by_token: BTreeMap<usize, f64>,
    by_time: Vec<TimeEntry>,
}

impl TimeIndex {
    /// Resolves every mark through `mark_to_token` and keeps the last time seen
    /// per token. Unknown marks and non-finite times are skipped.
    pub fn build<'a, I>(timing_marks: I, mark_to_token: &HashMap<String, usize>) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut by_token = BTreeMap::new();
        let mut dropped = 0usize;
        for (mark_name, seconds) in timing_marks {
            let Some(&token_id) = mark_to_token.get(mark_name) else {
                dropped += 1;
                continue;
            };
            if !seconds.is_finite() {
                dropped += 1;
                continue;
            }
            by_token.insert(token_id, seconds);
        }

        let mut by_time: Vec<TimeEntry> = by_token
            .iter()
            .map(|(&token_id, &seconds)| TimeEntry { token_id, seconds })
            .collect();
        // Equal times keep the lower token first.
        by_time.sort_by(|a, b| {
            a.seconds
                .total_cmp(&b.seconds)
                .then_with(|| a.token_id.cmp(&b.token_id))
        });

        debug!(
            marked_tokens = by_token.len(),
            dropped_marks = dropped,
            "Built time index"
        );
        TimeIndex { by_token, by_time }
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn seconds_for(&self, token_id: usize) -> Option<f64> {
        self.by_token.get(&token_id).copied()
    }

    /// Nearest marked token strictly before `token_id`.
    pub(crate) fn marked_before(&self, token_id: usize) -> Option<(usize, f64)> {
        self.by_token
            .range(..token_id)
            .next_back()
            .map(|(&id, &seconds)| (id, seconds))
    }

    /// Nearest marked token strictly after `token_id`, up to `limit` inclusive.
    pub(crate) fn marked_after(&self, token_id: usize, limit: usize) -> Option<(usize, f64)> {
        let start = token_id.checked_add(1)?;
        if start > limit {
            return None;
        }
        self.by_token
            .range(start..=limit)
            .next()
            .map(|(&id, &seconds)| (id, seconds))
    }

    pub fn by_token(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.by_token.iter().map(|(&id, &seconds)| (id, seconds))
    }

    pub fn by_time(&self) -> &[TimeEntry] {
        &self.by_time
    }
}
