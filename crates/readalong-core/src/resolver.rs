//! Seek target lookup for a clicked token.

use crate::time_index::TimeIndex;

/// Best-known audio time for `token_id`.
///
/// A direct mark wins. Otherwise the nearest marked neighbor is used, searching
/// outward one step at a time and checking the left side before the right, so
/// the earlier token wins when both sides are equally far. Right-hand
/// candidates are limited to `max_token_id`.
pub fn resolve_seek_time(index: &TimeIndex, token_id: usize, max_token_id: usize) -> Option<f64> {
    if index.is_empty() {
        return None;
    }
    if let Some(seconds) = index.seconds_for(token_id) {
        return Some(seconds);
    }

    let left = index.marked_before(token_id);
    let right = index.marked_after(token_id, max_token_id);
    match (left, right) {
        (Some((left_id, left_secs)), Some((right_id, right_secs))) => {
            if token_id - left_id <= right_id - token_id {
                Some(left_secs)
            } else {
                Some(right_secs)
            }
        }
        (Some((_, seconds)), None) | (None, Some((_, seconds))) => Some(seconds),
        (None, None) => None,
    }
}
