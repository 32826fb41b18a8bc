//! Playback position to active token.

use crate::time_index::TimeIndex;

/// Token whose mark is the latest one at or before `playback_secs`.
///
/// Binary search over the by-time view. Returns `None` before the first mark
/// and for an empty index.
pub fn current_token(index: &TimeIndex, playback_secs: f64) -> Option<usize> {
    let entries = index.by_time();
    let passed = entries.partition_point(|entry| entry.seconds <= playback_secs);
    passed.checked_sub(1).map(|idx| entries[idx].token_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_index() -> TimeIndex {
        let mark_to_token: HashMap<String, usize> = [("m0", 0), ("m3", 3), ("m7", 7)]
            .into_iter()
            .map(|(mark, token)| (mark.to_string(), token))
            .collect();
        TimeIndex::build(vec![("m7", 2.5), ("m0", 0.0), ("m3", 1.0)], &mark_to_token)
    }

    #[test]
    fn finds_rightmost_mark_at_or_before_position() {
        let index = sample_index();
        assert_eq!(current_token(&index, 0.0), Some(0));
        assert_eq!(current_token(&index, 0.99), Some(0));
        assert_eq!(current_token(&index, 1.0), Some(3));
        assert_eq!(current_token(&index, 2.49), Some(3));
        assert_eq!(current_token(&index, 2.5), Some(7));
        assert_eq!(current_token(&index, 90.0), Some(7));
    }

    #[test]
    fn position_before_first_mark_has_no_token() {
        let index = sample_index();
        assert_eq!(current_token(&index, -1.0), None);
        assert_eq!(current_token(&index, f64::NAN), None);
    }

    #[test]
    fn empty_index_has_no_token() {
        let index = TimeIndex::default();
        assert_eq!(current_token(&index, 0.0), None);
        assert_eq!(current_token(&index, 12.0), None);
    }

    #[test]
    fn shared_timestamp_reports_higher_token() {
        let mark_to_token: HashMap<String, usize> = [("a", 4), ("b", 5)]
            .into_iter()
            .map(|(mark, token)| (mark.to_string(), token))
            .collect();
        let index = TimeIndex::build(vec![("b", 1.0), ("a", 1.0)], &mark_to_token);
        assert_eq!(current_token(&index, 1.0), Some(5));
    }
}
