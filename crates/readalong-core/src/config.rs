//! Timing constants shared by the seek and highlight paths.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SEEK_EPSILON_SECS: f64 = 0.02;
pub const DEFAULT_HIGHLIGHT_EPSILON_SECS: f64 = 0.03;

/// Latency compensation applied around the time index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SyncTuning {
    /// Added to a resolved mark before seeking so playback lands past the boundary.
    #[serde(default = "default_seek_epsilon_secs")]
    pub seek_epsilon_secs: f64,
    /// Added to the sampled playback position before looking up the active token.
    #[serde(default = "default_highlight_epsilon_secs")]
    pub highlight_epsilon_secs: f64,
}

impl Default for SyncTuning {
    fn default() -> Self {
        SyncTuning {
            seek_epsilon_secs: default_seek_epsilon_secs(),
            highlight_epsilon_secs: default_highlight_epsilon_secs(),
        }
    }
}

impl SyncTuning {
    /// Negative or non-finite offsets collapse to zero.
    pub fn sanitized(self) -> Self {
        SyncTuning {
            seek_epsilon_secs: non_negative(self.seek_epsilon_secs),
            highlight_epsilon_secs: non_negative(self.highlight_epsilon_secs),
        }
    }

    pub fn seek_target(&self, mark_secs: f64) -> f64 {
        (mark_secs + self.seek_epsilon_secs).max(0.0)
    }

    pub fn highlight_probe(&self, current_time: f64) -> f64 {
        current_time + self.highlight_epsilon_secs
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn default_seek_epsilon_secs() -> f64 {
    DEFAULT_SEEK_EPSILON_SECS
}

fn default_highlight_epsilon_secs() -> f64 {
    DEFAULT_HIGHLIGHT_EPSILON_SECS
}

#[cfg(test)]
mod tests {
    use super::SyncTuning;

    #[test]
    fn seek_target_never_goes_negative() {
        let tuning = SyncTuning {
            seek_epsilon_secs: 0.02,
            highlight_epsilon_secs: 0.03,
        };
        assert!((tuning.seek_target(1.0) - 1.02).abs() < 1e-12);
        assert_eq!(tuning.seek_target(-5.0), 0.0);
    }

    #[test]
    fn sanitized_clears_bad_offsets() {
        let tuning = SyncTuning {
            seek_epsilon_secs: -1.0,
            highlight_epsilon_secs: f64::NAN,
        }
        .sanitized();
        assert_eq!(tuning.seek_epsilon_secs, 0.0);
        assert_eq!(tuning.highlight_epsilon_secs, 0.0);
    }
}
