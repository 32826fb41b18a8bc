use readalong_core::config::{DEFAULT_HIGHLIGHT_EPSILON_SECS, DEFAULT_SEEK_EPSILON_SECS};

pub(crate) const MIN_PLAYBACK_RATE: f32 = 0.5;
pub(crate) const MAX_PLAYBACK_RATE: f32 = 2.0;
pub(crate) const MIN_FRAME_INTERVAL_MS: u64 = 1;
pub(crate) const MAX_FRAME_INTERVAL_MS: u64 = 1_000;

pub(crate) fn default_seek_epsilon_secs() -> f64 {
    DEFAULT_SEEK_EPSILON_SECS
}

pub(crate) fn default_highlight_epsilon_secs() -> f64 {
    DEFAULT_HIGHLIGHT_EPSILON_SECS
}

pub(crate) fn default_sync_allowed() -> bool {
    true
}

pub(crate) fn default_frame_interval_ms() -> u64 {
    16
}

pub(crate) fn default_playback_rate() -> f32 {
    1.0
}

pub(crate) fn default_tail_secs() -> f64 {
    0.5
}

pub(crate) fn default_realtime() -> bool {
    false
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}
