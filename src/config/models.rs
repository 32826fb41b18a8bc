use super::defaults;
use readalong_core::SyncTuning;
use serde::Deserialize;
use std::time::Duration;

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_seek_epsilon_secs")]
    pub seek_epsilon_secs: f64,
    #[serde(default = "crate::config::defaults::default_highlight_epsilon_secs")]
    pub highlight_epsilon_secs: f64,
    #[serde(default = "crate::config::defaults::default_sync_allowed")]
    pub sync_allowed: bool,
    #[serde(default = "crate::config::defaults::default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_playback_rate")]
    pub playback_rate: f32,
    #[serde(default = "crate::config::defaults::default_tail_secs")]
    pub tail_secs: f64,
    #[serde(default = "crate::config::defaults::default_realtime")]
    pub realtime: bool,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            seek_epsilon_secs: defaults::default_seek_epsilon_secs(),
            highlight_epsilon_secs: defaults::default_highlight_epsilon_secs(),
            sync_allowed: defaults::default_sync_allowed(),
            frame_interval_ms: defaults::default_frame_interval_ms(),
            playback_rate: defaults::default_playback_rate(),
            tail_secs: defaults::default_tail_secs(),
            realtime: defaults::default_realtime(),
            log_level: defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    /// Keeps runtime values in bounds regardless of config source.
    pub fn clamped(mut self) -> Self {
        self.playback_rate = if self.playback_rate.is_finite() {
            self.playback_rate
                .clamp(defaults::MIN_PLAYBACK_RATE, defaults::MAX_PLAYBACK_RATE)
        } else {
            defaults::default_playback_rate()
        };
        self.frame_interval_ms = self.frame_interval_ms.clamp(
            defaults::MIN_FRAME_INTERVAL_MS,
            defaults::MAX_FRAME_INTERVAL_MS,
        );
        if !self.tail_secs.is_finite() || self.tail_secs < 0.0 {
            self.tail_secs = defaults::default_tail_secs();
        }
        self
    }

    pub fn tuning(&self) -> SyncTuning {
        SyncTuning {
            seek_epsilon_secs: self.seek_epsilon_secs,
            highlight_epsilon_secs: self.highlight_epsilon_secs,
        }
        .sanitized()
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
