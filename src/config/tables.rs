use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, serde::Serialize, Default)]
pub(super) struct ConfigTables {
    #[serde(default)]
    sync: SyncConfig,
    #[serde(default)]
    replay: ReplayConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            seek_epsilon_secs: tables.sync.seek_epsilon_secs,
            highlight_epsilon_secs: tables.sync.highlight_epsilon_secs,
            sync_allowed: tables.sync.sync_allowed,
            frame_interval_ms: tables.replay.frame_interval_ms,
            playback_rate: tables.replay.playback_rate,
            tail_secs: tables.replay.tail_secs,
            realtime: tables.replay.realtime,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            sync: SyncConfig {
                seek_epsilon_secs: config.seek_epsilon_secs,
                highlight_epsilon_secs: config.highlight_epsilon_secs,
                sync_allowed: config.sync_allowed,
            },
            replay: ReplayConfig {
                frame_interval_ms: config.frame_interval_ms,
                playback_rate: config.playback_rate,
                tail_secs: config.tail_secs,
                realtime: config.realtime,
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct SyncConfig {
    #[serde(default = "defaults::default_seek_epsilon_secs")]
    seek_epsilon_secs: f64,
    #[serde(default = "defaults::default_highlight_epsilon_secs")]
    highlight_epsilon_secs: f64,
    #[serde(default = "defaults::default_sync_allowed")]
    sync_allowed: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            seek_epsilon_secs: defaults::default_seek_epsilon_secs(),
            highlight_epsilon_secs: defaults::default_highlight_epsilon_secs(),
            sync_allowed: defaults::default_sync_allowed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ReplayConfig {
    #[serde(default = "defaults::default_frame_interval_ms")]
    frame_interval_ms: u64,
    #[serde(default = "defaults::default_playback_rate")]
    playback_rate: f32,
    #[serde(default = "defaults::default_tail_secs")]
    tail_secs: f64,
    #[serde(default = "defaults::default_realtime")]
    realtime: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            frame_interval_ms: defaults::default_frame_interval_ms(),
            playback_rate: defaults::default_playback_rate(),
            tail_secs: defaults::default_tail_secs(),
            realtime: defaults::default_realtime(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
