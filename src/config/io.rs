use super::models::AppConfig;
use super::tables::ConfigTables;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the provided path, falling back to defaults on any error.
pub fn load_config(path: &Path) -> AppConfig {
    match fs::read_to_string(path) {
        Ok(contents) => match parse_config(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), "Invalid config file, using defaults: {err:#}");
                AppConfig::default()
            }
        },
        Err(err) => {
            debug!(path = %path.display(), "No config file found, using defaults: {err}");
            AppConfig::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let tables: ConfigTables = toml::from_str(contents).context("Parsing config TOML")?;
    Ok(AppConfig::from(tables).clamped())
}

pub fn serialize_config(config: &AppConfig) -> Result<String> {
    toml::to_string(&ConfigTables::from(config)).context("Serializing config TOML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").expect("parse empty config");
        assert_eq!(config, AppConfig::default());
        assert!((config.seek_epsilon_secs - 0.02).abs() < f64::EPSILON);
        assert!((config.highlight_epsilon_secs - 0.03).abs() < f64::EPSILON);
    }

    #[test]
    fn tables_override_defaults() {
        let config = parse_config(
            r#"
[sync]
seek_epsilon_secs = 0.05
sync_allowed = false

[replay]
frame_interval_ms = 33

[logging]
log_level = "warn"
"#,
        )
        .expect("parse config");
        assert!((config.seek_epsilon_secs - 0.05).abs() < f64::EPSILON);
        assert!((config.highlight_epsilon_secs - 0.03).abs() < f64::EPSILON);
        assert!(!config.sync_allowed);
        assert_eq!(config.frame_interval_ms, 33);
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn out_of_range_replay_values_are_clamped() {
        let config = parse_config(
            r#"
[replay]
playback_rate = 9.0
frame_interval_ms = 0
tail_secs = -3.0
"#,
        )
        .expect("parse config");
        assert!((config.playback_rate - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.frame_interval_ms, 1);
        assert!((config.tail_secs - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(parse_config("[sync\nseek_epsilon_secs = ").is_err());
    }

    #[test]
    fn serialized_config_parses_back() {
        let config = AppConfig {
            sync_allowed: false,
            log_level: LogLevel::Info,
            ..AppConfig::default()
        };
        let text = serialize_config(&config).expect("serialize config");
        assert_eq!(parse_config(&text).expect("parse config"), config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/readalong/config.toml"));
        assert_eq!(config, AppConfig::default());
    }
}
