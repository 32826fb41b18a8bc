//! Entry point for the read-along replay tool.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Load a synthesis response and an optional event script.
//! - Replay playback through the sync core and report the outcome.

mod cancellation;
mod config;
mod replay;

use crate::cancellation::CancellationToken;
use crate::config::{AppConfig, load_config, serialize_config};
use crate::replay::{Script, run_replay};
use anyhow::{Context, Result, anyhow};
use readalong_core::SynthesisResponse;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const CONFIG_PATH: &str = "conf/config.toml";
const USAGE: &str = "Usage: readalong <response.json> [script.txt] | readalong --print-config";

enum Command {
    Replay {
        response_path: PathBuf,
        script_path: Option<PathBuf>,
    },
    PrintConfig,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let command = parse_args()?;
    let config = load_config(Path::new(CONFIG_PATH));
    set_log_level(reload_handle, config.log_level.as_filter_str());

    match command {
        Command::PrintConfig => {
            print!("{}", serialize_config(&config)?);
            Ok(())
        }
        Command::Replay {
            response_path,
            script_path,
        } => replay(&response_path, script_path.as_deref(), &config),
    }
}

fn replay(response_path: &Path, script_path: Option<&Path>, config: &AppConfig) -> Result<()> {
    info!(
        path = %response_path.display(),
        level = %config.log_level,
        "Starting read-along replay"
    );
    info!(
        seek_epsilon_secs = config.seek_epsilon_secs,
        highlight_epsilon_secs = config.highlight_epsilon_secs,
        sync_allowed = config.sync_allowed,
        realtime = config.realtime,
        "Active sync configuration"
    );

    let raw = fs::read_to_string(response_path)
        .with_context(|| format!("Reading {}", response_path.display()))?;
    let response = SynthesisResponse::from_json(&raw)
        .with_context(|| format!("Parsing synthesis response {}", response_path.display()))?;
    let script = match script_path {
        Some(path) => Script::load(path)?,
        None => Script::default(),
    };

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Failed to install Ctrl-C handler: {err}");
    }

    let summary = run_replay(response, script, config, &cancel);
    if let Some(notice) = &summary.notice {
        println!("note: {notice}");
    }
    println!("{}", summary.final_line);
    println!(
        "frames={} highlights={} active={} cancelled={}",
        summary.frames,
        summary.highlight_changes,
        summary
            .snapshot
            .active_token
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".to_string()),
        summary.cancelled
    );
    Ok(())
}

fn parse_args() -> Result<Command> {
    let mut args = env::args().skip(1);
    let first = args.next().ok_or_else(|| anyhow!(USAGE))?;
    if first == "--print-config" {
        return Ok(Command::PrintConfig);
    }

    let response_path = PathBuf::from(first);
    if !response_path.exists() {
        return Err(anyhow!("File not found: {}", response_path.display()));
    }
    let script_path = args.next().map(PathBuf::from);
    if let Some(path) = &script_path {
        if !path.exists() {
            return Err(anyhow!("Script not found: {}", path.display()));
        }
    }
    Ok(Command::Replay {
        response_path,
        script_path,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        info!(%level, "RUST_LOG set; ignoring configured log level");
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
