//! Token/time synchronization for read-along playback.
//!
//! A synthesis result carries sparse timing marks. This crate turns them into
//! a time index, answers "which token is playing" and "where does this token
//! start", and keeps exactly one highlighted token in step with playback.

pub mod config;
pub mod driver;
pub mod highlight;
pub mod payload;
pub mod resolver;
pub mod session;
pub mod snapshot;
pub mod sync_loop;
pub mod time_index;
pub mod tracker;

pub use config::SyncTuning;
pub use driver::{SyncDriver, SyncHost};
pub use highlight::{HighlightChange, HighlightState, TokenView, TokenWrapper, WrapperView};
pub use payload::{SyncMode, SynthesisResponse};
pub use session::{SessionEvent, SyncEffect, SyncEvent, SyncSession};
pub use snapshot::SyncSnapshot;
pub use sync_loop::{PlaybackSample, SyncLoop, SyncLoopState};
pub use time_index::{TimeEntry, TimeIndex};

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<()> {
    T::export_all_to(out_dir).map_err(|err| anyhow!("Failed to export {}: {err}", T::name()))
}

/// Writes the UI-facing types as TypeScript into `out_dir`.
pub fn export_ts_bindings(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for entry in
        fs::read_dir(out_dir).with_context(|| format!("Failed to list {}", out_dir.display()))?
    {
        let path = entry.context("Failed to read entry")?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }

    export_single_type::<SyncSnapshot>(out_dir)?;
    export_single_type::<SyncLoopState>(out_dir)?;
    export_single_type::<SyncMode>(out_dir)?;
    export_single_type::<TokenWrapper>(out_dir)?;

    let index_content = r#"export type { SyncSnapshot } from "./SyncSnapshot";
export type { SyncLoopState } from "./SyncLoopState";
export type { SyncMode } from "./SyncMode";
export type { TokenWrapper } from "./TokenWrapper";
"#;
    fs::write(out_dir.join("index.ts"), index_content)
        .with_context(|| format!("Failed to write {}", out_dir.join("index.ts").display()))?;
    Ok(())
}
