//! Offline playback of one synthesis result through the sync core.
//!
//! Frames are paced by a fixed interval instead of a display callback. Each
//! interval the replay delivers pending media events, fires due script steps,
//! delivers the queued frame (if any), and then advances the media clock.

mod host;
mod script;

use host::{MediaEvent, ReplayHost};
pub use script::Script;
use script::ScriptAction;

use crate::cancellation::CancellationToken;
use crate::config::AppConfig;
use readalong_core::{
    SyncDriver, SyncEvent, SyncHost, SyncSession, SyncSnapshot, SynthesisResponse,
};
use std::thread;
use tracing::{debug, info, warn};

/// Replay ceiling past the last scheduled moment, in wall seconds.
const IDLE_GRACE_SECS: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub frames: usize,
    pub highlight_changes: usize,
    pub wall_secs: f64,
    pub cancelled: bool,
    pub final_line: String,
    pub notice: Option<String>,
    pub snapshot: SyncSnapshot,
}

pub fn run_replay(
    response: SynthesisResponse,
    mut script: Script,
    config: &AppConfig,
    cancel: &CancellationToken,
) -> ReplaySummary {
    let interval = config.frame_interval();
    let step_secs = interval.as_secs_f64();
    let end_secs = response.end_of_audio(config.tail_secs);
    let host = ReplayHost::new(end_secs, f64::from(config.playback_rate));
    let mut driver = SyncDriver::new(SyncSession::new(config.tuning()), host);

    info!(
        end_secs,
        frame_interval_ms = config.frame_interval_ms,
        playback_rate = config.playback_rate,
        script_steps = script.len(),
        "Starting replay"
    );

    if !config.sync_allowed {
        driver.dispatch(SyncEvent::SetSyncAllowed(false));
    }
    driver.dispatch(SyncEvent::NewSession(Box::new(response)));
    drain_media_events(&mut driver);

    let mut clock = 0.0_f64;
    let mut frames = 0usize;
    let mut idle_since: Option<f64> = None;
    let mut cancelled = false;

    loop {
        if cancel.is_cancelled() {
            warn!(clock, "Replay cancelled");
            driver.host_mut().pause();
            drain_media_events(&mut driver);
            cancelled = true;
            break;
        }
        drain_media_events(&mut driver);

        for step in script.due(clock) {
            debug!(at_secs = step.at_secs, action = ?step.action, "Script step");
            apply_step(&mut driver, step.action);
            drain_media_events(&mut driver);
        }

        if let Some(frame_id) = driver.host_mut().take_frame() {
            frames += 1;
            let sample = driver.host().sample();
            driver.dispatch(SyncEvent::Frame { frame_id, sample });
            drain_media_events(&mut driver);
        }

        let host = driver.host();
        let settled = (host.is_paused() || host.is_ended()) && !host.has_queued_frame();
        if settled && script.is_exhausted() {
            let since = *idle_since.get_or_insert(clock);
            if clock - since >= IDLE_GRACE_SECS || host.is_ended() {
                break;
            }
        } else {
            idle_since = None;
        }

        driver.host_mut().advance(step_secs);
        clock += step_secs;
        if config.realtime {
            thread::sleep(interval);
        }
    }

    let host = driver.host();
    let summary = ReplaySummary {
        frames,
        highlight_changes: host.highlight_changes(),
        wall_secs: clock,
        cancelled,
        final_line: host.view().render_line(),
        notice: host.notice().map(str::to_string),
        snapshot: driver.snapshot(),
    };
    info!(
        frames = summary.frames,
        highlight_changes = summary.highlight_changes,
        wall_secs = format_args!("{:.3}", summary.wall_secs),
        audio = host.audio_url().unwrap_or("<none>"),
        position = host.position(),
        active_token = ?summary.snapshot.active_token,
        "Replay finished"
    );
    summary
}

fn apply_step(driver: &mut SyncDriver<ReplayHost>, action: ScriptAction) {
    match action {
        ScriptAction::Play => driver.host_mut().play_media(),
        ScriptAction::Pause => driver.host_mut().pause(),
        ScriptAction::Seek(seconds) => driver.host_mut().seek_media(seconds),
        ScriptAction::Click(token_id) => {
            driver.dispatch(SyncEvent::TokenClicked { token_id });
        }
        ScriptAction::Sync(allowed) => {
            driver.dispatch(SyncEvent::SetSyncAllowed(allowed));
        }
    }
}

/// Delivers media events the way an element's listeners would, including
/// events raised by effects of earlier events.
fn drain_media_events(driver: &mut SyncDriver<ReplayHost>) {
    while let Some(event) = driver.host_mut().take_event() {
        let event = match event {
            MediaEvent::Play => SyncEvent::Play,
            MediaEvent::Pause => SyncEvent::Pause,
            MediaEvent::Ended => SyncEvent::Ended,
            MediaEvent::Seeking { current_time } => SyncEvent::Seeking { current_time },
        };
        driver.dispatch(event);
    }
}
