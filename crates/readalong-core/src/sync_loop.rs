//! Frame-paced polling loop bookkeeping.
//!
//! The loop never touches the host directly. It hands out frame ids for the
//! host to schedule and remembers the single one it is waiting for; any other
//! id that comes back is a late callback and is refused.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SyncLoopState {
    #[default]
    Idle,
    Running,
}

/// Media element state observed at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSample {
    pub current_time: f64,
    pub paused: bool,
    pub ended: bool,
}

impl PlaybackSample {
    pub fn playing(current_time: f64) -> Self {
        Self {
            current_time,
            paused: false,
            ended: false,
        }
    }

    pub fn is_advancing(&self) -> bool {
        !self.paused && !self.ended
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncLoop {
    pending: Option<u64>,
    last_frame_id: u64,
}

impl SyncLoop {
    pub fn state(&self) -> SyncLoopState {
        if self.pending.is_some() {
            SyncLoopState::Running
        } else {
            SyncLoopState::Idle
        }
    }

    pub fn pending_frame(&self) -> Option<u64> {
        self.pending
    }

    /// Schedules the first tick. Returns `None` when a tick is already pending.
    pub fn start(&mut self) -> Option<u64> {
        if self.pending.is_some() {
            return None;
        }
        Some(self.schedule())
    }

    /// Drops the pending tick, returning its id so the host can cancel it.
    pub fn stop(&mut self) -> Option<u64> {
        self.pending.take()
    }

    /// Claims a fired tick. Only the pending id is accepted; the loop is idle
    /// until the caller reschedules.
    pub fn accept_frame(&mut self, frame_id: u64) -> bool {
        if self.pending == Some(frame_id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Queues the next tick after an accepted one.
    pub fn reschedule(&mut self) -> u64 {
        self.schedule()
    }

    fn schedule(&mut self) -> u64 {
        self.last_frame_id = self.last_frame_id.wrapping_add(1);
        self.pending = Some(self.last_frame_id);
        self.last_frame_id
    }
}
