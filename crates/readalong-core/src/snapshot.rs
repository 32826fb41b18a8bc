//! On-demand view of the sync session for the reader UI.

use crate::payload::SyncMode;
use crate::sync_loop::SyncLoopState;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct SyncSnapshot {
    pub generation: u64,
    pub active_token: Option<usize>,
    pub loop_state: SyncLoopState,
    pub sync_enabled: bool,
    pub sync_mode: SyncMode,
    pub marked_tokens: usize,
    pub max_token_id: usize,
}
