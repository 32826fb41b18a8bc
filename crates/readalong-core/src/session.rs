use crate::config::SyncTuning;
use crate::highlight::{HighlightChange, HighlightState, TokenWrapper, build_wrappers};
use crate::payload::{SyncMode, SynthesisResponse};
use crate::resolver::resolve_seek_time;
use crate::snapshot::SyncSnapshot;
use crate::sync_loop::{PlaybackSample, SyncLoop};
use crate::time_index::TimeIndex;
use crate::tracker::current_token;
use tracing::{debug, info};

/// Inputs from the surrounding reader: media element events, clicks, and new
/// synthesis results.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    NewSession(Box<SynthesisResponse>),
    Play,
    Pause,
    Ended,
    Seeking { current_time: f64 },
    Frame { frame_id: u64, sample: PlaybackSample },
    TokenClicked { token_id: usize },
    SetSyncAllowed(bool),
}

impl SyncEvent {
    pub fn action(&self) -> &'static str {
        match self {
            Self::NewSession(_) => "sync_new_session",
            Self::Play => "sync_play",
            Self::Pause => "sync_pause",
            Self::Ended => "sync_ended",
            Self::Seeking { .. } => "sync_seeking",
            Self::Frame { .. } => "sync_frame",
            Self::TokenClicked { .. } => "sync_token_clicked",
            Self::SetSyncAllowed(_) => "sync_set_allowed",
        }
    }
}

/// Work the host must carry out, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEffect {
    CancelFrame { frame_id: u64 },
    Highlight { token_id: usize, on: bool },
    RenderTokens(Vec<TokenWrapper>),
    ShowNotice(Option<String>),
    LoadAudio { url: Option<String> },
    RequestFrame { frame_id: u64 },
    SeekMedia { seconds: f64 },
    PlayMedia,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub action: &'static str,
    pub effects: Vec<SyncEffect>,
}

/// Sync state for one synthesis result, owned by the reader.
///
/// Everything except the host's permission flag and the frame id counter is
/// replaced on `NewSession`, and the replacement happens before the effects
/// that load the new audio.
#[derive(Debug, Clone)]
pub struct SyncSession {
    tuning: SyncTuning,
    index: TimeIndex,
    max_token_id: usize,
    highlight: HighlightState,
    sync_mode: SyncMode,
    sync_supported: bool,
    sync_allowed: bool,
    sync_loop: SyncLoop,
    generation: u64,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new(SyncTuning::default())
    }
}

impl SyncSession {
    pub fn new(tuning: SyncTuning) -> Self {
        Self {
            tuning: tuning.sanitized(),
            index: TimeIndex::default(),
            max_token_id: 0,
            highlight: HighlightState::default(),
            sync_mode: SyncMode::default(),
            sync_supported: false,
            sync_allowed: true,
            sync_loop: SyncLoop::default(),
            generation: 0,
        }
    }

    pub fn tuning(&self) -> SyncTuning {
        self.tuning
    }

    pub fn sync_enabled(&self) -> bool {
        self.sync_supported && self.sync_allowed
    }

    pub fn active_token(&self) -> Option<usize> {
        self.highlight.active()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn time_index(&self) -> &TimeIndex {
        &self.index
    }

    /// Token that should be lit for a raw media position.
    pub fn token_at(&self, current_time: f64) -> Option<usize> {
        current_token(&self.index, self.tuning.highlight_probe(current_time))
    }

    /// Mark time a click on `token_id` would seek to, before the seek offset.
    pub fn seek_time_for(&self, token_id: usize) -> Option<f64> {
        resolve_seek_time(&self.index, token_id, self.max_token_id)
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            generation: self.generation,
            active_token: self.highlight.active(),
            loop_state: self.sync_loop.state(),
            sync_enabled: self.sync_enabled(),
            sync_mode: self.sync_mode,
            marked_tokens: self.index.len(),
            max_token_id: self.max_token_id,
        }
    }

    pub fn apply(&mut self, event: SyncEvent) -> SessionEvent {
        let action = event.action();
        let mut effects = Vec::new();
        match event {
            SyncEvent::NewSession(response) => self.on_new_session(*response, &mut effects),
            SyncEvent::Play => self.on_play(&mut effects),
            SyncEvent::Pause | SyncEvent::Ended => self.stop_loop(action, &mut effects),
            SyncEvent::Seeking { current_time } => self.on_seeking(current_time, &mut effects),
            SyncEvent::Frame { frame_id, sample } => self.on_frame(frame_id, sample, &mut effects),
            SyncEvent::TokenClicked { token_id } => self.on_token_clicked(token_id, &mut effects),
            SyncEvent::SetSyncAllowed(allowed) => self.on_set_allowed(allowed, &mut effects),
        }
        SessionEvent { action, effects }
    }

    fn on_new_session(&mut self, response: SynthesisResponse, effects: &mut Vec<SyncEffect>) {
        self.stop_loop("sync_new_session", effects);
        self.set_active(None, effects);

        self.index = TimeIndex::build(response.timing_marks(), &response.mark_to_token);
        self.max_token_id = response.max_token_id();
        self.sync_mode = response.sync_mode;
        self.sync_supported = response.sync_supported();
        self.generation = self.generation.wrapping_add(1);
        info!(
            generation = self.generation,
            tokens = response.tokens.len(),
            marked_tokens = self.index.len(),
            sync_mode = %self.sync_mode,
            sync_enabled = self.sync_enabled(),
            "Built sync session"
        );

        effects.push(SyncEffect::RenderTokens(build_wrappers(&response)));
        effects.push(SyncEffect::ShowNotice(response.sync_notice()));
        effects.push(SyncEffect::LoadAudio {
            url: response.audio_url,
        });
        effects.push(SyncEffect::PlayMedia);
    }

    fn on_play(&mut self, effects: &mut Vec<SyncEffect>) {
        if !self.sync_enabled() {
            debug!(
                supported = self.sync_supported,
                allowed = self.sync_allowed,
                "Sync disabled; not starting highlight loop"
            );
            return;
        }
        match self.sync_loop.start() {
            Some(frame_id) => {
                debug!(frame_id, "Starting highlight loop");
                effects.push(SyncEffect::RequestFrame { frame_id });
            }
            None => debug!("Highlight loop already running"),
        }
    }

    fn on_seeking(&mut self, current_time: f64, effects: &mut Vec<SyncEffect>) {
        if !self.sync_enabled() {
            return;
        }
        let token_id = self.token_at(current_time);
        debug!(current_time, ?token_id, "Seek notification");
        self.set_active(token_id, effects);
    }

    fn on_frame(&mut self, frame_id: u64, sample: PlaybackSample, effects: &mut Vec<SyncEffect>) {
        if !self.sync_loop.accept_frame(frame_id) {
            debug!(
                frame_id,
                pending = ?self.sync_loop.pending_frame(),
                "Ignoring stale frame"
            );
            return;
        }
        if !(self.sync_enabled() && sample.is_advancing()) {
            debug!(
                frame_id,
                paused = sample.paused,
                ended = sample.ended,
                "Highlight loop went idle"
            );
            return;
        }
        let token_id = self.token_at(sample.current_time);
        self.set_active(token_id, effects);
        let next = self.sync_loop.reschedule();
        effects.push(SyncEffect::RequestFrame { frame_id: next });
    }

    fn on_token_clicked(&mut self, token_id: usize, effects: &mut Vec<SyncEffect>) {
        let Some(mark_secs) = self.seek_time_for(token_id) else {
            debug!(token_id, "No seek target for clicked token");
            return;
        };
        let seconds = self.tuning.seek_target(mark_secs);
        info!(token_id, mark_secs, seconds, "Seeking to clicked token");
        effects.push(SyncEffect::SeekMedia { seconds });
        self.set_active(Some(token_id), effects);
        effects.push(SyncEffect::PlayMedia);
    }

    fn on_set_allowed(&mut self, allowed: bool, effects: &mut Vec<SyncEffect>) {
        if self.sync_allowed == allowed {
            return;
        }
        self.sync_allowed = allowed;
        info!(allowed, sync_enabled = self.sync_enabled(), "Sync permission changed");
        if !allowed {
            self.stop_loop("sync_set_allowed", effects);
            self.set_active(None, effects);
        }
    }

    fn stop_loop(&mut self, reason: &'static str, effects: &mut Vec<SyncEffect>) {
        if let Some(frame_id) = self.sync_loop.stop() {
            debug!(frame_id, reason, "Stopping highlight loop");
            effects.push(SyncEffect::CancelFrame { frame_id });
        }
    }

    fn set_active(&mut self, token_id: Option<usize>, effects: &mut Vec<SyncEffect>) {
        let Some(HighlightChange { removed, added }) = self.highlight.set_active(token_id) else {
            return;
        };
        if let Some(token_id) = removed {
            effects.push(SyncEffect::Highlight {
                token_id,
                on: false,
            });
        }
        if let Some(token_id) = added {
            effects.push(SyncEffect::Highlight { token_id, on: true });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync_loop::SyncLoopState;
    use serde_json::json;

    fn response(value: serde_json::Value) -> Box<SynthesisResponse> {
        Box::new(serde_json::from_value(value).expect("parse response"))
    }

    fn sample_response() -> Box<SynthesisResponse> {
        response(json!({
            "audio_url": "/static/temp_audio/sample.mp3",
            "duration_seconds": 3.0,
            "tokens": [
                {"token_id": 0, "char": "今"}, {"token_id": 1, "char": "日"},
                {"token_id": 2, "char": "天"}, {"token_id": 3, "char": "氣"},
                {"token_id": 4, "char": "好"}
            ],
            "timepoints": [
                {"mark_name": "c_0", "seconds": 0.0},
                {"mark_name": "c_2", "seconds": 1.0},
                {"mark_name": "c_4", "seconds": 2.0}
            ],
            "mark_to_token": {"c_0": 0, "c_2": 2, "c_4": 4},
            "sync_mode": "reduced"
        }))
    }

    fn started_session() -> SyncSession {
        let mut session = SyncSession::new(SyncTuning::default());
        session.apply(SyncEvent::NewSession(sample_response()));
        session
    }

    fn requested_frame(event: &SessionEvent) -> Option<u64> {
        event.effects.iter().find_map(|effect| match effect {
            SyncEffect::RequestFrame { frame_id } => Some(*frame_id),
            _ => None,
        })
    }

    fn highlight_effects(event: &SessionEvent) -> Vec<(usize, bool)> {
        event
            .effects
            .iter()
            .filter_map(|effect| match effect {
                SyncEffect::Highlight { token_id, on } => Some((*token_id, *on)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_session_resets_before_loading_audio() {
        let mut session = started_session();
        let frame = requested_frame(&session.apply(SyncEvent::Play)).expect("frame");
        session.apply(SyncEvent::Seeking { current_time: 1.2 });
        assert_eq!(session.active_token(), Some(2));

        let event = session.apply(SyncEvent::NewSession(sample_response()));
        assert_eq!(event.action, "sync_new_session");
        assert_eq!(event.effects[0], SyncEffect::CancelFrame { frame_id: frame });
        assert_eq!(
            event.effects[1],
            SyncEffect::Highlight {
                token_id: 2,
                on: false
            }
        );
        assert!(matches!(event.effects[2], SyncEffect::RenderTokens(ref w) if w.len() == 5));
        assert_eq!(
            event.effects[3],
            SyncEffect::ShowNotice(Some("Reduced sync mode enabled for reliability.".into()))
        );
        assert_eq!(
            event.effects[4],
            SyncEffect::LoadAudio {
                url: Some("/static/temp_audio/sample.mp3".into())
            }
        );
        assert_eq!(event.effects[5], SyncEffect::PlayMedia);
        assert_eq!(session.active_token(), None);
        assert_eq!(session.generation(), 2);
    }

    #[test]
    fn play_twice_requests_one_frame() {
        let mut session = started_session();
        let first = session.apply(SyncEvent::Play);
        let second = session.apply(SyncEvent::Play);
        assert!(requested_frame(&first).is_some());
        assert!(second.effects.is_empty());
        assert_eq!(session.snapshot().loop_state, SyncLoopState::Running);
    }

    #[test]
    fn frame_updates_highlight_and_reschedules() {
        let mut session = started_session();
        let frame = requested_frame(&session.apply(SyncEvent::Play)).expect("frame");

        let event = session.apply(SyncEvent::Frame {
            frame_id: frame,
            sample: PlaybackSample::playing(0.98),
        });
        // 0.98 plus the lookahead crosses the mark at 1.0.
        assert_eq!(highlight_effects(&event), vec![(2, true)]);
        let next = requested_frame(&event).expect("next frame");
        assert_ne!(next, frame);

        let event = session.apply(SyncEvent::Frame {
            frame_id: next,
            sample: PlaybackSample::playing(1.5),
        });
        assert!(highlight_effects(&event).is_empty());
        assert!(requested_frame(&event).is_some());
    }

    #[test]
    fn paused_sample_ends_the_loop_without_update() {
        let mut session = started_session();
        let frame = requested_frame(&session.apply(SyncEvent::Play)).expect("frame");
        let event = session.apply(SyncEvent::Frame {
            frame_id: frame,
            sample: PlaybackSample {
                current_time: 2.5,
                paused: true,
                ended: false,
            },
        });
        assert!(event.effects.is_empty());
        assert_eq!(session.snapshot().loop_state, SyncLoopState::Idle);
        assert_eq!(session.active_token(), None);
    }

    #[test]
    fn late_frame_after_pause_is_ignored() {
        let mut session = started_session();
        let frame = requested_frame(&session.apply(SyncEvent::Play)).expect("frame");
        let paused = session.apply(SyncEvent::Pause);
        assert_eq!(paused.effects, vec![SyncEffect::CancelFrame { frame_id: frame }]);

        let late = session.apply(SyncEvent::Frame {
            frame_id: frame,
            sample: PlaybackSample::playing(2.2),
        });
        assert!(late.effects.is_empty());
        assert_eq!(session.active_token(), None);
        assert!(session.apply(SyncEvent::Pause).effects.is_empty());
    }

    #[test]
    fn late_frame_from_previous_session_is_ignored() {
        let mut session = started_session();
        let frame = requested_frame(&session.apply(SyncEvent::Play)).expect("frame");
        session.apply(SyncEvent::NewSession(sample_response()));
        let restarted = requested_frame(&session.apply(SyncEvent::Play)).expect("frame");
        assert_ne!(restarted, frame);

        let late = session.apply(SyncEvent::Frame {
            frame_id: frame,
            sample: PlaybackSample::playing(2.2),
        });
        assert!(late.effects.is_empty());
        assert_eq!(session.snapshot().loop_state, SyncLoopState::Running);
    }

    #[test]
    fn seeking_updates_highlight_while_idle() {
        let mut session = started_session();
        let event = session.apply(SyncEvent::Seeking { current_time: 2.1 });
        assert_eq!(highlight_effects(&event), vec![(4, true)]);
        let event = session.apply(SyncEvent::Seeking { current_time: 0.1 });
        assert_eq!(highlight_effects(&event), vec![(4, false), (0, true)]);
        assert_eq!(session.snapshot().loop_state, SyncLoopState::Idle);
    }

    #[test]
    fn click_seeks_past_nearest_mark_and_plays() {
        let mut session = started_session();
        let event = session.apply(SyncEvent::TokenClicked { token_id: 3 });
        let SyncEffect::SeekMedia { seconds } = event.effects[0] else {
            panic!("expected seek first, got {:?}", event.effects);
        };
        // Token 3 is unmarked; left neighbor 2 wins the tie with 4.
        assert!((seconds - 1.02).abs() < 1e-9);
        assert_eq!(event.effects[1], SyncEffect::Highlight { token_id: 3, on: true });
        assert_eq!(event.effects[2], SyncEffect::PlayMedia);
        assert_eq!(session.active_token(), Some(3));
    }

    #[test]
    fn click_without_timing_is_a_no_op() {
        let mut session = SyncSession::new(SyncTuning::default());
        session.apply(SyncEvent::NewSession(response(json!({
            "tokens": [{"token_id": 0, "char": "好"}]
        }))));
        let event = session.apply(SyncEvent::TokenClicked { token_id: 0 });
        assert!(event.effects.is_empty());
        assert_eq!(session.active_token(), None);
    }

    #[test]
    fn unsupported_sync_never_starts_loop() {
        let mut session = SyncSession::new(SyncTuning::default());
        session.apply(SyncEvent::NewSession(response(json!({
            "tokens": [{"token_id": 0, "char": "好"}],
            "timepoints": [{"mark_name": "c_0", "seconds": 0.0}],
            "mark_to_token": {"c_0": 0},
            "sync_supported": false
        }))));
        assert!(session.apply(SyncEvent::Play).effects.is_empty());
        assert!(session.apply(SyncEvent::Seeking { current_time: 0.5 }).effects.is_empty());
        assert!(!session.snapshot().sync_enabled);
    }

    #[test]
    fn disallowing_sync_stops_loop_and_clears_highlight() {
        let mut session = started_session();
        let frame = requested_frame(&session.apply(SyncEvent::Play)).expect("frame");
        session.apply(SyncEvent::Seeking { current_time: 1.0 });

        let event = session.apply(SyncEvent::SetSyncAllowed(false));
        assert_eq!(
            event.effects,
            vec![
                SyncEffect::CancelFrame { frame_id: frame },
                SyncEffect::Highlight {
                    token_id: 2,
                    on: false
                },
            ]
        );
        assert!(session.apply(SyncEvent::Play).effects.is_empty());

        session.apply(SyncEvent::SetSyncAllowed(true));
        assert!(requested_frame(&session.apply(SyncEvent::Play)).is_some());
    }

    #[test]
    fn snapshot_reports_session_shape() {
        let session = started_session();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.marked_tokens, 3);
        assert_eq!(snapshot.max_token_id, 4);
        assert_eq!(snapshot.sync_mode, SyncMode::Reduced);
        assert!(snapshot.sync_enabled);
        assert_eq!(snapshot.active_token, None);
    }

    #[test]
    fn directly_marked_tokens_resolve_to_their_exact_time() {
        let mut session = SyncSession::new(SyncTuning::default());
        let marks = [(0usize, 0.0_f64), (1, 0.333_333_333_333_333_3), (3, 1.7e-3), (6, 12.125)];
        let timepoints: Vec<_> = marks
            .iter()
            .map(|(id, secs)| json!({"mark_name": format!("m{id}"), "seconds": secs}))
            .collect();
        let mark_to_token: serde_json::Map<String, serde_json::Value> = marks
            .iter()
            .map(|(id, _)| (format!("m{id}"), json!(id)))
            .collect();
        let tokens: Vec<_> = (0..7).map(|id| json!({"token_id": id, "char": "字"})).collect();
        session.apply(SyncEvent::NewSession(response(json!({
            "tokens": tokens,
            "timepoints": timepoints,
            "mark_to_token": mark_to_token
        }))));

        for (id, secs) in marks {
            assert_eq!(session.seek_time_for(id), Some(secs));
        }
    }
}
