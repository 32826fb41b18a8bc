//! Simulated reader environment: a media element with a clock that only moves
//! when the replay advances it, a one-slot frame queue, and the token view.

use readalong_core::{PlaybackSample, SyncHost, TokenView, TokenWrapper, WrapperView};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Events a media element raises back into the reader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    Play,
    Pause,
    Ended,
    Seeking { current_time: f64 },
}

#[derive(Debug)]
pub struct ReplayHost {
    view: WrapperView,
    notice: Option<String>,
    audio_url: Option<String>,
    position: f64,
    end_secs: f64,
    rate: f64,
    paused: bool,
    ended: bool,
    queued_frame: Option<u64>,
    events: VecDeque<MediaEvent>,
    highlight_changes: usize,
}

impl ReplayHost {
    pub fn new(end_secs: f64, rate: f64) -> Self {
        Self {
            view: WrapperView::default(),
            notice: None,
            audio_url: None,
            position: 0.0,
            end_secs: end_secs.max(0.0),
            rate,
            paused: true,
            ended: false,
            queued_frame: None,
            events: VecDeque::new(),
            highlight_changes: 0,
        }
    }

    pub fn view(&self) -> &WrapperView {
        &self.view
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn highlight_changes(&self) -> usize {
        self.highlight_changes
    }

    pub fn has_queued_frame(&self) -> bool {
        self.queued_frame.is_some()
    }

    pub fn take_frame(&mut self) -> Option<u64> {
        self.queued_frame.take()
    }

    pub fn take_event(&mut self) -> Option<MediaEvent> {
        self.events.pop_front()
    }

    pub fn sample(&self) -> PlaybackSample {
        PlaybackSample {
            current_time: self.position,
            paused: self.paused,
            ended: self.ended,
        }
    }

    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.events.push_back(MediaEvent::Pause);
    }

    /// Moves the media clock forward by `wall_secs` of real time.
    pub fn advance(&mut self, wall_secs: f64) {
        if self.paused || self.ended {
            return;
        }
        self.position += wall_secs * self.rate;
        if self.position >= self.end_secs {
            self.position = self.end_secs;
            self.ended = true;
            self.paused = true;
            info!(position = self.position, "Playback reached end of audio");
            self.events.push_back(MediaEvent::Ended);
        }
    }
}

impl TokenView for ReplayHost {
    fn set_highlighted(&mut self, token_id: usize, on: bool) -> bool {
        let found = self.view.set_highlighted(token_id, on);
        if on {
            self.highlight_changes += 1;
            let ch = self
                .view
                .wrappers()
                .iter()
                .find(|wrapper| wrapper.token_id == token_id)
                .map(|wrapper| wrapper.ch.as_str())
                .unwrap_or("");
            info!(
                token_id,
                ch,
                position = format_args!("{:.3}", self.position),
                "Highlight"
            );
        }
        found
    }
}

impl SyncHost for ReplayHost {
    fn render_tokens(&mut self, wrappers: Vec<TokenWrapper>) {
        debug!(tokens = wrappers.len(), "Rendering token view");
        self.view = WrapperView::from_wrappers(wrappers);
    }

    fn show_notice(&mut self, notice: Option<&str>) {
        if let Some(text) = notice {
            info!(notice = text, "Sync notice");
        }
        self.notice = notice.map(str::to_string);
    }

    fn load_audio(&mut self, url: Option<&str>) {
        info!(url = url.unwrap_or("<none>"), end_secs = self.end_secs, "Loading audio");
        self.audio_url = url.map(str::to_string);
        self.position = 0.0;
        self.paused = true;
        self.ended = false;
    }

    fn seek_media(&mut self, seconds: f64) {
        self.position = seconds.clamp(0.0, self.end_secs);
        self.ended = false;
        self.events.push_back(MediaEvent::Seeking {
            current_time: self.position,
        });
    }

    fn play_media(&mut self) {
        if self.ended {
            self.position = 0.0;
            self.ended = false;
        }
        if self.paused {
            self.paused = false;
            self.events.push_back(MediaEvent::Play);
        }
    }

    fn request_frame(&mut self, frame_id: u64) {
        self.queued_frame = Some(frame_id);
    }

    fn cancel_frame(&mut self, frame_id: u64) {
        if self.queued_frame == Some(frame_id) {
            self.queued_frame = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_past_end_raises_ended_once() {
        let mut host = ReplayHost::new(1.0, 1.0);
        host.play_media();
        assert_eq!(host.take_event(), Some(MediaEvent::Play));
        host.advance(0.6);
        host.advance(0.6);
        host.advance(0.6);
        assert!(host.is_ended());
        assert_eq!(host.position(), 1.0);
        assert_eq!(host.take_event(), Some(MediaEvent::Ended));
        assert_eq!(host.take_event(), None);
    }

    #[test]
    fn playback_rate_scales_media_clock() {
        let mut host = ReplayHost::new(10.0, 2.0);
        host.play_media();
        host.advance(0.5);
        assert!((host.position() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn play_after_end_restarts_from_zero() {
        let mut host = ReplayHost::new(0.5, 1.0);
        host.play_media();
        host.advance(1.0);
        host.play_media();
        assert_eq!(host.position(), 0.0);
        assert!(!host.is_paused());
    }

    #[test]
    fn cancel_only_clears_matching_frame() {
        let mut host = ReplayHost::new(1.0, 1.0);
        host.request_frame(4);
        host.cancel_frame(3);
        assert!(host.has_queued_frame());
        host.cancel_frame(4);
        assert!(!host.has_queued_frame());
    }

    #[test]
    fn seek_clamps_to_media_bounds() {
        let mut host = ReplayHost::new(2.0, 1.0);
        host.seek_media(5.0);
        assert_eq!(
            host.take_event(),
            Some(MediaEvent::Seeking { current_time: 2.0 })
        );
        host.seek_media(-1.0);
        assert_eq!(host.position(), 0.0);
    }
}
