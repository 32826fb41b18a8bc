//! Executes session effects against a concrete host.

use crate::highlight::{TokenView, TokenWrapper};
use crate::session::{SyncEffect, SyncEvent, SyncSession};
use crate::snapshot::SyncSnapshot;
use tracing::debug;

/// The reader environment the sync core drives: a media element, a
/// display-frame scheduler, and the token view.
pub trait SyncHost: TokenView {
    fn render_tokens(&mut self, wrappers: Vec<TokenWrapper>);
    fn show_notice(&mut self, notice: Option<&str>);
    /// Replaces the media source and rewinds to zero.
    fn load_audio(&mut self, url: Option<&str>);
    fn seek_media(&mut self, seconds: f64);
    fn play_media(&mut self);
    fn request_frame(&mut self, frame_id: u64);
    fn cancel_frame(&mut self, frame_id: u64);
}

pub struct SyncDriver<H: SyncHost> {
    session: SyncSession,
    host: H,
}

impl<H: SyncHost> SyncDriver<H> {
    pub fn new(session: SyncSession, host: H) -> Self {
        Self { session, host }
    }

    pub fn session(&self) -> &SyncSession {
        &self.session
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.session.snapshot()
    }

    pub fn into_parts(self) -> (SyncSession, H) {
        (self.session, self.host)
    }

    /// Feeds one event through the session and runs its effects in order.
    pub fn dispatch(&mut self, event: SyncEvent) -> &'static str {
        let outcome = self.session.apply(event);
        if !outcome.effects.is_empty() {
            debug!(
                action = outcome.action,
                effects = outcome.effects.len(),
                "Running sync effects"
            );
        }
        for effect in outcome.effects {
            self.run_effect(effect);
        }
        outcome.action
    }

    fn run_effect(&mut self, effect: SyncEffect) {
        match effect {
            SyncEffect::CancelFrame { frame_id } => self.host.cancel_frame(frame_id),
            SyncEffect::Highlight { token_id, on } => {
                if !self.host.set_highlighted(token_id, on) {
                    debug!(token_id, on, "No element for highlighted token");
                }
            }
            SyncEffect::RenderTokens(wrappers) => self.host.render_tokens(wrappers),
            SyncEffect::ShowNotice(notice) => self.host.show_notice(notice.as_deref()),
            SyncEffect::LoadAudio { url } => self.host.load_audio(url.as_deref()),
            SyncEffect::RequestFrame { frame_id } => self.host.request_frame(frame_id),
            SyncEffect::SeekMedia { seconds } => self.host.seek_media(seconds),
            SyncEffect::PlayMedia => self.host.play_media(),
        }
    }
}
