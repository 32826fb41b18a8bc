//! Single active token and the per-token wrappers that carry its marker.

use crate::payload::SynthesisResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use ts_rs::TS;

/// Something that can toggle the highlight marker on a token element.
pub trait TokenView {
    /// Returns `false` when no element exists for `token_id`.
    fn set_highlighted(&mut self, token_id: usize, on: bool) -> bool;
}

/// The mutations performed by one `set_active` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightChange {
    pub removed: Option<usize>,
    pub added: Option<usize>,
}

impl HighlightChange {
    pub fn apply(&self, view: &mut impl TokenView) {
        if let Some(token_id) = self.removed {
            if !view.set_highlighted(token_id, false) {
                debug!(token_id, "No element to clear highlight on");
            }
        }
        if let Some(token_id) = self.added {
            if !view.set_highlighted(token_id, true) {
                debug!(token_id, "No element to highlight");
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightState {
    active: Option<usize>,
}

impl HighlightState {
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Moves the marker. Setting the current value again is a no-op and
    /// returns `None`.
    pub fn set_active(&mut self, token_id: Option<usize>) -> Option<HighlightChange> {
        if self.active == token_id {
            return None;
        }
        let removed = self.active.take();
        self.active = token_id;
        Some(HighlightChange {
            removed,
            added: token_id,
        })
    }
}

/// Minimal per-token structure the reader renders: annotation over character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TokenWrapper {
    pub token_id: usize,
    #[ts(optional)]
    pub mark: Option<String>,
    pub ruby: String,
    #[serde(rename = "char")]
    pub ch: String,
    pub active: bool,
}

/// In-memory token view built from a synthesis result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperView {
    wrappers: Vec<TokenWrapper>,
}

impl WrapperView {
    pub fn from_wrappers(wrappers: Vec<TokenWrapper>) -> Self {
        Self { wrappers }
    }

    pub fn wrappers(&self) -> &[TokenWrapper] {
        &self.wrappers
    }

    pub fn active_tokens(&self) -> Vec<usize> {
        self.wrappers
            .iter()
            .filter(|wrapper| wrapper.active)
            .map(|wrapper| wrapper.token_id)
            .collect()
    }

    /// Plain-text rendering with the active token bracketed.
    pub fn render_line(&self) -> String {
        let mut line = String::new();
        for wrapper in &self.wrappers {
            if wrapper.active {
                line.push('[');
                line.push_str(&wrapper.ch);
                line.push(']');
            } else {
                line.push_str(&wrapper.ch);
            }
        }
        line
    }

    fn position_of(&self, token_id: usize) -> Option<usize> {
        match self.wrappers.get(token_id) {
            Some(wrapper) if wrapper.token_id == token_id => Some(token_id),
            _ => self
                .wrappers
                .iter()
                .position(|wrapper| wrapper.token_id == token_id),
        }
    }
}

impl TokenView for WrapperView {
    fn set_highlighted(&mut self, token_id: usize, on: bool) -> bool {
        let Some(pos) = self.position_of(token_id) else {
            return false;
        };
        self.wrappers[pos].active = on;
        true
    }
}

/// Wrapper list for a response, none of them active.
pub fn build_wrappers(response: &SynthesisResponse) -> Vec<TokenWrapper> {
    // Sorted so a token addressed by several marks gets a stable label.
    let mut mark_by_token: BTreeMap<usize, &str> = BTreeMap::new();
    let sorted: BTreeMap<&str, usize> = response
        .mark_to_token
        .iter()
        .map(|(mark, token)| (mark.as_str(), *token))
        .collect();
    for (mark, token_id) in sorted {
        mark_by_token.entry(token_id).or_insert(mark);
    }

    response
        .tokens
        .iter()
        .map(|token| TokenWrapper {
            token_id: token.token_id,
            mark: mark_by_token.get(&token.token_id).map(|mark| mark.to_string()),
            ruby: token.jyutping.clone().unwrap_or_default(),
            ch: token.ch.clone(),
            active: false,
        })
        .collect()
}
