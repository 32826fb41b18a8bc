//! Timed user actions for a replay, one per line:
//!
//! ```text
//! # at_secs verb [arg]
//! 1.5 pause
//! 2.0 seek 0.75
//! 2.0 play
//! 4.25 click 12
//! 5 sync off
//! ```

use anyhow::{Context, Result, anyhow, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<at>\d+(?:\.\d+)?)\s+(?P<verb>[a-z]+)(?:\s+(?P<arg>\S+))?$")
        .expect("script line pattern")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptAction {
    Play,
    Pause,
    Seek(f64),
    Click(usize),
    Sync(bool),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptStep {
    pub at_secs: f64,
    pub action: ScriptAction,
}

/// Steps sorted by time; steps sharing a time keep file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    steps: Vec<ScriptStep>,
    cursor: usize,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Reading script {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Parsing script {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut steps = Vec::new();
        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let step = parse_line(line).with_context(|| format!("line {}: `{}`", idx + 1, raw))?;
            steps.push(step);
        }
        steps.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        Ok(Self { steps, cursor: 0 })
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Steps due at or before `clock_secs` that have not fired yet.
    pub fn due(&mut self, clock_secs: f64) -> Vec<ScriptStep> {
        let start = self.cursor;
        while self.cursor < self.steps.len() && self.steps[self.cursor].at_secs <= clock_secs {
            self.cursor += 1;
        }
        self.steps[start..self.cursor].to_vec()
    }
}

fn parse_line(line: &str) -> Result<ScriptStep> {
    let caps = LINE_RE
        .captures(line)
        .ok_or_else(|| anyhow!("expected `<at_secs> <verb> [arg]`"))?;
    let at_secs: f64 = caps["at"].parse().context("invalid time")?;
    let arg = caps.name("arg").map(|m| m.as_str());
    let action = match (&caps["verb"], arg) {
        ("play", None) => ScriptAction::Play,
        ("pause", None) => ScriptAction::Pause,
        ("seek", Some(arg)) => {
            let seconds: f64 = arg.parse().context("invalid seek time")?;
            if !seconds.is_finite() {
                bail!("seek time must be finite");
            }
            ScriptAction::Seek(seconds)
        }
        ("click", Some(arg)) => ScriptAction::Click(arg.parse().context("invalid token id")?),
        ("sync", Some("on")) => ScriptAction::Sync(true),
        ("sync", Some("off")) => ScriptAction::Sync(false),
        (verb, _) => bail!("unsupported action `{verb}`"),
    };
    Ok(ScriptStep { at_secs, action })
}
