//! Response contract of the synthesis collaborator.
//!
//! Only the fields the sync core consumes are modeled. Timing data is parsed
//! leniently: a malformed mark is dropped on its own instead of failing the
//! whole payload, since partial timing data is expected from the backend.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use ts_rs::TS;

const REDUCED_NOTICE: &str = "Reduced sync mode enabled for reliability.";
const NO_JYUTPING_NOTICE: &str =
    "Jyutping dependency unavailable on server; showing characters only.";

/// Server-declared fidelity of the timing data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SyncMode {
    #[default]
    Full,
    Reduced,
}

impl SyncMode {
    fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "reduced" => SyncMode::Reduced,
            _ => SyncMode::Full,
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SyncMode::Full => "full",
            SyncMode::Reduced => "reduced",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPayload {
    pub token_id: usize,
    #[serde(rename = "char")]
    pub ch: String,
    #[serde(default)]
    pub raw_index: Option<usize>,
    #[serde(default)]
    pub jyutping: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimepointPayload {
    #[serde(default)]
    pub mark_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub seconds: Option<f64>,
}

/// One synthesis result as returned by the TTS route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthesisResponse {
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub tokens: Vec<TokenPayload>,
    #[serde(default, deserialize_with = "lenient_timepoints")]
    pub timepoints: Vec<TimepointPayload>,
    #[serde(default, deserialize_with = "lenient_mark_to_token")]
    pub mark_to_token: HashMap<String, usize>,
    #[serde(default, deserialize_with = "lenient_sync_mode")]
    pub sync_mode: SyncMode,
    #[serde(default)]
    pub sync_supported: Option<bool>,
    #[serde(default)]
    pub jyutping_available: Option<bool>,
}

impl SynthesisResponse {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Highest addressable token id; zero for an empty token list.
    pub fn max_token_id(&self) -> usize {
        self.tokens.len().saturating_sub(1)
    }

    pub fn sync_supported(&self) -> bool {
        self.sync_supported.unwrap_or(true)
    }

    /// Well-formed `(mark_name, seconds)` pairs in input order.
    pub fn timing_marks(&self) -> Vec<(&str, f64)> {
        self.timepoints
            .iter()
            .filter_map(|point| Some((point.mark_name.as_deref()?, point.seconds?)))
            .collect()
    }

    /// Status line the reader shows above the token view, if any.
    pub fn sync_notice(&self) -> Option<String> {
        if self.jyutping_available == Some(false) {
            return Some(NO_JYUTPING_NOTICE.to_string());
        }
        match self.sync_mode {
            SyncMode::Reduced => Some(REDUCED_NOTICE.to_string()),
            SyncMode::Full => None,
        }
    }

    /// Time at which the simulated media reports `ended`.
    pub fn end_of_audio(&self, tail_secs: f64) -> f64 {
        if let Some(duration) = self.duration_seconds.filter(|d| d.is_finite() && *d > 0.0) {
            return duration;
        }
        let last_mark = self
            .timing_marks()
            .into_iter()
            .map(|(_, seconds)| seconds)
            .fold(0.0_f64, f64::max);
        last_mark + tail_secs.max(0.0)
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn token_id_from_value(value: &Value) -> Option<usize> {
    let parsed = number_from_value(value)?;
    if parsed < 0.0 || parsed.fract() != 0.0 || parsed > usize::MAX as f64 {
        return None;
    }
    Some(parsed as usize)
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}

fn lenient_timepoints<'de, D>(deserializer: D) -> Result<Vec<TimepointPayload>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| {
            let Value::Object(fields) = item else {
                return None;
            };
            let mark_name = match fields.get("mark_name") {
                Some(Value::String(name)) => Some(name.clone()),
                _ => None,
            };
            let seconds = fields.get("seconds").and_then(number_from_value);
            Some(TimepointPayload { mark_name, seconds })
        })
        .collect())
}

fn lenient_mark_to_token<'de, D>(deserializer: D) -> Result<HashMap<String, usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(entries) = value else {
        return Ok(HashMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(mark, token)| Some((mark, token_id_from_value(&token)?)))
        .collect())
}

fn lenient_sync_mode<'de, D>(deserializer: D) -> Result<SyncMode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(label) => SyncMode::from_label(&label),
        _ => SyncMode::Full,
    })
}
