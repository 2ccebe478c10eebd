//! Lenient parsing of raw generator output.
//!
//! Models wrap JSON in code fences, prefix it with prose, truncate it or skip
//! it entirely. Nothing here returns an error: activity parsing degrades to
//! field recovery and finally to [`SIGNAL_LOST`], draft parsing to `None`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agents::ProfileDraft;
use crate::feed::ActivityKind;
use crate::groups::GroupDraft;

/// Placeholder content when nothing usable came back
pub const SIGNAL_LOST: &str = "[signal lost] transmission corrupted in the neural grid";

/// Default emotional tone tag
pub const DEFAULT_TONE: &str = "neutral";

/// Default intent tag
pub const DEFAULT_INTENT: &str = "share";

lazy_static! {
    static ref FENCE: Regex = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap();
    static ref STRING_FIELD: Regex =
        Regex::new(r#""(content|emotional_tone|intent|activity_type)"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap();
    static ref SCORE_FIELD: Regex =
        Regex::new(r#""confidence_score"\s*:\s*(-?[0-9]+(?:\.[0-9]+)?)"#).unwrap();
}

/// Structured activity extracted from generator output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResponse {
    /// Post text
    pub content: String,
    /// Emotional tone tag
    pub emotional_tone: String,
    /// Intent tag
    pub intent: String,
    /// Kind the model claims it produced (advisory only)
    pub activity_type: Option<ActivityKind>,
    /// Model confidence in `[0, 1]`
    pub confidence_score: f64,
    /// Whether fields were recovered from malformed output
    #[serde(skip)]
    pub recovered: bool,
}

impl ActivityResponse {
    fn signal_lost() -> Self {
        Self {
            content: SIGNAL_LOST.to_string(),
            emotional_tone: DEFAULT_TONE.to_string(),
            intent: DEFAULT_INTENT.to_string(),
            activity_type: None,
            confidence_score: 0.0,
            recovered: true,
        }
    }

    /// Whether the content is the placeholder
    pub fn is_signal_lost(&self) -> bool {
        self.content == SIGNAL_LOST
    }
}

/// Locate the JSON object inside raw model text
pub fn extract_json(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    let unfenced = FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed);

    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(unfenced) {
        return Some(obj);
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&unfenced[start..=end]) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Parse generator output into an activity. Never fails.
pub fn parse_activity(text: &str) -> ActivityResponse {
    if let Some(obj) = extract_json(text) {
        if let Some(content) = string_field(&obj, "content") {
            return ActivityResponse {
                content,
                emotional_tone: string_field(&obj, "emotional_tone")
                    .unwrap_or_else(|| DEFAULT_TONE.to_string()),
                intent: string_field(&obj, "intent").unwrap_or_else(|| DEFAULT_INTENT.to_string()),
                activity_type: string_field(&obj, "activity_type").and_then(|s| s.parse().ok()),
                confidence_score: clamp_score(
                    obj.get("confidence_score").and_then(Value::as_f64).unwrap_or(0.0),
                ),
                recovered: false,
            };
        }
    }

    recover_fields(text).unwrap_or_else(|| {
        tracing::debug!(len = text.len(), "generator output unusable");
        ActivityResponse::signal_lost()
    })
}

/// Field-by-field recovery from truncated or malformed JSON, or plain prose
fn recover_fields(text: &str) -> Option<ActivityResponse> {
    let mut response = ActivityResponse::signal_lost();
    let mut found_content = false;

    for caps in STRING_FIELD.captures_iter(text) {
        let value = unescape(&caps[2]);
        if value.trim().is_empty() {
            continue;
        }
        match &caps[1] {
            "content" => {
                response.content = value;
                found_content = true;
            },
            "emotional_tone" => response.emotional_tone = value,
            "intent" => response.intent = value,
            "activity_type" => response.activity_type = value.parse().ok(),
            _ => {}
        }
    }
    if let Some(score) = SCORE_FIELD
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
    {
        response.confidence_score = clamp_score(score);
    }

    if !found_content {
        // Prose with no JSON shape at all is still usable content
        let prose = text.trim();
        if prose.is_empty() || prose.contains('{') || prose.starts_with("```") {
            return None;
        }
        response.content = prose.to_string();
    }

    Some(response)
}

/// Decode a JSON string body captured by a regex
fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.replace("\\\"", "\""))
}

/// Parse a group-founding draft; `None` if nothing usable came back
pub fn parse_group_draft(text: &str) -> Option<GroupDraft> {
    let obj = extract_json(text)?;
    let topics = match obj.get("topics") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    let draft = GroupDraft {
        name: string_field(&obj, "name").unwrap_or_default(),
        description: string_field(&obj, "description").unwrap_or_default(),
        topics,
    };
    draft.is_usable().then_some(draft)
}

/// Parse a profile draft; `None` if nothing usable came back
pub fn parse_profile_draft(text: &str) -> Option<ProfileDraft> {
    let obj = extract_json(text)?;
    let field = |key: &str| string_field(&obj, key).unwrap_or_default();

    let draft = ProfileDraft {
        name: field("name"),
        personality_traits: field("personality_traits"),
        communication_tone: field("communication_tone"),
        worldview: field("worldview"),
        posting_goals: field("posting_goals"),
        topics_of_interest: field("topics_of_interest"),
    };
    draft.is_usable().then_some(draft)
}
