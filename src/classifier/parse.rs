//! Model response parsing.
//!
//! Models wrap JSON in code fences or chatter around it; the payload is cut
//! out before deserializing into permissive raw shapes, which are then
//! normalized into the closed domain types.

use std::sync::OnceLock;

use chrono::FixedOffset;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::models::habit::{DayPart, Frequency, NewHabit};
use crate::models::intent::{
    CandidateMatch, Categorization, HabitIntent, ImageAnalysis, ManagementIntent, MatchConfidence,
};
use crate::models::item::{Category, DueDate, ItemType, Priority, TITLE_MAX_CHARS};
use crate::util::truncate_chars;
use crate::{AppError, Result};

fn fence() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").ok())
        .as_ref()
}

/// Cut the JSON object out of a model reply.
///
/// # Errors
///
/// Returns `AppError::Classifier` when no object can be found or parsed.
pub fn extract_json(raw: &str) -> Result<Value> {
    let body = fence()
        .and_then(|re| re.captures(raw))
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str());
    let start = body.find('{');
    let end = body.rfind('}');
    let slice = match (start, end) {
        (Some(start), Some(end)) if end > start => &body[start..=end],
        _ => return Err(AppError::Classifier("no json object in response".into())),
    };
    Ok(serde_json::from_str(slice)?)
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_value(extract_json(raw)?)?)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty() && s != "null")
}

#[derive(Deserialize)]
struct RawCategorization {
    category: Option<String>,
    #[serde(rename = "type")]
    item_type: Option<String>,
    priority: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    suggested_action: Option<String>,
    due_date: Option<String>,
}

/// Parse a categorization reply for `text`.
///
/// # Errors
///
/// Returns `AppError::Classifier` for non-JSON replies.
pub fn categorization(raw: &str, text: &str, offset: FixedOffset) -> Result<Categorization> {
    let parsed: RawCategorization = decode(raw)?;
    let title = non_empty(parsed.title).unwrap_or_else(|| text.trim().to_owned());
    Ok(Categorization {
        category: Category::normalize(parsed.category.as_deref()),
        item_type: parsed
            .item_type
            .as_deref()
            .and_then(ItemType::parse)
            .unwrap_or(ItemType::Idea),
        priority: parsed
            .priority
            .as_deref()
            .and_then(Priority::parse)
            .unwrap_or(Priority::Low),
        title: truncate_chars(&title, TITLE_MAX_CHARS),
        summary: non_empty(parsed.summary).unwrap_or_else(|| text.to_owned()),
        suggested_action: non_empty(parsed.suggested_action),
        due: non_empty(parsed.due_date).and_then(|d| DueDate::parse(&d, offset)),
    })
}

#[derive(Deserialize)]
struct RawManagement {
    intent: Option<String>,
    target: Option<String>,
    category: Option<String>,
    new_priority: Option<String>,
}

/// Parse a management intent reply. An empty target falls back to the
/// whole utterance.
///
/// # Errors
///
/// Returns `AppError::Classifier` for non-JSON replies.
pub fn management_intent(raw: &str, text: &str) -> Result<ManagementIntent> {
    let parsed: RawManagement = decode(raw)?;
    let target = non_empty(parsed.target).unwrap_or_else(|| text.trim().to_owned());
    let intent = parsed
        .intent
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    Ok(match intent.as_str() {
        "query" => ManagementIntent::Query {
            category: non_empty(parsed.category),
        },
        "delete" => ManagementIntent::Delete { target },
        "complete" => ManagementIntent::Complete { target },
        "update_priority" => ManagementIntent::UpdatePriority {
            target,
            new_priority: parsed.new_priority.as_deref().and_then(Priority::parse),
        },
        _ => ManagementIntent::None,
    })
}

#[derive(Deserialize)]
struct RawHabit {
    intent: Option<String>,
    habit_name: Option<String>,
    frequency: Option<String>,
    category: Option<String>,
    #[serde(default)]
    times: Vec<String>,
    xp_reward: Option<f64>,
}

/// Parse a habit intent reply. Intents without a habit name read as none.
///
/// # Errors
///
/// Returns `AppError::Classifier` for non-JSON replies.
pub fn habit_intent(raw: &str) -> Result<HabitIntent> {
    let parsed: RawHabit = decode(raw)?;
    let Some(name) = non_empty(parsed.habit_name) else {
        return Ok(HabitIntent::None);
    };
    let intent = parsed
        .intent
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    Ok(match intent.as_str() {
        "create_habit" => HabitIntent::Create(NewHabit {
            name: truncate_chars(&name, TITLE_MAX_CHARS),
            frequency: parsed
                .frequency
                .as_deref()
                .and_then(Frequency::parse)
                .unwrap_or(Frequency::Daily),
            category: Category::normalize(parsed.category.as_deref()),
            times: parsed
                .times
                .iter()
                .filter_map(|t| DayPart::parse(t))
                .collect(),
            xp_reward: parsed
                .xp_reward
                .filter(|xp| xp.is_finite() && *xp > 0.0 && *xp <= f64::from(u32::MAX))
                .map(whole),
        }),
        "complete_habit" => HabitIntent::Complete { name },
        _ => HabitIntent::None,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole(value: f64) -> u32 {
    value.round() as u32
}

#[derive(Deserialize)]
struct RawImage {
    description: Option<String>,
    category: Option<String>,
    suggested_title: Option<String>,
    priority: Option<String>,
    suggested_action: Option<String>,
}

/// Parse a vision reply.
///
/// # Errors
///
/// Returns `AppError::Classifier` for non-JSON replies.
pub fn image_analysis(raw: &str, caption: Option<&str>) -> Result<ImageAnalysis> {
    let parsed: RawImage = decode(raw)?;
    let caption = caption.map(str::trim).filter(|c| !c.is_empty());
    Ok(ImageAnalysis {
        description: non_empty(parsed.description)
            .or_else(|| caption.map(str::to_owned))
            .unwrap_or_else(|| "Image".into()),
        category: Category::normalize(parsed.category.as_deref()),
        suggested_title: truncate_chars(
            &non_empty(parsed.suggested_title).unwrap_or_else(|| "Image".into()),
            TITLE_MAX_CHARS,
        ),
        priority: parsed
            .priority
            .as_deref()
            .and_then(Priority::parse)
            .unwrap_or(Priority::Low),
        suggested_action: non_empty(parsed.suggested_action),
    })
}

#[derive(Deserialize)]
struct RawMatch {
    index: Option<Value>,
    confidence: Option<String>,
}

/// Parse a matcher reply against a list of `len` candidates. Index 0 and
/// out-of-range indexes mean no match.
///
/// # Errors
///
/// Returns `AppError::Classifier` for non-JSON replies.
pub fn candidate_match(raw: &str, len: usize) -> Result<Option<CandidateMatch>> {
    let parsed: RawMatch = decode(raw)?;
    let index = match parsed.index {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .and_then(|i| usize::try_from(i).ok());
    Ok(match index {
        Some(i) if (1..=len).contains(&i) => Some(CandidateMatch {
            index: i - 1,
            confidence: MatchConfidence::parse(parsed.confidence.as_deref().unwrap_or("")),
        }),
        _ => None,
    })
}
