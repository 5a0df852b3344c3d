//! Builders and readers for workspace property values.
//!
//! Readers accept both the shape the API returns (with `plain_text`) and
//! the shape the builders produce, so the in-memory backend can echo writes
//! back verbatim.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::Properties;

/// Title property.
#[must_use]
pub fn title(text: &str) -> Value {
    json!({ "title": [{ "text": { "content": text } }] })
}

/// Rich-text property.
#[must_use]
pub fn rich_text(text: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": text } }] })
}

/// Single-select property.
#[must_use]
pub fn select(name: &str) -> Value {
    json!({ "select": { "name": name } })
}

/// Multi-select property.
#[must_use]
pub fn multi_select<'a>(names: impl IntoIterator<Item = &'a str>) -> Value {
    let options: Vec<Value> = names
        .into_iter()
        .map(|name| json!({ "name": name }))
        .collect();
    json!({ "multi_select": options })
}

/// Date property with an ISO start value.
#[must_use]
pub fn date(start: &str) -> Value {
    json!({ "date": { "start": start } })
}

/// Date property for an instant.
#[must_use]
pub fn date_time(at: DateTime<Utc>) -> Value {
    date(&at.to_rfc3339())
}

/// Checkbox property.
#[must_use]
pub fn checkbox(checked: bool) -> Value {
    json!({ "checkbox": checked })
}

/// Number property.
#[must_use]
pub fn number(value: f64) -> Value {
    json!({ "number": value })
}

/// External file property.
#[must_use]
pub fn external_file(name: &str, url: &str) -> Value {
    json!({
        "files": [{ "name": name, "type": "external", "external": { "url": url } }]
    })
}

fn join_text(fragments: &Value) -> Option<String> {
    let parts = fragments.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| {
            part.get("plain_text")
                .or_else(|| part.get("text").and_then(|t| t.get("content")))
                .and_then(Value::as_str)
        })
        .collect();
    Some(text)
}

/// Read a title property.
#[must_use]
pub fn read_title(props: &Properties, key: &str) -> Option<String> {
    props.get(key)?.get("title").and_then(join_text)
}

/// Read a rich-text property; empty text reads as `None`.
#[must_use]
pub fn read_rich_text(props: &Properties, key: &str) -> Option<String> {
    props
        .get(key)?
        .get("rich_text")
        .and_then(join_text)
        .filter(|text| !text.is_empty())
}

/// Read a select or status property name.
#[must_use]
pub fn read_select(props: &Properties, key: &str) -> Option<String> {
    let value = props.get(key)?;
    value
        .get("select")
        .or_else(|| value.get("status"))
        .and_then(|option| option.get("name"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Read multi-select option names.
#[must_use]
pub fn read_multi_select(props: &Properties, key: &str) -> Vec<String> {
    props
        .get(key)
        .and_then(|value| value.get("multi_select"))
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(|option| option.get("name").and_then(Value::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Read the start of a date property.
#[must_use]
pub fn read_date(props: &Properties, key: &str) -> Option<String> {
    props
        .get(key)?
        .get("date")?
        .get("start")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Read a checkbox property.
#[must_use]
pub fn read_checkbox(props: &Properties, key: &str) -> Option<bool> {
    props.get(key)?.get("checkbox").and_then(Value::as_bool)
}

/// Read a number property.
#[must_use]
pub fn read_number(props: &Properties, key: &str) -> Option<f64> {
    props.get(key)?.get("number").and_then(Value::as_f64)
}

/// Read the first URL of a files property.
#[must_use]
pub fn read_file_url(props: &Properties, key: &str) -> Option<String> {
    let first = props.get(key)?.get("files")?.as_array()?.first()?;
    first
        .get("external")
        .or_else(|| first.get("file"))
        .and_then(|f| f.get("url"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Parse an RFC 3339 timestamp field.
#[must_use]
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|at| at.with_timezone(&Utc))
}
