//! Profile Extraction
//!
//! Turns the extractor model's JSON answer into a validated
//! [`ProfileUpdate`]. The model is asked to resolve relative dates itself;
//! this module only rejects answers that are clearly wrong.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde_json::{Map, Value};

use super::text::extract_json_object;
use crate::domain::entities::ProfileUpdate;

/// Prompt for the extractor model. Placeholders: `{today}`, `{text}`.
pub const EXTRACT_PROMPT: &str = r#"
你是一个信息抽取器。请从用户输入中抽取旅游条件。

你必须输出"严格 JSON"，不要输出任何其它文字、解释、标点、Markdown。
只允许输出一个 JSON 对象。

今天日期（用于推断相对时间）：{today}

日期字段规则：
- departure_date 和 return_date：
  1) 如果用户明确给了具体日期，请输出 YYYY-MM-DD
  2) 如果用户给的是相对时间（如"两周后/下周五/明天/后天/周末/今年1月30号"），请你基于"今天日期"换算成一个确定的 YYYY-MM-DD。
  3) 如果用户没有给出年份，默认为当下的年份
  4) 如果仍然无法确定（例如用户没有任何可落地线索），可以输出 null，并尽量把月份信息写入 month（如"2月"或"2026-02"）。

JSON 必须包含以下键（没提到就填 null）：
- depart_city
- month
- departure_date
- return_date
- days
- budget_cny
- preferences
- people
- destination

用户输入：{text}
"#;

/// Dates further back than this are treated as a wrong-year guess
const MAX_PAST_DAYS: i64 = 370;

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^20\d{2}-\d{2}-\d{2}$").expect("valid regex"))
}

fn explicit_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b20\d{2}\b").expect("valid regex"))
}

/// Render the extractor prompt for one user message
pub fn render_extract_prompt(user_text: &str, today: NaiveDate) -> String {
    EXTRACT_PROMPT
        .replace("{today}", &today.format("%Y-%m-%d").to_string())
        .replace("{text}", user_text)
}

/// Whether `s` has the `20YY-MM-DD` shape (not necessarily a real date)
pub fn looks_like_iso_date(s: &str) -> bool {
    iso_date_re().is_match(s.trim())
}

/// Parse and validate the extractor's answer.
///
/// Unparseable output yields an all-`None` update rather than an error:
/// a failed extraction must never block the chat turn.
pub fn parse_profile_update(model_output: &str, user_text: &str, today: NaiveDate) -> ProfileUpdate {
    let map = extract_json_object(model_output).unwrap_or_default();

    let departure_date = map
        .get("departure_date")
        .and_then(|v| validate_date(v, user_text, today));
    let return_date = map
        .get("return_date")
        .and_then(|v| validate_date(v, user_text, today));

    let month = string_field(&map, "month").or_else(|| {
        departure_date
            .as_deref()
            .map(|d| d.chars().take(7).collect::<String>())
    });

    ProfileUpdate {
        depart_city: string_field(&map, "depart_city"),
        month,
        departure_date,
        return_date,
        days: int_field(&map, "days"),
        budget_cny: int_field(&map, "budget_cny"),
        preferences: string_field(&map, "preferences"),
        people: int_field(&map, "people"),
        destination: string_field(&map, "destination"),
    }
}

/// Non-empty strings pass through; a list of strings (the model sometimes
/// answers preferences as an array) is joined with spaces.
fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

/// Integers, or strings made only of ASCII digits
fn int_field(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
                s.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

fn validate_date(value: &Value, user_text: &str, today: NaiveDate) -> Option<String> {
    let raw = value.as_str()?.trim();
    if !looks_like_iso_date(raw) {
        return None;
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;

    if user_text.contains("今年") && date.year() != today.year() {
        // Moving the year can invalidate Feb 29
        let moved = NaiveDate::from_ymd_opt(today.year(), date.month(), date.day())?;
        return Some(moved.format("%Y-%m-%d").to_string());
    }

    if !explicit_year_re().is_match(user_text) && (today - date).num_days() > MAX_PAST_DAYS {
        return None;
    }

    Some(date.format("%Y-%m-%d").to_string())
}
