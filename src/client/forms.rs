//! Conversion form heuristics
//!
//! Decides which form submissions look like leads worth reporting, and
//! flattens them into the conversion payload. These are hints, not
//! validation; the server stores whatever arrives.

use serde_json::{Map, Value};

/// A form submission as the host application hands it over.
#[derive(Debug, Clone, Default)]
pub struct FormSubmission {
    /// The form's action URL, or the page path when the action is empty.
    pub action: String,
    /// Field name/value pairs in document order.
    pub fields: Vec<(String, String)>,
}

/// Action path fragments that mark a lead form.
const PATH_HINTS: &[&str] = &[
    "quote", "estimate", "contact", "inquiry", "apply", "order", "request",
];

/// Field names that mark a lead form when enough of them appear.
const FIELD_HINTS: &[&str] = &[
    "name", "email", "mail", "tel", "phone", "company", "budget", "message",
];

/// Field names never forwarded to the server.
const BLOCKED_FIELDS: &[&str] = &["password", "passwd", "token", "card", "cvv", "secret"];

/// Field names that may carry the deal value.
const VALUE_FIELDS: &[&str] = &["budget", "price", "amount", "value", "cost"];

/// Minimum number of hinted field names before a form with a neutral
/// action counts as a lead form.
const FIELD_HINT_THRESHOLD: usize = 2;

pub fn looks_like_conversion_form(form: &FormSubmission) -> bool {
    let action = form.action.to_lowercase();
    if PATH_HINTS.iter().any(|hint| action.contains(hint)) {
        return true;
    }

    let hinted_fields = form
        .fields
        .iter()
        .filter(|(name, _)| {
            let name = name.to_lowercase();
            FIELD_HINTS.iter().any(|hint| name.contains(hint))
        })
        .count();
    hinted_fields >= FIELD_HINT_THRESHOLD
}

/// Flattens the submission into the JSON object sent as `formData`.
/// Secret-looking fields and empty values are dropped; on duplicate
/// names the last value wins.
pub fn collect_form_data(form: &FormSubmission) -> Value {
    let mut data = Map::new();
    for (name, value) in &form.fields {
        let lowered = name.to_lowercase();
        if BLOCKED_FIELDS.iter().any(|blocked| lowered.contains(blocked)) {
            continue;
        }
        if value.trim().is_empty() {
            continue;
        }
        data.insert(name.clone(), Value::String(value.clone()));
    }
    Value::Object(data)
}

/// Pulls an estimated deal value out of the first value-ish field that
/// contains digits. Currency symbols, separators and surrounding text
/// are stripped; the result is a hint, not an invoice.
pub fn extract_estimated_value(form: &FormSubmission) -> Option<i64> {
    for (name, value) in &form.fields {
        let lowered = name.to_lowercase();
        if !VALUE_FIELDS.iter().any(|hint| lowered.contains(hint)) {
            continue;
        }

        let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            continue;
        }
        if let Ok(parsed) = digits.parse::<i64>() {
            return Some(parsed);
        }
    }
    None
}
