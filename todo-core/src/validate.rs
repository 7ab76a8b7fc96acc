//! Request validation.
//!
//! Raw path segments and JSON bodies are turned into typed inputs here, before
//! any statement reaches the store. Every rejection is a
//! [`TodoError::InvalidInput`] carrying the message returned to the client.

use serde_json::Value;

use crate::error::{TodoError, TodoResult};
use crate::models::{NewTodo, TodoPatch};

pub const MSG_INVALID_ID: &str = "Invalid id";
pub const MSG_INVALID_CREATE_BODY: &str = "Invalid body: { title: string; completed?: boolean }";
pub const MSG_INVALID_BODY: &str = "Invalid body";
pub const MSG_NO_UPDATABLE_FIELDS: &str = "No updatable fields";
pub const MSG_TITLE_NOT_STRING: &str = "title must be a string";
pub const MSG_TITLE_EMPTY: &str = "title must not be empty";
pub const MSG_COMPLETED_NOT_BOOL: &str = "completed must be a boolean";

/// Strip surrounding whitespace, including the byte order mark.
fn trim_input(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Parse a todo id from a path segment.
///
/// Accepts any finite number without a fractional part that fits in `i64`
/// (`"7"`, `" 7 "`, `"7.0"`, `"1e2"`), plus unsigned `0x`/`0o`/`0b` literals.
pub fn parse_id(raw: &str) -> TodoResult<i64> {
    let s = trim_input(raw);
    if let Some(id) = parse_prefixed(s) {
        return id;
    }

    let n: f64 = s.parse().map_err(|_| TodoError::invalid(MSG_INVALID_ID))?;

    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if !n.is_finite() || n.fract() != 0.0 || n < i64::MIN as f64 || n >= i64::MAX as f64 {
        return Err(TodoError::invalid(MSG_INVALID_ID));
    }
    Ok(n as i64)
}

/// `None` when `s` carries no radix prefix.
fn parse_prefixed(s: &str) -> Option<TodoResult<i64>> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &s[2..];
    // from_str_radix takes a sign, a radix literal does not.
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(Err(TodoError::invalid(MSG_INVALID_ID)));
    }
    Some(i64::from_str_radix(digits, radix).map_err(|_| TodoError::invalid(MSG_INVALID_ID)))
}

/// Validate a create body. `None` means the body was missing or not JSON.
pub fn parse_create(body: Option<&Value>) -> TodoResult<NewTodo> {
    let obj = body
        .and_then(Value::as_object)
        .ok_or_else(|| TodoError::invalid(MSG_INVALID_CREATE_BODY))?;

    let title = match obj.get("title") {
        Some(Value::String(s)) if !trim_input(s).is_empty() => trim_input(s).to_string(),
        _ => return Err(TodoError::invalid(MSG_INVALID_CREATE_BODY)),
    };
    let completed = obj.get("completed").map(truthy).unwrap_or(false);

    Ok(NewTodo { title, completed })
}

/// Validate a partial update body. Keys present with a `null` value count as
/// supplied and fail the type check.
pub fn parse_patch(body: Option<&Value>) -> TodoResult<TodoPatch> {
    let obj = body
        .and_then(Value::as_object)
        .ok_or_else(|| TodoError::invalid(MSG_INVALID_BODY))?;

    let title = match obj.get("title") {
        None => None,
        Some(Value::String(s)) => {
            let trimmed = trim_input(s);
            if trimmed.is_empty() {
                return Err(TodoError::invalid(MSG_TITLE_EMPTY));
            }
            Some(trimmed.to_string())
        }
        Some(_) => return Err(TodoError::invalid(MSG_TITLE_NOT_STRING)),
    };

    let completed = match obj.get("completed") {
        None => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => return Err(TodoError::invalid(MSG_COMPLETED_NOT_BOOL)),
    };

    TodoPatch::new(title, completed).ok_or_else(|| TodoError::invalid(MSG_NO_UPDATABLE_FIELDS))
}

/// Loose boolean coercion used for `completed` on create.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
