use super::error::AnalyticsError;
use crate::metrics::DayCount;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Longest username GitHub allows.
pub const MAX_USERNAME_LEN: usize = 39;

static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("invalid regex"));

/// Trim and check a username: ASCII letters, digits and hyphens only.
///
/// # Errors
///
/// Returns a validation error for an empty, too long or malformed name.
pub fn validate_username(raw: &str) -> Result<String, AnalyticsError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(AnalyticsError::Validation("Missing username".into()));
    }

    if username.len() > MAX_USERNAME_LEN || !USERNAME_REGEX.is_match(username) {
        return Err(AnalyticsError::Validation("Invalid username format".into()));
    }

    Ok(username.to_string())
}

/// Check a requested window length.
///
/// Clients send the length as a number, a numeric string or nothing at all. A missing, null, zero or
/// empty value selects the default of 14 days.
///
/// # Errors
///
/// Returns a validation error for anything that does not denote 7, 14 or 30.
pub fn validate_days(days: Option<&Value>) -> Result<DayCount, AnalyticsError> {
    let Some(value) = days else {
        return Ok(DayCount::default());
    };

    match days_as_integer(value) {
        Some(0) => Ok(DayCount::default()),
        Some(n) => DayCount::try_from(n).map_err(|e| AnalyticsError::Validation(format!("Invalid days value: {e}"))),
        None => Err(AnalyticsError::Validation(format!("Invalid days value: {value}"))),
    }
}

fn days_as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Null => Some(0),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(0);
            }
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    }
}

#[expect(clippy::cast_possible_truncation, reason = "the value is whole and far inside the i64 range")]
fn whole_number(x: f64) -> Option<i64> {
    (x.is_finite() && x.abs() < 1e9 && x.fract().abs() < f64::EPSILON).then(|| x as i64)
}
