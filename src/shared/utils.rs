use chrono::{NaiveDate, TimeZone, Utc};

/// Parse a `YYYY-MM-DD` date filter into epoch seconds at UTC midnight.
///
/// Anything unparsable yields `None`, which callers treat as "no filter".
pub fn parse_date(s: &str) -> Option<f64> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).timestamp() as f64)
}

/// Truncate to `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}

/// Accept `value` only when it lies in `1..=max`.
pub fn check_range(name: &str, value: usize, max: usize) -> Result<usize, String> {
    if (1..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("'{name}' must be between 1 and {max}, got {value}"))
    }
}
