//! Small helpers for config values and timestamps.

/// Trimmed value, or `None` when it is missing or blank
pub fn non_blank(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Seconds since the Unix epoch. Every `updated_at` in the crate uses this clock.
pub fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}
