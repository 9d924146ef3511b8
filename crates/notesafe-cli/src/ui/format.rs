//! Text helpers shared by the renderers.

use std::time::Duration;

use chrono::{DateTime, Utc};

const ELLIPSIS: &str = "...";

/// Cut `text` to at most `width` characters, marking the cut with "...".
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().nth(width).is_none() {
        return text.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    if keep == 0 {
        return text.chars().take(width).collect();
    }
    let end = text
        .char_indices()
        .nth(keep)
        .map_or(text.len(), |(idx, _)| idx);
    format!("{}{}", &text[..end], ELLIPSIS)
}

/// Minutes in pretty output, full RFC 3339 otherwise.
pub fn format_datetime(dt: &DateTime<Utc>, pretty: bool) -> String {
    if pretty {
        dt.format("%Y-%m-%d %H:%M UTC").to_string()
    } else {
        dt.to_rfc3339()
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Lockout countdown as `m:ss`. Partial seconds round up so the display
/// never shows 0:00 while still locked out.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_millis().div_ceil(1000);
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Join the non-blank lines of `text` with single spaces.
pub fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
