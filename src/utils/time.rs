//! Time utilities

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Get current UTC time
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Format a wall-clock duration as a human-readable string
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_seconds = elapsed.as_secs();

    if total_seconds < 60 {
        return format!("{:.2}s", elapsed.as_secs_f64());
    }

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}
