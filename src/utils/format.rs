//! Formatting utilities for file sizes and timestamps.

use chrono::{DateTime, Local};

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Layout used for every timestamp shown to the user.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a byte count using binary (1024) thresholds.
///
/// Picks the largest unit the value reaches at least once: `1536` becomes
/// `"1.50 KB"`, `999` stays `"999 Bytes"`. Units above bytes get two decimals.
pub fn format_size(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} Bytes", bytes)
    }
}

/// Formats a local timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Formats permission bits as three octal digits (e.g. `644`).
pub fn format_permissions(mode: u32) -> String {
    format!("{:03o}", mode & 0o777)
}
